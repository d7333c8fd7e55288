use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Unable to parse '{input}' into a computation backend. \
     Valid values are 'cpu' and 'cu' followed by the CUDA version, e.g. 'cu102' or 'cu11.1'."
)]
pub struct ParseError {
    pub input: String,
}

impl ParseError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
