use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::ParseError;

pub const CPU_TAG: &str = "cpu";
pub const CUDA_PREFIX: &str = "cu";

/// Which compiled variant of a distribution to fetch.
///
/// Two backends are equal when their canonical strings are equal, and a
/// backend compares equal to a string holding its canonical form, so
/// `ComputationBackend::cuda(11, 3) == "cu113"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ComputationBackend {
    Generic { tag: String },
    Cuda { major: u32, minor: u32 },
}

impl ComputationBackend {
    #[must_use]
    pub fn cpu() -> Self {
        Self::generic(CPU_TAG)
    }

    #[must_use]
    pub fn generic(tag: &str) -> Self {
        Self::Generic {
            tag: tag.to_lowercase(),
        }
    }

    #[must_use]
    pub fn cuda(major: u32, minor: u32) -> Self {
        Self::Cuda { major, minor }
    }

    #[must_use]
    pub fn is_cuda(&self) -> bool {
        matches!(self, Self::Cuda { .. })
    }

    /// Canonical string, also used as the local version label of wheels
    /// (`torch==1.8.0+cu111`) and as a path segment of the download index.
    #[must_use]
    pub fn local_specifier(&self) -> String {
        match self {
            Self::Generic { tag } => tag.to_lowercase(),
            Self::Cuda { major, minor } => format!("{CUDA_PREFIX}{major}{minor}"),
        }
    }
}

const CUDA_PATTERN_SOURCE: &str =
    r"^(?:cuda|cu)?(?:(?P<major>[0-9]+)\.(?P<minor>[0-9]+)|(?P<digits>[0-9]{2,}))$";

fn cuda_pattern() -> &'static Regex {
    static CUDA_PATTERN: OnceLock<Regex> = OnceLock::new();
    CUDA_PATTERN.get_or_init(|| {
        Regex::new(CUDA_PATTERN_SOURCE).expect("Invalid CUDA backend regex")
    })
}

fn parse_component(value: &str, input: &str) -> Result<u32, ParseError> {
    value.parse().map_err(|_| ParseError::new(input))
}

impl FromStr for ComputationBackend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized == CPU_TAG {
            return Ok(Self::cpu());
        }

        let captures = cuda_pattern()
            .captures(&normalized)
            .ok_or_else(|| ParseError::new(s))?;

        // Without a dot the last digit is the minor version: "cu1111" is 111.1.
        let (major, minor) = match (captures.name("major"), captures.name("minor")) {
            (Some(major), Some(minor)) => (major.as_str(), minor.as_str()),
            _ => {
                let digits = captures
                    .name("digits")
                    .ok_or_else(|| ParseError::new(s))?
                    .as_str();
                digits.split_at(digits.len() - 1)
            }
        };

        Ok(Self::cuda(
            parse_component(major, s)?,
            parse_component(minor, s)?,
        ))
    }
}

impl TryFrom<String> for ComputationBackend {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComputationBackend> for String {
    fn from(backend: ComputationBackend) -> Self {
        backend.local_specifier()
    }
}

impl fmt::Display for ComputationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.local_specifier())
    }
}

impl PartialEq for ComputationBackend {
    fn eq(&self, other: &Self) -> bool {
        self.local_specifier() == other.local_specifier()
    }
}

impl Eq for ComputationBackend {}

impl PartialEq<str> for ComputationBackend {
    fn eq(&self, other: &str) -> bool {
        self.local_specifier() == other
    }
}

impl PartialEq<&str> for ComputationBackend {
    fn eq(&self, other: &&str) -> bool {
        self.local_specifier() == *other
    }
}

impl PartialEq<String> for ComputationBackend {
    fn eq(&self, other: &String) -> bool {
        self.local_specifier() == *other
    }
}

impl Hash for ComputationBackend {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_specifier().hash(state);
    }
}
