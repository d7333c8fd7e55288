/// Marker line written above the bootstrap block. Its presence anywhere in
/// the file is what counts as "inserted".
pub const IDENTIFIER: &str = "# -*- pytorch-pip-shim -*-";

/// The stanza is placed directly above the first line starting with this.
pub const ANCHOR: &str = "def main(";

/// Decorates pip's `main` with `pytorch_pip_shim.patch`, falling back to a
/// pass-through decorator when the package has been uninstalled without
/// removing the stanza first.
///
/// No line may start with [`ANCHOR`]: removal finds the end of the stanza by
/// looking for the next anchor line.
pub const BOOTSTRAP: &str = "\
try:
    import pytorch_pip_shim
except ImportError:
    import functools
    import types

    def _passthrough(pip_main):
        @functools.wraps(pip_main)
        def wrapper(*args, **kwargs):
            return pip_main(*args, **kwargs)

        return wrapper

    pytorch_pip_shim = types.SimpleNamespace(patch=_passthrough)

@pytorch_pip_shim.patch
";
