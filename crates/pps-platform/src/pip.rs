use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use which::which;

use crate::HideWindow;

/// Interpreters tried, in order, when no interpreter is configured.
pub const DEFAULT_INTERPRETERS: &[&str] = &["python3", "python"];

const PIP_PACKAGE_DIR_SCRIPT: &str = "import os, pip; print(os.path.dirname(pip.__file__))";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error(
        "Unexpected internal pytorch-pip-shim error: pip's main module could not be located \
         with any of [{tried}]. Pass the file explicitly or set PYTORCH_PIP_SHIM_FILE."
    )]
    Exhausted { tried: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    Exhausted,
}

/// Path of pip's CLI entry module relative to the installed `pip` package.
#[must_use]
pub fn pip_main_from_package_dir(package_dir: &Path) -> PathBuf {
    package_dir.join("_internal").join("cli").join("main.py")
}

pub fn resolve_pip_main<S: AsRef<str>>(interpreters: &[S]) -> Resolution {
    interpreters
        .iter()
        .find_map(|interpreter| query_interpreter(interpreter.as_ref()))
        .map_or(Resolution::Exhausted, Resolution::Found)
}

/// Ask each interpreter in turn where its `pip` lives and return the first
/// `main.py` found.
pub fn locate_pip_main<S: AsRef<str>>(interpreters: &[S]) -> Result<PathBuf, LocateError> {
    match resolve_pip_main(interpreters) {
        Resolution::Found(path) => {
            log::debug!("Resolved pip main module: {}", path.display());
            Ok(path)
        }
        Resolution::Exhausted => Err(LocateError::Exhausted {
            tried: interpreters
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn query_interpreter(interpreter: &str) -> Option<PathBuf> {
    let Ok(program) = which(interpreter) else {
        log::debug!("Interpreter {interpreter} not found");
        return None;
    };

    let output = Command::new(&program)
        .args(["-c", PIP_PACKAGE_DIR_SCRIPT])
        .hide_window()
        .output()
        .ok()?;

    if !output.status.success() {
        log::debug!(
            "{} could not import pip: {}",
            program.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let package_dir = stdout.trim();
    if package_dir.is_empty() {
        return None;
    }

    Some(pip_main_from_package_dir(Path::new(package_dir)))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{
        LocateError, Resolution, locate_pip_main, pip_main_from_package_dir, resolve_pip_main,
    };

    const MISSING: &str = "pytorch-pip-shim-test-interpreter-that-does-not-exist";

    #[test]
    fn pip_main_is_inside_internal_cli() {
        let path = pip_main_from_package_dir(Path::new("site-packages").join("pip").as_path());

        assert!(path.ends_with(
            Path::new("pip")
                .join("_internal")
                .join("cli")
                .join("main.py")
        ));
    }

    #[test]
    fn resolve_reports_exhausted_when_no_interpreter_exists() {
        assert_eq!(resolve_pip_main(&[MISSING]), Resolution::Exhausted);
    }

    #[test]
    fn locate_lists_every_interpreter_tried() {
        let error = locate_pip_main(&[MISSING, "also-missing-python"])
            .expect_err("no interpreter should resolve");

        assert_eq!(
            error,
            LocateError::Exhausted {
                tried: format!("{MISSING}, also-missing-python"),
            }
        );
        assert!(error.to_string().contains("internal"));
    }

    #[cfg(unix)]
    fn fake_interpreter(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake interpreter");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make fake interpreter executable");
        path
    }

    #[cfg(unix)]
    #[test]
    fn locate_uses_first_interpreter_that_imports_pip() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let broken = fake_interpreter(temp.path(), "broken-python", "exit 1");
        let working =
            fake_interpreter(temp.path(), "working-python", "echo /opt/site-packages/pip");

        let interpreters = [
            broken.to_string_lossy().into_owned(),
            working.to_string_lossy().into_owned(),
        ];
        let path = locate_pip_main(&interpreters).expect("second interpreter should resolve");

        assert_eq!(
            path,
            pip_main_from_package_dir(Path::new("/opt/site-packages/pip"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn empty_interpreter_output_is_not_a_match() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let silent = fake_interpreter(temp.path(), "silent-python", "exit 0");

        assert_eq!(
            resolve_pip_main(&[silent.to_string_lossy().into_owned()]),
            Resolution::Exhausted
        );
    }
}
