use std::io::Write;
use std::path::{Path, PathBuf};

use pps_backend::{VersionProbe, detect_with};
use pps_index::{InstallPolicy, select_backend};
use pps_platform::locate_pip_main;

use crate::cli::{CliArgs, Commands, IndexUrlArgs};
use crate::error::AppError;
use crate::settings::Settings;

pub const NAME: &str = "pytorch-pip-shim";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the parsed command line. `Ok(false)` maps to exit status 1 without an
/// error message, e.g. `status` on a file without the shim.
pub fn run(
    args: &CliArgs,
    settings: &Settings,
    probe: &dyn VersionProbe,
    out: &mut dyn Write,
) -> Result<bool, AppError> {
    let Some(command) = &args.command else {
        if args.version {
            print_version(out)?;
            return Ok(true);
        }
        return Ok(false);
    };

    match command {
        Commands::Insert(file) => {
            let path = resolve_file(file.file.as_deref(), settings)?;
            pps_shim::insert(&path)?;
            Ok(true)
        }
        Commands::Remove(file) => {
            let path = resolve_file(file.file.as_deref(), settings)?;
            pps_shim::remove(&path)?;
            Ok(true)
        }
        Commands::Status(status) => {
            let path = resolve_file(status.file.file.as_deref(), settings)?;
            let inserted = pps_shim::is_inserted(&path)?;
            if !status.quiet {
                let verb = if inserted { "is" } else { "is NOT" };
                writeln!(out, "The shim {verb} inserted.")?;
            }
            Ok(inserted)
        }
        Commands::Detect => {
            writeln!(out, "{}", detect_with(probe))?;
            Ok(true)
        }
        Commands::IndexUrl(index) => {
            let policy = index_policy(index, probe);
            writeln!(out, "{}", policy.index_url())?;
            Ok(true)
        }
    }
}

/// Print `error` for the user. Sources are only logged.
pub fn report_error(error: &AppError, err: &mut dyn Write) {
    log::debug!("Command failed: {error:?}");
    let _ = writeln!(err, "{NAME}: {error}");
}

fn print_version(out: &mut dyn Write) -> std::io::Result<()> {
    let exe = std::env::current_exe()?;
    let root = exe.parent().unwrap_or(&exe);
    writeln!(out, "{NAME}=={VERSION} from {}", root.display())
}

fn index_policy(index: &IndexUrlArgs, probe: &dyn VersionProbe) -> InstallPolicy {
    let backend = select_backend(index.computation_backend.clone(), index.cpu, || {
        detect_with(probe)
    });
    InstallPolicy::new(backend, index.pre)
}

/// The file given on the command line wins, then the configured one, then the
/// `main.py` of whichever interpreter's pip can be found.
fn resolve_file(file: Option<&Path>, settings: &Settings) -> Result<PathBuf, AppError> {
    if let Some(file) = file {
        return Ok(file.to_path_buf());
    }

    if let Some(file) = &settings.pip_main_file {
        log::debug!("Using configured pip main file {}", file.display());
        return Ok(file.clone());
    }

    Ok(locate_pip_main(&settings.interpreters())?)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::Path;

    use super::*;

    const PIP_MAIN: &str = "import sys\n\ndef main(args=None):\n    return 0\n";

    fn no_cuda() -> Option<String> {
        None
    }

    fn cuda_113() -> Option<String> {
        Some("Cuda compilation tools, release 11.3, V11.3.58".to_string())
    }

    fn run_cli(argv: &[&str], settings: &Settings, probe: &dyn VersionProbe) -> (bool, String) {
        let args = CliArgs::try_parse_from(std::iter::once(NAME).chain(argv.iter().copied()))
            .expect("arguments should parse");
        let mut out = Vec::new();
        let ok = run(&args, settings, probe, &mut out).expect("command should succeed");
        (ok, String::from_utf8(out).expect("output should be utf-8"))
    }

    fn pip_main(dir: &Path) -> PathBuf {
        let path = dir.join("main.py");
        std::fs::write(&path, PIP_MAIN).expect("write pip main");
        path
    }

    #[test]
    fn no_command_fails() {
        let (ok, out) = run_cli(&[], &Settings::default(), &no_cuda);
        assert!(!ok);
        assert!(out.is_empty());
    }

    #[test]
    fn version_prints_name_version_and_location() {
        let (ok, out) = run_cli(&["--version"], &Settings::default(), &no_cuda);
        assert!(ok);
        assert!(out.starts_with(&format!("{NAME}=={VERSION} from ")));
    }

    #[test]
    fn insert_status_remove_cycle() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = pip_main(temp_dir.path());
        let file = path.to_str().expect("utf-8 temp path");
        let settings = Settings::default();

        let (ok, out) = run_cli(&["status", file], &settings, &no_cuda);
        assert!(!ok);
        assert_eq!(out, "The shim is NOT inserted.\n");

        let (ok, _) = run_cli(&["insert", file], &settings, &no_cuda);
        assert!(ok);

        let (ok, out) = run_cli(&["status", file], &settings, &no_cuda);
        assert!(ok);
        assert_eq!(out, "The shim is inserted.\n");

        let (ok, _) = run_cli(&["remove", file], &settings, &no_cuda);
        assert!(ok);
        assert_eq!(
            std::fs::read_to_string(&path).expect("read pip main"),
            PIP_MAIN
        );
    }

    #[test]
    fn status_quiet_prints_nothing() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = pip_main(temp_dir.path());
        let file = path.to_str().expect("utf-8 temp path");

        let (ok, out) = run_cli(&["status", "--quiet", file], &Settings::default(), &no_cuda);

        assert!(!ok);
        assert!(out.is_empty());
    }

    #[test]
    fn configured_file_is_used_without_argument() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let settings = Settings {
            pip_main_file: Some(pip_main(temp_dir.path())),
            ..Settings::default()
        };

        let (ok, _) = run_cli(&["insert"], &settings, &no_cuda);
        assert!(ok);

        let (ok, _) = run_cli(&["status", "-q"], &settings, &no_cuda);
        assert!(ok);
    }

    #[test]
    fn insert_without_anchor_is_an_error() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("main.py");
        std::fs::write(&path, "print('hello')\n").expect("write file");
        let args = CliArgs::try_parse_from([NAME, "insert", path.to_str().expect("utf-8 path")])
            .expect("arguments should parse");

        let error = run(&args, &Settings::default(), &no_cuda, &mut Vec::new())
            .expect_err("insert should fail");

        assert!(matches!(
            error,
            AppError::Shim(pps_shim::ShimError::AnchorNotFound(_))
        ));
    }

    #[test]
    fn reported_error_names_the_program() {
        let error = AppError::Shim(pps_shim::ShimError::AnchorNotFound(PathBuf::from("main.py")));
        let mut err = Vec::new();

        report_error(&error, &mut err);

        assert_eq!(
            String::from_utf8(err).expect("output should be utf-8"),
            "pytorch-pip-shim: No line starting with 'def main(' found in main.py\n"
        );
    }

    #[test]
    fn unresolvable_default_file_is_an_error() {
        let settings = Settings {
            python: Some("pytorch-pip-shim-test-python-that-does-not-exist".to_string()),
            ..Settings::default()
        };
        let args = CliArgs::try_parse_from([NAME, "status"]).expect("arguments should parse");

        let error = run(&args, &settings, &no_cuda, &mut Vec::new())
            .expect_err("status should fail");

        assert!(matches!(error, AppError::Locate(_)));
    }

    #[test]
    fn detect_prints_canonical_backend() {
        let (ok, out) = run_cli(&["detect"], &Settings::default(), &cuda_113);
        assert!(ok);
        assert_eq!(out, "cu113\n");

        let (_, out) = run_cli(&["detect"], &Settings::default(), &no_cuda);
        assert_eq!(out, "cpu\n");
    }

    #[test]
    fn index_url_prefers_explicit_backend() {
        let (_, out) = run_cli(
            &["index-url", "--cpu", "--computation-backend", "cu102", "--pre"],
            &Settings::default(),
            &cuda_113,
        );
        assert_eq!(
            out,
            "https://download.pytorch.org/whl/nightly/cu102/torch_nightly.html\n"
        );
    }

    #[test]
    fn index_url_falls_back_to_detection() {
        let (_, out) = run_cli(&["index-url", "--pre"], &Settings::default(), &cuda_113);
        assert!(out.contains("/nightly/cu113/"));

        let (_, out) = run_cli(&["index-url", "--pre", "--cpu"], &Settings::default(), &cuda_113);
        assert!(out.contains("/nightly/cpu/"));

        let (_, out) = run_cli(&["index-url"], &Settings::default(), &cuda_113);
        assert_eq!(out, "https://download.pytorch.org/whl/torch_stable.html\n");
    }
}
