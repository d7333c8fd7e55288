use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use pps_backend::ComputationBackend;
use pps_index::{COMPUTATION_BACKEND_HELP, CPU_HELP};

#[derive(Parser, Debug)]
#[command(
    name = "pytorch-pip-shim",
    about = "Patch pip so PyTorch distributions are installed for the local computation backend",
    disable_version_flag = true
)]
pub struct CliArgs {
    #[arg(short = 'V', long, help = "Show pytorch-pip-shim version and path and exit")]
    pub version: bool,

    #[arg(short = 'v', long, global = true, help = "Print debug logs to stderr")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Insert the shim")]
    Insert(FileArgs),

    #[command(about = "Remove the shim")]
    Remove(FileArgs),

    #[command(about = "Status of the shim. If inserted returns 0 otherwise 1.")]
    Status(StatusArgs),

    #[command(
        about = "Detect the computation backend from the available hardware, preferring CUDA over CPU."
    )]
    Detect,

    #[command(about = "Print the index PyTorch distributions are installed from")]
    IndexUrl(IndexUrlArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    #[arg(
        value_name = "FILE",
        help = "pip main file. If not specified it is derived from the pip of the configured Python interpreter."
    )]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub file: FileArgs,

    #[arg(short = 'q', long, help = "Do not print the status to STDOUT.")]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IndexUrlArgs {
    #[arg(long, value_name = "BACKEND", help = COMPUTATION_BACKEND_HELP)]
    pub computation_backend: Option<ComputationBackend>,

    #[arg(long, help = CPU_HELP)]
    pub cpu: bool,

    #[arg(long, help = "Use the nightly index")]
    pub pre: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{CliArgs, Commands};

    #[test]
    fn no_arguments_parse_without_command() {
        let args = CliArgs::try_parse_from(["pytorch-pip-shim"]).unwrap();
        assert!(args.command.is_none());
        assert!(!args.version);
    }

    #[test]
    fn version_flags() {
        for flag in ["-V", "--version"] {
            let args = CliArgs::try_parse_from(["pytorch-pip-shim", flag]).unwrap();
            assert!(args.version);
        }
    }

    #[test]
    fn insert_with_and_without_file() {
        let args = CliArgs::try_parse_from(["pytorch-pip-shim", "insert"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Insert(ref file)) if file.file.is_none()));

        let args = CliArgs::try_parse_from(["pytorch-pip-shim", "insert", "main.py"]).unwrap();
        let Some(Commands::Insert(file)) = args.command else {
            panic!("expected insert command");
        };
        assert_eq!(file.file.as_deref(), Some(std::path::Path::new("main.py")));
    }

    #[test]
    fn status_quiet_flags() {
        for flag in ["-q", "--quiet"] {
            let args = CliArgs::try_parse_from(["pytorch-pip-shim", "status", flag]).unwrap();
            assert!(matches!(args.command, Some(Commands::Status(ref status)) if status.quiet));
        }
    }

    #[test]
    fn index_url_parses_backend() {
        let args = CliArgs::try_parse_from([
            "pytorch-pip-shim",
            "index-url",
            "--computation-backend",
            "cuda11.1",
            "--pre",
        ])
        .unwrap();

        let Some(Commands::IndexUrl(index)) = args.command else {
            panic!("expected index-url command");
        };
        assert_eq!(index.computation_backend.unwrap(), "cu111");
        assert!(index.pre);
    }

    #[test]
    fn index_url_rejects_unknown_backend() {
        let result = CliArgs::try_parse_from([
            "pytorch-pip-shim",
            "index-url",
            "--computation-backend",
            "cudnn",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_subcommand_and_option_fail() {
        assert!(CliArgs::try_parse_from(["pytorch-pip-shim", "unknown"]).is_err());
        assert!(CliArgs::try_parse_from(["pytorch-pip-shim", "--unknown"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let args = CliArgs::try_parse_from(["pytorch-pip-shim", "detect", "-v"]).unwrap();
        assert!(args.verbose);
    }
}
