use crate::report::{run_import, run_report, ImportArgs, ReportArgs};
use crate::server;
use card_intake::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Card Intake",
    about = "Serve, import, and report on credit-card applications",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Insert the rows of a CSV export into the primary applications table
    Import(ImportArgs),
    /// Print dashboard counts and the per-bank status report
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import(args).await,
        Command::Report(args) => run_report(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["card-intake-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn import_requires_a_file() {
        assert!(Cli::try_parse_from(["card-intake-api", "import"]).is_err());

        let cli = Cli::try_parse_from(["card-intake-api", "import", "--file", "export.csv"])
            .expect("parses");
        match cli.command {
            Some(Command::Import(args)) => assert_eq!(args.file, PathBuf::from("export.csv")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from(["card-intake-api", "serve", "--port", "8080"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
