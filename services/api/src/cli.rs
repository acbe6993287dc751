use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use volunsched::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Volunteer Scheduler",
    about = "Run or demonstrate the volunteer shift scheduling service from the command line",
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
    /// Walk through quota decisions, stats, and substitute search on a sample roster
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Volunteer roster CSV (name,phone,email,reliability_score) loaded at startup
    #[arg(long)]
    pub(crate) volunteers: Option<PathBuf>,
    /// Shift calendar CSV (date,shift_type,capacity) loaded at startup
    #[arg(long)]
    pub(crate) shifts: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_and_accepts_roster_paths() {
        let cli = Cli::try_parse_from([
            "volunsched-api",
            "serve",
            "--port",
            "8080",
            "--volunteers",
            "roster.csv",
        ])
        .expect("parse serve");

        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.volunteers, Some(PathBuf::from("roster.csv")));
                assert!(args.shifts.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let bare = Cli::try_parse_from(["volunsched-api"]).expect("parse bare");
        assert!(bare.command.is_none());
    }

    #[test]
    fn demo_accepts_a_reference_date() {
        let cli = Cli::try_parse_from(["volunsched-api", "demo", "--week-of", "2025-01-13"])
            .expect("parse demo");
        assert!(matches!(cli.command, Some(Command::Demo(_))));
    }
}
