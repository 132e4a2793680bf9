use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects crypto prices and news, then emails a market report")]
pub struct Cli {
    /// Path to environment file (default: ./.env). Can also use APP_ENV_FILE.
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        default_value = ".env",
        env = "APP_ENV_FILE",
        global = true
    )]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the current price once and store it
    CollectPrice,

    /// Search for fresh market news and store new items
    CollectNews,

    /// Draft, chart and email the market report
    SendReport,

    /// Run price, news and report steps once, in order
    RunOnce,

    /// Run the pipeline on a fixed interval until interrupted
    Schedule(ScheduleArgs),

    /// Apply database migrations
    Migrate,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Minutes between pipeline runs (overrides SCHEDULE_INTERVAL_MINUTES)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_minutes: Option<u64>,

    /// Do not run the pipeline immediately on start-up
    #[arg(long)]
    pub skip_initial_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_schedule_overrides() {
        let cli = Cli::try_parse_from([
            "crypto-agents",
            "schedule",
            "--interval-minutes",
            "5",
            "--skip-initial-run",
        ])
        .unwrap();

        match cli.cmd {
            Command::Schedule(args) => {
                assert_eq!(args.interval_minutes, Some(5));
                assert!(args.skip_initial_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Cli::try_parse_from(["crypto-agents", "schedule", "--interval-minutes", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_file_is_global() {
        let cli = Cli::try_parse_from(["crypto-agents", "run-once", "--env-file", "prod.env"]).unwrap();
        assert_eq!(cli.env_file, PathBuf::from("prod.env"));
        assert!(matches!(cli.cmd, Command::RunOnce));
    }
}
