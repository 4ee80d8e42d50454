use crate::demo::{run_demo, run_score, run_validate, DemoArgs, ScoreArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use masark::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Masark",
    about = "Score personality assessments and serve career recommendations",
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
    /// Score a comma-separated list of 1-5 responses
    Score(ScoreArgs),
    /// Run the seeded synthetic validation harness
    Validate(ValidateArgs),
    /// Walk through a session from first answer to career matches
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
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Validate(args) => run_validate(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masark::assessment::ScoringProfile;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["masark"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_comma_separated_responses() {
        let cli = Cli::try_parse_from([
            "masark",
            "score",
            "--responses",
            "1,3,5",
            "--profile",
            "basic",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.responses, vec![1, 3, 5]);
                assert_eq!(args.profile, Some(ScoringProfile::Basic));
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn validate_has_seeded_defaults() {
        let cli = Cli::try_parse_from(["masark", "validate"]).expect("parses");
        match cli.command {
            Some(Command::Validate(args)) => {
                assert_eq!(args.seed, 42);
                assert_eq!(args.samples, 100);
                assert!(!args.json);
            }
            other => panic!("expected validate command, got {other:?}"),
        }
    }

    #[test]
    fn demo_rejects_non_finite_consistency() {
        assert!(Cli::try_parse_from(["masark", "demo", "--consistency", "NaN"]).is_err());
        let cli = Cli::try_parse_from(["masark", "demo", "--consistency", "0.6"]).expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => assert_eq!(args.consistency, 0.6),
            other => panic!("expected demo command, got {other:?}"),
        }
    }
}
