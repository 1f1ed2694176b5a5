pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "dicey",
    about = "Dicey operator CLI",
    long_about = "Operate Dicey runtime readiness, local dice rolls, config inspection, and expression validation.",
    after_help = "Examples:\n  dicey roll \"3d6+2\"\n  dicey roll 4d6 --seed 7\n  dicey doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run startup preflight checks and return structured status output")]
    Start,
    #[command(about = "Roll a dice expression locally and print the result")]
    Roll {
        #[arg(help = "Dice expression, optionally suffixed with '@label'")]
        expression: String,
        #[arg(long, help = "Seed the random source for reproducible rolls")]
        seed: Option<u64>,
    },
    #[command(about = "Validate a dice expression without rolling it")]
    Validate {
        #[arg(help = "Dice expression to check")]
        expression: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate config, Discord token readiness, and dice engine determinism")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Start => commands::start::run(),
        Command::Roll { expression, seed } => commands::roll::run(&expression, seed),
        Command::Validate { expression } => commands::validate::run(&expression),
        Command::Config { json } => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(json) }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
