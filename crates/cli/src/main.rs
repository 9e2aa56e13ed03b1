// apcrecon CLI - CUFS payment reconciliation against support tickets

mod debug;
mod exit_codes;
mod input;
mod master;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use apcrecon_engine::Funder;

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "apcrecon")]
#[command(about = "Reconcile CUFS payment exports against open-access support tickets")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  apcrecon-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  apcrecon-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every funder named in a config file
    #[command(after_help = "\
Examples:
  apcrecon run payments.toml
  apcrecon run payments.toml --funder rcuk
  apcrecon run payments.toml --json
  apcrecon run payments.toml --output reports.json")]
    Run {
        /// Reconciliation config (TOML)
        config: PathBuf,

        /// Process a single funder instead of every configured one
        #[arg(long)]
        funder: Option<FunderArg>,

        /// Print run reports as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write run reports as JSON to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Check a config file without reading any payment data
    #[command(after_help = "\
Examples:
  apcrecon validate payments.toml")]
    Validate {
        /// Reconciliation config (TOML)
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FunderArg {
    Rcuk,
    Coaf,
}

impl From<FunderArg> for Funder {
    fn from(arg: FunderArg) -> Self {
        match arg {
            FunderArg::Rcuk => Funder::Rcuk,
            FunderArg::Coaf => Funder::Coaf,
        }
    }
}

fn main() -> ExitCode {
    // Warnings print by default; RUST_LOG overrides.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, funder, json, output } => {
            run::cmd_run(config, funder.map(Into::into), json, output)
        }
        Commands::Validate { config } => run::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUNTIME, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
