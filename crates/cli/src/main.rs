mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::Global;
use crate::output::print_error;

/// envpin - pinned toolchains, native dependencies and dev shells from one descriptor
#[derive(Parser)]
#[command(name = "envpin")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Descriptor file (default: ./envpin.lua)
  #[arg(short, long, global = true)]
  file: Option<PathBuf>,

  /// Fail instead of changing the lock file
  #[arg(long, global = true)]
  locked: bool,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the package into the store
  Build {
    /// Do not create the `result` link
    #[arg(long)]
    no_link: bool,
  },

  /// Build and run the app
  Run {
    /// Arguments passed to the app after its default arguments
    #[arg(last = true)]
    args: Vec<String>,
  },

  /// Enter the development shell
  Develop {
    /// Inherit the full host environment
    #[arg(long)]
    impure: bool,

    /// Keep a host variable in a pure shell (repeatable)
    #[arg(long, value_name = "VAR")]
    keep: Vec<String>,

    /// Run a command in the shell instead of an interactive shell
    #[arg(short = 'c', long = "command", num_args = 1.., allow_hyphen_values = true, value_name = "CMD")]
    command: Vec<String>,
  },

  /// Print the development shell environment as a sourceable script
  PrintEnv {
    /// Target shell (default: detected from $SHELL)
    #[arg(long)]
    shell: Option<String>,

    /// Inherit the full host environment
    #[arg(long)]
    impure: bool,
  },

  /// Evaluate the descriptor and resolve everything it pins
  Check {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show the package, its outputs and the lock
  Show {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Refresh locked inputs and the toolchain they select
  Update {
    /// Inputs to refresh (default: all)
    inputs: Vec<String>,

    /// Show what would change without writing the lock file
    #[arg(long)]
    dry_run: bool,
  },

  /// Create a template descriptor
  Init {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,
  },

  /// Show platform and settings
  Info,
}

fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let global = Global {
    file: cli.file,
    locked: cli.locked,
  };

  let result = match cli.command {
    Commands::Build { no_link } => cmd::cmd_build(&global, no_link).map(|_| 0),
    Commands::Run { args } => cmd::cmd_run(&global, args),
    Commands::Develop { impure, keep, command } => cmd::cmd_develop(&global, impure, keep, command),
    Commands::PrintEnv { shell, impure } => cmd::cmd_print_env(&global, shell.as_deref(), impure).map(|_| 0),
    Commands::Check { json } => cmd::cmd_check(&global, json).map(|_| 0),
    Commands::Show { json } => cmd::cmd_show(&global, json).map(|_| 0),
    Commands::Update { inputs, dry_run } => cmd::cmd_update(&global, inputs, dry_run).map(|_| 0),
    Commands::Init { dir } => cmd::cmd_init(&dir).map(|_| 0),
    Commands::Info => {
      cmd::cmd_info();
      Ok(0)
    }
  };

  match result {
    Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
