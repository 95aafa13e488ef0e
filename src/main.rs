mod app;
mod config;
mod db;
mod mirror;
mod tsheets;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "punch")]
#[command(about = "A command line clock-in tool for TSheets")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/punch/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Refresh the local mirror if it has gone stale
  Sync,
  /// List mirrored user names
  Users,
  /// List mirrored job code names
  Jobs,
  /// Clock a user in on a job
  ClockIn {
    /// User display name, e.g. "Marius Juston"
    #[arg(short, long)]
    user: String,

    /// Job code name, e.g. "Programming"
    #[arg(short, long)]
    job: String,
  },
  /// Show who is currently on the clock
  WhosIn,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;
  let app = app::App::new(&config)?;

  match args.command {
    Command::Sync => app.sync_all().await?,
    Command::Users => {
      app.sync_all().await?;
      for name in app.user_names()? {
        println!("{}", name);
      }
    }
    Command::Jobs => {
      app.sync_all().await?;
      for name in app.job_names()? {
        println!("{}", name);
      }
    }
    Command::ClockIn { user, job } => {
      app.clock_in(&user, &job).await?;
      println!("Clocked in {} on {}", user, job);
    }
    Command::WhosIn => {
      for name in app.whos_in().await? {
        println!("{}", name);
      }
    }
  }

  Ok(())
}
