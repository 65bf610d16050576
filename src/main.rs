use animedex::cli::Cli;
use animedex::commands::{self, Status};
use animedex::config::Config;
use animedex::context::Context;
use animedex::logging;
use clap::Parser;
use color_eyre::Result;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let cli = Cli::parse();

  let config = Config::load(cli.config.as_deref())?;
  let _log_guard = logging::init(&config.log_dir()?)?;
  info!(version = env!("CARGO_PKG_VERSION"), "animedex starting");

  let ctx = Context::init(&config, cli.user)?;
  let result = commands::run(&ctx, cli.command).await;
  ctx.shutdown()?;

  match result {
    Ok(Status::Ok) => Ok(ExitCode::SUCCESS),
    Ok(Status::Degraded) => Ok(ExitCode::FAILURE),
    Err(e) => {
      error!(error = %e, "command failed");
      Err(e)
    }
  }
}
