use std::io::Write;
use std::process;

use recipeez::{
    cli::{self, CliError, Ctx},
    config,
    infra::telemetry,
};
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &CliError) {
    debug!(error = ?error, "command failed");
    eprintln!("error: {error}");
    if let Some(hint) = error.hint() {
        eprintln!("hint: {hint}");
    }
}

async fn run() -> Result<(), CliError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let ctx = Ctx::from_settings(&settings)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(&ctx, cli_args.command, &mut out).await?;
    out.flush().map_err(CliError::Output)
}
