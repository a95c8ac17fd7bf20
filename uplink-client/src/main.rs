//! uplink - send one authenticated command to the control endpoint

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uplink_client::{run, write_outcome, Cli, ClientError, Dispatcher};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let err = ClientError::from(err);
            eprint!("{}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("uplink: {:#}", err);
            let code = err
                .downcast_ref::<ClientError>()
                .map_or(1, ClientError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

async fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    debug!("Endpoint: {}", config.endpoint);
    debug!("Credentials: {} ({})", config.credentials.display(), config.key_name);

    let dispatcher = Dispatcher::from_config(&config);
    let outcome = run(cli, &dispatcher)
        .await
        .with_context(|| format!("cannot dispatch '{}'", cli.command))?;

    write_outcome(&mut std::io::stdout().lock(), &outcome)?;

    Ok(())
}
