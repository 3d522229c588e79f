use anyhow::Result;
use sasl_probe_core::logger::init_logger;
use sasl_probe_core::{ArgsError, Invocation, KafkaConnector, Reporter, parse_args, run_probe};
use std::io;
use std::process::ExitCode;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let mut reporter = Reporter::new(io::stdout());

    let (credentials, options) = match parse_args(std::env::args_os().skip(1)) {
        Ok(Invocation::Help(text)) => {
            reporter.raw(&text)?;
            return Ok(ExitCode::SUCCESS);
        }
        Ok(Invocation::Probe {
            credentials,
            options,
        }) => (credentials, options),
        Err(ArgsError::Credential(err)) => {
            reporter.credential_error(&err)?;
            return Ok(ExitCode::FAILURE);
        }
        Err(ArgsError::Invalid(err)) => {
            err.print()?;
            return Ok(ExitCode::FAILURE);
        }
    };

    init_logger(&options.log_level);
    reporter.banner()?;

    info!(
        broker = %credentials.broker(),
        username = %credentials.username(),
        "Starting connectivity probe"
    );

    let outcome = run_probe(&KafkaConnector, &credentials, &options.settings(), &mut reporter).await?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
