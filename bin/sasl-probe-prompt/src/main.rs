use anyhow::Result;
use clap::Parser;
use sasl_probe_core::cli::PromptArgs;
use sasl_probe_core::logger::init_logger;
use sasl_probe_core::prompt::{TerminalPrompt, prompt_credentials};
use sasl_probe_core::{KafkaConnector, Reporter, run_probe};
use std::io;
use std::process::ExitCode;
use tracing::{debug, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = match PromptArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print()?;
            return Ok(if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    init_logger(&args.options.log_level);

    let mut reporter = Reporter::new(io::stdout());
    reporter.banner()?;

    let mut prompt = TerminalPrompt::stdout();
    let code = match prompt_credentials(&mut prompt) {
        Ok(credentials) => {
            info!(
                broker = %credentials.broker(),
                username = %credentials.username(),
                "Starting connectivity probe"
            );
            let outcome =
                run_probe(&KafkaConnector, &credentials, &args.options.settings(), &mut reporter)
                    .await?;
            if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            reporter.credential_error(&err)?;
            ExitCode::FAILURE
        }
    };

    if let Err(err) = prompt.wait_for_key() {
        debug!(error = %err, "No key press to wait for");
    }

    Ok(code)
}
