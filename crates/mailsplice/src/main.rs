//! `mailsplice` - MIME filter for mail pipelines
//!
//! Reads one message from stdin, applies the operation named by the
//! invocation name or `MAILSPLICE_MODE`, writes the result to stdout.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use anyhow::Context;
use mailsplice_core::{Config, Error, process};
use std::io::{Read, Write};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for invocation errors.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the message
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsplice=warn,mailsplice_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mailsplice: {e:#}");
            if matches!(e.downcast_ref::<Error>(), Some(Error::Usage(_))) {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    info!(mode = %config.mode, "starting mailsplice");

    let mut input = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut input)
        .context("failed to read message from stdin")?;
    debug!(bytes = input.len(), "read message");

    let output = process(&input, &config)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .context("failed to write message to stdout")?;
    Ok(())
}
