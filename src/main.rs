use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use confmerge::{ConfmergeError, MergeArgs, Prepared, handle, load_settings};

/// Merge a customized proxy config with its upstream base config.
#[derive(Debug, Parser)]
#[command(name = "confmerge", version)]
struct Cli {
    #[command(flatten)]
    merge: MergeArgs,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confmerge=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let action = cli.merge.action();
    let overrides = cli.merge.overrides();
    let env_enabled = !cli.merge.no_env;

    match handle(&action, || load_settings(overrides, env_enabled), confirm) {
        Ok(outcome) => {
            let text = outcome.to_string();
            if text.ends_with('\n') {
                print!("{text}");
            } else {
                println!("{text}");
            }
            ExitCode::SUCCESS
        }
        Err(ConfmergeError::Cancelled) => {
            eprintln!("Merge cancelled; nothing was written.");
            ExitCode::SUCCESS
        }
        Err(ConfmergeError::UnknownKeys(errors)) => {
            for err in errors {
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Show the summary and ask on stdin. Anything but `y`/`yes` declines.
fn confirm(prepared: &Prepared) -> bool {
    let mut stderr = io::stderr().lock();
    let prompt = writeln!(stderr, "{}\n", prepared.summary()).and_then(|()| {
        write!(
            stderr,
            "Apply merge to {}? [y/N] ",
            prepared.mod_path.display()
        )?;
        stderr.flush()
    });
    if prompt.is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
