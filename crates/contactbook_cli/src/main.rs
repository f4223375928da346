//! Interactive contact book shell.
//!
//! # Responsibility
//! - Resolve configuration, start logging and load the saved book.
//! - Feed stdin lines to the core service and persist after every change.

use contactbook_core::{
    init_logging, load_store, save_book, AppConfig, BookService, ServiceError,
};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

const PROMPT: &str = "> ";

fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(2);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let store = match load_store(&config.data_path) {
        Ok(store) => store,
        Err(err) => {
            error!(
                "event=cli_start module=cli status=error path={} error={}",
                config.data_path.display(),
                err
            );
            eprintln!(
                "could not read `{}`: {err}",
                config.data_path.display()
            );
            return ExitCode::from(2);
        }
    };
    info!(
        "event=cli_start module=cli status=ok persons={} events={}",
        store.person_count(),
        store.event_count()
    );

    let mut service = BookService::new(store);
    match run(&mut service, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(service: &mut BookService, config: &AppConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    write!(stdout, "{PROMPT}")?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            write!(stdout, "{PROMPT}")?;
            stdout.flush()?;
            continue;
        }

        match service.execute_line(&line) {
            Ok(outcome) => {
                writeln!(stdout, "{}", outcome.feedback)?;
                if outcome.mutated {
                    if let Err(err) = save_book(&service.snapshot(), &config.data_path) {
                        writeln!(stdout, "Could not save data to file: {err}")?;
                    }
                }
                if outcome.exit {
                    return Ok(());
                }
            }
            Err(err) if err.is_fatal() => return Err(fatal(err)),
            Err(err) => writeln!(stdout, "{err}")?,
        }

        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn fatal(err: ServiceError) -> io::Error {
    io::Error::other(format!(
        "history is inconsistent with the book; stopping: {err}"
    ))
}
