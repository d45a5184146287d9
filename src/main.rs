use anyhow::Result;
use clap::CommandFactory;
use clap::error::ErrorKind;
use parroty::cli::args::{self, Args, COMMANDS};
use parroty::cli::commands::Outcome;
use parroty::utils::error::{ParrotyError, format_error};
use parroty::{Settings, cli, run};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match args::try_parse() {
        Ok(args) => args,
        Err(err) => return handle_parse_error(&err),
    };
    let verbose = args.verbose > 0;

    match run_main(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display_error(&e, verbose);
            ExitCode::FAILURE
        }
    }
}

/// Report a clap error. Help and version go to stdout with success; every
/// usage error exits 1.
fn handle_parse_error(err: &clap::Error) -> ExitCode {
    if let Err(io) = err.print() {
        eprintln!("failed to print usage: {io}");
    }
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        ErrorKind::InvalidSubcommand => {
            eprintln!("\nValid commands: {}", COMMANDS.join(", "));
            ExitCode::FAILURE
        }
        _ => ExitCode::FAILURE,
    }
}

/// Display an error with contextual formatting.
///
/// Tries to downcast to `ParrotyError` for rich formatting, falls back to
/// anyhow's error chain display for other errors.
fn display_error(error: &anyhow::Error, verbose: bool) {
    if let Some(parroty_error) = error.downcast_ref::<ParrotyError>() {
        // Keep the context line ("Failed to ...") when one was attached
        let outer = error.to_string();
        if outer != parroty_error.to_string() {
            eprintln!("{outer}");
        }
        eprintln!("{}", format_error(parroty_error, verbose));
        return;
    }

    eprintln!("error: {error}");

    let causes: Vec<_> = error.chain().skip(1).collect();
    if !causes.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in causes.iter().enumerate() {
            let prefix = if i == causes.len().saturating_sub(1) {
                "\u{2514}\u{2500}"
            } else {
                "\u{251c}\u{2500}"
            };
            eprintln!("{prefix} {cause}");
        }
    }

    if verbose {
        let backtrace = error.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:\n{backtrace}");
        }
    }
}

#[allow(clippy::print_stdout)] // stdout is the command's output channel
async fn run_main(args: Args) -> Result<()> {
    let Some(command) = args.command.clone() else {
        Args::command().print_help()?;
        println!();
        return Ok(());
    };

    parroty::init_logging(args.verbose, args.quiet);

    let config = cli::config::load(&args)?;
    let settings = Settings::from_args(&args, &config);

    match run(&command, &settings).await? {
        Outcome::Print(text) => println!("{text}"),
        Outcome::Wrote(message) => eprintln!("{message}"),
    }
    Ok(())
}
