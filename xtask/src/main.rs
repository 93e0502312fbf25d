// Tooling crate: no public API to document.
#![allow(missing_docs)]

mod config;
mod flash;
mod plan;
mod preflight;
mod runner;

use anyhow::Result;
use build_stamp::Timestamp;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::plan::{Action, BoardColor};
use crate::runner::SystemRunner;

#[derive(Debug, Parser)]
#[command(name = "watch-flash")]
#[command(about = "Build the Sensor-Watch firmware for a board color while setting local time")]
#[command(
    long_about = "Build the Sensor-Watch firmware for a board color while setting local time.\n\n\
    Before compiling, the default clock in watch-library/hardware/main.c is rewritten \
    with the current local date and time. Must be run from within movement/make."
)]
#[command(version)]
struct Cli {
    /// Board color (case-insensitive)
    #[arg(value_name = "RED|GREEN|BLUE")]
    color: Option<String>,

    /// What to do after the build; a plain build when omitted
    #[arg(value_name = "install|emulate|clean")]
    action: Option<String>,

    /// The movement/make directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    make_dir: Option<PathBuf>,

    /// Show the stamp and the commands without changing or running anything
    #[arg(long)]
    dry_run: bool,

    /// Do not rewrite the build time in main.c
    #[arg(long)]
    no_stamp: bool,

    /// Debug-level logging on stderr (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Board color and action, or `None` when no color was given.
    fn selection(&self) -> Result<Option<(BoardColor, Action)>, String> {
        let Some(color) = &self.color else {
            return Ok(None);
        };
        let color = color.parse::<BoardColor>()?;
        let action = match &self.action {
            Some(word) => word.parse::<Action>()?,
            None => Action::default(),
        };
        Ok(Some((color, action)))
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", error_line(&e).red().bold());
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    let (color, action) = match cli.selection() {
        Ok(Some(selection)) => selection,
        // No color given: show usage, like -h.
        Ok(None) => {
            Cli::command().print_help()?;
            println!();
            return Ok(ExitCode::SUCCESS);
        }
        Err(message) => {
            eprintln!("{}", format!("Error: {message}").red().bold());
            eprintln!();
            Cli::command().print_help()?;
            println!();
            return Ok(ExitCode::FAILURE);
        }
    };

    init_tracing(cli.verbose);

    let make_dir = match cli.make_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let opts = flash::Options {
        color,
        action,
        make_dir,
        dry_run: cli.dry_run,
        no_stamp: cli.no_stamp,
    };

    flash::run(&opts, &mut SystemRunner, Timestamp::now())?;
    Ok(ExitCode::SUCCESS)
}

/// Full context chain on one line, e.g. `Error: Failed to set the build time: Failed to read '…'`.
fn error_line(e: &anyhow::Error) -> String {
    format!("Error: {e:#}")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("watch-flash").chain(args.iter().copied()))
    }

    fn select(args: &[&str]) -> Result<Option<(BoardColor, Action)>, String> {
        parse(args).unwrap().selection()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn color_is_case_insensitive() {
        assert_eq!(select(&["red"]), Ok(Some((BoardColor::Red, Action::Build))));
        assert_eq!(select(&["Green"]), Ok(Some((BoardColor::Green, Action::Build))));
        assert_eq!(select(&["BLUE"]), Ok(Some((BoardColor::Blue, Action::Build))));
    }

    #[test]
    fn unknown_color_names_the_allowed_colors() {
        assert_eq!(
            select(&["purple"]),
            Err("first argument must be RED, GREEN, or BLUE.".to_string())
        );
        // The color is checked before the action.
        assert_eq!(
            select(&["purple", "foo"]),
            Err("first argument must be RED, GREEN, or BLUE.".to_string())
        );
    }

    #[test]
    fn actions_parse() {
        assert_eq!(select(&["RED", "install"]), Ok(Some((BoardColor::Red, Action::Install))));
        assert_eq!(select(&["RED", "emulate"]), Ok(Some((BoardColor::Red, Action::Emulate))));
        assert_eq!(select(&["RED", "clean"]), Ok(Some((BoardColor::Red, Action::Clean))));
    }

    #[test]
    fn unknown_action_is_quoted_back() {
        assert_eq!(
            select(&["RED", "foo"]),
            Err("Unrecognized option 'foo'.".to_string())
        );
        assert_eq!(
            select(&["RED", "build"]),
            Err("Unrecognized option 'build'.".to_string())
        );
    }

    #[test]
    fn no_arguments_means_usage() {
        assert_eq!(select(&[]), Ok(None));
    }

    #[test]
    fn help_flag_is_not_an_error_exit() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn usage_names_the_colors_and_actions() {
        let usage = Cli::command().render_usage().to_string();
        assert!(usage.contains("RED|GREEN|BLUE"), "{usage}");
        assert!(usage.contains("install|emulate|clean"), "{usage}");
    }

    #[test]
    fn options_parse() {
        let cli = parse(&["red", "--dry-run", "--no-stamp", "--make-dir", "/tmp/make", "-v"]).unwrap();
        assert!(cli.dry_run && cli.no_stamp && cli.verbose);
        assert_eq!(cli.make_dir, Some(PathBuf::from("/tmp/make")));
    }

    #[test]
    fn error_line_carries_the_whole_chain() {
        let err = anyhow::anyhow!("Failed to read 'main.c'").context("Failed to set the build time");
        assert_eq!(
            error_line(&err),
            "Error: Failed to set the build time: Failed to read 'main.c'"
        );
    }
}
