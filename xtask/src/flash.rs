use anyhow::{Context, Result};
use build_stamp::{inject_file, preview_file, InjectReport, Timestamp};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config;
use crate::plan::{self, Action, BoardColor, Plan, Step};
use crate::preflight;
use crate::runner::StepRunner;

#[derive(Debug, Clone)]
pub struct Options {
    pub color: BoardColor,
    pub action: Action,
    pub make_dir: PathBuf,
    /// Report what would change and which commands would run, without doing either.
    pub dry_run: bool,
    /// Leave main.c alone even for actions that normally stamp it.
    pub no_stamp: bool,
}

pub fn run(opts: &Options, runner: &mut impl StepRunner, now: Timestamp) -> Result<()> {
    let dir = preflight::ensure_make_dir(&opts.make_dir)?;
    preflight::require_files(&dir)?;
    preflight::note_optional_files(&dir);

    let plan = plan::plan(opts.color, opts.action);

    if plan.stamp && !opts.no_stamp {
        stamp(&dir, now, opts.dry_run)?;
    }

    execute(&plan, &dir, runner, opts.dry_run)
}

fn stamp(dir: &Path, now: Timestamp, dry_run: bool) -> Result<()> {
    let target = dir.join(config::STAMP_TARGET);

    println!();
    println!(
        "{}",
        format!("🕒 Setting build time to {now}").cyan().bold()
    );

    // Any failure here aborts before make can see a half-written file.
    let result = if dry_run {
        preview_file(&target, now)
    } else {
        inject_file(&target, now)
    };
    let report = result.context("Failed to set the build time")?;

    print_report(&report, dry_run);
    Ok(())
}

fn print_report(report: &InjectReport, dry_run: bool) {
    let verb = if dry_run { "would set" } else { "set" };
    for rewrite in report.rewrites() {
        println!(
            "\t{}",
            format!(
                "--line {}: {verb} {} = {}",
                rewrite.line, rewrite.field, rewrite.value
            )
            .dimmed()
        );
    }

    let missing = report.missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
        println!(
            "\t{}",
            format!("--Note: no line found for {}", names.join(", ")).yellow()
        );
    }
}

fn execute(plan: &Plan, dir: &Path, runner: &mut impl StepRunner, dry_run: bool) -> Result<()> {
    println!();
    println!();
    println!("{}", format!("🔨 {}", plan.headline).cyan().bold());
    println!();

    let total_start = Instant::now();

    for step in &plan.steps {
        if dry_run {
            println!("   {}", format!("would run: {step}").dimmed());
            continue;
        }

        let start = Instant::now();
        let outcome = runner.run(step, dir);
        let ok = match outcome {
            Ok(ok) => ok,
            Err(e) => {
                report_failure(step);
                return Err(e);
            }
        };

        if ok {
            tracing::debug!(%step, secs = start.elapsed().as_secs_f64(), "step succeeded");
        } else if step.tolerate_failure {
            tracing::debug!(%step, "non-zero exit ignored");
        } else {
            report_failure(step);
            anyhow::bail!("'{step}' failed");
        }
    }

    if dry_run {
        println!();
        println!("{}", "Dry run: nothing was executed.".yellow());
        return Ok(());
    }

    if let Some(message) = plan.success {
        println!();
        println!();
        println!("{}", message.green().bold());
        println!(
            "   {}",
            format!("Finished in {:.2}s", total_start.elapsed().as_secs_f64()).dimmed()
        );
    }
    println!();

    Ok(())
}

fn failure_message(step: &Step) -> String {
    format!("Something went wrong -- see `{}` output above.", step.label)
}

fn report_failure(step: &Step) {
    eprintln!();
    eprintln!();
    eprintln!("{}", failure_message(step).red().bold());
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    const MAIN_C: &str = "\
    if (date_time.reg == 0) {
        date_time.unit.year = 3;
        date_time.unit.month = 1;
        date_time.unit.day = 1;
        date_time.unit.hour = 0;
        date_time.unit.minute = 0;
    }
";

    /// Records every step and answers from a script (default: success).
    #[derive(Default)]
    struct FakeRunner {
        ran: Vec<String>,
        dirs: Vec<PathBuf>,
        answers: VecDeque<Result<bool>>,
    }

    impl FakeRunner {
        fn answering(answers: Vec<Result<bool>>) -> Self {
            Self {
                answers: answers.into(),
                ..Self::default()
            }
        }
    }

    impl StepRunner for FakeRunner {
        fn run(&mut self, step: &Step, dir: &Path) -> Result<bool> {
            self.ran.push(step.to_string());
            self.dirs.push(dir.to_path_buf());
            self.answers.pop_front().unwrap_or(Ok(true))
        }
    }

    struct Tree {
        _tmp: TempDir,
        make: PathBuf,
        main_c: PathBuf,
    }

    fn tree() -> Tree {
        let tmp = TempDir::new().unwrap();
        let make = tmp.path().join("movement").join("make");
        let hw = tmp.path().join("watch-library").join("hardware");
        fs::create_dir_all(&make).unwrap();
        fs::create_dir_all(&hw).unwrap();
        fs::write(make.join("Makefile"), "all:\n").unwrap();
        let main_c = hw.join("main.c");
        fs::write(&main_c, MAIN_C).unwrap();
        Tree {
            _tmp: tmp,
            make,
            main_c,
        }
    }

    fn opts(tree: &Tree, action: Action) -> Options {
        Options {
            color: BoardColor::Red,
            action,
            make_dir: tree.make.clone(),
            dry_run: false,
            no_stamp: false,
        }
    }

    fn build_time() -> Timestamp {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        Timestamp::from_datetime(&dt)
    }

    fn stamped(tree: &Tree) -> bool {
        fs::read_to_string(&tree.main_c)
            .unwrap()
            .contains("        date_time.unit.year = 4;\n")
    }

    #[test]
    fn build_stamps_then_runs_make_in_make_dir() {
        let t = tree();
        let mut runner = FakeRunner::default();
        run(&opts(&t, Action::Build), &mut runner, build_time()).unwrap();

        assert_eq!(runner.ran, ["make COLOR=RED"]);
        assert_eq!(runner.dirs, [t.make.canonicalize().unwrap()]);
        assert!(stamped(&t));
        let src = fs::read_to_string(&t.main_c).unwrap();
        assert!(src.contains("        date_time.unit.minute = 7;\n"));
        assert!(src.contains("if (date_time.reg == 0) {\n"));
    }

    #[test]
    fn install_stops_when_build_fails() {
        let t = tree();
        let mut runner = FakeRunner::answering(vec![Ok(false)]);
        let err = run(&opts(&t, Action::Install), &mut runner, build_time()).unwrap_err();

        assert_eq!(runner.ran, ["make COLOR=RED"]);
        assert!(err.to_string().contains("make COLOR=RED"));
    }

    #[test]
    fn failed_install_step_points_at_make_install() {
        let p = plan::plan(BoardColor::Red, Action::Install);
        assert_eq!(
            failure_message(&p.steps[0]),
            "Something went wrong -- see `make` output above."
        );
        assert_eq!(
            failure_message(&p.steps[1]),
            "Something went wrong -- see `make install` output above."
        );

        let t = tree();
        let mut runner = FakeRunner::answering(vec![Ok(true), Ok(false)]);
        let err = run(&opts(&t, Action::Install), &mut runner, build_time()).unwrap_err();
        assert_eq!(runner.ran.len(), 2);
        assert!(err.to_string().contains("make install COLOR=RED"));
    }

    #[test]
    fn install_runs_both_steps() {
        let t = tree();
        let mut runner = FakeRunner::default();
        run(&opts(&t, Action::Install), &mut runner, build_time()).unwrap();
        assert_eq!(runner.ran, ["make COLOR=RED", "make install COLOR=RED"]);
    }

    #[test]
    fn emulate_ignores_server_exit_status() {
        let t = tree();
        let mut runner = FakeRunner::answering(vec![Ok(true), Ok(false)]);
        run(&opts(&t, Action::Emulate), &mut runner, build_time()).unwrap();
        assert_eq!(runner.ran.len(), 2);
    }

    #[test]
    fn emulate_skips_server_when_emmake_fails() {
        let t = tree();
        let mut runner = FakeRunner::answering(vec![Ok(false)]);
        assert!(run(&opts(&t, Action::Emulate), &mut runner, build_time()).is_err());
        assert_eq!(runner.ran, ["emmake make COLOR=RED"]);
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let t = tree();
        let mut runner = FakeRunner::answering(vec![Err(anyhow::anyhow!("no such program"))]);
        let err = run(&opts(&t, Action::Build), &mut runner, build_time()).unwrap_err();
        assert!(err.to_string().contains("no such program"));
    }

    #[test]
    fn clean_leaves_main_c_alone() {
        let t = tree();
        let mut runner = FakeRunner::default();
        run(&opts(&t, Action::Clean), &mut runner, build_time()).unwrap();
        assert_eq!(runner.ran, ["make clean COLOR=RED"]);
        assert_eq!(fs::read_to_string(&t.main_c).unwrap(), MAIN_C);
    }

    #[test]
    fn missing_makefile_runs_nothing() {
        let t = tree();
        fs::remove_file(t.make.join("Makefile")).unwrap();
        let mut runner = FakeRunner::default();
        let err = run(&opts(&t, Action::Build), &mut runner, build_time()).unwrap_err();

        assert!(err.to_string().contains("Makefile"));
        assert!(runner.ran.is_empty());
        assert_eq!(fs::read_to_string(&t.main_c).unwrap(), MAIN_C);
    }

    #[test]
    fn unreadable_main_c_aborts_before_make() {
        let t = tree();
        fs::write(&t.main_c, [0xff_u8, 0xfe]).unwrap();
        let mut runner = FakeRunner::default();
        let err = run(&opts(&t, Action::Build), &mut runner, build_time()).unwrap_err();

        assert!(format!("{err:#}").contains("Failed to read"));
        assert!(runner.ran.is_empty());
    }

    #[test]
    #[allow(clippy::permissions_set_readonly_false)]
    fn read_only_main_c_aborts_before_make() {
        let t = tree();
        let mut perms = fs::metadata(&t.main_c).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&t.main_c, perms.clone()).unwrap();

        // Privileged users (root in CI containers) can write anyway.
        if fs::OpenOptions::new().write(true).open(&t.main_c).is_ok() {
            return;
        }

        let mut runner = FakeRunner::default();
        let err = run(&opts(&t, Action::Install), &mut runner, build_time()).unwrap_err();

        assert!(format!("{err:#}").contains("Failed to write"));
        assert!(runner.ran.is_empty());
        assert_eq!(fs::read_to_string(&t.main_c).unwrap(), MAIN_C);

        perms.set_readonly(false);
        fs::set_permissions(&t.main_c, perms).unwrap();
    }

    #[test]
    fn wrong_directory_runs_nothing() {
        let t = tree();
        let mut o = opts(&t, Action::Build);
        o.make_dir = t.make.parent().unwrap().to_path_buf();
        let mut runner = FakeRunner::default();
        assert!(run(&o, &mut runner, build_time()).is_err());
        assert!(runner.ran.is_empty());
    }

    #[test]
    fn dry_run_changes_nothing() {
        let t = tree();
        let mut o = opts(&t, Action::Install);
        o.dry_run = true;
        let mut runner = FakeRunner::default();
        run(&o, &mut runner, build_time()).unwrap();

        assert!(runner.ran.is_empty());
        assert_eq!(fs::read_to_string(&t.main_c).unwrap(), MAIN_C);
    }

    #[test]
    fn no_stamp_still_builds() {
        let t = tree();
        let mut o = opts(&t, Action::Build);
        o.no_stamp = true;
        let mut runner = FakeRunner::default();
        run(&o, &mut runner, build_time()).unwrap();

        assert_eq!(runner.ran, ["make COLOR=RED"]);
        assert!(!stamped(&t));
    }
}
