//! End-to-end pipeline tests against scripted stand-ins for the TeX tools.
//!
//! Each fake appends one line per invocation to a shared call log, so tests
//! can assert on how often and in which order the tools ran.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crossbeam::channel;
use notify::event::{DataChange, ModifyKind};
use notify::{Event, EventKind};
use tempfile::TempDir;

use super::batch::BatchReport;
use super::error::StageError;
use super::*;
use crate::config::BuildConfig;
use crate::notifier::WriterNotifier;
use crate::utils::normalize_path;
use crate::watch::{Debouncer, rebuild, run_event_loop};

/// `-jobname $2 -output-directory $4`; writes the expanded source as the PDF.
const TYPESETTER: &str = r#"content=$(cat)
echo "typeset $2 TEXINPUTS=$TEXINPUTS" >> '@LOG@'
case "$content" in
  *FAIL*) echo "! Undefined control sequence."; exit 1 ;;
esac
printf '%s\n' "$content" > "$4/$2.pdf"
"#;

const BIBER: &str = r#"echo "biber $1" >> '@LOG@'
"#;

const FAILING_BIBER: &str = r#"echo "biber $1" >> '@LOG@'
echo "ERROR - Cannot find 'paper.bcf'!"
exit 2
"#;

const SIGNAL: &str = r#"echo "signal $1" >> '@LOG@'
"#;

const FAILING_SIGNAL: &str = r#"echo "no process found"
exit 1
"#;

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
    log: PathBuf,
    config: BuildConfig,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        fs::create_dir_all(root.join("in")).unwrap();

        let mut fixture = Self {
            log: root.join("calls.log"),
            config: BuildConfig::new(root.join("in"), root.join("out")),
            root,
            _temp: temp,
        };

        fixture.config.tools.typesetter = fixture.script("typeset.sh", TYPESETTER);
        fixture.config.tools.bibliography = fixture.script("biber.sh", BIBER);
        fixture.config.tools.signal = fixture.script("signal.sh", SIGNAL);
        fixture
    }

    /// Write a fake tool and return its command vector.
    fn script(&self, name: &str, body: &str) -> Vec<String> {
        let path = self.root.join(name);
        fs::write(&path, body.replace("@LOG@", &self.log.display().to_string())).unwrap();
        vec!["sh".into(), path.display().to_string()]
    }

    fn source(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.config.input_root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn output(&self, relative: &str) -> PathBuf {
        self.config.output_root.join(relative)
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Scan and build with a recording notifier.
    fn build(&self) -> (BatchReport, Vec<String>) {
        let notifier = Arc::new(WriterNotifier::new(Vec::new()));
        let ctx = BuildContext::with_notifier(self.config.clone(), notifier.clone());

        let stale = collect_stale(&ctx.config).unwrap();
        let report = build_batch(stale, &ctx).unwrap();

        drop(ctx);
        (report, messages(notifier))
    }

    /// Run one file's pipeline directly.
    fn generate(&self, input: &Path) -> (Result<(), StageError>, Vec<String>) {
        let notifier = Arc::new(WriterNotifier::new(Vec::new()));
        let ctx = BuildContext::with_notifier(self.config.clone(), notifier.clone());

        let file = SourceFile::new(input, &ctx.config).unwrap();
        let result = file.generate(&ctx);

        drop(ctx);
        (result, messages(notifier))
    }
}

/// Poll until `done` holds or `timeout` passes.
fn wait_for(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

/// Debouncer dispatching into the real pipeline, as the watch command does.
fn watch_debouncer(ctx: &Arc<BuildContext>) -> Debouncer {
    let dispatch_ctx = Arc::clone(ctx);
    Debouncer::new(
        Duration::from_millis(30),
        Arc::new(move |path: PathBuf| rebuild(path, &dispatch_ctx)),
    )
}

fn write_event(path: &Path) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
        .add_path(path.to_path_buf())
}

/// Feed `events` through the watch loop until it drains.
fn run_watch(debouncer: &Debouncer, events: Vec<Event>) {
    let (event_tx, event_rx) = channel::unbounded();
    let (error_tx, error_rx) = channel::unbounded::<notify::Error>();
    for event in events {
        event_tx.send(event).unwrap();
    }
    drop(event_tx);
    drop(error_tx);
    run_event_loop(event_rx, error_rx, debouncer);
}

fn messages(notifier: Arc<WriterNotifier<Vec<u8>>>) -> Vec<String> {
    let Ok(notifier) = Arc::try_unwrap(notifier) else {
        panic!("notifier still shared");
    };
    String::from_utf8(notifier.into_inner())
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

// ============================================================================
// Batch build
// ============================================================================

#[test]
fn test_builds_standalone_files_only() {
    let fx = Fixture::new();
    fx.source("a.tex", "hello");
    fx.source("_skip.tex", "partial");

    let (report, notes) = fx.build();

    assert_eq!(report.built, 1);
    assert!(report.is_success());
    assert_eq!(fx.calls(), vec!["typeset a TEXINPUTS=:".to_string()]);
    assert_eq!(fs::read_to_string(fx.output("a.pdf")).unwrap(), "hello\n");
    assert!(!fx.output("_skip.pdf").exists());
    assert!(notes.is_empty());
}

#[test]
fn test_second_run_builds_nothing() {
    let fx = Fixture::new();
    fx.source("a.tex", "hello");
    fx.source("notes/b.tex", "world");

    let (first, _) = fx.build();
    assert_eq!(first.built, 2);

    let (second, _) = fx.build();
    assert_eq!(second.built, 0);
    assert!(second.is_success());
    assert_eq!(fx.count("typeset"), 2);
}

#[test]
fn test_failure_is_isolated() {
    let fx = Fixture::new();
    let a = fx.source("a.tex", "FAIL here");
    fx.source("b.tex", "fine");

    // The previous artifact of `a` must survive its failed rebuild.
    let old = fx.output("a.pdf");
    fs::create_dir_all(old.parent().unwrap()).unwrap();
    fs::write(&old, "old").unwrap();
    File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(3600))
        .unwrap();

    let (report, notes) = fx.build();

    assert_eq!(report.built, 1);
    assert_eq!(report.failed, vec![a]);
    assert_eq!(fs::read_to_string(&old).unwrap(), "old");
    assert_eq!(fs::read_to_string(fx.output("b.pdf")).unwrap(), "fine\n");
    assert_eq!(notes, vec!["Failed to process file.".to_string()]);
}

#[test]
fn test_jobs_cap_still_builds_everything() {
    let mut fx = Fixture::new();
    fx.config.jobs = Some(1);
    for name in ["a.tex", "b.tex", "c/d.tex"] {
        fx.source(name, "x");
    }

    let (report, _) = fx.build();
    assert_eq!(report.built, 3);
    assert!(fx.output("c/d.pdf").exists());
}

#[test]
fn test_empty_batch() {
    let fx = Fixture::new();
    let (report, _) = fx.build();
    assert_eq!(report.built, 0);
    assert!(report.failed.is_empty());
    assert!(fx.calls().is_empty());
}

// ============================================================================
// Pipeline stages
// ============================================================================

#[test]
fn test_bibliography_runs_between_two_passes() {
    let fx = Fixture::new();
    let input = fx.source("paper.tex", r"\usepackage[backend=biber]{biblatex}");

    let (result, notes) = fx.generate(&input);

    assert!(result.is_ok());
    assert!(notes.is_empty());
    assert_eq!(
        fx.calls(),
        vec![
            "typeset paper TEXINPUTS=:".to_string(),
            format!("biber {}", fx.output("paper").display()),
            "typeset paper TEXINPUTS=:".to_string(),
        ]
    );
}

#[test]
fn test_table_of_contents_runs_two_passes() {
    let fx = Fixture::new();
    let input = fx.source("book.tex", "\\tableofcontents\n");

    let (result, _) = fx.generate(&input);

    assert!(result.is_ok());
    assert_eq!(fx.count("typeset"), 2);
    assert_eq!(fx.count("biber"), 0);
}

#[test]
fn test_plain_document_single_pass() {
    let fx = Fixture::new();
    let input = fx.source("memo.tex", r"\usepackage{natbib}");

    let (result, _) = fx.generate(&input);

    assert!(result.is_ok());
    assert_eq!(fx.count("typeset"), 1);
    assert_eq!(fx.count("biber"), 0);
}

#[test]
fn test_bibliography_failure_stops_pipeline() {
    let mut fx = Fixture::new();
    fx.config.tools.bibliography = fx.script("biber.sh", FAILING_BIBER);
    let input = fx.source("paper.tex", r"\usepackage{biblatex}");

    let (result, notes) = fx.generate(&input);

    let Err(StageError::Bibliography(err)) = result else {
        panic!("expected bibliography failure");
    };
    assert!(err.output().contains("Cannot find"));
    assert_eq!(fx.count("typeset"), 1);
    assert_eq!(notes, vec!["Failed to run Biber.".to_string()]);
}

#[test]
fn test_missing_source_reports_read_failure() {
    let fx = Fixture::new();
    let input = fx.config.input_root.join("ghost.tex");

    let (result, notes) = fx.generate(&input);

    assert!(matches!(result, Err(StageError::Read { .. })));
    assert!(fx.calls().is_empty());
    assert_eq!(notes, vec!["Failed to read file.".to_string()]);
}

#[test]
fn test_include_dirs_reach_typesetter() {
    let mut fx = Fixture::new();
    fx.config.include_dirs = vec![PathBuf::from("lib"), PathBuf::from("/usr/share/tex")];
    let input = fx.source("a.tex", "x");

    let (result, _) = fx.generate(&input);

    assert!(result.is_ok());
    assert_eq!(
        fx.calls(),
        vec!["typeset a TEXINPUTS=lib:/usr/share/tex:".to_string()]
    );
}

#[test]
fn test_macros_expanded_before_typesetting() {
    let fx = Fixture::new();
    let input = fx.source("notes/week_1.tex", r"\breadcrumbs|\slashcrumbs|\outdir");

    let (result, _) = fx.generate(&input);

    assert!(result.is_ok());
    let pdf = fs::read_to_string(fx.output("notes/week_1.pdf")).unwrap();
    assert_eq!(
        pdf,
        format!(
            "notes \\textgreater\\hspace{{1pt}} week 1|notes/week 1|{}\n",
            fx.output("notes").display()
        )
    );
}

// ============================================================================
// Reader reload
// ============================================================================

#[test]
fn test_reload_signals_reader_after_success() {
    let mut fx = Fixture::new();
    fx.config.reload = true;
    let input = fx.source("a.tex", "x");

    let (result, _) = fx.generate(&input);

    assert!(result.is_ok());
    assert_eq!(
        fx.calls(),
        vec!["typeset a TEXINPUTS=:".to_string(), "signal mupdf".to_string()]
    );
}

#[test]
fn test_reload_skipped_after_failure() {
    let mut fx = Fixture::new();
    fx.config.reload = true;
    let input = fx.source("a.tex", "FAIL");

    let (result, _) = fx.generate(&input);

    assert!(matches!(result, Err(StageError::Typeset(_))));
    assert_eq!(fx.count("signal"), 0);
}

#[test]
fn test_reload_failure_keeps_build_successful() {
    let mut fx = Fixture::new();
    fx.config.reload = true;
    fx.config.tools.signal = fx.script("signal.sh", FAILING_SIGNAL);
    let input = fx.source("a.tex", "x");

    let (result, notes) = fx.generate(&input);

    assert!(result.is_ok());
    assert!(fx.output("a.pdf").exists());
    assert_eq!(notes, vec!["Failed to reload mupdf.".to_string()]);
}

#[test]
fn test_lock_table_empty_after_batch() {
    let fx = Fixture::new();
    fx.source("a.tex", "x");
    fx.source("b.tex", "FAIL");

    let ctx = BuildContext::new(fx.config.clone());
    let report = build_batch(collect_stale(&ctx.config).unwrap(), &ctx).unwrap();

    assert_eq!(report.built, 1);
    assert_eq!(ctx.locks.len(), 0);
}

// ============================================================================
// Watch dispatch
// ============================================================================

#[test]
fn test_save_burst_runs_pipeline_once() {
    let fx = Fixture::new();
    let input = fx.source("a.tex", "x");
    let ctx = Arc::new(BuildContext::new(fx.config.clone()));
    let debouncer = watch_debouncer(&ctx);

    run_watch(&debouncer, (0..5).map(|_| write_event(&input)).collect());

    assert!(wait_for(Duration::from_secs(5), || fx.output("a.pdf").exists()));
    assert!(wait_for(Duration::from_secs(2), || debouncer.pending() == 0));
    thread::sleep(Duration::from_millis(200));
    assert_eq!(fx.calls(), vec!["typeset a TEXINPUTS=:".to_string()]);
}

#[test]
fn test_path_outside_input_root_ignored() {
    let fx = Fixture::new();
    let stray = fx.root.join("elsewhere/b.tex");
    fs::create_dir_all(stray.parent().unwrap()).unwrap();
    fs::write(&stray, "x").unwrap();
    let ctx = Arc::new(BuildContext::new(fx.config.clone()));
    let debouncer = watch_debouncer(&ctx);

    run_watch(&debouncer, vec![write_event(&stray)]);

    assert!(wait_for(Duration::from_secs(2), || debouncer.pending() == 0));
    thread::sleep(Duration::from_millis(200));
    assert!(fx.calls().is_empty());
    assert!(!fx.output("b.pdf").exists());
}

#[test]
fn test_watch_run_waits_for_running_build() {
    let fx = Fixture::new();
    let input = fx.source("a.tex", "x");
    let ctx = Arc::new(BuildContext::new(fx.config.clone()));
    let debouncer = watch_debouncer(&ctx);

    // Stand in for a batch build of the same file that is still running.
    let lock = ctx.locks.for_path(&input);
    let guard = lock.lock();

    debouncer.trigger(input.clone());
    assert!(wait_for(Duration::from_secs(2), || debouncer.pending() == 0));
    thread::sleep(Duration::from_millis(150));
    assert_eq!(fx.count("typeset"), 0);

    drop(guard);
    assert!(wait_for(Duration::from_secs(5), || fx.count("typeset") == 1));
    ctx.locks.release(&input, lock);
}
