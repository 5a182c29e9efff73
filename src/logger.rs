//! Terminal output: prefixed log lines and the `build` progress counter.
//!
//! Everything is written to stderr: `render` streams image bytes to stdout,
//! so the terminal chatter has to stay out of the way.
//!
//! ```ignore
//! log!("build"; "converted {} diagrams", count);
//! debug!("render"; "scratch pair at {}", dir.display());
//!
//! let progress = ProgressLine::new("bpmn", 12);
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{StderrLock, Write, stderr},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Whether a progress line currently owns the last terminal row.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Enable `debug!` output (`--verbose`).
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Print `[module] message` to stderr.
///
/// ```ignore
/// log!("build"; "no diagrams in {}", dir.display());
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let mut out = stderr().lock();
    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        clear_row(&mut out);
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module {
        "render" => tag.bright_blue().bold().to_string(),
        "build" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.bright_yellow().bold().to_string(),
        _ => tag.bright_magenta().bold().to_string(),
    }
}

fn clear_row(out: &mut StderrLock<'_>) {
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

/// In-place counter shown while diagrams convert: `[build] bpmn(4/12)`.
///
/// Worker threads call `inc`; a redraw is skipped when another thread is
/// already drawing. Log lines printed meanwhile clear the row first and
/// the next `inc` redraws it underneath.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    drawing: Mutex<()>,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let progress = Self {
            label,
            total,
            done: AtomicUsize::new(0),
            drawing: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.drawing.try_lock() {
            self.draw(false);
        }
    }

    fn line(&self) -> String {
        format!("{}({}/{})", self.label, self.done.load(Ordering::Relaxed), self.total)
    }

    fn draw(&self, newline: bool) {
        let mut out = stderr().lock();
        clear_row(&mut out);
        write!(out, "{} {}", prefix("build"), self.line()).ok();
        if newline {
            writeln!(out).ok();
        }
        out.flush().ok();
    }

    /// Leave the final count on screen.
    pub fn finish(self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        {
            let _guard = self.drawing.lock();
            self.draw(true);
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let mut out = stderr().lock();
        clear_row(&mut out);
        out.flush().ok();
    }
}
