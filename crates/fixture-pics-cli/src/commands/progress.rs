use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};

use fixture_pics::{ProgressObserver, ProvisionOutcome};

const BAR_WIDTH: usize = 28;

/// Draws a single-line progress bar on stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    total: AtomicU32,
    done: AtomicU32,
    failed: AtomicU32,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn redraw(&self) {
        let line = render_bar(
            self.done.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
        );
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{line}");
        let _ = stderr.flush();
    }
}

impl ProgressObserver for ConsoleProgress {
    fn started(&self, total: u32) {
        self.total.store(total, Ordering::SeqCst);
        println!("Removing current pictures : OK");
        println!("Downloading pictures : in progress");
        self.redraw();
    }

    fn advanced(&self, _index: u32, succeeded: bool) {
        self.done.fetch_add(1, Ordering::SeqCst);
        if !succeeded {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.redraw();
    }

    fn completed(&self, _outcome: &ProvisionOutcome) {
        eprintln!();
        println!("Downloading pictures : OK");
    }
}

/// ` 3/20 [====>-----------------------]  15%`, plus a failure count if any.
pub fn render_bar(done: u32, total: u32, failed: u32) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (done as usize * BAR_WIDTH) / total as usize
    };
    let percent = if total == 0 {
        100
    } else {
        done as usize * 100 / total as usize
    };

    let mut bar = "=".repeat(filled);
    if filled < BAR_WIDTH {
        bar.push('>');
        bar.push_str(&"-".repeat(BAR_WIDTH - filled - 1));
    }

    let width = total.to_string().len();
    let mut line = format!(" {done:>width$}/{total} [{bar}] {percent:>3}%");
    if failed > 0 {
        line.push_str(&format!("  ({failed} failed)"));
    }
    line
}
