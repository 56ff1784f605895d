// src/crawl/sink.rs
// =============================================================================
// The result sink: the one place where concurrent workers hand over their
// results.
//
// Every report() goes through a single lock, so one page's lines can never be
// interleaved with another page's - no matter whether the reporter writes to
// the console, a file or both. The sink also keeps the counters that end up
// in the crawl summary.
// =============================================================================

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use super::result::CrawlResult;
use crate::report::{ReportError, Reporter};

pub struct ResultSink {
    reporter: Mutex<Box<dyn Reporter>>,
    reported: AtomicUsize,
    failed: AtomicUsize,
    write_errors: AtomicUsize,
}

impl ResultSink {
    pub fn new(reporter: impl Reporter + 'static) -> Self {
        Self::boxed(Box::new(reporter))
    }

    pub fn boxed(reporter: Box<dyn Reporter>) -> Self {
        Self {
            reporter: Mutex::new(reporter),
            reported: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            write_errors: AtomicUsize::new(0),
        }
    }

    // Delivers one result to the reporter
    //
    // Returns whether the reporter stored it. A reporter error (or panic) is
    // logged and counted but never stops the crawl; the result still counts
    // as delivered.
    pub fn report(&self, result: CrawlResult) -> bool {
        if !result.is_ok() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let outcome = {
            let mut reporter = self.reporter.lock().unwrap_or_else(PoisonError::into_inner);
            // Caught inside the lock so a panicking reporter can't poison it
            panic::catch_unwind(AssertUnwindSafe(|| reporter.report(&result)))
                .unwrap_or(Err(ReportError::Panicked))
        };
        self.reported.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok(()) => true,
            Err(e) => {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
                warn!(url = %result.source_url, error = %e, "failed to report crawl result");
                false
            }
        }
    }

    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn write_errors(&self) -> usize {
        self.write_errors.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink")
            .field("reported", &self.reported())
            .field("failed", &self.failed())
            .field("write_errors", &self.write_errors())
            .finish_non_exhaustive()
    }
}
