// src/report.rs
// =============================================================================
// Where crawl results end up.
//
// A Reporter knows how to format and store one CrawlResult. It does NOT have
// to worry about concurrency - the ResultSink (src/crawl/sink.rs) owns the
// reporter behind a lock and only ever calls it from one worker at a time.
//
// Reporters:
// - TextReporter: the classic console layout (start/stop times, the page,
//   then its links indented with a tab)
// - JsonLinesReporter: one JSON object per line, for piping into other tools
// - UrlFileReporter: appends "URL: <page>" blocks to a text file (urls.txt)
// - TeeReporter: sends every result to two reporters (console + file)
// =============================================================================

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::crawl::CrawlResult;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write crawl result: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize crawl result: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reporter panicked")]
    Panicked,
}

// The persistence collaborator
//
// `Send` so the sink can be shared between worker tasks.
pub trait Reporter: Send {
    fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError>;
}

// Human-readable output, one block per page
pub struct TextReporter<W> {
    out: W,
}

impl<W: Write + Send> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Reporter for TextReporter<W> {
    fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
        // Build the whole block first so it reaches the writer in one go
        let mut block = String::new();
        block.push_str(&format!("Start time of crawl of this URL: {}\n", result.start_time));
        block.push_str(&format!("Stop time of crawl of this URL: {}\n", result.end_time));
        block.push_str(&format!("{}\n", result.source_url));
        if let Some(error) = &result.error {
            block.push_str(&format!("\terror: {}\n", error));
        }
        for url in &result.discovered_urls {
            block.push_str(&format!("\t {}\n", url));
        }

        self.out.write_all(block.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

// Machine-readable output: every result is one line of JSON
pub struct JsonLinesReporter<W> {
    out: W,
}

impl<W: Write + Send> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Reporter for JsonLinesReporter<W> {
    fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        self.out.flush()?;
        Ok(())
    }
}

// Appends every page and its links to a file, keeping earlier runs
pub struct UrlFileReporter {
    out: BufWriter<File>,
}

impl UrlFileReporter {
    // Opens (or creates) the file in append mode
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

impl Reporter for UrlFileReporter {
    fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
        writeln!(self.out, "URL: {}", result.source_url)?;
        for url in &result.discovered_urls {
            writeln!(self.out, "\t {}", url)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

// Sends each result to two reporters, first `A` then `B`
//
// Both are always attempted; the first error wins.
pub struct TeeReporter<A, B> {
    first: A,
    second: B,
}

impl<A: Reporter, B: Reporter> TeeReporter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Reporter, B: Reporter> Reporter for TeeReporter<A, B> {
    fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
        let first = self.first.report(result);
        let second = self.second.report(result);
        first.and(second)
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&mut self, result: &CrawlResult) -> Result<(), ReportError> {
        (**self).report(result)
    }
}
