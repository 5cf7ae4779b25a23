//! Progress sinks
//!
//! Output side of a wait. The watcher writes liveness markers, plain lines
//! and raw response dumps here; where they end up is up to the sink.

use serde_json::Value;
use std::io::{self, Stderr, Stdout, Write};

/// Destination for the watcher's operator-facing output
pub trait ProgressSink: Send {
    /// Writes one progress marker without a line break
    fn write_progress(&mut self, marker: char);

    /// Writes a full line
    fn write_line(&mut self, line: &str);

    /// Writes a structured dump of a status response
    fn write_verbose(&mut self, response: &Value);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn write_progress(&mut self, _marker: char) {}

    fn write_line(&mut self, _line: &str) {}

    fn write_verbose(&mut self, _response: &Value) {}
}

/// Sink writing progress and lines to one stream and dumps to another
///
/// Write errors are ignored: a closed terminal must not fail the copy job.
pub struct ConsoleSink<O, E> {
    out: O,
    err: E,
}

impl ConsoleSink<Stdout, Stderr> {
    /// Progress on stdout, dumps on stderr
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write + Send, E: Write + Send> ProgressSink for ConsoleSink<O, E> {
    fn write_progress(&mut self, marker: char) {
        let _ = write!(self.out, "{}", marker);
        // Markers carry no newline, so push them out right away
        let _ = self.out.flush();
    }

    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
    }

    fn write_verbose(&mut self, response: &Value) {
        let rendered =
            serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
        let _ = writeln!(self.err, "{}", rendered);
    }
}

/// One call made on a `RecordingSink`
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Progress(char),
    Line(String),
    Verbose(Value),
}

/// Sink that remembers every call, in order
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, SinkEvent::Progress(_)))
            .count()
    }

    pub fn line_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, SinkEvent::Line(_)))
            .count()
    }

    pub fn verbose_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, SinkEvent::Verbose(_)))
            .count()
    }

    /// What a terminal would show for the progress and line output
    pub fn rendered(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            match event {
                SinkEvent::Progress(marker) => out.push(*marker),
                SinkEvent::Line(line) => {
                    out.push_str(line);
                    out.push('\n');
                }
                SinkEvent::Verbose(_) => {}
            }
        }
        out
    }
}

impl ProgressSink for RecordingSink {
    fn write_progress(&mut self, marker: char) {
        self.events.push(SinkEvent::Progress(marker));
    }

    fn write_line(&mut self, line: &str) {
        self.events.push(SinkEvent::Line(line.to_string()));
    }

    fn write_verbose(&mut self, response: &Value) {
        self.events.push(SinkEvent::Verbose(response.clone()));
    }
}
