//! Log sink boundary.
//!
//! The core never owns a logger: callers inject a single-argument
//! message sink (a UI text widget, a buffer in tests) and `None`
//! falls back to stdout. Messages are plain operator-readable prose,
//! without levels or codes.

/// Callback type for progress reporting.
pub type LogSink<'a> = Option<&'a dyn Fn(&str)>;

/// Send one message to the sink, or stdout when no sink is set.
pub fn emit(sink: LogSink<'_>, message: &str) {
    match sink {
        Some(f) => f(message),
        None => println!("{message}"),
    }
}

/// Outcome of one per-item operation inside a stage.
///
/// Stages distinguish "nothing to do" from "something broke": a
/// skipped item is normal control flow, a failed item is logged and
/// counted but does not abort the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Done,
    Skipped(String),
    Failed(String),
}
