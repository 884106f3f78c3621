//! FILENAME: script-engine/src/logger.rs
//! PURPOSE: The interactive sink/source the REPL and debugger read from and
//! write to (spec §6.1) — distinct from the `log` facade used for
//! operator-facing diagnostics elsewhere in this crate.

use std::cell::RefCell;
use std::collections::VecDeque;

pub trait Logger {
    fn write_line(&self, line: &str);
    fn read_line(&self) -> Option<String>;
}

/// Captures everything written and serves canned input — what the test
/// suite uses to drive the debugger without a real terminal.
#[derive(Default)]
pub struct BufferedLogger {
    output: RefCell<Vec<String>>,
    input: RefCell<VecDeque<String>>,
}

impl BufferedLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            output: RefCell::new(Vec::new()),
            input: RefCell::new(lines.into_iter().collect()),
        }
    }

    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn push_input(&self, line: impl Into<String>) {
        self.input.borrow_mut().push_back(line.into());
    }
}

impl Logger for BufferedLogger {
    fn write_line(&self, line: &str) {
        self.output.borrow_mut().push(line.to_string());
    }

    fn read_line(&self) -> Option<String> {
        self.input.borrow_mut().pop_front()
    }
}

/// Writes to the process's real stdout/stdin.
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }

    fn read_line(&self) -> Option<String> {
        let mut buf = String::new();
        match std::io::stdin().read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => Some(buf.trim_end_matches(['\n', '\r']).to_string()),
            Err(_) => None,
        }
    }
}

/// Discards everything — used when a caller evaluates a script with
/// debugging disabled and has no interactive surface at all.
pub struct NullLogger;

impl Logger for NullLogger {
    fn write_line(&self, _line: &str) {}
    fn read_line(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_logger_records_output() {
        let logger = BufferedLogger::new();
        logger.write_line("hello");
        logger.write_line("world");
        assert_eq!(logger.output(), vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn buffered_logger_replays_input() {
        let logger = BufferedLogger::with_input(["step".to_string(), "continue".to_string()]);
        assert_eq!(logger.read_line(), Some("step".to_string()));
        assert_eq!(logger.read_line(), Some("continue".to_string()));
        assert_eq!(logger.read_line(), None);
    }
}
