// SPDX-License-Identifier: Apache-2.0

//! Human-facing diagnostics, dispatched to any number of handlers.
//!
//! Storage internals log through the [`log`] facade directly. A [`Logger`] is for
//! applications that want leveled messages written to a stream, forwarded to the
//! facade, or both. There's no global logger; create one and pass it around.

use std::fmt;
use std::io;

/// The severity of a [`LogMessage`], ordered from least to most severe.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum LogLevel {
	/// Anything that may be of interest.
	#[default]
	Debug,
	/// State changes.
	Info,
	/// Non-critical errors.
	Warning,
	/// Critical errors.
	Error,
}

impl LogLevel {
	/// Returns the uppercase label written before messages at this level.
	pub const fn label(self) -> &'static str {
		match self {
			Self::Debug   => "DEBUG",
			Self::Info    => "INFO",
			Self::Warning => "WARNING",
			Self::Error   => "ERROR",
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl From<LogLevel> for log::Level {
	fn from(value: LogLevel) -> Self {
		match value {
			LogLevel::Debug   => Self::Debug,
			LogLevel::Info    => Self::Info,
			LogLevel::Warning => Self::Warn,
			LogLevel::Error   => Self::Error,
		}
	}
}

/// A leveled log message. Text can be appended with [`write!`], since messages
/// implement [`fmt::Write`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogMessage {
	level: LogLevel,
	text: String,
}

impl LogMessage {
	/// Creates a message at `level` with initial `text`.
	pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
		Self { level, text: text.into() }
	}

	/// Returns the message level.
	pub fn level(&self) -> LogLevel { self.level }
	/// Returns the message text.
	pub fn message(&self) -> &str { &self.text }
}

impl fmt::Write for LogMessage {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		self.text.push_str(s);
		Ok(())
	}
}

impl fmt::Display for LogMessage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.level, self.text)
	}
}

/// Receives messages dispatched by a [`Logger`].
pub trait LogHandler {
	/// Handles one message. Handlers must not panic or fail the caller.
	fn handle(&mut self, message: &LogMessage);
}

impl<F: FnMut(&LogMessage)> LogHandler for F {
	fn handle(&mut self, message: &LogMessage) { self(message) }
}

/// Writes messages at or above a minimum level to a stream, one per line, as
/// `LEVEL: message`.
pub struct StreamHandler<W: io::Write> {
	stream: W,
	level: LogLevel,
}

impl<W: io::Write> StreamHandler<W> {
	/// Creates a handler writing messages at `level` or above to `stream`.
	pub fn new(stream: W, level: LogLevel) -> Self {
		Self { stream, level }
	}

	/// Returns the minimum level written.
	pub fn level(&self) -> LogLevel { self.level }
	/// Returns a reference to the stream.
	pub fn get_ref(&self) -> &W { &self.stream }
	/// Consumes the handler, returning the stream.
	pub fn into_inner(self) -> W { self.stream }
}

impl<W: io::Write> LogHandler for StreamHandler<W> {
	fn handle(&mut self, message: &LogMessage) {
		if message.level < self.level {
			return
		}

		// A failed write is dropped; logging never fails the caller.
		let _ = writeln!(self.stream, "{message}");
	}
}

/// Forwards messages to the [`log`] facade, with the `sigbuf` target.
#[derive(Copy, Clone, Debug, Default)]
pub struct FacadeHandler;

impl LogHandler for FacadeHandler {
	fn handle(&mut self, message: &LogMessage) {
		log::log!(target: "sigbuf", log::Level::from(message.level), "{}", message.text);
	}
}

/// Dispatches messages to every registered handler, in registration order.
#[derive(Default)]
pub struct Logger {
	handlers: Vec<Box<dyn LogHandler>>,
}

impl Logger {
	/// Creates a logger with no handlers.
	pub fn new() -> Self { Self::default() }

	/// Creates a logger forwarding to the [`log`] facade.
	pub fn facade() -> Self {
		let mut logger = Self::new();
		logger.add_handler(FacadeHandler);
		logger
	}

	/// Registers a handler. The logger owns it from then on.
	pub fn add_handler(&mut self, handler: impl LogHandler + 'static) {
		self.handlers.push(Box::new(handler));
	}

	/// Returns the number of registered handlers.
	pub fn handler_count(&self) -> usize { self.handlers.len() }

	/// Dispatches `message` to all handlers.
	pub fn log(&mut self, message: &LogMessage) {
		for handler in &mut self.handlers {
			handler.handle(message);
		}
	}

	pub fn debug  (&mut self, text: impl Into<String>) { self.log_text(LogLevel::Debug,   text) }
	pub fn info   (&mut self, text: impl Into<String>) { self.log_text(LogLevel::Info,    text) }
	pub fn warning(&mut self, text: impl Into<String>) { self.log_text(LogLevel::Warning, text) }
	pub fn error  (&mut self, text: impl Into<String>) { self.log_text(LogLevel::Error,   text) }

	fn log_text(&mut self, level: LogLevel, text: impl Into<String>) {
		self.log(&LogMessage::new(level, text))
	}
}

impl fmt::Debug for Logger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Logger")
		 .field("handlers", &self.handlers.len())
		 .finish()
	}
}

#[cfg(test)]
mod test {
	use super::{LogLevel, LogMessage};

	#[test]
	fn level_order() {
		assert!(LogLevel::Debug < LogLevel::Info);
		assert!(LogLevel::Info < LogLevel::Warning);
		assert!(LogLevel::Warning < LogLevel::Error);
	}

	#[test]
	fn display() {
		let msg = LogMessage::new(LogLevel::Warning, "low on space");
		assert_eq!(msg.to_string(), "WARNING: low on space");
	}
}
