//! How commands talk back to the user.
//!
//! Data goes to stdout as JSON lines so it can be piped into other tools; everything meant for
//! a human (progress, summaries, errors) goes to stderr with a styled prefix.

use std::io::Write;

use console::style;
use serde::Serialize;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for work in progress
pub static WORKING_PREFIX: &str = "» ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";

/// A status message for the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// Neutral information
  Info(&'a str),
  /// A request is under way
  Working(&'a str),
  /// The command finished
  Success(&'a str),
  /// The command finished with less than asked for
  Warning(&'a str),
  /// The command failed
  Error(&'a HarvesterdError),
}

/// Output channel for commands.
pub trait UserInteraction {
  /// Writes one data record.
  fn emit<T: Serialize>(&self, record: &T) -> Result<()>;

  /// Writes a status message.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// JSON lines on stdout, styled status on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

impl UserInteraction for Terminal {
  fn emit<T: Serialize>(&self, record: &T) -> Result<()> {
    let line = serde_json::to_string(record)?;
    writeln!(std::io::stdout().lock(), "{line}")?;
    Ok(())
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    let mut stderr = std::io::stderr().lock();
    match content {
      ResponseContent::Info(message) => writeln!(stderr, "{} {message}", style(INFO_PREFIX).blue())?,
      ResponseContent::Working(message) => writeln!(stderr, "{} {message}", style(WORKING_PREFIX).cyan())?,
      ResponseContent::Success(message) => writeln!(stderr, "{} {message}", style(SUCCESS_PREFIX).green())?,
      ResponseContent::Warning(message) => writeln!(stderr, "{} {message}", style(WARNING_PREFIX).yellow())?,
      ResponseContent::Error(error) => writeln!(stderr, "{} {error}", style(ERROR_PREFIX).red())?,
    }
    Ok(())
  }
}

/// Keeps everything in memory, for exercising commands without a terminal.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
  /// Emitted records, as JSON
  pub records:  std::cell::RefCell<Vec<serde_json::Value>>,
  /// Status messages, rendered without styling
  pub messages: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl UserInteraction for Recorder {
  fn emit<T: Serialize>(&self, record: &T) -> Result<()> {
    self.records.borrow_mut().push(serde_json::to_value(record)?);
    Ok(())
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    let message = match content {
      ResponseContent::Info(message)
      | ResponseContent::Working(message)
      | ResponseContent::Success(message)
      | ResponseContent::Warning(message) => message.to_owned(),
      ResponseContent::Error(error) => error.to_string(),
    };
    self.messages.borrow_mut().push(message);
    Ok(())
  }
}
