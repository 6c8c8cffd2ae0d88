//! Command Processor
//!
//! Maps a command string to its response. This is the only place that
//! knows what the commands mean; the UDP and TCP handlers only move bytes.
//!
//! ## Supported Commands
//!
//! - `date` - Current local date, `YYYY-MM-DD`
//! - `time` - Current local time with offset, `HH:MM:SS+hh:mm`
//! - `datetime` - Current local date and time in RFC 3339
//!
//! Anything else is answered with `Error: unknown command`.
//!
//! A zero UTC offset is written as `Z` in both `time` and `datetime`, so the
//! `time` body is always the part of the `datetime` body after the `T`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandProcessor                        │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   parse()   │───>│   now()     │───>│  format()   │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                          Clock                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::clock::{Clock, SystemClock};
use crate::protocol::{Command, Response};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fmt;
use std::sync::Arc;

/// Turns commands into responses using an injected clock.
///
/// Cloning is cheap: clones share the same clock.
#[derive(Clone)]
pub struct CommandProcessor {
    clock: Arc<dyn Clock>,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandProcessor").finish_non_exhaustive()
    }
}

impl CommandProcessor {
    /// Creates a processor backed by the local system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates a processor backed by the given clock.
    pub fn with_clock(clock: impl Clock) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// Processes a command and returns the response.
    ///
    /// The command must already be stripped of its line terminator.
    /// Every input produces a response; unknown input is not an error.
    ///
    /// # Example
    ///
    /// ```
    /// use timeserver::commands::CommandProcessor;
    ///
    /// let processor = CommandProcessor::new();
    /// assert_eq!(processor.process("nope").as_str(), "Error: unknown command\n");
    /// assert!(processor.process("date").as_str().ends_with('\n'));
    /// ```
    pub fn process(&self, command: &str) -> Response {
        self.execute(Command::parse(command))
    }

    /// Executes an already parsed command.
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Date => Response::new(format_date(&self.clock.now())),
            Command::Time => Response::new(format_time(&self.clock.now())),
            Command::DateTime => Response::new(format_datetime(&self.clock.now())),
            Command::Unknown => Response::unknown_command(),
        }
    }
}

/// Processes a command against the local system clock.
pub fn process(command: &str) -> Response {
    CommandProcessor::new().process(command)
}

// ============================================================================
// Formatting
// ============================================================================

fn format_date(now: &DateTime<FixedOffset>) -> String {
    now.format("%Y-%m-%d").to_string()
}

fn format_time(now: &DateTime<FixedOffset>) -> String {
    if now.offset().local_minus_utc() == 0 {
        now.format("%H:%M:%SZ").to_string()
    } else {
        now.format("%H:%M:%S%:z").to_string()
    }
}

fn format_datetime(now: &DateTime<FixedOffset>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::clock::FixedClock;
    use chrono::TimeZone;

    fn create_processor(offset_secs: i32) -> CommandProcessor {
        let instant = FixedOffset::east_opt(offset_secs)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 15, 4, 5)
            .unwrap();
        CommandProcessor::with_clock(FixedClock::new(instant))
    }

    #[test]
    fn test_date() {
        let processor = create_processor(2 * 3600);
        assert_eq!(processor.process("date").as_str(), "2024-03-09\n");
    }

    #[test]
    fn test_time_positive_offset() {
        let processor = create_processor(2 * 3600);
        assert_eq!(processor.process("time").as_str(), "15:04:05+02:00\n");
    }

    #[test]
    fn test_time_negative_offset() {
        let processor = create_processor(-(5 * 3600 + 30 * 60));
        assert_eq!(processor.process("time").as_str(), "15:04:05-05:30\n");
    }

    #[test]
    fn test_time_utc_uses_zulu() {
        let processor = create_processor(0);
        assert_eq!(processor.process("time").as_str(), "15:04:05Z\n");
    }

    #[test]
    fn test_datetime() {
        let processor = create_processor(2 * 3600);
        assert_eq!(
            processor.process("datetime").as_str(),
            "2024-03-09T15:04:05+02:00\n"
        );

        let processor = create_processor(0);
        assert_eq!(processor.process("datetime").as_str(), "2024-03-09T15:04:05Z\n");
    }

    #[test]
    fn test_time_is_datetime_suffix() {
        for offset in [0, 3600, -7200, 19800] {
            let processor = create_processor(offset);
            let datetime = processor.process("datetime");
            let time = processor.process("time");

            let (_, suffix) = datetime.body().split_once('T').unwrap();
            assert_eq!(suffix, time.body());
        }
    }

    #[test]
    fn test_unknown_commands() {
        let processor = create_processor(0);

        for input in ["", "bogus", "DATE", "Time", " date", "date ", "date\r", "date\n", "now"] {
            assert_eq!(
                processor.process(input).as_str(),
                "Error: unknown command\n",
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_idempotent_with_fixed_clock() {
        let processor = create_processor(3600);

        for command in ["date", "time", "datetime"] {
            let first = processor.process(command);
            let second = processor.process(command);
            assert_eq!(first, second);
            assert!(!first.is_error());
        }
    }

    #[test]
    fn test_exactly_one_trailing_newline() {
        let processor = CommandProcessor::new();

        for command in ["date", "time", "datetime", "bogus"] {
            let response = processor.process(command);
            let text = response.as_str();
            assert!(text.ends_with('\n'));
            assert!(!text[..text.len() - 1].contains('\n'));
        }
    }

    #[test]
    fn test_system_clock_formats() {
        let date = process("date");
        let body = date.body();
        assert_eq!(body.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(body, "%Y-%m-%d").is_ok());

        let datetime = process("datetime");
        assert!(DateTime::parse_from_rfc3339(datetime.body()).is_ok());

        let time = process("time");
        assert!(chrono::NaiveTime::parse_from_str(&time.body()[..8], "%H:%M:%S").is_ok());
    }

    #[test]
    fn test_execute_parsed_command() {
        let processor = create_processor(0);
        assert_eq!(processor.execute(Command::Date).body(), "2024-03-09");
        assert!(processor.execute(Command::Unknown).is_error());
    }
}
