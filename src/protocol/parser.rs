//! Incremental Line Parser
//!
//! TCP is a byte stream: one read may deliver half a command, or several
//! commands at once. The connection handler appends whatever arrives to a
//! `BytesMut` buffer and asks the parser for the next complete line.
//!
//! ## How the Parser Works
//!
//! `LineParser::parse` inspects the buffer and returns either:
//! - `Ok(Some(line))` - a complete line was split off the front of the buffer
//! - `Ok(None)` - no newline yet, the caller should read more data
//! - `Err(ParseError)` - the buffered line grew past the allowed size
//!
//! Exactly one trailing `\n` is removed from each line. A `\r` before it is
//! kept, so `date\r\n` reaches the command processor as `date\r`.
//!
//! UDP has no framing at all, so datagrams only go through
//! [`decode_command`].

use crate::protocol::types::NEWLINE;
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use thiserror::Error;

/// Maximum number of bytes buffered while waiting for a newline (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Errors that can occur while framing lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No newline within the first `max` bytes
    #[error("line too long: {size} bytes buffered without a newline (max: {max})")]
    LineTooLong { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Splits newline-terminated lines off a receive buffer.
///
/// # Example
///
/// ```
/// use timeserver::protocol::LineParser;
/// use bytes::BytesMut;
///
/// let mut parser = LineParser::new();
/// let mut buffer = BytesMut::from(&b"time\ndate"[..]);
///
/// assert_eq!(parser.parse(&mut buffer).unwrap().as_deref(), Some(&b"time"[..]));
/// assert_eq!(parser.parse(&mut buffer).unwrap(), None);
/// assert_eq!(&buffer[..], b"date");
/// ```
#[derive(Debug)]
pub struct LineParser {
    max_line_length: usize,
    /// Bytes already scanned for a newline, so a slowly arriving line is not
    /// rescanned from the start on every read
    scanned: usize,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    /// Creates a parser with the default [`MAX_LINE_LENGTH`].
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            scanned: 0,
        }
    }

    /// Attempts to take one complete line from the front of `buf`.
    ///
    /// On success the line and its newline are removed from the buffer;
    /// the returned bytes exclude the newline.
    pub fn parse(&mut self, buf: &mut BytesMut) -> ParseResult<Option<Bytes>> {
        // The buffer may have been drained by the caller since the last call
        let start = self.scanned.min(buf.len());

        match buf[start..].iter().position(|&b| b == NEWLINE) {
            Some(offset) => {
                let end = start + offset;
                self.scanned = 0;

                if end > self.max_line_length {
                    return Err(ParseError::LineTooLong {
                        size: end,
                        max: self.max_line_length,
                    });
                }

                let mut line = buf.split_to(end + 1);
                line.truncate(end);
                Ok(Some(line.freeze()))
            }
            None => {
                self.scanned = buf.len();

                if buf.len() > self.max_line_length {
                    return Err(ParseError::LineTooLong {
                        size: buf.len(),
                        max: self.max_line_length,
                    });
                }

                Ok(None)
            }
        }
    }
}

/// Decodes a command from raw bytes.
///
/// Invalid UTF-8 is replaced rather than rejected; such input can never
/// match a command and is answered with the unknown command reply.
pub fn decode_command(payload: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(data: &[u8]) -> BytesMut {
        BytesMut::from(data)
    }

    #[test]
    fn test_single_line() {
        let mut parser = LineParser::new();
        let mut buf = buffer(b"date\n");

        let line = parser.parse(&mut buf).unwrap().unwrap();
        assert_eq!(&line[..], b"date");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_incomplete_line() {
        let mut parser = LineParser::new();
        let mut buf = buffer(b"dat");

        assert_eq!(parser.parse(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"dat");

        buf.extend_from_slice(b"e\n");
        let line = parser.parse(&mut buf).unwrap().unwrap();
        assert_eq!(&line[..], b"date");
    }

    #[test]
    fn test_pipelined_lines() {
        let mut parser = LineParser::new();
        let mut buf = buffer(b"time\ndatetime\nbogus\n");

        let lines: Vec<Bytes> = std::iter::from_fn(|| parser.parse(&mut buf).unwrap()).collect();
        assert_eq!(
            lines,
            vec![
                Bytes::from_static(b"time"),
                Bytes::from_static(b"datetime"),
                Bytes::from_static(b"bogus"),
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_strips_only_one_newline() {
        let mut parser = LineParser::new();

        let mut buf = buffer(b"date\r\n");
        assert_eq!(&parser.parse(&mut buf).unwrap().unwrap()[..], b"date\r");

        let mut buf = buffer(b"\n\n");
        assert_eq!(&parser.parse(&mut buf).unwrap().unwrap()[..], b"");
        assert_eq!(&parser.parse(&mut buf).unwrap().unwrap()[..], b"");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_line_too_long() {
        let mut parser = LineParser::with_max_line_length(8);
        let mut buf = buffer(b"0123456789");

        assert_eq!(
            parser.parse(&mut buf),
            Err(ParseError::LineTooLong { size: 10, max: 8 })
        );
    }

    #[test]
    fn test_long_line_with_newline_is_rejected() {
        let mut parser = LineParser::with_max_line_length(4);
        let mut buf = buffer(b"datetime\n");

        assert!(matches!(
            parser.parse(&mut buf),
            Err(ParseError::LineTooLong { size: 8, max: 4 })
        ));
    }

    #[test]
    fn test_line_at_limit_is_accepted() {
        let mut parser = LineParser::with_max_line_length(4);
        let mut buf = buffer(b"date\n");

        assert_eq!(&parser.parse(&mut buf).unwrap().unwrap()[..], b"date");
    }

    #[test]
    fn test_decode_command() {
        assert_eq!(decode_command(b"date"), "date");
        assert_eq!(decode_command(b"date\n"), "date\n");
        assert_eq!(decode_command(&[0xff, b'd']), "\u{fffd}d");
    }
}
