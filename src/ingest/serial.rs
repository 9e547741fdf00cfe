//! Sensor line source.
//!
//! Production reads the station over a serial port; `--stdin` reads the same
//! protocol from standard input (the simulator or a recorded session). Both
//! are wrapped in [`LineReader`], which survives read timeouts without
//! losing half-received lines.

use std::io::{self, BufRead};
use std::time::Duration;

use crate::model::SourceError;

/// Opens the serial device. Failure here is the one fatal ingestion error.
pub fn open_serial(
    port: &str,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<Box<dyn serialport::SerialPort>, SourceError> {
    serialport::new(port, baud_rate)
        .timeout(read_timeout)
        .open()
        .map_err(|source| SourceError::Serial {
            port: port.to_string(),
            source,
        })
}

/// Result of waiting for the next line.
#[derive(Debug, PartialEq)]
pub enum NextLine {
    /// A complete line, trailing newline and surrounding whitespace removed.
    Line(String),
    /// Nothing complete arrived before the read timed out.
    Idle,
    /// The source is closed.
    Closed,
}

/// Line splitter over a byte source that may time out mid-line.
pub struct LineReader<R> {
    inner: R,
    pending: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Reads until a newline, a timeout, or end of input.
    ///
    /// Bytes read before a timeout are kept and completed on the next call.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> io::Result<NextLine> {
        match self.inner.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(NextLine::Closed),
            // Either a full line or an unterminated final line at end of input
            Ok(_) => Ok(NextLine::Line(self.take_line())),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(NextLine::Idle)
            }
            Err(e) => Err(e),
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        line
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Cursor, Read};

    /// Byte source that replays chunks, raising TimedOut between them.
    struct ChoppyPort {
        chunks: VecDeque<Option<&'static [u8]>>,
    }

    impl Read for ChoppyPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Some(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
                Some(None) => Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_reads_lines_then_closes() {
        let mut reader = LineReader::new(Cursor::new("TEMP=20;HUM=50;RAIN=900\r\n\nTEMP=21"));

        assert_eq!(reader.next_line().unwrap(), NextLine::Line("TEMP=20;HUM=50;RAIN=900".into()));
        assert_eq!(reader.next_line().unwrap(), NextLine::Line(String::new()));
        assert_eq!(reader.next_line().unwrap(), NextLine::Line("TEMP=21".into()));
        assert_eq!(reader.next_line().unwrap(), NextLine::Closed);
    }

    #[test]
    fn test_timeout_keeps_partial_line() {
        let port = ChoppyPort {
            chunks: VecDeque::from(vec![
                Some(&b"TEMP=19.5;HU"[..]),
                None,
                Some(&b"M=70;RAIN=300\n"[..]),
            ]),
        };
        let mut reader = LineReader::new(io::BufReader::new(port));

        assert_eq!(reader.next_line().unwrap(), NextLine::Idle);
        assert_eq!(reader.next_line().unwrap(), NextLine::Line("TEMP=19.5;HUM=70;RAIN=300".into()));
        assert_eq!(reader.next_line().unwrap(), NextLine::Closed);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut reader = LineReader::new(Cursor::new(&b"TEMP=2\xff0;HUM=1;RAIN=1\n"[..]));

        match reader.next_line().unwrap() {
            NextLine::Line(line) => assert!(line.starts_with("TEMP=2\u{fffd}0")),
            other => panic!("expected a line, got {:?}", other),
        }
    }
}
