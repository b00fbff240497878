//! NDJSON (newline-delimited JSON) stream sink.
//!
//! Each row is serialized straight into the buffered writer.
//!
//! ```ignore
//! let mut sink = JsonStreamSink::stdout();
//! sink.write_events(&events)?;
//! sink.write_grants(&grants)?;
//! let rows = sink.finish()?;
//! ```

use super::{EventRow, GrantRow};
use serde::Serialize;
use std::io::{self, BufWriter, Write};

pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    /// Write NDJSON to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonStreamSink<W> {
    /// Create a sink wrapping any writer (file, Vec<u8>, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    pub fn write_events(&mut self, rows: &[EventRow]) -> io::Result<()> {
        rows.iter().try_for_each(|row| self.write_row(row))
    }

    pub fn write_grants(&mut self, rows: &[GrantRow]) -> io::Result<()> {
        rows.iter().try_for_each(|row| self.write_row(row))
    }

    fn write_row<T: Serialize>(&mut self, row: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_json_object_per_line() {
        let mut buf = Vec::new();
        let mut sink = JsonStreamSink::new(&mut buf);

        let events = vec![
            EventRow {
                event: "request_created".into(),
                resource: "db-prod".into(),
                applicant: "carol".into(),
                party: String::new(),
                approvals: 0,
                needed: 0,
                created_at: "2026-10-19T00:00:00Z".into(),
            },
            EventRow {
                event: "approval_recorded".into(),
                resource: "db-prod".into(),
                applicant: "carol".into(),
                party: "alice".into(),
                approvals: 1,
                needed: 2,
                created_at: "2026-10-19T00:00:01Z".into(),
            },
        ];
        let grants = vec![GrantRow {
            resource: "db-prod".into(),
            applicant: "carol".into(),
            grantor: "bob".into(),
            approvers: "alice,bob".into(),
            granted_at: "2026-10-19T00:00:02Z".into(),
        }];

        sink.write_events(&events).unwrap();
        sink.write_grants(&grants).unwrap();
        assert_eq!(sink.rows_written(), 3);
        assert_eq!(sink.finish().unwrap(), 3);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 3);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["party"], "alice");
        let third: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(third["approvers"], "alice,bob");
    }
}
