//! Destination for rejected rows.
//!
//! The engine itself never touches the file system. Binaries hand in a
//! file-backed sink; tests use [`MemorySink`] or [`NullSink`].

use std::io;

use crate::model::{PaymentRow, RejectReason};

/// Receives each rejected row as it is encountered, with the header of the
/// file it came from. Failures are reported but the run carries on.
pub trait DebugSink {
    fn append(&mut self, reason: RejectReason, header: &[String], row: &PaymentRow)
        -> io::Result<()>;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl DebugSink for NullSink {
    fn append(
        &mut self,
        _reason: RejectReason,
        _header: &[String],
        _row: &PaymentRow,
    ) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every appended row in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<(RejectReason, PaymentRow)>,
}

impl DebugSink for MemorySink {
    fn append(&mut self, reason: RejectReason, _header: &[String], row: &PaymentRow)
        -> io::Result<()> {
        self.rows.push((reason, row.clone()));
        Ok(())
    }
}
