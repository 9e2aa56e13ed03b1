//! File-backed debug sink: one CSV per rejection reason.
//!
//! Rejected rows land under the configured debug directory in files named
//! `<prefix><input file name>`, so `rcuk_payments.csv` produces
//! `unmatched_rcuk_payments.csv`, `non_judb_rcuk_payments.csv` and
//! `non_ebdu_rcuk_payments.csv` as needed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use apcrecon_engine::model::{PaymentRow, RejectReason};
use apcrecon_engine::sink::DebugSink;

fn file_prefix(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::NoTicketMatch => "unmatched_",
        RejectReason::WrongFundSource => "non_judb_",
        RejectReason::NonQualifyingCode => "non_ebdu_",
    }
}

/// Lazily creates one writer per reason; the directory and files appear only
/// when a rejection of that reason actually happens. Each file starts with
/// the input's header row.
pub struct FileSink {
    dir: PathBuf,
    input_name: String,
    writers: HashMap<RejectReason, csv::Writer<fs::File>>,
}

impl FileSink {
    pub fn new(dir: PathBuf, input_name: String) -> Self {
        Self { dir, input_name, writers: HashMap::new() }
    }

    fn writer(
        &mut self,
        reason: RejectReason,
        header: &[String],
    ) -> io::Result<&mut csv::Writer<fs::File>> {
        match self.writers.entry(reason) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                fs::create_dir_all(&self.dir)?;
                let path = self
                    .dir
                    .join(format!("{}{}", file_prefix(reason), self.input_name));
                let file = fs::File::create(&path)?;
                let mut writer = csv::Writer::from_writer(file);
                writer.write_record(header).map_err(io::Error::other)?;
                Ok(entry.insert(writer))
            }
        }
    }
}

impl DebugSink for FileSink {
    fn append(
        &mut self,
        reason: RejectReason,
        header: &[String],
        row: &PaymentRow,
    ) -> io::Result<()> {
        let writer = self.writer(reason, header)?;
        let record: Vec<&str> = header
            .iter()
            .map(|name| row.field(name).unwrap_or(""))
            .collect();
        writer.write_record(&record).map_err(io::Error::other)?;
        writer.flush()
    }
}
