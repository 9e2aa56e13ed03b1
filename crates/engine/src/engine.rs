//! Run driver: route every row of a funder's report and update the master.

use std::collections::HashMap;

use log::warn;

use crate::aggregate::{merge, push_to_master};
use crate::classify::classify;
use crate::config::{FieldMapping, ReconcileConfig};
use crate::error::ReconcileError;
use crate::extract::{extract_ticket_id, Lookups};
use crate::model::{
    AcceptedKind, AcceptedPayment, Disposition, Funder, MasterTicketStore, PaymentKind,
    PaymentReport, PaymentRow, RejectReason, RejectedPayment, RunMeta, RunReport, RunSummary,
    TicketAggregates,
};
use crate::sink::DebugSink;

/// Reconcile one funder's payment report.
///
/// Aggregates and tracking logs are fresh per call; `master` belongs to the
/// caller and accumulates across every run of a session. Row-level problems
/// are warned about and recovered, never fatal.
pub fn run(
    config: &ReconcileConfig,
    funder: Funder,
    report: &PaymentReport,
    lookups: &Lookups,
    master: &mut MasterTicketStore,
    debug: &mut dyn DebugSink,
) -> Result<RunReport, ReconcileError> {
    let mapping = config.mapping(funder)?;
    let date_fields = config.date_fields();

    if !report.has_column(&mapping.transaction_code) {
        warn!(
            "{}: no '{}' column; every matched payment counts as an APC",
            report.source, mapping.transaction_code
        );
    }

    let mut aggregates = TicketAggregates::default();
    let mut accepted: Vec<AcceptedPayment> = Vec::new();
    let mut rejected: Vec<RejectedPayment> = Vec::new();
    let mut summary = RunSummary::default();

    for (position, row) in report.rows.iter().enumerate() {
        let first_row = position == 0;
        summary.rows += 1;

        let raw_ref = row.field(&mapping.ticket_ref).unwrap_or("");
        let invoice = row.field(&mapping.invoice).unwrap_or("");
        let ticket = match extract_ticket_id(raw_ref, invoice, lookups) {
            Some(ticket) => ticket,
            None => {
                summary.unmatched += 1;
                reject(&mut rejected, debug, report, row, RejectReason::NoTicketMatch);
                continue;
            }
        };

        let kind = match classify(row, mapping) {
            Disposition::Apc => {
                summary.apc += 1;
                if funder == Funder::Rcuk {
                    accepted.push(AcceptedPayment { kind: AcceptedKind::Apc, row: row.clone() });
                }
                Some(PaymentKind::Apc)
            }
            Disposition::OtherCost => {
                summary.other_cost += 1;
                if funder == Funder::Rcuk {
                    accepted.push(AcceptedPayment {
                        kind: AcceptedKind::OtherCost,
                        row: row.clone(),
                    });
                }
                Some(PaymentKind::Other)
            }
            Disposition::NoTransactionField => {
                summary.no_transaction_field += 1;
                accepted.push(AcceptedPayment {
                    kind: AcceptedKind::NoTransactionField,
                    row: row.clone(),
                });
                Some(PaymentKind::Apc)
            }
            Disposition::WrongFundSource => {
                summary.wrong_fund_source += 1;
                reject(&mut rejected, debug, report, row, RejectReason::WrongFundSource);
                None
            }
            Disposition::NonQualifying => {
                summary.non_qualifying += 1;
                reject(&mut rejected, debug, report, row, RejectReason::NonQualifyingCode);
                None
            }
            Disposition::Unmatched => {
                unreachable!("rows without a ticket are rejected before classification")
            }
        };

        if let Some(kind) = kind {
            merge(&mut aggregates, &ticket, kind, row, &report.header, mapping, &date_fields);
            if let Some(aggregate) = aggregates.by_kind(kind).get(&ticket) {
                push_to_master(master, &ticket, aggregate, &report.source, first_row);
            }
        }
    }

    summary.accepted = summary.apc + summary.other_cost + summary.no_transaction_field;
    summary.rejected = summary.unmatched + summary.wrong_fund_source + summary.non_qualifying;

    Ok(RunReport {
        meta: RunMeta {
            config_name: config.name.clone(),
            funder,
            source: report.source.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        accepted,
        rejected,
    })
}

fn reject(
    rejected: &mut Vec<RejectedPayment>,
    debug: &mut dyn DebugSink,
    report: &PaymentReport,
    row: &PaymentRow,
    reason: RejectReason,
) {
    if let Err(e) = debug.append(reason, &report.header, row) {
        warn!("{}: cannot record {reason} row {}: {e}", report.source, row.seq);
    }
    rejected.push(RejectedPayment { reason, row: row.clone() });
}

/// Load a payment report from decoded CSV text.
///
/// The ticket-reference and invoice columns must exist, and the fund-source
/// column must exist wherever the transaction-code column does. A record
/// that fails to parse is skipped with a warning.
pub fn load_report(
    source: &str,
    csv_data: &str,
    mapping: &FieldMapping,
) -> Result<PaymentReport, ReconcileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| ReconcileError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let require = |column: &str| -> Result<(), ReconcileError> {
        if header.iter().any(|h| h == column) {
            Ok(())
        } else {
            Err(ReconcileError::MissingColumn {
                source: source.to_string(),
                column: column.to_string(),
            })
        }
    };
    require(&mapping.ticket_ref)?;
    require(&mapping.invoice)?;
    if header.iter().any(|h| h == &mapping.transaction_code) {
        require(&mapping.sof_code)?;
    }

    let mut rows = Vec::new();
    for (seq, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("{source}: skipping malformed record {seq}: {e}");
                continue;
            }
        };
        let mut fields = HashMap::with_capacity(header.len());
        for (i, name) in header.iter().enumerate() {
            if let Some(value) = record.get(i) {
                fields.insert(name.clone(), value.to_string());
            }
        }
        rows.push(PaymentRow { seq, fields });
    }

    Ok(PaymentReport {
        source: source.to_string(),
        header,
        rows,
    })
}

/// Load the two-column `OA id,ticket id` lookup CSV. No header row.
pub fn load_lookup_table(
    source: &str,
    csv_data: &str,
) -> Result<Vec<(String, String)>, ReconcileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv_data.as_bytes());

    let mut pairs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconcileError::Io(e.to_string()))?;
        let oa = record.get(0).unwrap_or("").trim();
        let ticket = record.get(1).unwrap_or("").trim();
        if oa.is_empty() || ticket.is_empty() {
            warn!("{source}: line {}: incomplete lookup row skipped", line + 1);
            continue;
        }
        pairs.push((oa.to_string(), ticket.to_string()));
    }
    Ok(pairs)
}
