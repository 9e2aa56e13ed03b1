//! Per-ticket aggregation and the master-store push.
//!
//! Repeat payments against one ticket fold into a single record: amounts sum
//! into a dedicated output field, posting dates stay fresh, and any other
//! field that disagrees keeps both values joined by [`VALUE_SEPARATOR`].

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::config::FieldMapping;
use crate::model::{
    MasterTicketStore, PaymentKind, PaymentRow, TicketAggregate, TicketAggregates, TicketId,
};

/// Joins conflicting field values on merge. Downstream report tooling splits
/// on this exact token, so it never changes.
pub const VALUE_SEPARATOR: &str = " %&% ";

/// Parse an amount cell, tolerating thousands separators.
pub fn parse_amount(value: &str) -> Option<f64> {
    value.replace(',', "").trim().parse::<f64>().ok()
}

/// Render a running total the way it is stored into an output field.
pub fn format_amount(total: f64) -> String {
    total.to_string()
}

/// Fold one accepted row into the aggregate for `ticket` under `kind`.
///
/// Fields merge in header order. The first row for a ticket is stored
/// verbatim; later rows sum the amount and reconcile fields one by one.
pub fn merge(
    aggregates: &mut TicketAggregates,
    ticket: &TicketId,
    kind: PaymentKind,
    row: &PaymentRow,
    header: &[String],
    mapping: &FieldMapping,
    date_fields: &BTreeSet<String>,
) {
    let output_field = match kind {
        PaymentKind::Apc => &mapping.total_apc,
        PaymentKind::Other => &mapping.total_other,
    };

    // Page and membership rows merge their transaction code against the APC
    // record's code for the same ticket, so the master row shows both.
    let apc_code = match kind {
        PaymentKind::Other => aggregates
            .apc
            .get(ticket)
            .and_then(|agg| agg.fields.get(&mapping.transaction_code))
            .filter(|code| !code.is_empty())
            .cloned(),
        PaymentKind::Apc => None,
    };

    let amount = match row.field(&mapping.amount).and_then(parse_amount) {
        Some(amount) => amount,
        None => {
            warn!("ticket {ticket}: no usable amount in row {}; counting zero", row.seq);
            0.0
        }
    };

    let slot = aggregates.by_kind_mut(kind);
    match slot.get_mut(ticket) {
        Some(existing) => {
            existing.total += amount;
            for name in header {
                let new_value = match row.field(name) {
                    Some(value) => value,
                    None => continue,
                };
                let merged = if date_fields.contains(name) {
                    new_value.to_string()
                } else if kind == PaymentKind::Other && name == &mapping.transaction_code {
                    match &apc_code {
                        Some(code) => format!("{code}{VALUE_SEPARATOR}{new_value}"),
                        None => reconcile_values(existing.fields.get(name), new_value),
                    }
                } else {
                    reconcile_values(existing.fields.get(name), new_value)
                };
                existing.fields.insert(name.clone(), merged);
            }
            existing
                .fields
                .insert(output_field.clone(), format_amount(existing.total));
        }
        None => {
            let mut fields: BTreeMap<String, String> = BTreeMap::new();
            for name in header {
                if let Some(value) = row.field(name) {
                    fields.insert(name.clone(), value.to_string());
                }
            }
            fields.insert(output_field.clone(), format_amount(amount));
            slot.insert(ticket.clone(), TicketAggregate { total: amount, fields });
        }
    }
}

/// Equal or absent keeps the incoming value; a disagreement keeps both.
fn reconcile_values(existing: Option<&String>, new_value: &str) -> String {
    match existing {
        Some(old) if old != new_value => format!("{old}{VALUE_SEPARATOR}{new_value}"),
        _ => new_value.to_string(),
    }
}

/// Copy a ticket's aggregate fields into the master store.
///
/// Overwrites silently except on a run's first row, where a field already
/// present under a different value draws one warning per field.
pub fn push_to_master(
    master: &mut MasterTicketStore,
    ticket: &TicketId,
    aggregate: &TicketAggregate,
    source: &str,
    first_row: bool,
) {
    let record = master.tickets.entry(ticket.clone()).or_default();
    for (name, value) in &aggregate.fields {
        if first_row {
            if let Some(old) = record.get(name) {
                if old != value {
                    warn!("ticket {ticket}: field '{name}' already set; {source} overwrites it");
                }
            }
        }
        record.insert(name.clone(), value.clone());
    }
}
