//! Ticket-id extraction from free-text payment references.
//!
//! Finance staff paste OA numbers ("OA-1234", "OA 1234", "oa1234") or ZD
//! ticket numbers ("ZD 4323") into reference fields by hand, so matching is
//! deliberately loose and backed by hand-maintained correction tables.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::config::{LookupConfig, OverrideTables};
use crate::model::TicketId;

/// Lookup and override tables consulted during extraction.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    /// OA id to ticket id, the general table.
    pub oa_to_ticket: BTreeMap<String, String>,
    /// OA id to ticket id, manual overrides. Wins over `oa_to_ticket`.
    pub manual: BTreeMap<String, String>,
    /// Invoice number to ticket id.
    pub invoice: BTreeMap<String, String>,
    /// Full reference text to ticket id. Wins over the invoice table.
    pub description: BTreeMap<String, String>,
    /// Raw reference typo to its correction, applied before matching.
    pub reference_typos: BTreeMap<String, String>,
    /// Resolved ticket id typo to its correction, applied last.
    pub ticket_typos: BTreeMap<String, String>,
}

impl Lookups {
    /// Build tables from config. The caller loads `[lookup] file` separately
    /// and folds its rows into `oa_to_ticket`.
    pub fn from_config(lookup: &LookupConfig, overrides: &OverrideTables) -> Self {
        Self {
            oa_to_ticket: lookup.map.clone(),
            manual: overrides.manual.clone(),
            invoice: overrides.invoice.clone(),
            description: overrides.description.clone(),
            reference_typos: overrides.reference_typos.clone(),
            ticket_typos: overrides.ticket_typos.clone(),
        }
    }
}

fn oa_pattern() -> &'static Regex {
    static OA: OnceLock<Regex> = OnceLock::new();
    OA.get_or_init(|| Regex::new(r"OA[ -]?[0-9]{4,8}").unwrap())
}

fn zd_pattern() -> &'static Regex {
    static ZD: OnceLock<Regex> = OnceLock::new();
    ZD.get_or_init(|| Regex::new(r"ZD[ -]?[0-9]{4,8}").unwrap())
}

/// Resolve the ticket id for one payment row.
///
/// `raw_ref` is the ticket-reference column's text and `invoice` the invoice
/// column's value. Override precedence: description beats invoice beats any
/// pattern match. Returns `None` when nothing resolves.
pub fn extract_ticket_id(raw_ref: &str, invoice: &str, lookups: &Lookups) -> Option<TicketId> {
    let reference = lookups
        .reference_typos
        .get(raw_ref)
        .map(String::as_str)
        .unwrap_or(raw_ref);
    let upper = reference.to_uppercase();

    let mut ticket = if let Some(m) = oa_pattern().find(&upper) {
        let oa = normalize_oa(m.as_str());
        match lookups.manual.get(&oa).or_else(|| lookups.oa_to_ticket.get(&oa)) {
            Some(id) => id.clone(),
            None => {
                warn!("no ticket mapping for {oa}; its payments will not be exported");
                String::new()
            }
        }
    } else if let Some(m) = zd_pattern().find(&upper) {
        normalize_zd(m.as_str())
    } else {
        String::new()
    };

    if let Some(id) = lookups.invoice.get(invoice.trim()) {
        ticket = id.clone();
    }
    if let Some(id) = lookups.description.get(reference.trim()) {
        ticket = id.clone();
    }

    if ticket.is_empty() {
        return None;
    }
    if let Some(fixed) = lookups.ticket_typos.get(&ticket) {
        ticket = fixed.clone();
    }
    Some(TicketId::new(ticket))
}

/// `OA 1234`, `OA-1234` and `OA1234` all normalize to `OA-1234`.
fn normalize_oa(matched: &str) -> String {
    let digits: String = matched.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("OA-{digits}")
}

/// Strip the ZD prefix and separators, leaving the bare ticket number.
fn normalize_zd(matched: &str) -> String {
    matched
        .replace(' ', "-")
        .trim_matches(|c| matches!(c, 'Z' | 'D' | '-'))
        .to_string()
}
