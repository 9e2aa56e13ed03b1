//! Data model: payment rows in, per-ticket aggregates and run reports out.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One payment record, keyed by column name.
///
/// `seq` is the zero-based position of the record in its source file.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRow {
    pub seq: usize,
    pub fields: HashMap<String, String>,
}

impl PaymentRow {
    /// Value of a named column. `None` when the source file has no such column.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// A loaded payment export: header in file order plus its rows.
#[derive(Debug, Clone)]
pub struct PaymentReport {
    pub source: String,
    pub header: Vec<String>,
    pub rows: Vec<PaymentRow>,
}

impl PaymentReport {
    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|h| h == name)
    }
}

/// Funder whose payments are being reconciled. Variant order is the
/// processing order when a session covers more than one funder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Funder {
    Rcuk,
    Coaf,
}

impl Funder {
    /// Key used for this funder in the config's `[funders.*]` tables.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Rcuk => "rcuk",
            Self::Coaf => "coaf",
        }
    }
}

impl fmt::Display for Funder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rcuk => write!(f, "RCUK"),
            Self::Coaf => write!(f, "COAF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Outcome of routing one payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Article processing charge, aggregated into the APC channel.
    Apc,
    /// Page, colour or membership payment, aggregated separately.
    OtherCost,
    /// Qualifying fund source but a transaction code outside the known set.
    NonQualifying,
    /// Paid from a fund source that does not qualify.
    WrongFundSource,
    /// The file carries no transaction-code column; treated as an APC.
    NoTransactionField,
    /// No ticket id could be extracted or resolved for the row.
    Unmatched,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apc => write!(f, "apc"),
            Self::OtherCost => write!(f, "other_cost"),
            Self::NonQualifying => write!(f, "non_qualifying"),
            Self::WrongFundSource => write!(f, "wrong_fund_source"),
            Self::NoTransactionField => write!(f, "no_transaction_field"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// Aggregation channel for an accepted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    Apc,
    Other,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Ticket identifier in the support system (a "ZD number").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accumulated payments of one kind against one ticket.
///
/// `total` is the running sum of parsed amounts; `fields` holds the merged
/// row fields, including the rendered total under the output field name.
#[derive(Debug, Clone)]
pub struct TicketAggregate {
    pub total: f64,
    pub fields: BTreeMap<String, String>,
}

/// Per-run aggregates, one map per payment kind.
#[derive(Debug, Default)]
pub struct TicketAggregates {
    pub apc: BTreeMap<TicketId, TicketAggregate>,
    pub other: BTreeMap<TicketId, TicketAggregate>,
}

impl TicketAggregates {
    pub fn by_kind(&self, kind: PaymentKind) -> &BTreeMap<TicketId, TicketAggregate> {
        match kind {
            PaymentKind::Apc => &self.apc,
            PaymentKind::Other => &self.other,
        }
    }

    pub fn by_kind_mut(&mut self, kind: PaymentKind) -> &mut BTreeMap<TicketId, TicketAggregate> {
        match kind {
            PaymentKind::Apc => &mut self.apc,
            PaymentKind::Other => &mut self.other,
        }
    }
}

/// Ticket-indexed field store that outlives individual runs: every funder
/// processed in a session lands its aggregates here.
#[derive(Debug, Clone, Default)]
pub struct MasterTicketStore {
    pub tickets: BTreeMap<TicketId, BTreeMap<String, String>>,
}

impl MasterTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted union of field names across every ticket.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: BTreeSet<&String> = BTreeSet::new();
        for fields in self.tickets.values() {
            names.extend(fields.keys());
        }
        names.into_iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tracking
// ---------------------------------------------------------------------------

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No ticket id could be extracted or resolved.
    NoTicketMatch,
    /// Source-of-funds code other than the qualifying one.
    WrongFundSource,
    /// Transaction code present but outside the qualifying set.
    NonQualifyingCode,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTicketMatch => write!(f, "no_ticket_match"),
            Self::WrongFundSource => write!(f, "wrong_fund_source"),
            Self::NonQualifyingCode => write!(f, "non_qualifying_code"),
        }
    }
}

/// How an accepted row qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptedKind {
    Apc,
    OtherCost,
    /// Accepted by default: the file has no transaction-code column.
    NoTransactionField,
}

impl fmt::Display for AcceptedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apc => write!(f, "apc"),
            Self::OtherCost => write!(f, "other_cost"),
            Self::NoTransactionField => write!(f, "no_transaction_field"),
        }
    }
}

/// A rejected row with its reason. List position is arrival order.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedPayment {
    pub reason: RejectReason,
    pub row: PaymentRow,
}

/// An accepted row with its kind. List position is arrival order.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedPayment {
    pub kind: AcceptedKind,
    pub row: PaymentRow,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Provenance for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub funder: Funder,
    pub source: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Row counts for one run. `accepted` and `rejected` partition `rows`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub apc: usize,
    pub other_cost: usize,
    pub no_transaction_field: usize,
    pub unmatched: usize,
    pub wrong_fund_source: usize,
    pub non_qualifying: usize,
}

/// Everything one funder run produced, except the master-store updates.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub accepted: Vec<AcceptedPayment>,
    pub rejected: Vec<RejectedPayment>,
}
