//! `apcrecon-engine` — CUFS payment to support-ticket reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded payment reports and lookup tables,
//! returns per-run reports and updates a caller-owned master ticket store.
//! The only write path is the caller-supplied debug sink.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod sink;

pub use config::ReconcileConfig;
pub use engine::{load_lookup_table, load_report, run};
pub use error::ReconcileError;
pub use extract::Lookups;
pub use model::{Funder, MasterTicketStore, PaymentReport, RunReport};
