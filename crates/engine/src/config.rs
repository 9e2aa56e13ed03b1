//! TOML configuration for a reconciliation session.
//!
//! One config names every funder's input file and column mapping, the
//! OA-to-ticket lookup sources, the override tables and the output targets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::ReconcileError;
use crate::model::Funder;

/// Top-level config, one per reconciliation session.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Human-readable name, echoed in run reports.
    pub name: String,
    /// Column mappings per funder. Processing follows [`Funder`] order.
    pub funders: BTreeMap<Funder, FieldMapping>,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub overrides: OverrideTables,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Character encoding of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Encoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "windows-1252")]
    Windows1252,
}

/// Where one funder's payments live and what its columns are called.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Input CSV, relative to the config file.
    pub file: String,
    /// Forced input encoding. Default is UTF-8 with Windows-1252 fallback.
    #[serde(default)]
    pub encoding: Option<Encoding>,
    /// Column holding the payment amount.
    pub amount: String,
    /// Column holding the invoice number.
    pub invoice: String,
    /// Column whose free text carries the OA or ZD reference.
    pub ticket_ref: String,
    /// Column holding the posting date.
    pub paydate: String,
    /// Column holding the transaction code. May be absent from the file.
    #[serde(default = "default_transaction_code")]
    pub transaction_code: String,
    /// Column holding the source-of-funds code.
    #[serde(default = "default_sof_code")]
    pub sof_code: String,
    /// Output field for the summed APC amount.
    pub total_apc: String,
    /// Output field for the summed page, colour or membership amount.
    pub total_other: String,
}

fn default_transaction_code() -> String {
    "Tran".to_string()
}

fn default_sof_code() -> String {
    "SOF".to_string()
}

/// Sources for the general OA-to-ticket table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupConfig {
    /// Two-column `OA id,ticket id` CSV, relative to the config file.
    #[serde(default)]
    pub file: Option<String>,
    /// Inline entries. Win over duplicate keys from `file`.
    #[serde(default)]
    pub map: BTreeMap<String, String>,
}

/// Hand-maintained correction tables consulted during extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverrideTables {
    /// OA id to ticket id. Wins over the general lookup table.
    #[serde(default)]
    pub manual: BTreeMap<String, String>,
    /// Invoice number to ticket id.
    #[serde(default)]
    pub invoice: BTreeMap<String, String>,
    /// Full reference text to ticket id. Wins over the invoice table.
    #[serde(default)]
    pub description: BTreeMap<String, String>,
    /// Known bad reference text to its correction, applied before matching.
    #[serde(default)]
    pub reference_typos: BTreeMap<String, String>,
    /// Known bad ticket id to its correction, applied after resolution.
    #[serde(default)]
    pub ticket_typos: BTreeMap<String, String>,
}

/// Output targets, relative to the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Master ticket CSV. Not written when unset.
    #[serde(default)]
    pub master: Option<String>,
    /// Directory for rejected-row debug CSVs. Not written when unset.
    #[serde(default)]
    pub debug_dir: Option<String>,
}

impl ReconcileConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml(input: &str) -> Result<Self, ReconcileError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|e| ReconcileError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.funders.is_empty() {
            return Err(ReconcileError::ConfigValidation(
                "at least one funder is required".to_string(),
            ));
        }
        for (funder, mapping) in &self.funders {
            let key = funder.config_key();
            if mapping.file.is_empty() {
                return Err(ReconcileError::ConfigValidation(format!(
                    "funder '{key}': file must not be empty"
                )));
            }
            for (label, column) in [
                ("amount", &mapping.amount),
                ("invoice", &mapping.invoice),
                ("ticket_ref", &mapping.ticket_ref),
                ("paydate", &mapping.paydate),
                ("total_apc", &mapping.total_apc),
                ("total_other", &mapping.total_other),
            ] {
                if column.is_empty() {
                    return Err(ReconcileError::ConfigValidation(format!(
                        "funder '{key}': {label} must not be empty"
                    )));
                }
            }
            if mapping.total_apc == mapping.total_other {
                return Err(ReconcileError::ConfigValidation(format!(
                    "funder '{key}': total_apc and total_other must differ"
                )));
            }
        }
        Ok(())
    }

    /// Column mapping for a funder.
    pub fn mapping(&self, funder: Funder) -> Result<&FieldMapping, ReconcileError> {
        self.funders
            .get(&funder)
            .ok_or_else(|| ReconcileError::UnknownFunder(funder.config_key().to_string()))
    }

    /// Posting-date columns across all funders. Merges keep these fresh
    /// instead of concatenating, whichever funder is running.
    pub fn date_fields(&self) -> BTreeSet<String> {
        self.funders
            .values()
            .map(|mapping| mapping.paydate.clone())
            .collect()
    }
}
