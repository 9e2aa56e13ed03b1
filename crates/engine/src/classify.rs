//! Transaction-code and fund-source classification.

use crate::config::FieldMapping;
use crate::model::{Disposition, PaymentRow};

/// Source-of-funds code a payment must carry to qualify.
pub const QUALIFYING_SOF_CODE: &str = "JUDB";

/// Transaction code for article processing charges.
pub const APC_TRANSACTION_CODE: &str = "EBDU";

/// Transaction codes for page, colour and membership payments.
pub const OTHER_TRANSACTION_CODES: [&str; 2] = ["EBDV", "EBDW"];

/// Decide how one matched payment row is routed.
///
/// Rows without a resolved ticket never reach this point, so `Unmatched` is
/// not returned here. A missing transaction-code column is checked first and
/// wins over everything, including the fund-source check.
pub fn classify(row: &PaymentRow, mapping: &FieldMapping) -> Disposition {
    let code = match row.field(&mapping.transaction_code) {
        Some(code) => code,
        None => return Disposition::NoTransactionField,
    };
    if row.field(&mapping.sof_code) != Some(QUALIFYING_SOF_CODE) {
        return Disposition::WrongFundSource;
    }
    if code == APC_TRANSACTION_CODE {
        return Disposition::Apc;
    }
    if OTHER_TRANSACTION_CODES.contains(&code) {
        return Disposition::OtherCost;
    }
    Disposition::NonQualifying
}
