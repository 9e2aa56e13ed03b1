//! Master ticket store CSV export.

use std::path::Path;

use apcrecon_engine::MasterTicketStore;

/// Write the master store: one row per ticket, the `ticket` column first,
/// then the union of field names in sorted order.
pub fn write_master_csv(path: &Path, master: &MasterTicketStore) -> Result<(), String> {
    let columns = master.field_names();

    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    header.push("ticket");
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header).map_err(|e| e.to_string())?;

    for (ticket, fields) in &master.tickets {
        let mut record: Vec<&str> = Vec::with_capacity(columns.len() + 1);
        record.push(ticket.as_str());
        for name in &columns {
            record.push(fields.get(name).map(String::as_str).unwrap_or(""));
        }
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())
}
