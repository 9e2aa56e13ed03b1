//! Input decoding and lookup-table loading.

use std::io::Read;
use std::path::Path;

use apcrecon_engine::config::Encoding;
use apcrecon_engine::engine::load_lookup_table;
use apcrecon_engine::{Lookups, ReconcileConfig};

use crate::CliError;

/// Read a file and convert it to UTF-8.
///
/// Without a configured encoding, UTF-8 is tried first and Windows-1252 is
/// the fallback; CUFS exports usually come via Excel.
pub fn read_decoded(path: &Path, encoding: Option<Encoding>) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match encoding {
        Some(Encoding::Utf8) => String::from_utf8(bytes).map_err(|e| e.to_string()),
        Some(Encoding::Windows1252) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
        // Try UTF-8 first; on failure, recover the buffer from the error.
        None => match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(e) => {
                let bytes = e.into_bytes();
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
                Ok(decoded.into_owned())
            }
        },
    }
}

/// Build the extraction tables from the config plus the optional lookup CSV.
pub fn load_lookups(config: &ReconcileConfig, base_dir: &Path) -> Result<Lookups, CliError> {
    let mut lookups = Lookups::from_config(&config.lookup, &config.overrides);
    if let Some(file) = &config.lookup.file {
        let path = base_dir.join(file);
        let data = read_decoded(&path, None)
            .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))?;
        let pairs =
            load_lookup_table(file, &data).map_err(|e| CliError::runtime(e.to_string()))?;
        // Inline [lookup.map] entries win over file rows.
        for (oa, ticket) in pairs {
            lookups.oa_to_ticket.entry(oa).or_insert(ticket);
        }
    }
    Ok(lookups)
}
