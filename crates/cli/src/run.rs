//! `apcrecon run` and `apcrecon validate` command bodies.

use std::path::{Path, PathBuf};

use apcrecon_engine::engine::load_report;
use apcrecon_engine::sink::{DebugSink, NullSink};
use apcrecon_engine::{Funder, MasterTicketStore, ReconcileConfig, RunReport};

use crate::debug::FileSink;
use crate::input;
use crate::master::write_master_csv;
use crate::CliError;

pub fn cmd_run(
    config_path: PathBuf,
    only: Option<Funder>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let config_text = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", config_path.display())))?;
    let config = ReconcileConfig::from_toml(&config_text)
        .map_err(|e| CliError::config(e.to_string()))?;

    // Input and output paths resolve relative to the config file.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let funders: Vec<Funder> = match only {
        Some(funder) => {
            if config.mapping(funder).is_err() {
                return Err(CliError::usage(format!(
                    "funder '{}' is not defined in {}",
                    funder.config_key(),
                    config_path.display()
                ))
                .with_hint(format!(
                    "add a [funders.{}] table to the config",
                    funder.config_key()
                )));
            }
            vec![funder]
        }
        None => config.funders.keys().copied().collect(),
    };

    let lookups = input::load_lookups(&config, base_dir)?;

    let mut master = MasterTicketStore::new();
    let mut reports: Vec<RunReport> = Vec::new();

    for funder in funders {
        let mapping = config
            .mapping(funder)
            .map_err(|e| CliError::config(e.to_string()))?;

        let csv_path = base_dir.join(&mapping.file);
        let csv_data = input::read_decoded(&csv_path, mapping.encoding)
            .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", csv_path.display())))?;
        let report = load_report(&mapping.file, &csv_data, mapping)
            .map_err(|e| CliError::runtime(e.to_string()))?;

        let mut sink: Box<dyn DebugSink> = match &config.output.debug_dir {
            Some(dir) => Box::new(FileSink::new(base_dir.join(dir), file_name(&csv_path))),
            None => Box::new(NullSink),
        };

        let run_report = apcrecon_engine::run(
            &config,
            funder,
            &report,
            &lookups,
            &mut master,
            sink.as_mut(),
        )
        .map_err(|e| CliError::runtime(e.to_string()))?;

        print_summary(&run_report);
        reports.push(run_report);
    }

    if let Some(name) = &config.output.master {
        let path = base_dir.join(name);
        write_master_csv(&path, &master)
            .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {} ({} tickets)", path.display(), master.tickets.len());
    }

    if json || output.is_some() {
        let json_str = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::runtime(format!("cannot serialize reports: {e}")))?;
        if let Some(path) = output {
            std::fs::write(&path, &json_str)
                .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        if json {
            println!("{json_str}");
        }
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_text = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", config_path.display())))?;
    let config = ReconcileConfig::from_toml(&config_text)
        .map_err(|e| CliError::config(e.to_string()))?;

    let funders: Vec<&str> = config.funders.keys().map(|f| f.config_key()).collect();
    eprintln!("valid: '{}' (funders: {})", config.name, funders.join(", "));
    Ok(())
}

fn print_summary(report: &RunReport) {
    let s = &report.summary;
    eprintln!(
        "{} [{}]: {} rows — {} accepted ({} apc, {} other, {} no-tran), {} rejected ({} unmatched, {} wrong fund, {} non-qualifying)",
        report.meta.source,
        report.meta.funder,
        s.rows,
        s.accepted,
        s.apc,
        s.other_cost,
        s.no_transaction_field,
        s.rejected,
        s.unmatched,
        s.wrong_fund_source,
        s.non_qualifying,
    );
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
