use log::{info, warn};

use crate::config::Config;
use crate::persist::{ResultsDb, save_results_json};
use crate::results_export::export_results_xlsx;
use crate::tournament::TournamentOutcome;

/// What happened to each configured results sink.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub saved: Vec<String>,
    pub errors: Vec<String>,
}

/// Writes a finished run to every sink the config enables. Failures are
/// collected, never propagated: the result stands whether or not it was saved.
pub fn persist_outcome(config: &Config, outcome: &TournamentOutcome) -> PersistReport {
    let mut report = PersistReport::default();

    if let Some(path) = config.results_json.as_deref() {
        match save_results_json(path, &outcome.teams) {
            Ok(()) => report.saved.push(format!("results saved to {}", path.display())),
            Err(err) => report.errors.push(format!("json save failed: {err:#}")),
        }
    }

    if let Some(path) = config.results_db.as_deref() {
        match ResultsDb::open(path).and_then(|mut db| db.record_run(outcome)) {
            Ok(run_id) => report
                .saved
                .push(format!("run #{run_id} recorded in {}", path.display())),
            Err(err) => report.errors.push(format!("sqlite save failed: {err:#}")),
        }
    }

    if let Some(path) = config.results_xlsx.as_deref() {
        match export_results_xlsx(path, outcome) {
            Ok(summary) => report.saved.push(format!(
                "workbook written to {} ({} teams, {} matches)",
                path.display(),
                summary.teams,
                summary.matches
            )),
            Err(err) => report.errors.push(format!("xlsx export failed: {err:#}")),
        }
    }

    for line in &report.saved {
        info!("{line}");
    }
    for line in &report.errors {
        warn!("{line}");
    }
    report
}
