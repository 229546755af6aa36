use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};

use crate::error::AppResult;
use crate::timestamp;
use crate::types::SimulationResult;

/// Plain-text summary of a session: parameters plus the three predictions.
pub fn build_report(session: &SimulationResult) -> String {
    let params = &session.config.params;
    let metrics = &session.metrics;
    format!(
        "--- ABC THEORY REPORT ---\n\
         Timestamp: {timestamp}\n\
         \n\
         PARAMETERS:\n\
         a: {a}\n\
         b: {b}\n\
         c: {c}\n\
         \n\
         VALIDATION:\n\
         Electron: {electron:.4} MeV\n\
         Proton: {proton:.2} MeV\n\
         G: {gravity:.4e}\n\
         MATCH: {matched:.2}%",
        timestamp = session.timestamp,
        a = params.a,
        b = params.b,
        c = params.c,
        electron = metrics.electron_mass.predicted,
        proton = metrics.proton_mass.predicted,
        gravity = metrics.gravity.predicted,
        matched = metrics.match_percentage,
    )
}

pub fn report_file_name(at: SystemTime) -> String {
    format!("abc-theory-report-{}.txt", timestamp::unix_millis(at))
}

/// Writes the report into `dir`. Without a session nothing is written.
pub fn export_report(
    dir: &Path,
    session: Option<&SimulationResult>,
    at: SystemTime,
) -> AppResult<Option<PathBuf>> {
    let Some(session) = session else {
        debug!("nothing to export");
        return Ok(None);
    };

    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(at));
    fs::write(&path, build_report(session))?;
    info!(path = %path.display(), "report exported");
    Ok(Some(path))
}
