//! Swept response curves as CSV.
//!
//! Expected headers:
//! step,voltage
//!
//! Example:
//! step,voltage
//! 0,1.0
//! 16,1.0046
use serde::{Deserialize, Serialize};
use bias_traits::{STEP_MAX, STEP_MIN};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct CurveRow {
    pub step: i64,
    pub voltage: f32,
}

pub fn load_curve_csv(path: &Path) -> eyre::Result<Vec<CurveRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open curve CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["step", "voltage"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "curve CSV must have headers 'step,voltage', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<CurveRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<CurveRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        let (lo, hi) = (i64::from(STEP_MIN), i64::from(STEP_MAX));
        if !(lo..=hi).contains(&row.step) {
            eyre::bail!("CSV row {}: step {} outside [{lo}, {hi}]", idx + 2, row.step);
        }
        if let Some(prev) = rows.last()
            && row.step <= prev.step
        {
            eyre::bail!(
                "CSV row {}: steps must be strictly increasing ({} after {})",
                idx + 2,
                row.step,
                prev.step
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_curve_csv(path: &Path, rows: impl IntoIterator<Item = CurveRow>) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| eyre::eyre!("create curve CSV {:?}: {}", path, e))?;
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| eyre::eyre!("write curve CSV {:?}: {}", path, e))?;
    }
    wtr.flush()
        .map_err(|e| eyre::eyre!("flush curve CSV {:?}: {}", path, e))?;
    Ok(())
}
