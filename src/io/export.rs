//! CSV export for step records and forward profiles.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::SimError;
use crate::sim::types::StepResult;
use crate::tariff::profile::TariffInfo;

/// Column header for step telemetry.
const HEADER: &str = "timeslot,hour_of_day,outside_temp,temperature,band,stock,\
                      outgoing_stock,incoming_stock,ancillary_kwh,cooling_kwh,\
                      total_kwh,up_regulation_kwh,down_regulation_kwh,\
                      exercised_regulation_kwh,cost";

/// Exports step records to a CSV file at `path`.
///
/// # Errors
///
/// Returns a `SimError` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_csv(results, io::BufWriter::new(file))
}

/// Writes step records as CSV to any writer.
///
/// One header row, then one row per step. Output is deterministic for
/// identical inputs.
///
/// # Errors
///
/// Returns a `SimError` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.timeslot.to_string(),
            r.hour_of_day.to_string(),
            format!("{:.3}", r.outside_temp),
            format!("{:.4}", r.temperature),
            format!("{:?}", r.band),
            format!("{:.3}", r.stock),
            format!("{:.3}", r.outgoing_stock),
            format!("{:.3}", r.incoming_stock),
            format!("{:.4}", r.ancillary_kwh),
            format!("{:.4}", r.cooling_kwh),
            format!("{:.4}", r.total_kwh),
            format!("{:.4}", r.up_regulation_kwh),
            format!("{:.4}", r.down_regulation_kwh),
            format!("{:.4}", r.exercised_regulation_kwh),
            format!("{:.4}", r.cost),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports forward profiles side by side to a CSV file at `path`.
///
/// # Errors
///
/// Returns a `SimError` if file creation or writing fails.
pub fn export_profiles_csv(profiles: &[TariffInfo], path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_profiles_csv(profiles, io::BufWriter::new(file))
}

/// Writes `hour,<tariff>,...` with one row per profile hour.
///
/// Shorter profiles leave their cells empty past their end.
///
/// # Errors
///
/// Returns a `SimError` if writing fails.
pub fn write_profiles_csv(profiles: &[TariffInfo], writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let header = std::iter::once("hour".to_string())
        .chain(profiles.iter().map(|p| format!("tariff_{}", p.tariff_id().0)));
    wtr.write_record(header)?;

    let hours = profiles.iter().map(|p| p.profile().len()).max().unwrap_or(0);
    for h in 0..hours {
        let row = std::iter::once(h.to_string()).chain(
            profiles
                .iter()
                .map(|p| p.profile().get(h).map(|kwh| format!("{kwh:.4}")).unwrap_or_default()),
        );
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}
