//! CSV export for analysis snapshots.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::Snapshot;

/// Column header for snapshot export.
pub const HEADER: &str = "day,indoor_temp_f,electricity_w,electricity_usd,\
                       water_gal,water_usd,total_usd";

/// Exports snapshots to a CSV file at the given path.
///
/// Writes a header row followed by one row per snapshot. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(snapshots: &[Snapshot], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(snapshots, buf)
}

/// Writes snapshots as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(snapshots: &[Snapshot], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for s in snapshots {
        wtr.write_record(&[
            format!("{:.5}", s.time),
            format!("{:.3}", s.indoor_temp),
            format!("{:.3}", s.electricity.watts),
            format!("{:.6}", s.electricity.dollars),
            format!("{:.3}", s.water.gallons),
            format!("{:.6}", s.water.dollars),
            format!("{:.6}", s.total_dollars),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
