use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::path::Path;

use crate::signal::PpgRecording;

/// Parse a two-column comma-delimited sensor log: red counts in the first
/// column, infrared in the second, first line a header.
pub fn parse_sensor_log(text: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    read_channels(&mut reader)
}

/// Read a sensor log from disk at the given sampling rate.
pub fn read_sensor_log(path: &Path, fs: f64) -> Result<PpgRecording> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let (red, ir) = read_channels(&mut reader)?;
    Ok(PpgRecording { fs, red, ir })
}

fn read_channels<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut red = Vec::new();
    let mut ir = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading sensor row {}", idx + 1))?;
        red.push(field(&record, 0, "red", idx)?);
        ir.push(field(&record, 1, "infrared", idx)?);
    }
    if red.is_empty() {
        anyhow::bail!("no sensor samples found");
    }
    Ok((red, ir))
}

fn field(record: &StringRecord, col: usize, name: &str, row: usize) -> Result<f64> {
    let raw = record
        .get(col)
        .ok_or_else(|| anyhow::anyhow!("row {} is missing the {} column", row + 1, name))?;
    raw.parse::<f64>()
        .with_context(|| format!("row {}: {} value '{}' is not numeric", row + 1, name, raw))
}

/// Write a recording in the two-column log format the parser accepts.
pub fn write_sensor_log(path: &Path, rec: &PpgRecording) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["red", "ir"])?;
    for (red, ir) in rec.red.iter().zip(rec.ir.iter()) {
        writer.write_record([red.to_string(), ir.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_columns_and_skips_header() {
        let text = "red,ir\n10,8\n12,9\n14,10\n";
        let (red, ir) = parse_sensor_log(text).unwrap();
        assert_eq!(red, vec![10.0, 12.0, 14.0]);
        assert_eq!(ir, vec![8.0, 9.0, 10.0]);
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let err = parse_sensor_log("red,ir\n10,eight\n").unwrap_err();
        assert!(err.to_string().contains("infrared"));
    }

    #[test]
    fn rejects_missing_column() {
        let text = "red,ir\n10,8\n12\n";
        assert!(parse_sensor_log(text).is_err());
    }

    #[test]
    fn rejects_header_only_log() {
        assert!(parse_sensor_log("red,ir\n").is_err());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor.csv");
        let rec = PpgRecording {
            fs: 10.0,
            red: vec![100.0, 105.0, 102.0],
            ir: vec![200.0, 204.0, 201.0],
        };
        write_sensor_log(&path, &rec).unwrap();
        let loaded = read_sensor_log(&path, 10.0).unwrap();
        assert_eq!(loaded.red, rec.red);
        assert_eq!(loaded.ir, rec.ir);
    }
}
