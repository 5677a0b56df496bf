use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::path::Path;

/// Parse a single-column reference SpO2 trace, one value per analysis
/// window, first line a header.
pub fn parse_reference_trace(text: &str) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let mut values = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading reference row {}", idx + 1))?;
        let raw = record
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("reference row {} is empty", idx + 1))?;
        let value: f64 = raw
            .parse()
            .with_context(|| format!("row {}: reference value '{}' is not numeric", idx + 1, raw))?;
        values.push(value);
    }
    if values.is_empty() {
        anyhow::bail!("no reference values found");
    }
    Ok(values)
}

/// Read a reference trace from disk.
pub fn read_reference_trace(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_reference_trace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_column_after_header() {
        let values = parse_reference_trace("spo2\n98\n97\n98\n").unwrap();
        assert_eq!(values, vec![98.0, 97.0, 98.0]);
    }

    #[test]
    fn rejects_empty_trace() {
        assert!(parse_reference_trace("spo2\n").is_err());
    }

    #[test]
    fn rejects_non_numeric_value() {
        let err = parse_reference_trace("spo2\nlow\n").unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }
}
