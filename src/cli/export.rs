use std::path::{Path, PathBuf};

use crate::bindings::{evaluate, Inputs, BINDINGS};
use crate::cli::{open_store, ExportFormat, FilterArgs};
use crate::error::Result;
use crate::loader::DataStore;
use crate::settings::load_settings;

fn default_dir() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    PathBuf::from(format!("tillroll-export-{date}"))
}

pub fn run(
    file: Option<&str>,
    output_dir: Option<String>,
    format: ExportFormat,
    records: bool,
    filters: &FilterArgs,
) -> Result<()> {
    let settings = load_settings();
    let store = open_store(file, &settings)?;
    let inputs = filters.to_inputs(&store, &settings)?;
    let dir = output_dir.map(PathBuf::from).unwrap_or_else(default_dir);

    for path in write_all(&store, &inputs, &dir, format, records)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Write one file per view, plus `records.csv` when asked. Returns the paths
/// in the order written.
pub fn write_all(
    store: &DataStore,
    inputs: &Inputs,
    dir: &Path,
    format: ExportFormat,
    records: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for binding in BINDINGS {
        let output = evaluate(store, binding, inputs)?;
        let path = dir.join(format!("{}.{}", binding.view.key(), format.extension()));
        let file = std::fs::File::create(&path)?;
        match format {
            ExportFormat::Json => serde_json::to_writer_pretty(file, &output)?,
            ExportFormat::Csv => output.write_csv(file)?,
        }
        written.push(path);
    }

    if records {
        let path = dir.join("records.csv");
        let mut wtr = csv::Writer::from_path(&path)?;
        for r in store.records() {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadReport;
    use crate::models::TransactionRecord;
    use chrono::NaiveDate;

    fn store() -> DataStore {
        let at = |m: u32, d: u32| {
            NaiveDate::from_ymd_opt(2020, m, d)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        };
        DataStore::from_records(
            vec![
                TransactionRecord::new("1", "LANTERN", 2, 50.0, at(1, 5), "United Kingdom"),
                TransactionRecord::new("2", "CANDLE", 1, 150.0, at(2, 10), "United Kingdom"),
            ],
            LoadReport::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_write_all_csv_with_records() {
        let s = store();
        let inputs = Inputs::initial(&s, &["United Kingdom".to_string()]);
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(&s, &inputs, dir.path(), ExportFormat::Csv, true).unwrap();
        assert_eq!(paths.len(), BINDINGS.len() + 1);

        let monthly = std::fs::read_to_string(dir.path().join("monthly-sales.csv")).unwrap();
        assert_eq!(monthly, "label,total\n2020-01,100.00\n2020-02,150.00\n");

        let records = std::fs::read_to_string(dir.path().join("records.csv")).unwrap();
        let header = records.lines().next().unwrap();
        assert!(header.starts_with("customer_id,description,quantity,unit_price,total_price"));
        assert_eq!(records.lines().count(), 3);
    }

    #[test]
    fn test_write_all_json() {
        let s = store();
        let inputs = Inputs::initial(&s, &[]);
        let dir = tempfile::tempdir().unwrap();
        write_all(&s, &inputs, dir.path(), ExportFormat::Json, false).unwrap();
        assert!(!dir.path().join("records.csv").exists());

        let seg: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("customer-segmentation.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(seg["counts"][0]["segment"], "Low Spenders");
        assert_eq!(seg["counts"][1]["customers"], 1);

        let by_country: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("sales-by-country.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(by_country, serde_json::json!([]));
    }
}
