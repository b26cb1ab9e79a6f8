use colored::Colorize;
use tracing::warn;

use crate::error::{Result, RetailError};
use crate::loader::DataStore;
use crate::settings::{load_settings, save_settings, shellexpand_path};

/// Check the file loads, then remember it along with the dashboard defaults.
pub fn run(file: Option<&str>, countries: Vec<String>, debounce_ms: Option<u64>) -> Result<()> {
    let file = file.ok_or(RetailError::NoDataFile)?;
    let path = shellexpand_path(file);
    let store = DataStore::load(std::path::Path::new(&path))?;

    let mut settings = load_settings();
    settings.data_file = Some(path.clone());
    if !countries.is_empty() {
        settings.default_countries = countries;
    }
    if let Some(ms) = debounce_ms {
        settings.debounce_ms = ms;
    }

    for c in &settings.default_countries {
        if !store.countries().contains(c) {
            warn!(country = %c, "default country does not occur in the data");
            println!("{} {c} does not occur in {path}", "warning:".yellow());
        }
    }

    save_settings(&settings)?;
    println!(
        "Data file set to {path} ({} invoice lines, {} periods).",
        store.records().len(),
        store.periods().len()
    );
    println!("Default countries: {}", settings.default_countries.join(", "));
    Ok(())
}
