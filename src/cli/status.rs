use crate::cli::open_store;
use crate::error::{Result, RetailError};
use crate::fmt::number;
use crate::geo::iso3_for;
use crate::settings::{config_dir, load_settings, resolve_data_file};

pub fn run(file: Option<&str>) -> Result<()> {
    let settings = load_settings();

    println!("Config dir:   {}", config_dir().display());
    println!("Selection:    {}", settings.default_countries.join(", "));
    println!("Debounce:     {} ms", settings.debounce_ms);

    let path = match resolve_data_file(file, &settings) {
        Ok(path) => path,
        Err(RetailError::NoDataFile) => {
            println!();
            println!("No data file configured. Run `tillroll init --file <PATH>` to set one.");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    println!("Data file:    {}", path.display());

    let store = open_store(file, &settings)?;
    let report = store.report();
    let periods = store.periods();

    println!();
    println!("Rows read:              {}", number(report.rows_read));
    println!("Kept:                   {}", number(report.kept));
    println!("Missing customer/desc:  {}", number(report.missing_identity));
    println!("Quantity <= 0:          {}", number(report.non_positive_quantity));
    println!("Unparseable:            {}", number(report.malformed));
    println!();
    println!(
        "Periods:      {} ({} to {})",
        periods.len(),
        periods.labels().first().map(String::as_str).unwrap_or("-"),
        periods.labels().last().map(String::as_str).unwrap_or("-"),
    );
    println!("Countries:    {}", store.countries().len());

    Ok(())
}

pub fn periods(file: Option<&str>) -> Result<()> {
    let store = open_store(file, &load_settings())?;
    for (i, label) in store.periods().labels().iter().enumerate() {
        println!("{i:>3}  {label}");
    }
    Ok(())
}

/// Countries in the order the selector offers them. Names the map cannot
/// place are marked.
pub fn countries(file: Option<&str>) -> Result<()> {
    let store = open_store(file, &load_settings())?;
    for country in store.countries() {
        match iso3_for(country) {
            Some(code) => println!("{code}  {country}"),
            None => println!("---  {country}  (not on map)"),
        }
    }
    Ok(())
}
