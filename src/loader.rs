use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db;
use crate::error::{DataLoadError, LoadResult, Result, RetailError};
use crate::filters::Subset;
use crate::models::{ParsedRow, TransactionRecord};
use crate::periods::PeriodIndex;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "CustomerID",
    "Description",
    "Quantity",
    "UnitPrice",
    "InvoiceDate",
    "Country",
];

const UNSPECIFIED_COUNTRY: &str = "Unspecified";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw
        .trim()
        .replace(',', "")
        .replace(['£', '$', '€', '"'], "");
    s.trim().parse().ok().filter(|v: &f64| v.is_finite())
}

pub fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim().replace(',', "");
    if let Ok(q) = raw.parse::<i64>() {
        return Some(q);
    }
    let f: f64 = raw.parse().ok()?;
    (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Convert an Excel serial (days since 1899-12-30, fraction = time of day).
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    base.checked_add_signed(chrono::Duration::seconds(seconds))
}

/// Workbooks store numeric ids as floats; `17850.0` and `"17850"` are the same customer.
fn normalize_customer_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Some(format!("{}", f as i64)),
        _ => Some(raw.to_string()),
    }
}

/// UTF-8 when valid, otherwise Latin-1, the usual encoding of older retail
/// exports.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn non_blank(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

// ---------------------------------------------------------------------------
// Sheet cells: the common shape both readers produce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => non_blank(s),
            Cell::Number(n) => Some(format!("{n}")),
            Cell::DateTime(dt) => Some(dt.to_string()),
        }
    }

    fn customer_id(&self) -> Option<String> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            other => other.text().and_then(|s| normalize_customer_id(&s)),
        }
    }

    fn quantity(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Cell::Text(s) => parse_quantity(s),
            _ => None,
        }
    }

    fn amount(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_amount(s),
            _ => None,
        }
    }

    fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Number(n) => excel_serial_to_datetime(*n),
            Cell::Text(s) => parse_datetime(s),
            Cell::Empty => None,
        }
    }
}

/// A header row plus data rows, as read from the first sheet of the source.
#[derive(Debug, Default)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY_CELL: Cell = Cell::Empty;

struct ColumnMap {
    customer_id: usize,
    description: usize,
    quantity: usize,
    unit_price: usize,
    invoice_date: usize,
    country: usize,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> LoadResult<Self> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| find(**c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns(missing));
        }
        let idx = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            customer_id: idx("CustomerID"),
            description: idx("Description"),
            quantity: idx("Quantity"),
            unit_price: idx("UnitPrice"),
            invoice_date: idx("InvoiceDate"),
            country: idx("Country"),
        })
    }

    fn parse(&self, row: &[Cell]) -> ParsedRow {
        let cell = |i: usize| row.get(i).unwrap_or(&EMPTY_CELL);
        ParsedRow {
            customer_id: cell(self.customer_id).customer_id(),
            description: cell(self.description).text(),
            quantity: cell(self.quantity).quantity(),
            unit_price: cell(self.unit_price).amount(),
            invoice_date: cell(self.invoice_date).datetime(),
            country: cell(self.country).text(),
        }
    }
}

// ---------------------------------------------------------------------------
// Source formats, dispatched on the file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl SourceFormat {
    pub fn detect(path: &Path) -> LoadResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            _ => Err(DataLoadError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn read(&self, path: &Path) -> LoadResult<Sheet> {
        match self {
            Self::Csv => read_csv(path),
            #[cfg(feature = "xlsx")]
            Self::Workbook => read_workbook(path),
        }
    }
}

fn read_csv(path: &Path) -> LoadResult<Sheet> {
    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let header = rdr
        .byte_headers()?
        .iter()
        .map(|h| decode_field(h).trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(decode_field(f))
                    }
                })
                .collect(),
        );
    }
    Ok(Sheet { header, rows })
}

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path) -> LoadResult<Sheet> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| DataLoadError::Workbook(format!("Failed to open {}: {e}", path.display())))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataLoadError::NoSheets(path.display().to_string()))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| DataLoadError::Workbook(e.to_string()))?;

    let to_cell = |d: &Data| match d {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Cell::DateTime)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Cell::DateTime)
            .unwrap_or(Cell::Empty),
        _ => Cell::Empty,
    };

    let mut rows = range.rows();
    let header = rows
        .next()
        .map(|r| {
            r.iter()
                .map(|d| match d {
                    Data::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(&to_cell).collect()).collect();
    Ok(Sheet { header, rows })
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Row counts from one load, by outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub kept: usize,
    pub missing_identity: usize,
    pub non_positive_quantity: usize,
    pub malformed: usize,
}

/// Apply the cleaning rules in order: identity (customer id + description),
/// then quantity > 0, then derivation. Unparseable rows are counted, not fatal.
pub fn clean_rows(rows: Vec<ParsedRow>) -> (Vec<TransactionRecord>, LoadReport) {
    let mut report = LoadReport {
        rows_read: rows.len(),
        ..LoadReport::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.into_iter().enumerate() {
        let (Some(customer_id), Some(description)) = (row.customer_id, row.description) else {
            report.missing_identity += 1;
            continue;
        };
        let Some(quantity) = row.quantity else {
            debug!(row = i + 2, "skipping row with unparseable Quantity");
            report.malformed += 1;
            continue;
        };
        if quantity <= 0 {
            report.non_positive_quantity += 1;
            continue;
        }
        let (Some(unit_price), Some(invoice_date)) = (row.unit_price, row.invoice_date) else {
            debug!(row = i + 2, "skipping row with unparseable UnitPrice or InvoiceDate");
            report.malformed += 1;
            continue;
        };
        let country = row
            .country
            .unwrap_or_else(|| UNSPECIFIED_COUNTRY.to_string());
        records.push(TransactionRecord::new(
            customer_id,
            description,
            quantity,
            unit_price,
            invoice_date,
            country,
        ));
    }

    report.kept = records.len();
    (records, report)
}

// ---------------------------------------------------------------------------
// DataStore
// ---------------------------------------------------------------------------

/// The process-wide table: loaded once, then only ever read through `&DataStore`.
/// Rows are mirrored into a private in-memory SQLite database that the views
/// aggregate over.
#[derive(Debug)]
pub struct DataStore {
    records: Vec<TransactionRecord>,
    periods: PeriodIndex,
    countries: Vec<String>,
    report: LoadReport,
    conn: Mutex<Connection>,
}

impl DataStore {
    pub fn load(path: &Path) -> LoadResult<Self> {
        if !path.exists() {
            return Err(DataLoadError::NotFound(path.display().to_string()));
        }
        let format = SourceFormat::detect(path)?;
        let sheet = format.read(path)?;
        let store = Self::from_sheet(sheet)?;
        if store.records.is_empty() {
            return Err(DataLoadError::NoRecords(path.display().to_string()));
        }
        let r = &store.report;
        info!(
            path = %path.display(),
            rows = r.rows_read,
            kept = r.kept,
            missing_identity = r.missing_identity,
            non_positive_quantity = r.non_positive_quantity,
            malformed = r.malformed,
            periods = store.periods.len(),
            "loaded invoice lines"
        );
        Ok(store)
    }

    pub fn from_sheet(sheet: Sheet) -> LoadResult<Self> {
        let columns = ColumnMap::from_header(&sheet.header)?;
        let parsed = sheet.rows.iter().map(|r| columns.parse(r)).collect();
        let (records, report) = clean_rows(parsed);
        Self::from_records(records, report)
    }

    pub fn from_records(records: Vec<TransactionRecord>, report: LoadReport) -> LoadResult<Self> {
        let mut conn = db::open_memory()?;
        db::insert_records(&mut conn, &records)?;
        let periods = PeriodIndex::from_records(&records);
        let countries = {
            let mut seen = HashSet::new();
            records
                .iter()
                .filter(|r| seen.insert(r.country.as_str()))
                .map(|r| r.country.clone())
                .collect()
        };
        Ok(Self {
            records,
            periods,
            countries,
            report,
            conn: Mutex::new(conn),
        })
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn periods(&self) -> &PeriodIndex {
        &self.periods
    }

    /// Distinct countries in first-seen order (the selector's option list).
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Run a read-only query against the table.
    pub fn query<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RetailError::Other("invoice table lock poisoned".to_string()))?;
        Ok(f(&conn)?)
    }

    /// The rows a subset matches, in load order, borrowed from the table.
    pub fn select(&self, subset: &Subset) -> Result<Vec<&TransactionRecord>> {
        let (clause, params) = subset.where_clause();
        let ids: Vec<i64> = self.query(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id FROM invoice_lines WHERE {clause} ORDER BY id"
            ))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| row.get(0))?;
            let ids = rows.collect::<rusqlite::Result<Vec<i64>>>()?;
            Ok(ids)
        })?;
        Ok(ids
            .into_iter()
            .filter_map(|id| usize::try_from(id).ok().and_then(|i| self.records.get(i)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("2.55"), Some(2.55));
        assert_eq!(parse_amount("1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("£3.39"), Some(3.39));
        assert_eq!(parse_amount("-11062.06"), Some(-11062.06));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("-infinity"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("6"), Some(6));
        assert_eq!(parse_quantity("-12"), Some(-12));
        assert_eq!(parse_quantity("24.0"), Some(24));
        assert_eq!(parse_quantity("2.5"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2010, 12, 1)
            .unwrap()
            .and_hms_opt(8, 26, 0)
            .unwrap();
        assert_eq!(parse_datetime("12/1/2010 8:26"), Some(expected));
        assert_eq!(parse_datetime("2010-12-01 08:26:00"), Some(expected));
        assert_eq!(parse_datetime("2010-12-01T08:26:00"), Some(expected));
        assert_eq!(parse_datetime("2010-12-01T08:26:00Z"), Some(expected));
        assert_eq!(
            parse_datetime("2010-12-01"),
            NaiveDate::from_ymd_opt(2010, 12, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let dt = excel_serial_to_datetime(45667.5).unwrap();
        assert_eq!(dt.to_string(), "2025-01-10 12:00:00");
        assert_eq!(excel_serial_to_datetime(-1.0), None);
    }

    #[test]
    fn test_normalize_customer_id() {
        assert_eq!(normalize_customer_id("17850.0"), Some("17850".to_string()));
        assert_eq!(normalize_customer_id(" 13047 "), Some("13047".to_string()));
        assert_eq!(normalize_customer_id("C-100"), Some("C-100".to_string()));
        assert_eq!(normalize_customer_id(""), None);
        assert_eq!(normalize_customer_id("NaN"), None);
    }

    #[test]
    fn test_load_cleans_and_derives() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "retail.csv", &[
            HEADER,
            "536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom",
            "536365,71053,WHITE METAL LANTERN,6,12/1/2010 8:26,3.39,,United Kingdom",
            "536366,22633,,6,12/1/2010 8:28,1.85,17850,United Kingdom",
            "C536379,D,Discount,-1,12/1/2010 9:41,27.5,14527,United Kingdom",
            "536367,84406B,CREAM CUPID HEARTS COAT HANGER,8,1/5/2011 8:34,2.75,13047,France",
            "536368,22752,SET 7 BABUSHKA NESTING BOXES,two,1/5/2011 8:34,7.65,13047,France",
        ]);
        let store = DataStore::load(&path).unwrap();
        let report = store.report();
        assert_eq!(report.rows_read, 6);
        assert_eq!(report.kept, 2);
        assert_eq!(report.missing_identity, 2);
        assert_eq!(report.non_positive_quantity, 1);
        assert_eq!(report.malformed, 1);

        for r in store.records() {
            assert!(r.quantity > 0);
            assert!((r.total_price - r.quantity as f64 * r.unit_price).abs() < 1e-9);
        }
        assert_eq!(store.records()[0].year_month, "2010-12");
        assert_eq!(store.periods().labels(), &["2010-12", "2011-01"]);
        assert_eq!(store.countries(), &["United Kingdom", "France"]);
    }

    #[test]
    fn test_load_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", &[
            "InvoiceNo,Description,Quantity,InvoiceDate,CustomerID",
            "1,THING,1,12/1/2010 8:26,1",
        ]);
        match DataStore::load(&path) {
            Err(DataLoadError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["UnitPrice".to_string(), "Country".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataStore::load(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::NotFound(_)));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "retail.txt", &[HEADER]);
        let err = DataStore::load(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_with_no_surviving_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "returns.csv", &[
            HEADER,
            "C1,D,Discount,-1,12/1/2010 9:41,27.5,14527,United Kingdom",
        ]);
        let err = DataStore::load(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::NoRecords(_)));
    }

    #[test]
    fn test_blank_country_is_unspecified() {
        let sheet = Sheet {
            header: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![vec![
                Cell::Number(12346.0),
                Cell::Text("MEDIUM CERAMIC TOP STORAGE JAR".into()),
                Cell::Number(74215.0),
                Cell::Number(1.04),
                Cell::Number(40561.4375),
                Cell::Empty,
            ]],
        };
        let store = DataStore::from_sheet(sheet).unwrap();
        let r = &store.records()[0];
        assert_eq!(r.customer_id, "12346");
        assert_eq!(r.country, "Unspecified");
        assert_eq!(r.invoice_date.to_string(), "2011-01-18 10:30:00");
    }

    #[test]
    fn test_non_finite_prices_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "prices.csv", &[
            HEADER,
            "1,A,LANTERN,2,2011-01-05 10:00:00,3.0,17850,United Kingdom",
            "2,B,CANDLE,1,2011-01-06 10:00:00,NaN,17850,United Kingdom",
            "3,C,MUG,1,2011-01-07 10:00:00,inf,13047,France",
        ]);
        let store = DataStore::load(&path).unwrap();
        assert_eq!(store.report().kept, 1);
        assert_eq!(store.report().malformed, 2);
        assert!(store.records().iter().all(|r| r.total_price.is_finite()));

        let sheet = Sheet {
            header: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![vec![
                Cell::Number(12346.0),
                Cell::Text("JAR".into()),
                Cell::Number(1.0),
                Cell::Number(f64::NAN),
                Cell::Number(40561.4375),
                Cell::Text("France".into()),
            ]],
        };
        let store = DataStore::from_sheet(sheet).unwrap();
        assert!(store.records().is_empty());
        assert_eq!(store.report().malformed, 1);
    }

    #[test]
    fn test_latin1_csv_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.extend_from_slice(b"\n1,A,CAF\xC9 MUG,2,2011-01-05 10:00:00,\xA32.50,17850,United Kingdom\n");
        bytes.extend_from_slice("2,B,CAFÉ LANTERN,1,2011-01-06 10:00:00,4.00,13047,France\n".as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let store = DataStore::load(&path).unwrap();
        assert_eq!(store.report().kept, 2);
        assert_eq!(store.records()[0].description, "CAFÉ MUG");
        assert_eq!(store.records()[0].unit_price, 2.5);
        assert_eq!(store.records()[1].description, "CAFÉ LANTERN");
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_read_workbook_cells() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retail.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
        for (col, name) in ["InvoiceNo", "Description", "Quantity", "InvoiceDate", "UnitPrice", "CustomerID", " Country "]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_number(0, 7, 2011.0).unwrap();

        sheet.write_string(1, 0, "536365").unwrap();
        sheet.write_string(1, 1, "WHITE METAL LANTERN").unwrap();
        sheet.write_number(1, 2, 6.0).unwrap();
        let when = ExcelDateTime::from_ymd(2011, 1, 18)
            .unwrap()
            .and_hms(10, 30, 0)
            .unwrap();
        sheet.write_datetime_with_format(1, 3, &when, &date_format).unwrap();
        sheet.write_number(1, 4, 3.39).unwrap();
        sheet.write_number(1, 5, 17850.0).unwrap();
        sheet.write_string(1, 6, "United Kingdom").unwrap();

        sheet.write_string(2, 0, "536366").unwrap();
        sheet.write_string(2, 1, "HAND WARMER").unwrap();
        sheet.write_number(2, 2, 2.0).unwrap();
        sheet.write_number(2, 3, 40562.5).unwrap();
        sheet.write_number(2, 4, 1.85).unwrap();
        sheet.write_number(2, 5, 13047.0).unwrap();
        sheet.write_string(2, 6, "France").unwrap();
        workbook.save(&path).unwrap();

        let parsed = read_workbook(&path).unwrap();
        assert_eq!(parsed.header[6], "Country");
        assert_eq!(parsed.header[7], "2011");
        assert_eq!(
            parsed.rows[0][3],
            Cell::DateTime(parse_datetime("2011-01-18 10:30:00").unwrap())
        );

        let store = DataStore::from_sheet(parsed).unwrap();
        assert_eq!(store.report().kept, 2);
        let first = &store.records()[0];
        assert_eq!(first.customer_id, "17850");
        assert_eq!(first.invoice_date.to_string(), "2011-01-18 10:30:00");
        assert!((first.total_price - 6.0 * 3.39).abs() < 1e-9);
        let second = &store.records()[1];
        assert_eq!(second.customer_id, "13047");
        assert_eq!(second.invoice_date.to_string(), "2011-01-19 12:00:00");
        assert_eq!(store.countries(), &["United Kingdom", "France"]);
    }

    #[test]
    fn test_select_borrows_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "retail.csv", &[
            HEADER,
            "1,A,LANTERN,2,2010-12-05 10:00:00,3.0,17850,United Kingdom",
            "2,B,CANDLE,1,2011-01-06 10:00:00,4.0,13047,France",
        ]);
        let store = DataStore::load(&path).unwrap();
        let rows = store.select(&Subset::all()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(std::ptr::eq(rows[1], &store.records()[1]));
    }

    #[test]
    fn test_store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DataStore>();
    }
}
