use chrono::NaiveDateTime;
use serde::Serialize;

/// One cleaned invoice line. Built once by the loader and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub customer_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub invoice_date: NaiveDateTime,
    pub year_month: String,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub country: String,
}

impl TransactionRecord {
    /// Build a record from source values, deriving the price and calendar
    /// columns. Callers are responsible for the quantity/identity filters.
    pub fn new(
        customer_id: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
        unit_price: f64,
        invoice_date: NaiveDateTime,
        country: impl Into<String>,
    ) -> Self {
        use chrono::Datelike;

        Self {
            customer_id: customer_id.into(),
            description: description.into(),
            quantity,
            unit_price,
            total_price: quantity as f64 * unit_price,
            invoice_date,
            year_month: invoice_date.format("%Y-%m").to_string(),
            day_of_week: invoice_date.weekday().num_days_from_monday(),
            day_of_month: invoice_date.day(),
            country: country.into(),
        }
    }
}

/// Intermediate representation of one sheet row before cleaning.
#[derive(Debug, Clone, Default)]
pub struct ParsedRow {
    pub customer_id: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub invoice_date: Option<NaiveDateTime>,
    pub country: Option<String>,
}
