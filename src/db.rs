use rusqlite::{params, Connection};

use crate::models::TransactionRecord;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS invoice_lines (
    id INTEGER PRIMARY KEY,
    customer_id TEXT NOT NULL,
    description TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    unit_price REAL NOT NULL,
    total_price REAL NOT NULL,
    invoice_date TEXT NOT NULL,
    year_month TEXT NOT NULL,
    country TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoice_lines_year_month ON invoice_lines(year_month);
CREATE INDEX IF NOT EXISTS idx_invoice_lines_country ON invoice_lines(country);
";

/// A private in-memory database holding the cleaned table.
pub fn open_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Bulk insert in one transaction. Row `id` is the record's position in the
/// in-memory table, so query results map straight back to records.
pub fn insert_records(conn: &mut Connection, records: &[TransactionRecord]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO invoice_lines \
             (id, customer_id, description, quantity, unit_price, total_price, invoice_date, year_month, country) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for (i, r) in records.iter().enumerate() {
            stmt.execute(params![
                i as i64,
                r.customer_id,
                r.description,
                r.quantity,
                r.unit_price,
                r.total_price,
                r.invoice_date,
                r.year_month,
                r.country,
            ])?;
        }
    }
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_insert_and_count() {
        let mut conn = open_memory().unwrap();
        let at = NaiveDate::from_ymd_opt(2011, 1, 18)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let records = vec![
            TransactionRecord::new("12346", "STORAGE JAR", 3, 1.5, at, "United Kingdom"),
            TransactionRecord::new("13047", "LANTERN", 1, 4.0, at, "France"),
        ];
        insert_records(&mut conn, &records).unwrap();

        let (count, revenue): (i64, f64) = conn
            .query_row(
                "SELECT COUNT(*), SUM(total_price) FROM invoice_lines",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(revenue, 8.5);

        let stored: chrono::NaiveDateTime = conn
            .query_row("SELECT invoice_date FROM invoice_lines WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, at);
    }
}
