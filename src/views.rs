use chrono::NaiveDateTime;
use rusqlite::params_from_iter;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::filters::Subset;
use crate::geo::iso3_for;
use crate::loader::DataStore;
use crate::segments::{classify, Segment};

pub const TOP_PRODUCTS_LIMIT: usize = 10;

/// One group key with its summed `total_price`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedTotal {
    pub invoice_date: NaiveDateTime,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRegion {
    pub country: String,
    /// `None` when the renderer does not recognise the name; the region is
    /// drawn blank.
    pub iso3: Option<&'static str>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentCount {
    pub segment: Segment,
    pub customers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerSegmentation {
    /// Segments with at least one customer, lowest tier first.
    pub counts: Vec<SegmentCount>,
    /// Customers whose spend in the subset is zero or negative.
    pub unclassified: usize,
}

impl CustomerSegmentation {
    pub fn total_customers(&self) -> usize {
        self.counts.iter().map(|c| c.customers).sum::<usize>() + self.unclassified
    }
}

/// `SUM(total_price)` per distinct `key` over the subset.
fn totals_by(
    store: &DataStore,
    subset: &Subset,
    key: &str,
    order: &str,
    limit: Option<usize>,
) -> Result<Vec<GroupTotal>> {
    let (clause, params) = subset.where_clause();
    let mut sql = format!(
        "SELECT {key}, SUM(total_price) AS total FROM invoice_lines \
         WHERE {clause} GROUP BY {key} ORDER BY {order}"
    );
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }
    store.query(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok(GroupTotal {
                label: row.get(0)?,
                total: row.get(1)?,
            })
        })?;
        let totals = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(totals)
    })
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Revenue per distinct invoice timestamp, oldest first.
pub fn sales_over_time(store: &DataStore, subset: &Subset) -> Result<Vec<DatedTotal>> {
    let (clause, params) = subset.where_clause();
    let sql = format!(
        "SELECT invoice_date, SUM(total_price) AS total FROM invoice_lines \
         WHERE {clause} GROUP BY invoice_date ORDER BY invoice_date"
    );
    store.query(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok(DatedTotal {
                invoice_date: row.get(0)?,
                total: row.get(1)?,
            })
        })?;
        let series = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(series)
    })
}

/// Revenue per country, alphabetical.
pub fn sales_by_country(store: &DataStore, subset: &Subset) -> Result<Vec<GroupTotal>> {
    totals_by(store, subset, "country", "country", None)
}

/// The ten best-selling products by revenue. Equal totals are ordered by
/// description so the cut at ten is deterministic.
pub fn top_products(store: &DataStore, subset: &Subset) -> Result<Vec<GroupTotal>> {
    totals_by(
        store,
        subset,
        "description",
        "total DESC, description ASC",
        Some(TOP_PRODUCTS_LIMIT),
    )
}

/// Country revenue keyed for the choropleth. Names outside the registry are
/// kept with no code and logged, they never fail the view.
pub fn sales_map(store: &DataStore, subset: &Subset) -> Result<Vec<MapRegion>> {
    Ok(sales_by_country(store, subset)?
        .into_iter()
        .map(|g| {
            let iso3 = iso3_for(&g.label);
            if iso3.is_none() {
                warn!(country = %g.label, "country name not recognised by the map; region left blank");
            }
            MapRegion {
                country: g.label,
                iso3,
                total: g.total,
            }
        })
        .collect())
}

/// Count customers per spend tier, where spend is summed over the subset only.
pub fn customer_segmentation(store: &DataStore, subset: &Subset) -> Result<CustomerSegmentation> {
    let (clause, params) = subset.where_clause();
    let sql = format!(
        "SELECT SUM(total_price) FROM invoice_lines WHERE {clause} GROUP BY customer_id"
    );
    let spend: Vec<f64> = store.query(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get(0))?;
        let spend = rows.collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(spend)
    })?;

    let mut tally = [0usize; Segment::ALL.len()];
    let mut unclassified = 0;
    for total in spend {
        match classify(total) {
            Some(seg) => tally[seg as usize] += 1,
            None => unclassified += 1,
        }
    }

    Ok(CustomerSegmentation {
        counts: Segment::ALL
            .into_iter()
            .zip(tally)
            .filter(|(_, customers)| *customers > 0)
            .map(|(segment, customers)| SegmentCount { segment, customers })
            .collect(),
        unclassified,
    })
}

/// Revenue per calendar month, oldest first.
pub fn monthly_sales(store: &DataStore, subset: &Subset) -> Result<Vec<GroupTotal>> {
    totals_by(store, subset, "year_month", "year_month", None)
}
