use std::collections::BTreeSet;

use crate::periods::PeriodRange;

/// A row predicate over the invoice table. Filters only ever narrow it, so
/// they compose in either order; views run it as a SQL `WHERE` clause and the
/// table itself is never touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subset {
    period: Option<PeriodRange>,
    countries: Option<BTreeSet<String>>,
}

impl Subset {
    /// Every row of the table.
    pub fn all() -> Self {
        Self::default()
    }

    /// The predicate as a SQL fragment with numbered `?N` placeholders.
    pub fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(p) = &self.period {
            clauses.push(format!(
                "year_month BETWEEN ?{} AND ?{}",
                params.len() + 1,
                params.len() + 2
            ));
            params.push(p.start.clone());
            params.push(p.end.clone());
        }

        if let Some(countries) = &self.countries {
            if countries.is_empty() {
                clauses.push("0".to_string());
            } else {
                let marks: Vec<String> = (0..countries.len())
                    .map(|i| format!("?{}", params.len() + i + 1))
                    .collect();
                clauses.push(format!("country IN ({})", marks.join(", ")));
                params.extend(countries.iter().cloned());
            }
        }

        if clauses.is_empty() {
            ("1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

/// Narrow to rows whose `year_month` lies in `[start, end]`. Labels are
/// zero-padded `YYYY-MM`, so string order is calendar order.
pub fn filter_by_period(subset: &Subset, start: &str, end: &str) -> Subset {
    let period = match &subset.period {
        Some(p) => PeriodRange {
            start: p.start.as_str().max(start).to_string(),
            end: p.end.as_str().min(end).to_string(),
        },
        None => PeriodRange {
            start: start.to_string(),
            end: end.to_string(),
        },
    };
    Subset {
        period: Some(period),
        countries: subset.countries.clone(),
    }
}

/// Narrow to rows whose country is in `countries`. An empty selection matches
/// nothing.
pub fn filter_by_countries(subset: &Subset, countries: &BTreeSet<String>) -> Subset {
    let countries = match &subset.countries {
        Some(current) => current.intersection(countries).cloned().collect(),
        None => countries.clone(),
    };
    Subset {
        period: subset.period.clone(),
        countries: Some(countries),
    }
}
