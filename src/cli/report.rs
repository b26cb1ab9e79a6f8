use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::bindings::{evaluate, Binding, Inputs, Signal, ViewId, ViewOutput};
use crate::cli::{open_store, FilterArgs};
use crate::error::Result;
use crate::fmt::{amount, number};
use crate::loader::DataStore;
use crate::settings::load_settings;

pub fn run(file: Option<&str>, view: ViewId, filters: &FilterArgs, json: bool) -> Result<()> {
    let binding = view.binding();
    filters.check_applies(binding)?;

    let settings = load_settings();
    let store = open_store(file, &settings)?;
    let inputs = filters.to_inputs(&store, &settings)?;
    let output = evaluate(&store, binding, &inputs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_view(binding, &filter_label(binding, &store, &inputs), &output));
    }
    Ok(())
}

/// Human description of the control value a view was computed under.
pub fn filter_label(binding: &Binding, store: &DataStore, inputs: &Inputs) -> String {
    match binding.input {
        Signal::DateRange => {
            let (lo, hi) = inputs.range;
            let periods = store.periods();
            format!(
                "{} to {}",
                periods.get(lo).unwrap_or("?"),
                periods.get(hi).unwrap_or("?")
            )
        }
        Signal::Countries if inputs.countries.is_empty() => "no countries selected".to_string(),
        Signal::Countries => inputs
            .countries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn group_header(view: ViewId) -> &'static str {
    match view {
        ViewId::SalesByCountry => "Country",
        ViewId::TopProducts => "Product",
        ViewId::MonthlySales => "Month",
        _ => "Group",
    }
}

fn amount_cell(val: f64) -> Cell {
    Cell::new(amount(val)).set_alignment(CellAlignment::Right)
}

// ---------------------------------------------------------------------------
// Pure formatting (view output → String)
// ---------------------------------------------------------------------------

pub fn format_view(binding: &Binding, filter: &str, output: &ViewOutput) -> String {
    let heading = format!("{}  {}", binding.title.bold(), filter.dimmed());
    if output.is_empty() {
        return format!("{heading}\n(no matching invoice lines)");
    }

    let mut table = Table::new();
    match output {
        ViewOutput::Timeline(points) => {
            table.set_header(vec!["Invoice Date", "Revenue"]);
            for p in points {
                table.add_row(vec![
                    Cell::new(p.invoice_date.format("%Y-%m-%d %H:%M")),
                    amount_cell(p.total),
                ]);
            }
            let total: f64 = points.iter().map(|p| p.total).sum();
            table.add_row(vec![Cell::new("Total".bold()), amount_cell(total)]);
        }
        ViewOutput::Totals(groups) => {
            table.set_header(vec![group_header(binding.view), "Revenue"]);
            for g in groups {
                table.add_row(vec![Cell::new(&g.label), amount_cell(g.total)]);
            }
        }
        ViewOutput::Map(regions) => {
            table.set_header(vec!["Country", "ISO-3", "Revenue"]);
            for r in regions {
                let code = match r.iso3 {
                    Some(code) => code.normal(),
                    None => "unmapped".yellow(),
                };
                table.add_row(vec![Cell::new(&r.country), Cell::new(code), amount_cell(r.total)]);
            }
        }
        ViewOutput::Segments(seg) => {
            let total = seg.total_customers().max(1) as f64;
            table.set_header(vec!["Segment", "Customers", "Share"]);
            for c in &seg.counts {
                table.add_row(vec![
                    Cell::new(c.segment.label()),
                    Cell::new(number(c.customers)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.1}%", c.customers as f64 / total * 100.0))
                        .set_alignment(CellAlignment::Right),
                ]);
            }
            if seg.unclassified > 0 {
                table.add_row(vec![
                    Cell::new("No positive spend".dimmed()),
                    Cell::new(number(seg.unclassified)).set_alignment(CellAlignment::Right),
                    Cell::new(""),
                ]);
            }
        }
    }
    format!("{heading}\n{table}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{CustomerSegmentation, GroupTotal, MapRegion, SegmentCount};
    use crate::segments::Segment;

    #[test]
    fn test_format_monthly_sales() {
        let out = ViewOutput::Totals(vec![
            GroupTotal { label: "2020-01".into(), total: 100.0 },
            GroupTotal { label: "2020-02".into(), total: 1500.5 },
        ]);
        let text = format_view(ViewId::MonthlySales.binding(), "2020-01 to 2020-02", &out);
        assert!(text.contains("Monthly Sales"));
        assert!(text.contains("Month"));
        assert!(text.contains("2020-02"));
        assert!(text.contains("1,500.50"));
    }

    #[test]
    fn test_format_empty_output() {
        let out = ViewOutput::Totals(Vec::new());
        let text = format_view(ViewId::SalesByCountry.binding(), "no countries selected", &out);
        assert!(text.contains("no matching invoice lines"));
    }

    #[test]
    fn test_format_segments_with_unclassified() {
        let out = ViewOutput::Segments(CustomerSegmentation {
            counts: vec![
                SegmentCount { segment: Segment::Low, customers: 3 },
                SegmentCount { segment: Segment::VeryHigh, customers: 1 },
            ],
            unclassified: 1,
        });
        let text = format_view(ViewId::CustomerSegmentation.binding(), "", &out);
        assert!(text.contains("Low Spenders"));
        assert!(text.contains("Very High Spenders"));
        assert!(text.contains("60.0%"));
        assert!(text.contains("No positive spend"));
    }

    #[test]
    fn test_format_map_marks_unmapped() {
        let out = ViewOutput::Map(vec![MapRegion {
            country: "EIRE".into(),
            iso3: None,
            total: 10.0,
        }]);
        let text = format_view(ViewId::SalesMap.binding(), "", &out);
        assert!(text.contains("EIRE"));
        assert!(text.contains("unmapped"));
    }
}
