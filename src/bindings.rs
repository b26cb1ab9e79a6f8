//! Dispatch table from UI input signals to chart views.
//!
//! Each chart listens to exactly one input: the period range slider or the
//! country selector. When an input changes, only the views bound to it are
//! recomputed, each from the shared read-only [`DataStore`].

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::filters::{filter_by_countries, filter_by_period, Subset};
use crate::loader::DataStore;
use crate::views::{self, CustomerSegmentation, DatedTotal, GroupTotal, MapRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    DateRange,
    Countries,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DateRange => "date range",
            Self::Countries => "country",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ViewId {
    SalesOverTime,
    SalesByCountry,
    TopProducts,
    SalesMap,
    CustomerSegmentation,
    MonthlySales,
}

impl ViewId {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SalesOverTime => "sales-over-time",
            Self::SalesByCountry => "sales-by-country",
            Self::TopProducts => "top-products",
            Self::SalesMap => "sales-map",
            Self::CustomerSegmentation => "customer-segmentation",
            Self::MonthlySales => "monthly-sales",
        }
    }

    /// The view's row in [`BINDINGS`].
    pub fn binding(&self) -> &'static Binding {
        let index = match self {
            Self::SalesOverTime => 0,
            Self::SalesByCountry => 1,
            Self::TopProducts => 2,
            Self::SalesMap => 3,
            Self::CustomerSegmentation => 4,
            Self::MonthlySales => 5,
        };
        &BINDINGS[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Choropleth,
    Pie,
}

/// Summary table produced by one view, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewOutput {
    Timeline(Vec<DatedTotal>),
    Totals(Vec<GroupTotal>),
    Map(Vec<MapRegion>),
    Segments(CustomerSegmentation),
}

impl ViewOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Timeline(v) => v.is_empty(),
            Self::Totals(v) => v.is_empty(),
            Self::Map(v) => v.is_empty(),
            Self::Segments(s) => s.counts.is_empty() && s.unclassified == 0,
        }
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        match self {
            Self::Timeline(points) => {
                wtr.write_record(["invoice_date", "total"])?;
                for p in points {
                    wtr.write_record([p.invoice_date.to_string(), format!("{:.2}", p.total)])?;
                }
            }
            Self::Totals(groups) => {
                wtr.write_record(["label", "total"])?;
                for g in groups {
                    wtr.write_record([g.label.clone(), format!("{:.2}", g.total)])?;
                }
            }
            Self::Map(regions) => {
                wtr.write_record(["country", "iso3", "total"])?;
                for r in regions {
                    wtr.write_record([
                        r.country.clone(),
                        r.iso3.unwrap_or_default().to_string(),
                        format!("{:.2}", r.total),
                    ])?;
                }
            }
            Self::Segments(seg) => {
                wtr.write_record(["segment", "customers"])?;
                for c in &seg.counts {
                    wtr.write_record([c.segment.label().to_string(), c.customers.to_string()])?;
                }
                wtr.write_record(["unclassified".to_string(), seg.unclassified.to_string()])?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

pub struct Binding {
    pub view: ViewId,
    pub input: Signal,
    pub chart: ChartKind,
    pub title: &'static str,
    compute: fn(&DataStore, &Subset) -> Result<ViewOutput>,
}

impl Binding {
    pub fn compute(&self, store: &DataStore, subset: &Subset) -> Result<ViewOutput> {
        (self.compute)(store, subset)
    }
}

pub static BINDINGS: &[Binding] = &[
    Binding {
        view: ViewId::SalesOverTime,
        input: Signal::DateRange,
        chart: ChartKind::Line,
        title: "Sales Over Time",
        compute: |store, s| Ok(ViewOutput::Timeline(views::sales_over_time(store, s)?)),
    },
    Binding {
        view: ViewId::SalesByCountry,
        input: Signal::Countries,
        chart: ChartKind::Bar,
        title: "Sales by Country",
        compute: |store, s| Ok(ViewOutput::Totals(views::sales_by_country(store, s)?)),
    },
    Binding {
        view: ViewId::TopProducts,
        input: Signal::DateRange,
        chart: ChartKind::Bar,
        title: "Top Products",
        compute: |store, s| Ok(ViewOutput::Totals(views::top_products(store, s)?)),
    },
    Binding {
        view: ViewId::SalesMap,
        input: Signal::DateRange,
        chart: ChartKind::Choropleth,
        title: "Sales Map",
        compute: |store, s| Ok(ViewOutput::Map(views::sales_map(store, s)?)),
    },
    Binding {
        view: ViewId::CustomerSegmentation,
        input: Signal::DateRange,
        chart: ChartKind::Pie,
        title: "Customer Segmentation",
        compute: |store, s| Ok(ViewOutput::Segments(views::customer_segmentation(store, s)?)),
    },
    Binding {
        view: ViewId::MonthlySales,
        input: Signal::DateRange,
        chart: ChartKind::Bar,
        title: "Monthly Sales",
        compute: |store, s| Ok(ViewOutput::Totals(views::monthly_sales(store, s)?)),
    },
];

/// Current values of the two UI controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    /// Slider positions into the period index, `lo <= hi`.
    pub range: (usize, usize),
    pub countries: BTreeSet<String>,
}

impl Inputs {
    /// Full period range and the configured default countries.
    pub fn initial(store: &DataStore, default_countries: &[String]) -> Self {
        Self {
            range: store.periods().full_range().unwrap_or((0, 0)),
            countries: default_countries.iter().cloned().collect(),
        }
    }
}

/// Filter the table along the binding's single input, then run its view.
pub fn evaluate(store: &DataStore, binding: &Binding, inputs: &Inputs) -> Result<ViewOutput> {
    let subset = match binding.input {
        Signal::DateRange => {
            let (lo, hi) = inputs.range;
            let range = store.periods().resolve(lo, hi)?;
            filter_by_period(&Subset::all(), &range.start, &range.end)
        }
        Signal::Countries => filter_by_countries(&Subset::all(), &inputs.countries),
    };
    debug!(view = binding.view.key(), filter = ?subset, "recomputing view");
    binding.compute(store, &subset)
}

/// Recompute the views bound to `signal`, in table order.
pub fn recompute(
    store: &DataStore,
    inputs: &Inputs,
    signal: Signal,
) -> Result<Vec<(ViewId, ViewOutput)>> {
    BINDINGS
        .iter()
        .filter(|b| b.input == signal)
        .map(|b| Ok((b.view, evaluate(store, b, inputs)?)))
        .collect()
}

pub fn recompute_all(store: &DataStore, inputs: &Inputs) -> Result<Vec<(ViewId, ViewOutput)>> {
    BINDINGS
        .iter()
        .map(|b| Ok((b.view, evaluate(store, b, inputs)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

/// Coalesces bursts of input changes: a signal fires once its control has
/// been quiet for the configured interval.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Vec<(Signal, Instant)>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Vec::new(),
        }
    }

    pub fn touch(&mut self, signal: Signal, now: Instant) {
        match self.pending.iter_mut().find(|(s, _)| *s == signal) {
            Some(entry) => entry.1 = now,
            None => self.pending.push((signal, now)),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time until the earliest pending signal becomes ready.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.pending
            .iter()
            .map(|(_, t)| (*t + self.quiet).saturating_duration_since(now))
            .min()
    }

    /// Remove and return the signals whose quiet period has elapsed.
    pub fn ready(&mut self, now: Instant) -> Vec<Signal> {
        let quiet = self.quiet;
        let (fired, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|(_, t)| now.saturating_duration_since(*t) >= quiet);
        self.pending = waiting;
        let mut signals: Vec<Signal> = fired.into_iter().map(|(s, _)| s).collect();
        signals.sort();
        signals
    }
}
