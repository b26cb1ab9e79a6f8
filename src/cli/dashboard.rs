use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Chart, Dataset, GraphType, LineGauge, Paragraph,
        Row, Table,
    },
    DefaultTerminal, Frame,
};
use tracing::{debug, info, warn};

use crate::bindings::{
    recompute, recompute_all, ChartKind, Debouncer, Inputs, Signal, ViewId, ViewOutput,
};
use crate::cli::open_store;
use crate::error::Result;
use crate::fmt::{amount, compact, number};
use crate::geo::iso3_for;
use crate::loader::DataStore;
use crate::segments::Segment;
use crate::settings::{load_settings, resolve_data_file, Settings};
use crate::tui::{
    amount_span, install_panic_hook, month_label, shade, y_axis_ticks, AMOUNT_STYLE,
    FOCUSED_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE, TITLE_STYLE,
};
use crate::views::{CustomerSegmentation, DatedTotal, GroupTotal, MapRegion};

/// Poll interval while no input change is waiting to settle.
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Panels in reading order: left column top to bottom, then right.
const GRID: [[ViewId; 2]; 3] = [
    [ViewId::SalesOverTime, ViewId::MonthlySales],
    [ViewId::TopProducts, ViewId::CustomerSegmentation],
    [ViewId::SalesByCountry, ViewId::SalesMap],
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Handle {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Screen {
    Charts,
    CountryPicker { cursor: usize },
}

struct Dashboard<'a> {
    store: &'a DataStore,
    source: String,
    inputs: Inputs,
    defaults: Inputs,
    outputs: Vec<(ViewId, ViewOutput)>,
    handle: Handle,
    screen: Screen,
    debouncer: Debouncer,
    status_message: Option<String>,
}

impl<'a> Dashboard<'a> {
    fn new(store: &'a DataStore, settings: &Settings, source: String) -> Result<Self> {
        let defaults = Inputs::initial(store, &settings.default_countries);
        let outputs = recompute_all(store, &defaults)?;
        Ok(Self {
            store,
            source,
            inputs: defaults.clone(),
            defaults,
            outputs,
            handle: Handle::End,
            screen: Screen::Charts,
            debouncer: Debouncer::new(Duration::from_millis(settings.debounce_ms)),
            status_message: None,
        })
    }

    fn output(&self, view: ViewId) -> Option<&ViewOutput> {
        self.outputs.iter().find(|(v, _)| *v == view).map(|(_, o)| o)
    }

    /// Recompute the views bound to each settled signal.
    fn apply(&mut self, signals: &[Signal]) {
        for &signal in signals {
            debug!(signal = signal.name(), "input settled");
            match recompute(self.store, &self.inputs, signal) {
                Ok(fresh) => {
                    for (view, out) in fresh {
                        match self.outputs.iter_mut().find(|(v, _)| *v == view) {
                            Some(slot) => slot.1 = out,
                            None => self.outputs.push((view, out)),
                        }
                    }
                }
                Err(e) => {
                    warn!(signal = signal.name(), error = %e, "recompute failed");
                    self.status_message = Some(e.to_string());
                }
            }
        }
    }

    fn move_handle(&mut self, delta: i64, now: Instant) {
        let last = self.store.periods().len().saturating_sub(1) as i64;
        let (lo, hi) = self.inputs.range;
        let step = |pos: usize| (pos as i64 + delta).clamp(0, last) as usize;
        let range = match self.handle {
            Handle::Start => (step(lo).min(hi), hi),
            Handle::End => (lo, step(hi).max(lo)),
        };
        if range != self.inputs.range {
            self.inputs.range = range;
            self.debouncer.touch(Signal::DateRange, now);
        }
    }

    fn toggle_country(&mut self, idx: usize, now: Instant) {
        let Some(country) = self.store.countries().get(idx) else {
            return;
        };
        if !self.inputs.countries.remove(country) {
            self.inputs.countries.insert(country.clone());
        }
        self.debouncer.touch(Signal::Countries, now);
    }

    fn reset(&mut self, now: Instant) {
        if self.inputs.range != self.defaults.range {
            self.debouncer.touch(Signal::DateRange, now);
        }
        if self.inputs.countries != self.defaults.countries {
            self.debouncer.touch(Signal::Countries, now);
        }
        self.inputs = self.defaults.clone();
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode, now: Instant) -> bool {
        self.status_message = None;
        match self.screen {
            Screen::Charts => match code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Tab | KeyCode::BackTab => {
                    self.handle = match self.handle {
                        Handle::Start => Handle::End,
                        Handle::End => Handle::Start,
                    };
                }
                KeyCode::Left => self.move_handle(-1, now),
                KeyCode::Right => self.move_handle(1, now),
                KeyCode::Char('c') => self.screen = Screen::CountryPicker { cursor: 0 },
                KeyCode::Char('r') => self.reset(now),
                _ => {}
            },
            Screen::CountryPicker { cursor } => {
                let last = self.store.countries().len().saturating_sub(1);
                match code {
                    KeyCode::Char('q') => return true,
                    KeyCode::Esc | KeyCode::Char('c') => self.screen = Screen::Charts,
                    KeyCode::Up => {
                        self.screen = Screen::CountryPicker {
                            cursor: cursor.saturating_sub(1),
                        }
                    }
                    KeyCode::Down => {
                        self.screen = Screen::CountryPicker {
                            cursor: (cursor + 1).min(last),
                        }
                    }
                    KeyCode::Char(' ') | KeyCode::Enter => self.toggle_country(cursor, now),
                    _ => {}
                }
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Charts => self.draw_charts(frame),
            Screen::CountryPicker { cursor } => self.draw_country_picker(frame, cursor),
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let revenue: f64 = self.store.records().iter().map(|r| r.total_price).sum();
        let line = Line::from(vec![
            Span::styled(" tillroll", HEADER_STYLE),
            Span::raw(format!("  {}  ", self.source)),
            Span::styled(
                format!(
                    "{} invoice lines, {} countries, revenue ",
                    number(self.store.records().len()),
                    self.store.countries().len()
                ),
                FOOTER_STYLE,
            ),
            amount_span(revenue),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_hints(&self, frame: &mut Frame, area: Rect, hints: &str) {
        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                area,
            );
        } else {
            let pending = if self.debouncer.is_idle() { "" } else { "  updating..." };
            frame.render_widget(
                Paragraph::new(format!(" {hints}{pending}")).style(FOOTER_STYLE),
                area,
            );
        }
    }

    fn draw_charts(&self, frame: &mut Frame) {
        let area = frame.area();
        let border_style = Style::default().fg(Color::DarkGray);

        let [header_area, sep1, slider_area, countries_area, sep2, grid_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);

        self.draw_header(frame, header_area);

        let sep_line = "━".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(border_style);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget, sep2);

        frame.render_widget(Paragraph::new(self.slider_line()), slider_area);
        frame.render_widget(Paragraph::new(self.countries_line()), countries_area);

        let rows = Layout::vertical([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(grid_area);
        for (row_area, views) in rows.iter().zip(GRID.iter()) {
            let [left, right] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(*row_area);
            self.draw_panel(frame, left, views[0]);
            self.draw_panel(frame, right, views[1]);
        }

        self.draw_hints(
            frame,
            hints_area,
            "Tab=switch handle  Left/Right=move period  c=countries  r=reset  q=quit",
        );
    }

    /// `Period  [Dec 10] ●━━━━━━●──── [Dec 11]`, focused handle highlighted.
    fn slider_line(&self) -> Line<'static> {
        let periods = self.store.periods();
        let (lo, hi) = self.inputs.range;
        let handle_style = |h: Handle| {
            if h == self.handle {
                FOCUSED_STYLE
            } else {
                TITLE_STYLE
            }
        };
        let label = |i: usize| month_label(periods.get(i).unwrap_or("?"));

        let track: String = (0..periods.len())
            .map(|i| {
                if i == lo || i == hi {
                    '●'
                } else if i > lo && i < hi {
                    '━'
                } else {
                    '─'
                }
            })
            .collect();

        Line::from(vec![
            Span::raw(" Period     "),
            Span::styled(format!("[{}]", label(lo)), handle_style(Handle::Start)),
            Span::raw(" "),
            Span::styled(track, AMOUNT_STYLE),
            Span::raw(" "),
            Span::styled(format!("[{}]", label(hi)), handle_style(Handle::End)),
        ])
    }

    fn countries_line(&self) -> Line<'static> {
        let selected = if self.inputs.countries.is_empty() {
            Span::styled("(none selected)", FOOTER_STYLE)
        } else {
            Span::raw(
                self.inputs
                    .countries
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };
        Line::from(vec![Span::raw(" Countries  "), selected])
    }

    fn draw_panel(&self, frame: &mut Frame, area: Rect, view: ViewId) {
        let binding = view.binding();
        let block = Block::bordered()
            .title(Span::styled(format!(" {} ", binding.title), TITLE_STYLE))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match (binding.chart, self.output(view)) {
            (_, Some(out)) if out.is_empty() => draw_empty(frame, inner),
            (ChartKind::Line, Some(ViewOutput::Timeline(points))) => {
                draw_timeline(frame, inner, points)
            }
            (ChartKind::Bar, Some(ViewOutput::Totals(groups))) if view == ViewId::TopProducts => {
                draw_ranked_bars(frame, inner, groups)
            }
            (ChartKind::Bar, Some(ViewOutput::Totals(groups))) if view == ViewId::MonthlySales => {
                draw_bars(frame, inner, groups, month_label)
            }
            (ChartKind::Bar, Some(ViewOutput::Totals(groups))) => {
                draw_bars(frame, inner, groups, country_label)
            }
            (ChartKind::Choropleth, Some(ViewOutput::Map(regions))) => {
                draw_map(frame, inner, regions)
            }
            (ChartKind::Pie, Some(ViewOutput::Segments(seg))) => draw_segments(frame, inner, seg),
            _ => draw_empty(frame, inner),
        }
    }

    fn draw_country_picker(&self, frame: &mut Frame, cursor: usize) {
        let area = frame.area();
        let [header_area, sep, title_area, content_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.draw_header(frame, header_area);
        let sep_line = "━".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(sep_line.as_str()).style(Style::default().fg(Color::DarkGray)),
            sep,
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" Countries ({} selected)", self.inputs.countries.len()),
                TITLE_STYLE,
            )),
            title_area,
        );

        let height = content_area.height.max(1) as usize;
        let offset = cursor.saturating_sub(height - 1);
        let lines: Vec<Line> = self
            .store
            .countries()
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, country)| {
                let mark = if self.inputs.countries.contains(country) { "x" } else { " " };
                let marker = if i == cursor { ">" } else { " " };
                let text = format!(" {marker} [{mark}] {country}");
                if i == cursor {
                    Line::from(Span::styled(text, SELECTED_STYLE))
                } else {
                    Line::from(text)
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), content_area);

        self.draw_hints(frame, hints_area, "Up/Down=navigate  Space=toggle  Esc=back  q=quit");
    }
}

// ---------------------------------------------------------------------------
// Panel renderers
// ---------------------------------------------------------------------------

fn draw_empty(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(Span::styled(" No matching invoice lines", FOOTER_STYLE)),
        area,
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn country_label(country: &str) -> String {
    iso3_for(country)
        .map(str::to_string)
        .unwrap_or_else(|| truncate(country, 3))
}

fn bar_value(total: f64) -> u64 {
    total.max(0.0).round() as u64
}

fn draw_timeline(frame: &mut Frame, area: Rect, points: &[DatedTotal]) {
    let data: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.invoice_date.and_utc().timestamp() as f64, p.total))
        .collect();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return draw_empty(frame, area);
    };
    let x_min = data[0].0;
    let x_max = data[data.len() - 1].0.max(x_min + 1.0);
    let y_max = points.iter().map(|p| p.total).fold(0.0, f64::max);
    let (top, mid) = y_axis_ticks(y_max);

    let chart = Chart::new(vec![Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Braille)
        .style(AMOUNT_STYLE)
        .data(&data)])
    .x_axis(
        Axis::default()
            .style(FOOTER_STYLE)
            .bounds([x_min, x_max])
            .labels(vec![
                Span::from(first.invoice_date.format("%Y-%m-%d").to_string()),
                Span::from(last.invoice_date.format("%Y-%m-%d").to_string()),
            ]),
    )
    .y_axis(
        Axis::default()
            .style(FOOTER_STYLE)
            .bounds([0.0, top])
            .labels(vec![
                Span::from("0"),
                Span::from(compact(mid)),
                Span::from(compact(top)),
            ]),
    );
    frame.render_widget(chart, area);
}

/// Vertical bars with a round-valued y axis drawn to their left.
fn draw_bars(frame: &mut Frame, area: Rect, groups: &[GroupTotal], label: fn(&str) -> String) {
    let max_val = groups.iter().map(|g| g.total).fold(0.0, f64::max);
    let (top_tick, mid_tick) = y_axis_ticks(max_val);
    let top_label = compact(top_tick);
    let mid_label = compact(mid_tick);
    let y_label_width = top_label.len().max(mid_label.len()) as u16 + 1;

    let [y_axis_area, bar_area] =
        Layout::horizontal([Constraint::Length(y_label_width), Constraint::Fill(1)]).areas(area);

    // bottom two rows hold values and labels
    let inner_height = bar_area.height.saturating_sub(2);
    let mid_row = inner_height / 2;
    let y_lines: Vec<Line> = (0..inner_height)
        .map(|row| {
            let text = if row == 0 {
                top_label.as_str()
            } else if row == mid_row {
                mid_label.as_str()
            } else {
                ""
            };
            Line::from(Span::styled(
                format!("{:>width$}", text, width = y_label_width as usize),
                FOOTER_STYLE,
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(y_lines), y_axis_area);

    let count = groups.len().max(1) as u16;
    let bar_width = (bar_area.width / count).saturating_sub(1).clamp(1, 8);
    let bars: Vec<Bar> = groups
        .iter()
        .map(|g| {
            Bar::default()
                .value(bar_value(g.total))
                .text_value(compact(g.total))
                .label(Line::from(label(&g.label)))
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(AMOUNT_STYLE)
        .value_style(Style::default().fg(Color::Black).bg(Color::Rgb(80, 220, 100)))
        .max(bar_value(top_tick).max(1));
    frame.render_widget(chart, bar_area);
}

/// Horizontal bars, best seller first.
fn draw_ranked_bars(frame: &mut Frame, area: Rect, groups: &[GroupTotal]) {
    let label_width = (area.width / 3).max(8) as usize;
    let bars: Vec<Bar> = groups
        .iter()
        .map(|g| {
            Bar::default()
                .value(bar_value(g.total))
                .text_value(amount(g.total))
                .label(Line::from(truncate(&g.label, label_width)))
        })
        .collect();
    let chart = BarChart::default()
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .bar_style(AMOUNT_STYLE)
        .value_style(Style::default().fg(Color::Black).bg(Color::Rgb(80, 220, 100)));
    frame.render_widget(chart, area);
}

/// Choropleth as a shaded table, largest market first. Unmapped names get no
/// fill.
fn draw_map(frame: &mut Frame, area: Rect, regions: &[MapRegion]) {
    let max_val = regions.iter().map(|r| r.total).fold(0.0, f64::max);
    let mut ordered: Vec<&MapRegion> = regions.iter().collect();
    ordered.sort_by(|a, b| b.total.total_cmp(&a.total));

    let rows: Vec<Row> = ordered
        .into_iter()
        .map(|r| {
            let row = Row::new(vec![
                r.country.clone(),
                r.iso3.unwrap_or("---").to_string(),
                amount(r.total),
            ]);
            match r.iso3 {
                Some(_) if max_val > 0.0 => row.style(
                    Style::default()
                        .fg(Color::White)
                        .bg(shade(r.total / max_val)),
                ),
                _ => row.style(FOOTER_STYLE),
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Fill(1), Constraint::Length(4), Constraint::Length(16)],
    )
    .header(Row::new(vec!["Country", "ISO", "Revenue"]).style(TITLE_STYLE));
    frame.render_widget(table, area);
}

fn segment_color(segment: Segment) -> Color {
    match segment {
        Segment::Low => Color::Rgb(120, 160, 255),
        Segment::Medium => Color::Rgb(80, 220, 100),
        Segment::High => Color::Rgb(255, 200, 60),
        Segment::VeryHigh => Color::Rgb(255, 110, 90),
    }
}

/// Segment shares as one gauge per tier.
fn draw_segments(frame: &mut Frame, area: Rect, seg: &CustomerSegmentation) {
    let total = seg.total_customers().max(1);
    let mut constraints = vec![Constraint::Length(1); seg.counts.len() + 2];
    constraints.push(Constraint::Fill(1));
    let rows = Layout::vertical(constraints).split(area);

    for (c, row) in seg.counts.iter().zip(rows.iter()) {
        let ratio = c.customers as f64 / total as f64;
        let gauge = LineGauge::default()
            .label(format!(
                "{:<19}{:>7} {:>5.1}%",
                c.segment.label(),
                number(c.customers),
                ratio * 100.0
            ))
            .ratio(ratio)
            .filled_style(Style::default().fg(segment_color(c.segment)))
            .unfilled_style(Style::default().fg(Color::DarkGray))
            .line_set(symbols::line::THICK);
        frame.render_widget(gauge, *row);
    }

    let mut summary = vec![Span::styled(
        format!("{} customers", number(seg.total_customers())),
        FOOTER_STYLE,
    )];
    if seg.unclassified > 0 {
        summary.push(Span::styled(
            format!(", {} with no positive spend", number(seg.unclassified)),
            FOOTER_STYLE,
        ));
    }
    if let Some(row) = rows.get(seg.counts.len() + 1) {
        frame.render_widget(Paragraph::new(Line::from(summary)), *row);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(file: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let source = resolve_data_file(file, &settings)?.display().to_string();
    let store = open_store(file, &settings)?;
    let mut dashboard = Dashboard::new(&store, &settings, source)?;
    info!(
        records = store.records().len(),
        periods = store.periods().len(),
        "dashboard ready"
    );

    install_panic_hook();
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut dashboard);
    drop(terminal);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, dashboard: &mut Dashboard) -> Result<()> {
    loop {
        terminal.draw(|frame| dashboard.draw(frame))?;

        let timeout = dashboard
            .debouncer
            .next_deadline(Instant::now())
            .unwrap_or(IDLE_POLL);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        return Ok(());
                    }
                    if dashboard.handle_key(key.code, Instant::now()) {
                        return Ok(());
                    }
                }
            }
        }

        let ready = dashboard.debouncer.ready(Instant::now());
        if !ready.is_empty() {
            dashboard.apply(&ready);
        }
    }
}
