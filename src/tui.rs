use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::amount;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const FOCUSED_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

/// Revenue as a colored Span.
pub fn amount_span(val: f64) -> Span<'static> {
    Span::styled(amount(val), AMOUNT_STYLE)
}

/// Restore the terminal before the default hook prints the panic.
pub fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
}

/// Choropleth fill for a region carrying `ratio` of the largest total:
/// a dark blue ramping to bright cyan.
pub fn shade(ratio: f64) -> Color {
    let t = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let lerp = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    Color::Rgb(lerp(20.0, 90.0), lerp(40.0, 220.0), lerp(90.0, 255.0))
}

/// Pick round y-axis tick values (top and mid) given a max data value.
pub fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    // 1, 2.5, 5 per decade
    let mut step = 1.0;
    let top = loop {
        if let Some(s) = [step, step * 2.5, step * 5.0].into_iter().find(|&s| s >= max_val) {
            break s;
        }
        step *= 10.0;
        if step > 1e15 {
            break max_val;
        }
    };
    (top, top / 2.0)
}

/// "2011-03" → "Mar 11"; anything unparseable is returned as given.
pub fn month_label(year_month: &str) -> String {
    let Some((year, month)) = year_month.split_once('-') else {
        return year_month.to_string();
    };
    let name = match month {
        "01" => "Jan",
        "02" => "Feb",
        "03" => "Mar",
        "04" => "Apr",
        "05" => "May",
        "06" => "Jun",
        "07" => "Jul",
        "08" => "Aug",
        "09" => "Sep",
        "10" => "Oct",
        "11" => "Nov",
        "12" => "Dec",
        _ => return year_month.to_string(),
    };
    let yy = year.get(year.len().saturating_sub(2)..).unwrap_or(year);
    format!("{name} {yy}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_y_axis_ticks() {
        assert_eq!(y_axis_ticks(800.0), (1000.0, 500.0));
        assert_eq!(y_axis_ticks(1200.0), (2500.0, 1250.0));
        assert_eq!(y_axis_ticks(42_000.0), (50_000.0, 25_000.0));
        assert_eq!(y_axis_ticks(0.0), (1.0, 0.5));
    }

    #[test]
    fn test_shade_endpoints() {
        assert_eq!(shade(0.0), Color::Rgb(20, 40, 90));
        assert_eq!(shade(1.0), Color::Rgb(90, 220, 255));
        assert_eq!(shade(7.0), shade(1.0));
        assert_eq!(shade(f64::NAN), shade(0.0));
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2011-03"), "Mar 11");
        assert_eq!(month_label("2010-12"), "Dec 10");
        assert_eq!(month_label("garbage"), "garbage");
    }
}
