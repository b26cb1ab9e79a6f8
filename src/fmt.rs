fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format revenue with thousands separators and two decimals: 1,234.56
pub fn amount(val: f64) -> String {
    let negative = val < 0.0;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let sign = if negative { "-" } else { "" };
    format!("{sign}{}.{dec_part}", group_thousands(int_part))
}

pub fn number(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Compact axis label: "950", "12.5k", "3M".
pub fn compact(val: f64) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    let scaled = |v: f64, suffix: &str| {
        if v == v.floor() {
            format!("{sign}{}{suffix}", v as u64)
        } else {
            format!("{sign}{v:.1}{suffix}")
        }
    };
    if abs >= 1_000_000.0 {
        scaled(abs / 1_000_000.0, "M")
    } else if abs >= 1000.0 {
        scaled(abs / 1000.0, "k")
    } else {
        format!("{sign}{}", abs.round() as u64)
    }
}
