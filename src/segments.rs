use serde::Serialize;

/// Customer-value tiers, ordered from lowest to highest spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Segment {
    #[serde(rename = "Low Spenders")]
    Low,
    #[serde(rename = "Medium Spenders")]
    Medium,
    #[serde(rename = "High Spenders")]
    High,
    #[serde(rename = "Very High Spenders")]
    VeryHigh,
}

/// Upper bounds (inclusive) of the bounded tiers; `VeryHigh` is open-ended.
const BOUNDS: [(f64, Segment); 3] = [
    (100.0, Segment::Low),
    (500.0, Segment::Medium),
    (1000.0, Segment::High),
];

impl Segment {
    pub const ALL: [Segment; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Spenders",
            Self::Medium => "Medium Spenders",
            Self::High => "High Spenders",
            Self::VeryHigh => "Very High Spenders",
        }
    }
}

/// Bin a customer's total spend into `(0,100]`, `(100,500]`, `(500,1000]` or
/// `(1000,∞)`. Spend that is zero, negative or NaN falls outside every bin.
pub fn classify(total_spend: f64) -> Option<Segment> {
    if total_spend.is_nan() || total_spend <= 0.0 {
        return None;
    }
    BOUNDS
        .iter()
        .find(|(upper, _)| total_spend <= *upper)
        .map(|(_, seg)| *seg)
        .or(Some(Segment::VeryHigh))
}
