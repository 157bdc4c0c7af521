// Customer-facing markup applied to wholesale/base prices

pub const FLOOR_FEE: f64 = 35.0;
pub const MARKUP_RATE: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkedUpPrice {
    pub base: f64,
    pub markup: f64,
    pub final_price: f64,
}

// markup = max(FLOOR_FEE, MARKUP_RATE * base), rounded to cents
pub fn apply_markup(base: f64) -> MarkedUpPrice {
    let markup = round_cents(FLOOR_FEE.max(MARKUP_RATE * base));
    MarkedUpPrice {
        base,
        markup,
        final_price: round_cents(base + markup),
    }
}

// Same rule lifted over an optional base; absent stays absent
pub fn marked_up(base: Option<f64>) -> Option<f64> {
    base.filter(|b| b.is_finite() && *b >= 0.0)
        .map(|b| apply_markup(b).final_price)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
