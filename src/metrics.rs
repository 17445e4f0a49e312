// Derived percentages and their display formatting.
// Every ratio is guarded: a zero denominator yields 0, never NaN or inf.

use serde::Serialize;

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn pct(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Progress towards the paid-enrollment goal.
pub fn avance(pagados: u64, meta: u64) -> f64 {
    pct(pagados, meta)
}

/// Overall lead-to-paid conversion.
pub fn conversion(pagados: u64, total_leads: u64) -> f64 {
    pct(pagados, total_leads)
}

/// Direction of a Var. column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn classify(value: Option<i64>) -> Trend {
        let value = value.unwrap_or(0);
        if value > 0 {
            Trend::Up
        } else if value < 0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Flat => "–",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Trend::Up => "trend-up",
            Trend::Down => "trend-down",
            Trend::Flat => "trend-flat",
        }
    }
}

/// Group an integer's digits with `.` (es locale), e.g. `1.234.567`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

pub fn format_signed(value: i64) -> String {
    let grouped = format_count(value.unsigned_abs());
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Two decimals with es-locale separators, e.g. `1.234,50`.
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return "0,00".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{},{frac_part}", group_thousands(int_part))
}

pub fn format_pct(value: f64) -> String {
    format!("{}%", format_decimal(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_ratios() {
        assert_eq!(avance(10, 0), 0.0);
        assert_eq!(conversion(0, 0), 0.0);
        assert_eq!(avance(25, 50), 50.0);
        assert_eq!(conversion(20, 1000), 2.0);
        assert!(pct(u64::MAX, 1).is_finite());
    }

    #[test]
    fn trend_buckets() {
        assert_eq!(Trend::classify(Some(5)), Trend::Up);
        assert_eq!(Trend::classify(Some(-3)), Trend::Down);
        assert_eq!(Trend::classify(Some(0)), Trend::Flat);
        assert_eq!(Trend::classify(None), Trend::Flat);
        assert_eq!(Trend::Down.indicator(), "▼");
    }

    #[test]
    fn spanish_number_formatting() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1.000");
        assert_eq!(format_count(1_234_567), "1.234.567");
        assert_eq!(format_signed(-4500), "-4.500");
        assert_eq!(format_decimal(2.0), "2,00");
        assert_eq!(format_decimal(1234.5), "1.234,50");
        assert_eq!(format_decimal(-0.001), "0,00");
        assert_eq!(format_decimal(f64::NAN), "0,00");
        assert_eq!(format_pct(33.333), "33,33%");
    }
}
