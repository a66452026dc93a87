//! Wire encodings for outbound telemetry.

use hl_core::round_to;

/// Temperature payload: one decimal place.
pub fn temperature(value: f64) -> String {
    format!("{:.1}", round_to(value, 1))
}

/// Pressure payload: two decimal places.
pub fn pressure(value: f64) -> String {
    format!("{:.2}", round_to(value, 2))
}

/// Percentage payload, truncated toward zero to a whole number.
pub fn percent(value: f64) -> String {
    format!("{}", value.trunc() as i64)
}

pub fn count(value: usize) -> String {
    value.to_string()
}

pub fn flame(on: bool) -> String {
    let text = if on { "ON" } else { "OFF" };
    text.to_string()
}

pub fn mode(enabled: bool) -> String {
    let text = if enabled { "heat" } else { "off" };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings() {
        assert_eq!(temperature(45.26), "45.3");
        assert_eq!(temperature(30.0), "30.0");
        assert_eq!(pressure(1.5), "1.50");
        assert_eq!(percent(44.9), "44");
        assert_eq!(percent(0.0), "0");
        assert_eq!(count(2), "2");
        assert_eq!(flame(true), "ON");
        assert_eq!(mode(false), "off");
    }
}
