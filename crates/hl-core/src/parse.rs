//! Parsing of inbound bus payloads.
//!
//! Payloads arrive as free-form UTF-8 text. Every parser returns either a
//! validated value or a [`PayloadError`]; callers decide what to keep on
//! rejection (the control loops keep their prior value).

use thiserror::Error;

pub type PayloadResult<T> = Result<T, PayloadError>;

/// Reasons an inbound payload is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Empty payload")]
    Empty,

    #[error("Not a number: {payload:?}")]
    NotNumeric { payload: String },

    #[error("Non-finite number: {payload:?}")]
    NonFinite { payload: String },

    #[error("Unrecognized state: {payload:?}")]
    UnknownState { payload: String },
}

/// On/off switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        matches!(self, Switch::On)
    }
}

const SWITCH_OFF: &[&str] = &["off", "0", "false", "disable", "disabled", "standby"];

const WINDOW_OPEN: &[&str] = &["on", "open", "opened", "1", "true"];
const WINDOW_CLOSED: &[&str] = &["off", "close", "closed", "0", "false"];

/// Parse a numeric payload. Surrounding whitespace is ignored; NaN and
/// infinities are rejected.
pub fn parse_number(payload: &str) -> PayloadResult<f64> {
    let text = payload.trim();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }
    let value: f64 = text.parse().map_err(|_| PayloadError::NotNumeric {
        payload: payload.to_string(),
    })?;
    if !value.is_finite() {
        return Err(PayloadError::NonFinite {
            payload: payload.to_string(),
        });
    }
    Ok(value)
}

/// Parse a free-form mode command.
///
/// The off aliases are matched case-insensitively; any other non-empty word
/// switches on.
pub fn parse_switch(payload: &str) -> PayloadResult<Switch> {
    let text = payload.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }
    if SWITCH_OFF.contains(&text.as_str()) {
        Ok(Switch::Off)
    } else {
        Ok(Switch::On)
    }
}

/// Parse a boolean-like window state. Returns `true` when open.
pub fn parse_window(payload: &str) -> PayloadResult<bool> {
    let text = payload.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }
    if WINDOW_OPEN.contains(&text.as_str()) {
        Ok(true)
    } else if WINDOW_CLOSED.contains(&text.as_str()) {
        Ok(false)
    } else {
        Err(PayloadError::UnknownState {
            payload: payload.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_accepts_padded_values() {
        assert_eq!(parse_number("45"), Ok(45.0));
        assert_eq!(parse_number(" 52.5\n"), Ok(52.5));
        assert_eq!(parse_number("-3"), Ok(-3.0));
    }

    #[test]
    fn number_rejects_garbage() {
        assert_eq!(
            parse_number("abc"),
            Err(PayloadError::NotNumeric {
                payload: "abc".to_string()
            })
        );
        assert_eq!(parse_number("   "), Err(PayloadError::Empty));
        assert!(matches!(
            parse_number("NaN"),
            Err(PayloadError::NonFinite { .. })
        ));
        assert!(matches!(
            parse_number("inf"),
            Err(PayloadError::NonFinite { .. })
        ));
    }

    #[test]
    fn switch_off_aliases() {
        for alias in ["off", "OFF", " Off ", "0", "false", "False", "disabled"] {
            assert_eq!(parse_switch(alias), Ok(Switch::Off), "alias {alias:?}");
        }
    }

    #[test]
    fn switch_anything_else_is_on() {
        for word in ["heat", "on", "ON", "1", "auto"] {
            assert_eq!(parse_switch(word), Ok(Switch::On), "word {word:?}");
        }
        assert_eq!(parse_switch(""), Err(PayloadError::Empty));
    }

    #[test]
    fn window_states() {
        assert_eq!(parse_window("on"), Ok(true));
        assert_eq!(parse_window("OPEN"), Ok(true));
        assert_eq!(parse_window("1"), Ok(true));
        assert_eq!(parse_window("closed"), Ok(false));
        assert_eq!(parse_window("off"), Ok(false));
        assert!(matches!(
            parse_window("ajar"),
            Err(PayloadError::UnknownState { .. })
        ));
    }
}
