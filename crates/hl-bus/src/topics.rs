//! Topic names and topic filters.

use crate::error::{BusError, BusResult};

/// Topics owned by the boiler loop.
pub mod boiler {
    pub const WATER_TEMP: &str = "otgw/status/boiler_temp";
    pub const RETURN_TEMP: &str = "otgw/status/return_temp";
    pub const MODULATION: &str = "otgw/status/modulation";
    pub const PRESSURE: &str = "otgw/status/pressure";
    pub const FLAME: &str = "otgw/status/flame";
    pub const MODE_STATE: &str = "otgw/mode/state";
    pub const SETPOINT_STATE: &str = "otgw/setpoint/state";
    pub const DIAGNOSTICS: &str = "otgw/diagnostics";

    pub const MODE_COMMAND: &str = "otgw/mode/set";
    pub const SETPOINT_COMMAND: &str = "otgw/setpoint/set";
}

/// Topics owned by the building thermal loop.
pub mod thermal {
    pub const INDOOR_TEMP: &str = "home/sensor/indoor_temp";
    pub const OUTDOOR_TEMP: &str = "home/sensor/outdoor_temp";
    pub const HEATING_DEMAND: &str = "home/heating/demand";
    pub const WINDOWS_OPEN_COUNT: &str = "home/sensors/windows_open_count";
    pub const DIAGNOSTICS: &str = "home/thermal/state";

    pub const TARGET_COMMAND: &str = "home/thermal/target/set";
}

/// Window state topics published by the external window source.
pub mod window {
    const PREFIX: &str = "homeassistant/binary_sensor/window_";
    const SUFFIX: &str = "/state";

    /// Filter matching every window state topic.
    pub const STATE_FILTER: &str = "homeassistant/binary_sensor/+/state";

    pub fn state_topic(window_id: &str) -> String {
        format!("{PREFIX}{window_id}{SUFFIX}")
    }

    /// Extract the window id from a state topic.
    pub fn id_from_topic(topic: &str) -> Option<&str> {
        let id = topic.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        if id.is_empty() || id.contains('/') {
            None
        } else {
            Some(id)
        }
    }
}

/// A subscription filter: a literal topic or a pattern with `+` (exactly one
/// level) and a trailing `#` (zero or more levels).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    raw: String,
}

impl TopicFilter {
    pub fn parse(filter: &str) -> BusResult<Self> {
        let invalid = |reason: &'static str| BusError::InvalidTopic {
            topic: filter.to_string(),
            reason,
        };
        if filter.is_empty() {
            return Err(invalid("filter must not be empty"));
        }
        let levels: Vec<&str> = filter.split('/').collect();
        for (i, level) in levels.iter().enumerate() {
            if level.contains('#') && (*level != "#" || i != levels.len() - 1) {
                return Err(invalid("'#' must be the whole last level"));
            }
            if level.contains('+') && *level != "+" {
                return Err(invalid("'+' must be a whole level"));
            }
        }
        Ok(Self {
            raw: filter.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, topic: &str) -> bool {
        let mut filter_levels = self.raw.split('/');
        let mut topic_levels = topic.split('/');
        loop {
            match (filter_levels.next(), topic_levels.next()) {
                (Some("#"), _) => return true,
                (Some("+"), Some(_)) => {}
                (Some(f), Some(t)) if f == t => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

/// Validate a concrete topic for publishing (no wildcards, not empty).
pub fn validate_topic(topic: &str) -> BusResult<()> {
    if topic.is_empty() {
        return Err(BusError::InvalidTopic {
            topic: topic.to_string(),
            reason: "topic must not be empty",
        });
    }
    if topic.contains(['+', '#']) {
        return Err(BusError::InvalidTopic {
            topic: topic.to_string(),
            reason: "wildcards are not allowed in published topics",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_filter() {
        let f = TopicFilter::parse(boiler::SETPOINT_COMMAND).unwrap();
        assert!(f.matches("otgw/setpoint/set"));
        assert!(!f.matches("otgw/setpoint/state"));
        assert!(!f.matches("otgw/setpoint"));
        assert!(!f.matches("otgw/setpoint/set/extra"));
    }

    #[test]
    fn single_level_wildcard() {
        let f = TopicFilter::parse(window::STATE_FILTER).unwrap();
        assert!(f.matches(&window::state_topic("kitchen")));
        assert!(!f.matches("homeassistant/binary_sensor/window_kitchen/set"));
        assert!(!f.matches("homeassistant/binary_sensor/state"));
    }

    #[test]
    fn multi_level_wildcard() {
        let f = TopicFilter::parse("otgw/#").unwrap();
        assert!(f.matches("otgw/status/boiler_temp"));
        assert!(f.matches("otgw/diagnostics"));
        assert!(f.matches("otgw"));
        assert!(!f.matches("home/sensor/indoor_temp"));
    }

    #[test]
    fn rejects_malformed_filters() {
        assert!(TopicFilter::parse("").is_err());
        assert!(TopicFilter::parse("otgw/#/status").is_err());
        assert!(TopicFilter::parse("otgw/stat+").is_err());
        assert!(TopicFilter::parse("otgw/#x").is_err());
    }

    #[test]
    fn window_topic_ids() {
        let topic = window::state_topic("living_room");
        assert_eq!(topic, "homeassistant/binary_sensor/window_living_room/state");
        assert_eq!(window::id_from_topic(&topic), Some("living_room"));
        assert_eq!(window::id_from_topic("homeassistant/binary_sensor/door_x/state"), None);
        assert_eq!(window::id_from_topic("homeassistant/binary_sensor/window_/state"), None);
    }

    #[test]
    fn published_topics_have_no_wildcards() {
        assert!(validate_topic(thermal::INDOOR_TEMP).is_ok());
        assert!(validate_topic("home/+/x").is_err());
        assert!(validate_topic("").is_err());
    }
}
