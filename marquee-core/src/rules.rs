use serde::Deserialize;

/// Operational knobs sourced from the settings collaborator (config file +
/// environment in this deployment). Injected into the core components so a
/// tuning change never needs a rebuild.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRules {
    #[serde(default = "default_max_seats")]
    pub max_seats_per_booking: usize,
    #[serde(default = "default_hold_minutes")]
    pub hold_minutes: i64,
    #[serde(default = "default_cancellation_window")]
    pub cancellation_window_hours: i64,
}

fn default_max_seats() -> usize {
    10
}

fn default_hold_minutes() -> i64 {
    10
}

fn default_cancellation_window() -> i64 {
    2
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_seats_per_booking: default_max_seats(),
            hold_minutes: default_hold_minutes(),
            cancellation_window_hours: default_cancellation_window(),
        }
    }
}
