use serde::{Deserialize, Serialize};

/// This allows for testing the program without hitting Google Maps or the dashboard API. When
/// `HAULBOARD_IN_TEST_MODE` is set and non-zero in length, then the mode will be `Mode::Test`,
/// otherwise it will be `Mode::Live`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Use Google Maps and the configured record store.
    #[default]
    Live,
    /// Use in-memory collaborators seeded with sample data.
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

const TEST_MODE_VAR: &str = "HAULBOARD_IN_TEST_MODE";

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(s) if !s.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}
