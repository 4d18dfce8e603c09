use std::{env, str::FromStr, time::Duration};

use crate::{backend::DEFAULT_API_URL, playback::PlaybackConfig};

/// Client settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    pub api_url: String,
    /// Profile to work on when nobody logs in.
    pub profile_id: Option<String>,
    pub playback: PlaybackConfig,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            profile_id: None,
            playback: PlaybackConfig::default(),
        }
    }
}

impl TrackingConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("FLEET_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()),
            profile_id: env::var("FLEET_PROFILE_ID")
                .ok()
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty()),
            playback: PlaybackConfig::from_env(),
        }
    }
}

impl PlaybackConfig {
    /// Defaults, overridden by `PLAYBACK_STEP`, `PLAYBACK_REPORT_SECS` and
    /// `PLAYBACK_FRAME_MS` where set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            step: parse_var("PLAYBACK_STEP")
                .filter(|step: &f64| *step > 0.0 && *step <= 1.0)
                .unwrap_or(defaults.step),
            report_interval: parse_var("PLAYBACK_REPORT_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.report_interval),
            frame_interval: parse_var("PLAYBACK_FRAME_MS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_interval),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("ignoring {}={:?}: not a valid value", name, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_values_are_ignored() {
        env::set_var("TRACKING_TEST_NUMBER", "twelve");
        assert_eq!(parse_var::<u64>("TRACKING_TEST_NUMBER"), None);
        env::set_var("TRACKING_TEST_NUMBER", " 12 ");
        assert_eq!(parse_var::<u64>("TRACKING_TEST_NUMBER"), Some(12));
        assert_eq!(parse_var::<u64>("TRACKING_TEST_UNSET"), None);
    }

    #[test]
    fn playback_values_out_of_range_fall_back_to_defaults() {
        let defaults = PlaybackConfig::default();
        for (step, report, frame) in [("0", "0", "0"), ("-0.5", "-3", "-16"), ("1.5", "x", "")] {
            env::set_var("PLAYBACK_STEP", step);
            env::set_var("PLAYBACK_REPORT_SECS", report);
            env::set_var("PLAYBACK_FRAME_MS", frame);
            assert_eq!(PlaybackConfig::from_env(), defaults);
        }

        env::set_var("PLAYBACK_STEP", "0.01");
        env::set_var("PLAYBACK_REPORT_SECS", "5");
        env::set_var("PLAYBACK_FRAME_MS", "40");
        let config = PlaybackConfig::from_env();
        assert_eq!(config.step, 0.01);
        assert_eq!(config.report_interval, Duration::from_secs(5));
        assert_eq!(config.frame_interval, Duration::from_millis(40));

        for name in ["PLAYBACK_STEP", "PLAYBACK_REPORT_SECS", "PLAYBACK_FRAME_MS"] {
            env::remove_var(name);
        }
    }

    #[test]
    fn defaults_match_the_animation() {
        let config = TrackingConfig::default();
        assert_eq!(config.api_url, "http://localhost:8080/api/v1");
        assert_eq!(config.playback.step, 0.005);
        assert_eq!(config.playback.report_interval, Duration::from_secs(2));
        assert_eq!(config.playback.frame_interval, Duration::from_millis(16));
    }
}
