use serde::{Deserialize, Serialize};

use crate::{RatingsError, Result};

/// Upper bound on window offsets; every playback tick walks all of them.
pub const MAX_WINDOW_SAMPLES: usize = 10_000;

/// Top-level configuration consumed by the ratings session.
///
/// The core never reads or writes the settings file itself; hosts hand over
/// the JSON text and persist whatever [`RatingsConfig::to_json_string`]
/// returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingsConfig {
    /// Live updates during playback are skipped while disabled.
    pub enabled: bool,
    /// Passed through to the swing and accuracy providers.
    pub timescale: f64,
    /// Accuracy at which the star curve is read.
    pub star_accuracy: f64,
    pub window: WindowParams,
    /// Quiet period before a burst of save notifications triggers a reload.
    pub reload_debounce_ms: u64,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timescale: 1.0,
            star_accuracy: 0.96,
            window: WindowParams::default(),
            reload_debounce_ms: 250,
        }
    }
}

impl RatingsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timescale.is_finite() && self.timescale > 0.0) {
            return Err(RatingsError::InvalidConfig(format!(
                "timescale must be positive, got {}",
                self.timescale
            )));
        }

        if !self.star_accuracy.is_finite() {
            return Err(RatingsError::InvalidConfig(
                "star accuracy must be finite".to_owned(),
            ));
        }

        self.window.validate()
    }
}

/// Shape of the Gaussian window used for live ratings.
///
/// The same offsets are applied to both time axes: beats for the swing
/// series and seconds for the accuracy series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    pub radius: f64,
    pub step: f64,
    pub sigma: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            radius: 8.0,
            step: 0.1,
            sigma: 2.5,
        }
    }
}

impl WindowParams {
    /// Number of offsets in `[-radius, radius]`, both ends included.
    pub fn sample_count(&self) -> usize {
        // * small slack so that 2R/step landing a hair below an integer
        // * still counts the closing offset
        (((2.0 * self.radius / self.step) + 1e-9).floor() as usize).saturating_add(1)
    }

    /// Offsets from `-radius` to `radius` in steps of `step`.
    pub fn offsets(&self) -> impl Iterator<Item = f64> {
        let Self { radius, step, .. } = *self;

        (0..self.sample_count()).map(move |i| -radius + i as f64 * step)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("radius", self.radius),
            ("step", self.step),
            ("sigma", self.sigma),
        ];

        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(RatingsError::InvalidConfig(format!(
                    "window {name} must be positive, got {value}"
                )));
            }
        }

        let samples = self.sample_count();
        if samples > MAX_WINDOW_SAMPLES {
            return Err(RatingsError::InvalidConfig(format!(
                "window spans {samples} offsets, at most {MAX_WINDOW_SAMPLES} allowed"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_has_161_offsets() {
        let window = WindowParams::default();
        assert_eq!(window.sample_count(), 161);

        let offsets: Vec<_> = window.offsets().collect();
        assert_eq!(offsets.len(), 161);
        assert_eq!(offsets[0], -8.0);
        assert!((offsets[80]).abs() < 1e-12);
        assert!((offsets[160] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn window_size_is_capped() {
        let largest = WindowParams {
            radius: 4_999.5,
            step: 1.0,
            sigma: 2.5,
        };
        assert_eq!(largest.sample_count(), MAX_WINDOW_SAMPLES);
        assert!(largest.validate().is_ok());

        let too_large = WindowParams {
            radius: 5_000.0,
            ..largest
        };
        assert!(too_large.validate().is_err());

        let overflowing = WindowParams {
            radius: 1e300,
            step: 1e-300,
            sigma: 2.5,
        };
        assert_eq!(overflowing.sample_count(), usize::MAX);
        assert!(overflowing.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = RatingsConfig::from_json_str(r#"{ "star_accuracy": 0.98 }"#).unwrap();

        assert_eq!(config.star_accuracy, 0.98);
        assert!(config.enabled);
        assert_eq!(config.timescale, 1.0);
        assert_eq!(config.window, WindowParams::default());
    }

    #[test]
    fn json_round_trip() {
        let config = RatingsConfig {
            enabled: false,
            timescale: 1.2,
            ..Default::default()
        };

        let json = config.to_json_string().unwrap();
        assert_eq!(RatingsConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = RatingsConfig::from_json_str(r#"{ "timescale": 0.0 }"#).unwrap_err();
        assert!(matches!(err, RatingsError::InvalidConfig(_)));

        let err = RatingsConfig::from_json_str(r#"{ "window": { "step": -0.1 } }"#).unwrap_err();
        assert!(format!("{err}").contains("step"));

        let err = RatingsConfig::from_json_str(
            r#"{ "window": { "radius": 1000000.0, "step": 0.000001, "sigma": 2.5 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, RatingsError::InvalidConfig(_)));
        assert!(format!("{err}").contains("offsets"));

        let err = RatingsConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, RatingsError::Json(_)));
    }
}
