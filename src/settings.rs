//! Settings file handling and the status file the daemon writes back.
//!
//! Settings come from a JSON file (path given on the command line). Every
//! field is optional and out-of-range values fall back to the documented
//! default with a warning; a bad settings file never stops the daemon.

use crate::encoder::{EncoderConfig, Mode};
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

/// Broadcom GPIO numbers usable for encoder inputs on the Pi header.
/// GPIO 2/3 are excluded, they carry the I2C bus the DAC sits on.
const BCM_PINS: &[u64] = &[
    0, 1, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
    /// BCM numbering, not header pin numbering.
    pub pin_a: u64,
    pub pin_b: u64,
    pub pin_button: u64,
    pub pin_led: u64,
    pub pin_enable: u64,
    /// Count delta per transition, 0..=200.
    pub resolution: i32,
    /// Quadrature line bounce window in ms, 0..=100.
    pub encoder_bounce_ms: u64,
    /// Pushbutton bounce window in ms, 0..=1000.
    pub button_bounce_ms: u64,
    /// Count restored on every enable toggle, 0..=4096.
    pub neutral: i32,
    pub clamp: bool,
    pub i2c_bus: String,
    pub dac_address: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mode: Mode::Mechanical,
            pin_a: 5,
            pin_b: 6,
            pin_button: 13,
            pin_led: 16,
            pin_enable: 20,
            resolution: 10,
            encoder_bounce_ms: 30,
            button_bounce_ms: 300,
            neutral: 2048,
            clamp: true,
            i2c_bus: "/dev/i2c-1".to_string(),
            dac_address: 0x62,
        }
    }
}

impl Settings {
    pub fn load_from_path(path: &str) -> Result<Settings> {
        let f = File::open(path)?;
        let reader = BufReader::new(f);
        let settings = serde_json::from_reader(reader)?;
        Ok(settings)
    }

    /// Load and validate, falling back to defaults instead of failing.
    pub fn load(path: &str) -> Settings {
        let settings = match Settings::load_from_path(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("could not read settings file {}: {}, using defaults", path, e);
                Settings::default()
            }
        };
        settings.validated()
    }

    /// Replace out-of-range values with their defaults, with a warning.
    pub fn validated(mut self) -> Settings {
        let defaults = Settings::default();
        let inputs = [self.pin_a, self.pin_b, self.pin_button];
        if inputs.iter().any(|p| !BCM_PINS.contains(p)) {
            warn!(
                "encoder pins {:?} not all valid BCM inputs, using default i/o pins",
                inputs
            );
            self.pin_a = defaults.pin_a;
            self.pin_b = defaults.pin_b;
            self.pin_button = defaults.pin_button;
        }
        if !BCM_PINS.contains(&self.pin_led) {
            warn!("invalid LED pin {}, using {}", self.pin_led, defaults.pin_led);
            self.pin_led = defaults.pin_led;
        }
        if !BCM_PINS.contains(&self.pin_enable) {
            warn!(
                "invalid enable pin {}, using {}",
                self.pin_enable, defaults.pin_enable
            );
            self.pin_enable = defaults.pin_enable;
        }
        if self.resolution < 0 || self.resolution > 200 {
            warn!(
                "resolution {} out of range 0..=200, using {}",
                self.resolution, defaults.resolution
            );
            self.resolution = defaults.resolution;
        }
        if self.encoder_bounce_ms > 100 {
            warn!(
                "encoder bounce {} ms out of range 0..=100, using {}",
                self.encoder_bounce_ms, defaults.encoder_bounce_ms
            );
            self.encoder_bounce_ms = defaults.encoder_bounce_ms;
        }
        if self.button_bounce_ms > 1000 {
            warn!(
                "button bounce {} ms out of range 0..=1000, using {}",
                self.button_bounce_ms, defaults.button_bounce_ms
            );
            self.button_bounce_ms = defaults.button_bounce_ms;
        }
        if self.neutral < 0 || self.neutral > 4096 {
            warn!(
                "neutral count {} out of range 0..=4096, using {}",
                self.neutral, defaults.neutral
            );
            self.neutral = defaults.neutral;
        }
        self
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            mode: self.mode,
            resolution: self.resolution,
            neutral: self.neutral,
            clamp: self.clamp,
        }
    }

    pub fn encoder_bounce(&self) -> Duration {
        Duration::from_millis(self.encoder_bounce_ms)
    }

    pub fn button_bounce(&self) -> Duration {
        Duration::from_millis(self.button_bounce_ms)
    }
}

/// Snapshot shared with other tooling via the status file.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Status {
    pub enabled: bool,
    pub position: i32,
}

impl Status {
    pub fn write_to_path(self, path: &str) -> Result<()> {
        let f = File::create(path)?;
        serde_json::to_writer(&f, &self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.pin_a, 5);
        assert_eq!(settings.pin_b, 6);
        assert_eq!(settings.pin_button, 13);
        assert_eq!(settings.resolution, 10);
        assert_eq!(settings.encoder_bounce_ms, 30);
        assert_eq!(settings.button_bounce_ms, 300);
        assert_eq!(settings.neutral, 2048);
        assert!(settings.clamp);
        assert_eq!(settings.mode, Mode::Mechanical);
    }

    #[test]
    fn mode_parses_lowercase() {
        let settings: Settings = serde_json::from_str(r#"{"mode": "optical"}"#).unwrap();
        assert_eq!(settings.mode, Mode::Optical);
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let settings: Settings = serde_json::from_str(
            r#"{"resolution": 500, "encoder_bounce_ms": 999, "button_bounce_ms": 5000, "neutral": 9000}"#,
        )
        .unwrap();
        let settings = settings.validated();
        assert_eq!(settings.resolution, 10);
        assert_eq!(settings.encoder_bounce_ms, 30);
        assert_eq!(settings.button_bounce_ms, 300);
        assert_eq!(settings.neutral, 2048);
    }

    #[test]
    fn invalid_input_pin_restores_whole_pin_set() {
        let settings: Settings =
            serde_json::from_str(r#"{"pin_a": 2, "pin_b": 17, "pin_button": 22}"#).unwrap();
        let settings = settings.validated();
        assert_eq!(settings.pin_a, 5);
        assert_eq!(settings.pin_b, 6);
        assert_eq!(settings.pin_button, 13);
    }

    #[test]
    fn in_range_values_survive_validation() {
        let settings: Settings = serde_json::from_str(
            r#"{"mode": "optical", "pin_a": 17, "pin_b": 27, "pin_button": 22, "resolution": 1, "encoder_bounce_ms": 0}"#,
        )
        .unwrap();
        let settings = settings.validated();
        assert_eq!(settings.pin_a, 17);
        assert_eq!(settings.pin_b, 27);
        assert_eq!(settings.pin_button, 22);
        assert_eq!(settings.resolution, 1);
        assert_eq!(settings.encoder_bounce_ms, 0);
    }
}
