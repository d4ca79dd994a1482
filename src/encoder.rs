//! Quadrature decode state machine for a single rotary encoder with an
//! integral momentary pushbutton.
//!
//! The decoder is pure logic: edges are delivered by the dispatch layer in
//! `main`, line levels are sampled there and passed in, and the enabled
//! signal goes out through [`EnableSink`]. Nothing here touches hardware,
//! so the whole state machine runs under test on any host.

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// One of the three monitored encoder lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    PhaseA,
    PhaseB,
    PushButton,
}

impl Line {
    pub(crate) fn index(self) -> usize {
        match self {
            Line::PhaseA => 0,
            Line::PhaseB => 1,
            Line::PushButton => 2,
        }
    }
}

/// Sampled level of a line. Always read fresh at decode time, never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl From<u8> for Level {
    fn from(v: u8) -> Self {
        match v {
            0 => Level::Low,
            _ => Level::High,
        }
    }
}

/// Physical encoder family. Fixed for the lifetime of an [`Encoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Bourns style: momentary pulses on phase A, direction taken from the
    /// phase B level at the falling edge. Only phase A is watched.
    Mechanical,
    /// CUI style: steady levels between detents, both edges of both phases
    /// are significant. Direction comes from comparing the two levels.
    Optical,
}

#[derive(Clone, Copy, Debug)]
pub struct EncoderConfig {
    pub mode: Mode,
    /// Count delta per registered transition.
    pub resolution: i32,
    /// Mid-scale count restored on every enable/disable toggle.
    pub neutral: i32,
    /// Keep the count inside [0, 4096] after every delta.
    pub clamp: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            mode: Mode::Mechanical,
            resolution: 10,
            neutral: 2048,
            clamp: true,
        }
    }
}

/// Receiver for the enabled-state notification fired on every pushbutton
/// toggle. Implementations must not block for long and must swallow their
/// own failures; the decoder fires and forgets.
pub trait EnableSink {
    fn enabled_changed(&mut self, enabled: bool);
}

/// Decoder state for one physical encoder.
///
/// Starts disabled at the neutral count. Multiple encoders are just
/// multiple values of this type, each with its own pin set.
pub struct Encoder<S> {
    config: EncoderConfig,
    position: i32,
    enabled: bool,
    sink: S,
}

impl<S: EnableSink> Encoder<S> {
    pub fn new(config: EncoderConfig, sink: S) -> Self {
        Encoder {
            position: config.neutral,
            enabled: false,
            config,
            sink,
        }
    }

    /// Accepted pushbutton edge: flip the enabled flag, recenter the count.
    ///
    /// Every toggle recenters rather than resuming the prior count, so the
    /// downstream device always comes back at the neutral voltage.
    pub fn on_pushbutton_edge(&mut self) {
        self.enabled = !self.enabled;
        self.position = self.config.neutral;
        info!(
            "encoder {}, rotation = {}",
            if self.enabled { "enabled" } else { "disabled" },
            self.position
        );
        self.sink.enabled_changed(self.enabled);
    }

    /// Accepted phase edge with both levels as sampled at dispatch time.
    ///
    /// No-op while disabled. Panics on an edge for a line this mode does
    /// not watch: that means the dispatch wiring is misconfigured.
    pub fn on_phase_edge(&mut self, line: Line, level_a: Level, level_b: Level) {
        if !self.enabled {
            debug!("encoder disabled, ignoring edge on {:?}", line);
            return;
        }
        let resolution = self.config.resolution;
        let delta = match self.config.mode {
            // Falling edge on A; B's level at that instant gives direction.
            Mode::Mechanical => match line {
                Line::PhaseA => {
                    if level_b == Level::High {
                        resolution
                    } else {
                        -resolution
                    }
                }
                other => panic!("mechanical decode watches phase A only, got {:?}", other),
            },
            // 1x decode: equality of the instantaneous levels gives
            // direction, with opposite sign depending on which phase moved.
            Mode::Optical => match line {
                Line::PhaseA => {
                    if level_a == level_b {
                        -resolution
                    } else {
                        resolution
                    }
                }
                Line::PhaseB => {
                    if level_a == level_b {
                        resolution
                    } else {
                        -resolution
                    }
                }
                Line::PushButton => panic!("pushbutton edges go to on_pushbutton_edge"),
            },
        };
        self.position += delta;
        if self.config.clamp {
            self.position = self.position.max(0).min(4096);
        }
        debug!("rotation = {}", self.position);
    }

    /// Current count. Single brief read for the output poller.
    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
