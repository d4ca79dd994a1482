//! GPIO wiring: encoder input pins with per-mode interrupt edges, and the
//! LED / enable-signal outputs driven on every enable toggle.

use crate::encoder::{EnableSink, Level, Mode};
use crate::settings::Settings;
use anyhow::Result;
use log::warn;
use std::thread;
use std::time::Duration;
use sysfs_gpio::{Direction, Edge, Pin};

/// Width of the strobe on the enable-signal line.
const ENABLE_PULSE_WIDTH: Duration = Duration::from_millis(10);

pub struct EncoderPins {
    pub phase_a: Pin,
    pub phase_b: Pin,
    pub button: Pin,
}

impl EncoderPins {
    /// Export the three input pins and select interrupt edges for the mode:
    /// mechanical encoders pulse, so only phase A falling edges fire;
    /// optical encoders hold levels, so both edges of both phases fire.
    pub fn setup(settings: &Settings) -> Result<EncoderPins> {
        let phase_a = input_pin(settings.pin_a)?;
        let phase_b = input_pin(settings.pin_b)?;
        let button = input_pin(settings.pin_button)?;

        match settings.mode {
            Mode::Mechanical => phase_a.set_edge(Edge::FallingEdge)?,
            Mode::Optical => {
                phase_a.set_edge(Edge::BothEdges)?;
                phase_b.set_edge(Edge::BothEdges)?;
            }
        }
        button.set_edge(Edge::FallingEdge)?;

        Ok(EncoderPins {
            phase_a,
            phase_b,
            button,
        })
    }

    /// Fresh read of both phase levels at decode time.
    pub fn sample_levels(&self) -> Result<(Level, Level)> {
        let a = Level::from(self.phase_a.get_value()?);
        let b = Level::from(self.phase_b.get_value()?);
        Ok((a, b))
    }
}

fn input_pin(num: u64) -> Result<Pin> {
    let pin = Pin::new(num);
    pin.export()?;
    pin.set_direction(Direction::In)?;
    Ok(pin)
}

/// Indicator LED plus the enable strobe for the downstream controller.
///
/// The LED follows the enabled flag; the enable line is strobed on every
/// toggle. Failures are logged and dropped, the decoder never waits on or
/// retries this path.
pub struct EnableSignal {
    led: Pin,
    pulse: Pin,
}

impl EnableSignal {
    pub fn setup(led_num: u64, pulse_num: u64) -> Result<EnableSignal> {
        let led = output_pin(led_num)?;
        let pulse = output_pin(pulse_num)?;
        Ok(EnableSignal { led, pulse })
    }

    fn strobe(&self) -> Result<()> {
        self.pulse.set_value(1)?;
        thread::sleep(ENABLE_PULSE_WIDTH);
        self.pulse.set_value(0)?;
        Ok(())
    }
}

impl EnableSink for EnableSignal {
    fn enabled_changed(&mut self, enabled: bool) {
        if let Err(e) = self.led.set_value(enabled as u8) {
            warn!("could not update LED: {}", e);
        }
        if let Err(e) = self.strobe() {
            warn!("could not strobe enable signal: {}", e);
        }
    }
}

fn output_pin(num: u64) -> Result<Pin> {
    let pin = Pin::new(num);
    pin.export()?;
    pin.set_direction(Direction::Low)?;
    Ok(pin)
}
