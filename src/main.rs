mod dac;
mod debounce;
mod encoder;
mod gpio;
mod settings;

use anyhow::Result;
use dac::Dac;
use debounce::EdgeDebouncer;
use encoder::{Encoder, Line, Mode};
use gpio::{EnableSignal, EncoderPins};
use log::{debug, info, warn};
use mio::{Events, Poll, PollOpt, Ready, Token};
use settings::{Settings, Status};

use std::env;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const PHASE_A: Token = Token(0);
const PHASE_B: Token = Token(1);
const BUTTON: Token = Token(2);

// Pushing the count every 10 ms keeps CPU usage around 3 %.
const DAC_POLL_INTERVAL: Duration = Duration::from_millis(10);

const SETTINGS_PATH: &str = "/etc/trimdac.json";
const STATUS_PATH: &str = "/var/log/trimdac-status.json";

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| SETTINGS_PATH.to_string());
    let settings = Settings::load(&path);
    info!("starting with {:?}", settings);

    let pins = EncoderPins::setup(&settings)?;
    let enable = EnableSignal::setup(settings.pin_led, settings.pin_enable)?;
    let encoder = Arc::new(Mutex::new(Encoder::new(settings.encoder_config(), enable)));

    // Setup event registry
    let poll = Poll::new()?;
    let mut events = Events::with_capacity(128);

    let phase_a_events = pins.phase_a.get_async_poller()?;
    poll.register(&phase_a_events, PHASE_A, Ready::readable(), PollOpt::edge())?;
    let _phase_b_events = match settings.mode {
        // Phase B edges only matter for the optical decode.
        Mode::Optical => {
            let poller = pins.phase_b.get_async_poller()?;
            poll.register(&poller, PHASE_B, Ready::readable(), PollOpt::edge())?;
            Some(poller)
        }
        Mode::Mechanical => None,
    };
    let button_events = pins.button.get_async_poller()?;
    poll.register(&button_events, BUTTON, Ready::readable(), PollOpt::edge())?;

    // Ditch first OS event
    poll.poll(&mut events, None)?;

    // Asynchronously dispatch debounced edges to the decoder
    {
        let encoder = encoder.clone();
        let mut debouncer =
            EdgeDebouncer::new(settings.encoder_bounce(), settings.button_bounce());
        thread::spawn(move || loop {
            poll.poll(&mut events, None).expect("GPIO event poll failed");
            let now = Instant::now();
            for event in &events {
                let line = match event.token() {
                    PHASE_A => Line::PhaseA,
                    PHASE_B => Line::PhaseB,
                    BUTTON => Line::PushButton,
                    _ => unreachable!("event for unregistered token"),
                };
                if !debouncer.should_accept(line, now) {
                    continue;
                }
                let mut encoder = encoder.lock().unwrap();
                match line {
                    Line::PushButton => encoder.on_pushbutton_edge(),
                    phase => match pins.sample_levels() {
                        Ok((level_a, level_b)) => encoder.on_phase_edge(phase, level_a, level_b),
                        Err(e) => warn!("could not read phase levels, skipping edge: {}", e),
                    },
                }
            }
        });
    }

    let mut dac = Dac::open(&settings.i2c_bus, settings.dac_address)?;
    let mut last_status: Option<Status> = None;
    loop {
        let status = {
            let encoder = encoder.lock().unwrap();
            Status {
                enabled: encoder.is_enabled(),
                position: encoder.position(),
            }
        };
        dac.set_count(status.position)?;

        if last_status != Some(status) {
            debug!("dac count = {}", status.position);
            if let Err(e) = status.write_to_path(STATUS_PATH) {
                warn!("could not write status file: {}", e);
            }
            last_status = Some(status);
        }
        thread::sleep(DAC_POLL_INTERVAL);
    }
}
