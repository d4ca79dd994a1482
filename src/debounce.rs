//! Refractory-window edge filter, the software stand-in for the bouncetime
//! RPi.GPIO applies to interrupt callbacks.
//!
//! Contact bounce shows up as a burst of edges within a few milliseconds;
//! the burst collapses to exactly one accepted edge. No attempt is made to
//! reconstruct a true edge count.

use crate::encoder::Line;
use std::time::{Duration, Instant};

pub struct EdgeDebouncer {
    encoder_window: Duration,
    button_window: Duration,
    // Timestamp of the last accepted edge, per line.
    last_accepted: [Option<Instant>; 3],
}

impl EdgeDebouncer {
    /// The two quadrature lines share `encoder_window`; the pushbutton gets
    /// its own, typically much larger, `button_window`. A zero window
    /// accepts every edge.
    pub fn new(encoder_window: Duration, button_window: Duration) -> Self {
        EdgeDebouncer {
            encoder_window,
            button_window,
            last_accepted: [None; 3],
        }
    }

    /// Accept an edge iff at least the line's window has passed since the
    /// last accepted edge on that line. The first edge is always accepted.
    pub fn should_accept(&mut self, line: Line, at: Instant) -> bool {
        let window = match line {
            Line::PushButton => self.button_window,
            _ => self.encoder_window,
        };
        let slot = &mut self.last_accepted[line.index()];
        if let Some(prev) = *slot {
            if at.saturating_duration_since(prev) < window {
                return false;
            }
        }
        *slot = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn debouncer() -> EdgeDebouncer {
        EdgeDebouncer::new(ms(30), ms(300))
    }

    #[test]
    fn first_edge_always_accepted() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert!(d.should_accept(Line::PhaseA, t0));
        assert!(d.should_accept(Line::PhaseB, t0));
        assert!(d.should_accept(Line::PushButton, t0));
    }

    #[test]
    fn burst_collapses_to_one_edge() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert!(d.should_accept(Line::PhaseA, t0));
        for i in 1..10 {
            assert!(!d.should_accept(Line::PhaseA, t0 + ms(i * 3)));
        }
    }

    #[test]
    fn spaced_edges_all_accepted() {
        let mut d = debouncer();
        let t0 = Instant::now();
        for i in 0..10 {
            assert!(d.should_accept(Line::PhaseA, t0 + ms(i * 30)));
        }
    }

    #[test]
    fn window_restarts_from_accepted_edge_only() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert!(d.should_accept(Line::PhaseA, t0));
        // Rejected bounce at +20 ms must not push the window out.
        assert!(!d.should_accept(Line::PhaseA, t0 + ms(20)));
        assert!(d.should_accept(Line::PhaseA, t0 + ms(30)));
    }

    #[test]
    fn lines_are_filtered_independently() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert!(d.should_accept(Line::PhaseA, t0));
        assert!(!d.should_accept(Line::PhaseA, t0 + ms(10)));
        // Phase B has seen nothing yet.
        assert!(d.should_accept(Line::PhaseB, t0 + ms(10)));
        // The button window is 300 ms, the encoder window 30 ms.
        assert!(d.should_accept(Line::PushButton, t0));
        assert!(!d.should_accept(Line::PushButton, t0 + ms(100)));
        assert!(d.should_accept(Line::PhaseA, t0 + ms(100)));
    }

    #[test]
    fn zero_window_disables_filtering() {
        let mut d = EdgeDebouncer::new(ms(0), ms(0));
        let t0 = Instant::now();
        for _ in 0..5 {
            assert!(d.should_accept(Line::PhaseA, t0));
            assert!(d.should_accept(Line::PushButton, t0));
        }
    }
}
