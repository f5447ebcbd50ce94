// Fixed-period gate for the GUI input timer
//
// The outer loop spins every few milliseconds; the keypad translator
// only runs when its period has elapsed, like a GUI runtime's periodic
// input timer. The first call is always due.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollGate {
    period_ms: u64,
    last_ms: Option<u64>,
}

impl PollGate {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// True when a poll should run at `now_ms`; records it as the last run.
    pub fn due(&mut self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) if now_ms.wrapping_sub(last) < self.period_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_due_then_every_period() {
        let mut gate = PollGate::new(20);
        let due: Vec<u64> = (0..=60).step_by(5).filter(|&t| gate.due(t)).collect();
        assert_eq!(due, [0, 20, 40, 60]);
    }

    #[test]
    fn late_tick_restarts_period_from_now() {
        let mut gate = PollGate::new(20);
        assert!(gate.due(0));
        assert!(gate.due(27));
        assert!(!gate.due(45));
        assert!(gate.due(47));
    }
}
