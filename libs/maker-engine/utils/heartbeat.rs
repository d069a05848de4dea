//! Periodic status logging gate

use chrono::{DateTime, Duration, Utc};

pub struct Heartbeat {
    interval: Duration,
    last_beat: DateTime<Utc>,
}

impl Heartbeat {
    pub fn new(interval_secs: u64) -> Self {
        Self::starting_at(interval_secs, Utc::now())
    }

    pub fn starting_at(interval_secs: u64, now: DateTime<Utc>) -> Self {
        Self {
            interval: Duration::seconds(interval_secs as i64),
            last_beat: now,
        }
    }

    pub fn should_beat(&self) -> bool {
        self.due_at(Utc::now())
    }

    pub fn due_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_beat >= self.interval
    }

    /// Beat if due. Returns whether it did.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.due_at(now) {
            self.last_beat = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_respects_interval() {
        let t0 = Utc::now();
        let mut hb = Heartbeat::starting_at(30, t0);

        assert!(!hb.tick(t0 + Duration::seconds(29)));
        assert!(hb.tick(t0 + Duration::seconds(30)));
        // Interval restarts from the last beat
        assert!(!hb.tick(t0 + Duration::seconds(45)));
        assert!(hb.tick(t0 + Duration::seconds(61)));
    }
}
