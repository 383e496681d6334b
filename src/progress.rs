use std::time::{Duration, Instant};

use ciafile::transmit::Progress;

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Logs how far along a transfer is, at most once a second
pub struct ProgressLog {
    total: u64,
    done: u64,
    started: Instant,
    last_report: Option<Instant>,
}

impl ProgressLog {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            done: 0,
            started: Instant::now(),
            last_report: None,
        }
    }
    pub fn done(&self) -> u64 {
        self.done
    }
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            100
        } else {
            (u128::from(self.done) * 100 / u128::from(self.total)).min(100) as u64
        }
    }
    /// Bytes per second since the transfer started
    pub fn speed(&self) -> u64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.done as f64 / secs) as u64
        } else {
            0
        }
    }
    /// Estimated time until everything is sent, `None` while the speed is unknown
    pub fn time_left(&self) -> Option<Duration> {
        time_left(self.total.saturating_sub(self.done), self.speed())
    }
    fn report(&mut self, now: Instant) {
        self.last_report = Some(now);
        info!(
            "{:>3}% {}/{} bytes, {} KiB/s, {} left",
            self.percent(),
            self.done,
            self.total,
            self.speed() / 1024,
            hms(self.time_left())
        );
    }
}

fn time_left(remaining: u64, speed: u64) -> Option<Duration> {
    if remaining == 0 {
        Some(Duration::ZERO)
    } else if speed == 0 {
        None
    } else {
        Some(Duration::from_secs(remaining.div_ceil(speed)))
    }
}

fn hms(time: Option<Duration>) -> String {
    match time {
        Some(time) => {
            let secs = time.as_secs();
            format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
        }
        None => "--:--:--".to_string(),
    }
}

impl Progress for ProgressLog {
    fn advance(&mut self, bytes: u64) {
        self.done += bytes;

        let now = Instant::now();
        let due = self
            .last_report
            .map_or(true, |last| now.duration_since(last) >= REPORT_INTERVAL);
        if due || self.done >= self.total {
            self.report(now);
        }
    }
}
