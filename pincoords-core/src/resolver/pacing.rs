use std::time::Duration;

/// Fixed-interval gate between consecutive requests.
///
/// The first `wait` returns immediately; every later one sleeps the
/// configured interval. A zero interval never sleeps, which keeps resolver
/// tests free of wall-clock delay.
#[derive(Debug)]
pub struct IntervalGate {
    interval: Duration,
    primed: bool,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval, primed: false }
    }

    pub async fn wait(&mut self) {
        if self.primed && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.primed = true;
    }
}
