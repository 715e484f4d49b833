use std::time::Duration;

/// Retransmit timeout with exponential backoff.
///
/// Doubles on every trigger up to the cap and is never reduced. There is no
/// retry budget at this layer; giving up is the caller's call, driven by the
/// record layer failing fatally.
#[derive(Debug)]
pub(crate) struct Backoff {
    timeout: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(start: Duration, max: Duration) -> Self {
        Backoff {
            timeout: start,
            max,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn bump(&mut self) {
        self.timeout = (self.timeout * 2).min(self.max);
    }
}
