use std::time::Duration;

/// Reliable handshake configuration.
#[derive(Debug, Clone)]
pub struct Config {
    retransmit_start_rto: Duration,
    retransmit_max_rto: Duration,
    max_message_len: usize,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            retransmit_start_rto: Duration::from_secs(1),
            retransmit_max_rto: Duration::from_secs(60),
            max_message_len: 65_536,
        }
    }

    /// Initial retransmit timeout.
    ///
    /// Doubled on every retransmit trigger.
    #[inline(always)]
    pub fn retransmit_start_rto(&self) -> Duration {
        self.retransmit_start_rto
    }

    /// Upper bound for the retransmit timeout.
    #[inline(always)]
    pub fn retransmit_max_rto(&self) -> Duration {
        self.retransmit_max_rto
    }

    /// Largest declared handshake message length we will buffer.
    ///
    /// Fragments announcing a bigger message are dropped, which stops a
    /// peer from requesting pathological reassembly allocations.
    #[inline(always)]
    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    retransmit_start_rto: Duration,
    retransmit_max_rto: Duration,
    max_message_len: usize,
}

impl ConfigBuilder {
    /// Set the initial retransmit timeout.
    ///
    /// Defaults to 1 second.
    pub fn retransmit_start_rto(mut self, rto: Duration) -> Self {
        self.retransmit_start_rto = rto;
        self
    }

    /// Set the upper bound for the retransmit timeout.
    ///
    /// Defaults to 60 seconds.
    pub fn retransmit_max_rto(mut self, rto: Duration) -> Self {
        self.retransmit_max_rto = rto;
        self
    }

    /// Set the largest declared handshake message length to buffer.
    ///
    /// Defaults to 65536.
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        Config {
            retransmit_start_rto: self.retransmit_start_rto,
            retransmit_max_rto: self.retransmit_max_rto,
            max_message_len: self.max_message_len,
        }
    }
}
