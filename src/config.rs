//! Static settings of an [`InetBox`](crate::InetBox) node.

use core::time::Duration;

/// LIN product identification of an iNet Box: supplier `0x4617` (Truma),
/// function `0x1F00`.
pub const INET_BOX_IDENTIFIER: [u8; 4] = [0x17, 0x46, 0x00, 0x1F];
pub const INET_BOX_VARIANT: u8 = 0x01;

/// Node configuration.
///
/// ```
/// use core::time::Duration;
/// use truma_inetbox::Config;
///
/// let config = Config::default()
///     .with_clock_sync_delay(Duration::from_secs(60))
///     .with_auto_clock_sync(false);
/// assert_eq!(config.init_retry, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Returned by the product identification read.
    pub identifier: [u8; 4],
    pub variant: u8,
    /// How long to wait for the device enumeration before asking again.
    pub init_retry: Duration,
    /// How long to wait for the panel to collect a pending write before
    /// announcing it again.
    pub update_retry: Duration,
    /// Delay between the device enumeration and the automatic clock write.
    pub clock_sync_delay: Duration,
    /// Write the time to the panel once after start-up, if a time source is set.
    pub auto_clock_sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier: INET_BOX_IDENTIFIER,
            variant: INET_BOX_VARIANT,
            init_retry: Duration::from_secs(5),
            update_retry: Duration::from_secs(5),
            clock_sync_delay: Duration::from_secs(30),
            auto_clock_sync: true,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_identifier(mut self, identifier: [u8; 4], variant: u8) -> Self {
        self.identifier = identifier;
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn with_init_retry(mut self, init_retry: Duration) -> Self {
        self.init_retry = init_retry;
        self
    }

    #[must_use]
    pub fn with_update_retry(mut self, update_retry: Duration) -> Self {
        self.update_retry = update_retry;
        self
    }

    #[must_use]
    pub fn with_clock_sync_delay(mut self, clock_sync_delay: Duration) -> Self {
        self.clock_sync_delay = clock_sync_delay;
        self
    }

    #[must_use]
    pub fn with_auto_clock_sync(mut self, auto_clock_sync: bool) -> Self {
        self.auto_clock_sync = auto_clock_sync;
        self
    }
}
