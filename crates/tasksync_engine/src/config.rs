//! Configuration for the sync engine.

use rand::Rng;
use std::time::Duration;

/// Configuration for sync sessions.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of records requested per fetch.
    pub fetch_batch_size: u32,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Request timeout, honoured by network transports.
    pub timeout: Duration,
    /// Only sync while connected to Wi-Fi.
    pub wifi_only: bool,
    /// Only sync while connected to this Wi-Fi network.
    pub wifi_only_ssid: Option<String>,
}

impl SyncConfig {
    /// Creates a new sync configuration with defaults.
    pub fn new() -> Self {
        Self {
            fetch_batch_size: 50,
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(30),
            wifi_only: false,
            wifi_only_ssid: None,
        }
    }

    /// Sets the fetch batch size. Zero is treated as one.
    pub fn with_fetch_batch_size(mut self, size: u32) -> Self {
        self.fetch_batch_size = size.max(1);
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restricts syncing to Wi-Fi, optionally to a single network.
    pub fn with_wifi_only(mut self, ssid: Option<String>) -> Self {
        self.wifi_only = true;
        self.wifi_only_ssid = ssid;
        self
    }

    /// Returns true if a session may run on the given network.
    pub fn permits(&self, network: &NetworkState) -> bool {
        if !self.wifi_only {
            return true;
        }
        if !network.connected || !network.wifi {
            return false;
        }
        match &self.wifi_only_ssid {
            Some(required) => network.ssid.as_deref() == Some(required.as_str()),
            None => true,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the device's connectivity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkState {
    /// Any network is reachable.
    pub connected: bool,
    /// The active network is Wi-Fi.
    pub wifi: bool,
    /// Name of the Wi-Fi network, if known.
    pub ssid: Option<String>,
}

impl NetworkState {
    /// Connected through Wi-Fi.
    pub fn wifi(ssid: Option<&str>) -> Self {
        Self {
            connected: true,
            wifi: true,
            ssid: ssid.map(str::to_string),
        }
    }

    /// Connected through a metered mobile network.
    pub fn cellular() -> Self {
        Self {
            connected: true,
            wifi: false,
            ssid: None,
        }
    }

    /// No connectivity.
    pub fn offline() -> Self {
        Self::default()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Disables jitter.
    pub fn without_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Calculates the delay before the given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter && delay_secs > 0.0 {
            // Up to 25% on top
            let jitter = delay_secs * 0.25 * rand::thread_rng().gen::<f64>();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_fetch_batch_size(10)
            .with_timeout(Duration::from_secs(60))
            .with_retry(RetryConfig::no_retry());

        assert_eq!(config.fetch_batch_size, 10);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 1);
        assert!(!config.wifi_only);
    }

    #[test]
    fn sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.fetch_batch_size, 50);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        assert_eq!(SyncConfig::new().with_fetch_batch_size(0).fetch_batch_size, 1);
    }

    #[test]
    fn permits_any_network_by_default() {
        let config = SyncConfig::new();
        assert!(config.permits(&NetworkState::cellular()));
        assert!(config.permits(&NetworkState::offline()));
    }

    #[test]
    fn wifi_only_rejects_cellular() {
        let config = SyncConfig::new().with_wifi_only(None);
        assert!(!config.permits(&NetworkState::cellular()));
        assert!(!config.permits(&NetworkState::offline()));
        assert!(config.permits(&NetworkState::wifi(Some("home"))));
        assert!(config.permits(&NetworkState::wifi(None)));
    }

    #[test]
    fn wifi_only_with_ssid() {
        let config = SyncConfig::new().with_wifi_only(Some("home".into()));
        assert!(config.permits(&NetworkState::wifi(Some("home"))));
        assert!(!config.permits(&NetworkState::wifi(Some("cafe"))));
        assert!(!config.permits(&NetworkState::wifi(None)));
    }

    #[test]
    fn retry_config_no_retry() {
        let config = RetryConfig::no_retry();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn retry_delay_exponential() {
        let config = RetryConfig::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .without_jitter();

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn retry_delay_capped() {
        let config = RetryConfig::new(20)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .without_jitter();

        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn retry_jitter_bounded() {
        let config = RetryConfig::new(3).with_initial_delay(Duration::from_millis(100));
        for _ in 0..50 {
            let delay = config.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }
}
