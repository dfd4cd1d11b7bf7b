//! Cache configuration.
//!
//! Controls the response cache via the `[cache]` section of `bookgate.toml`.

use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 60;
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Store upstream responses at all.
    pub enabled: bool,
    /// Age at which an entry stops being served.
    pub ttl: Duration,
    /// Period of the background sweep; `None` disables it.
    pub purge_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            purge_interval: Some(Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS)),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl_seconds.get()),
            purge_interval: (settings.purge_interval_seconds > 0)
                .then(|| Duration::from_secs(settings.purge_interval_seconds)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;
    use crate::config::CacheSettings;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.purge_interval, Some(Duration::from_secs(300)));
    }

    #[test]
    fn zero_purge_interval_disables_the_sweep() {
        let settings = CacheSettings {
            enabled: true,
            ttl_seconds: NonZeroU64::new(5).expect("non-zero"),
            purge_interval_seconds: 0,
        };
        let config = CacheConfig::from(&settings);
        assert_eq!(config.ttl, Duration::from_secs(5));
        assert!(config.purge_interval.is_none());
    }
}
