//! Router, probe and policy configuration.
//!
//! Every section deserializes with defaults so a partial config file only
//! needs to name what it changes.

use crate::{DegradePolicy, Error, GenerationProfile, Profiles, Result, policy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default benchmark resource.
pub const BENCHMARK_URL: &str = "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcSZtdNNVK-gDIF-vyrnNSy5_SEKN4z0FiwGeQ&s";

/// Default cap on bytes read per probe (5 MiB).
pub const MAX_PROBE_BYTES: u64 = 5 * 1024 * 1024;

/// Network probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Resource downloaded to measure throughput.
    pub benchmark_url: String,
    /// Total probe timeout in seconds.
    pub timeout_secs: u64,
    /// How long a measurement is reused, in seconds.
    pub cache_interval_secs: u64,
    /// Maximum bytes read per probe.
    pub max_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            benchmark_url: BENCHMARK_URL.to_owned(),
            timeout_secs: 10,
            cache_interval_secs: 30,
            max_bytes: MAX_PROBE_BYTES,
        }
    }
}

impl NetworkConfig {
    /// Reject settings that can never produce a measurement.
    pub fn validate(&self) -> Result<()> {
        if !self.benchmark_url.starts_with("http://") && !self.benchmark_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "benchmark_url '{}' is not an http(s) URL",
                self.benchmark_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("network timeout_secs must be positive".into()));
        }
        if self.max_bytes == 0 {
            return Err(Error::Config("network max_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_interval(&self) -> Duration {
        Duration::from_secs(self.cache_interval_secs)
    }
}

/// One generation profile as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub temperature: f32,
    pub max_output_tokens: usize,
    pub nucleus_p: f32,
    pub degraded: bool,
}

impl From<GenerationProfile> for ProfileConfig {
    fn from(profile: GenerationProfile) -> Self {
        Self {
            temperature: profile.temperature(),
            max_output_tokens: profile.max_output_tokens(),
            nucleus_p: profile.nucleus_p(),
            degraded: profile.degraded(),
        }
    }
}

impl TryFrom<ProfileConfig> for GenerationProfile {
    type Error = Error;

    fn try_from(config: ProfileConfig) -> Result<Self> {
        GenerationProfile::new(
            config.temperature,
            config.max_output_tokens,
            config.nucleus_p,
            config.degraded,
        )
    }
}

/// Degrade policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Speeds below this (in Mbps) are degraded.
    pub threshold_mbps: f64,
    pub offline: ProfileConfig,
    pub degraded: ProfileConfig,
    pub full: ProfileConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            threshold_mbps: policy::DEFAULT_THRESHOLD_MBPS,
            offline: GenerationProfile::OFFLINE.into(),
            degraded: GenerationProfile::DEGRADED.into(),
            full: GenerationProfile::FULL.into(),
        }
    }
}

impl PolicyConfig {
    /// Validate and build the policy.
    pub fn build(&self) -> Result<DegradePolicy> {
        DegradePolicy::new(
            self.threshold_mbps,
            Profiles {
                offline: self.offline.try_into()?,
                degraded: self.degraded.try_into()?,
                full: self.full.try_into()?,
            },
        )
    }
}

/// Routing behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Minimum spacing of remote recovery checks, in seconds.
    ///
    /// Doubles with each consecutive remote failure, up to eight times.
    pub health_check_interval_secs: u64,
    /// Timeout for a single recovery check, in seconds.
    pub health_check_timeout_secs: u64,
    /// Longest wait for the next chunk of a generation, in seconds.
    ///
    /// A backend silent for longer has failed the attempt.
    pub generation_timeout_secs: u64,
    /// Bypass the probe cache at the start of every turn.
    pub force_probe_each_turn: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: 30,
            health_check_timeout_secs: 10,
            generation_timeout_secs: 60,
            force_probe_each_turn: true,
        }
    }
}

impl RouterConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}
