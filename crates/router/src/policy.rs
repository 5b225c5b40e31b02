//! Bandwidth to generation-profile policy.
//!
//! A measured speed falls into one of three tiers. Offline turns go to the
//! local backend and keep a generous budget; degraded turns keep remote
//! calls small and focused; full turns use standard settings.

use crate::{Error, Result};
use llm::General;
use std::fmt;

/// Default degrade threshold in Mbps.
pub const DEFAULT_THRESHOLD_MBPS: f64 = 130.0;

/// Sampling parameters for one turn.
///
/// Immutable once built; [`GenerationProfile::new`] enforces the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProfile {
    temperature: f32,
    max_output_tokens: usize,
    nucleus_p: f32,
    degraded: bool,
}

impl GenerationProfile {
    /// Local-only turns: standard sampling, generous token cap.
    pub const OFFLINE: Self = Self {
        temperature: 0.7,
        max_output_tokens: 4096,
        nucleus_p: 1.0,
        degraded: true,
    };

    /// Constrained bandwidth: low temperature, small cap, narrow nucleus.
    pub const DEGRADED: Self = Self {
        temperature: 0.3,
        max_output_tokens: 150,
        nucleus_p: 0.3,
        degraded: true,
    };

    /// Good connectivity.
    pub const FULL: Self = Self {
        temperature: 0.7,
        max_output_tokens: 4096,
        nucleus_p: 1.0,
        degraded: false,
    };

    /// Build a profile, rejecting out-of-range values.
    ///
    /// Temperature must lie in `[0, 2]`, the token cap must be positive and
    /// `nucleus_p` must lie in `(0, 1]`.
    pub fn new(
        temperature: f32,
        max_output_tokens: usize,
        nucleus_p: f32,
        degraded: bool,
    ) -> Result<Self> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::MalformedProfile(format!(
                "temperature {temperature} outside [0, 2]"
            )));
        }
        if max_output_tokens == 0 {
            return Err(Error::MalformedProfile(
                "max_output_tokens must be positive".into(),
            ));
        }
        if !(nucleus_p > 0.0 && nucleus_p <= 1.0) {
            return Err(Error::MalformedProfile(format!(
                "nucleus_p {nucleus_p} outside (0, 1]"
            )));
        }
        Ok(Self {
            temperature,
            max_output_tokens,
            nucleus_p,
            degraded,
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> usize {
        self.max_output_tokens
    }

    pub fn nucleus_p(&self) -> f32 {
        self.nucleus_p
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// The chat config carrying this profile's sampling parameters.
    pub fn general(&self) -> General {
        General::default().with_sampling(self.temperature, self.max_output_tokens, self.nucleus_p)
    }
}

/// Connectivity tier of a measured speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Offline,
    Degraded,
    Full,
}

impl Tier {
    /// Classify a speed against a threshold.
    ///
    /// Zero, negative and NaN speeds are offline.
    pub fn classify(speed_mbps: f64, threshold_mbps: f64) -> Self {
        if speed_mbps.is_nan() || speed_mbps <= 0.0 {
            Self::Offline
        } else if speed_mbps < threshold_mbps {
            Self::Degraded
        } else {
            Self::Full
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offline => "offline",
            Self::Degraded => "degraded",
            Self::Full => "full",
        })
    }
}

/// The three profiles a policy chooses between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profiles {
    pub offline: GenerationProfile,
    pub degraded: GenerationProfile,
    pub full: GenerationProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            offline: GenerationProfile::OFFLINE,
            degraded: GenerationProfile::DEGRADED,
            full: GenerationProfile::FULL,
        }
    }
}

/// Maps a measured speed to a [`GenerationProfile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegradePolicy {
    threshold_mbps: f64,
    profiles: Profiles,
}

impl DegradePolicy {
    /// Build a policy.
    ///
    /// The threshold must be finite and positive. The offline and degraded
    /// profiles must be flagged degraded and the full profile must not be,
    /// so `degraded` tracks `speed < threshold` exactly.
    pub fn new(threshold_mbps: f64, profiles: Profiles) -> Result<Self> {
        if !threshold_mbps.is_finite() || threshold_mbps <= 0.0 {
            return Err(Error::Config(format!(
                "degrade threshold {threshold_mbps} must be a positive number"
            )));
        }
        for (name, profile) in [
            ("offline", &profiles.offline),
            ("degraded", &profiles.degraded),
            ("full", &profiles.full),
        ] {
            let expected = name != "full";
            if profile.degraded != expected {
                return Err(Error::MalformedProfile(format!(
                    "{name} profile must have degraded = {expected}"
                )));
            }
        }
        Ok(Self {
            threshold_mbps,
            profiles,
        })
    }

    /// Policy with the canonical profiles.
    pub fn with_threshold(threshold_mbps: f64) -> Result<Self> {
        Self::new(threshold_mbps, Profiles::default())
    }

    pub fn threshold_mbps(&self) -> f64 {
        self.threshold_mbps
    }

    /// Tier of a measured speed.
    pub fn tier(&self, speed_mbps: f64) -> Tier {
        Tier::classify(speed_mbps, self.threshold_mbps)
    }

    /// The profile for a tier.
    pub fn profile(&self, tier: Tier) -> GenerationProfile {
        match tier {
            Tier::Offline => self.profiles.offline,
            Tier::Degraded => self.profiles.degraded,
            Tier::Full => self.profiles.full,
        }
    }

    /// The profile for a measured speed.
    pub fn select(&self, speed_mbps: f64) -> GenerationProfile {
        self.profile(self.tier(speed_mbps))
    }
}

impl Default for DegradePolicy {
    fn default() -> Self {
        Self {
            threshold_mbps: DEFAULT_THRESHOLD_MBPS,
            profiles: Profiles::default(),
        }
    }
}

/// Select a canonical profile for `speed_mbps` against `threshold_mbps`.
pub fn select(speed_mbps: f64, threshold_mbps: f64) -> GenerationProfile {
    DegradePolicy {
        threshold_mbps,
        profiles: Profiles::default(),
    }
    .select(speed_mbps)
}
