//! Bandwidth-adaptive routing between a remote and a local inference
//! backend.
//!
//! Each turn the [`HybridRouter`] measures throughput with a
//! [`NetworkProbe`], picks a [`GenerationProfile`] through the
//! [`DegradePolicy`], and streams the answer from the remote backend when
//! it is usable, falling back to the local one otherwise. Both backends
//! read and extend one shared [`Transcript`].
//!
//! # Example
//!
//! ```rust,ignore
//! use haka_router::{
//!     DegradePolicy, HybridRouter, NetworkConfig, NetworkProbe, Prompt, RouterConfig,
//! };
//!
//! let probe = NetworkProbe::http(client.clone(), &NetworkConfig::default())?;
//! let mut router = HybridRouter::new(
//!     Some(remote),
//!     local,
//!     probe,
//!     DegradePolicy::default(),
//!     RouterConfig::default(),
//! );
//! let reply = router.chat(Prompt::new("You are a patient tutor."), "hello").await;
//! println!("[{}] {}", reply.backend, reply.text);
//! ```

pub use config::{NetworkConfig, PolicyConfig, ProfileConfig, RouterConfig};
pub use error::{Error, Result};
pub use policy::{DEFAULT_THRESHOLD_MBPS, DegradePolicy, GenerationProfile, Profiles, Tier, select};
pub use probe::{Benchmark, HttpBenchmark, NetworkMeasurement, NetworkProbe, Sample, speed_mbps};
pub use router::{APOLOGY, Backend, HybridRouter, Prompt, Reply, RouterState, TurnEvent};
pub use toolbox::{Handler, MAX_TOOL_ROUNDS, Toolbox};
pub use transcript::Transcript;

pub mod config;
mod error;
mod policy;
mod probe;
mod router;
mod toolbox;
mod transcript;
