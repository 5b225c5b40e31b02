//! Network throughput probe.
//!
//! Times a bounded download and converts it to megabits per second. Any
//! failure reads as offline (`0.0`). Measurements are cached for an
//! interval; clones share the cache, so several sessions on one host can
//! reuse a single probe.

use crate::{Error, Result, config::NetworkConfig};
use futures_util::StreamExt;
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

/// One throughput reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkMeasurement {
    /// Measured speed; `0.0` means offline or unreachable.
    pub speed_mbps: f64,
    pub measured_at: Instant,
}

impl NetworkMeasurement {
    /// An offline reading taken now.
    pub fn offline() -> Self {
        Self {
            speed_mbps: 0.0,
            measured_at: Instant::now(),
        }
    }

    /// Whether this reading means no connectivity.
    pub fn is_offline(&self) -> bool {
        self.speed_mbps <= 0.0
    }
}

/// Raw result of a benchmark download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub bytes: u64,
    pub elapsed: Duration,
}

/// A timed download.
pub trait Benchmark: Send + Sync + 'static {
    /// Download the benchmark resource and report what was read.
    fn fetch(&self) -> impl Future<Output = anyhow::Result<Sample>> + Send;
}

/// Downloads a fixed resource over HTTP, reading at most `max_bytes`.
#[derive(Clone)]
pub struct HttpBenchmark {
    client: reqwest::Client,
    url: String,
    max_bytes: u64,
}

impl HttpBenchmark {
    pub fn new(client: reqwest::Client, url: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            client,
            url: url.into(),
            max_bytes,
        }
    }

    /// The benchmark resource.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Benchmark for HttpBenchmark {
    async fn fetch(&self) -> anyhow::Result<Sample> {
        let start = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        let mut body = response.bytes_stream();
        let mut bytes = 0u64;
        while let Some(chunk) = body.next().await {
            bytes += chunk?.len() as u64;
            if bytes >= self.max_bytes {
                break;
            }
        }

        Ok(Sample {
            bytes,
            elapsed: start.elapsed(),
        })
    }
}

/// Convert a download into megabits per second.
///
/// Non-positive or non-finite durations yield `0.0`.
pub fn speed_mbps(bytes: u64, elapsed_secs: f64) -> f64 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / (elapsed_secs * 1_000_000.0)
}

/// Measures throughput with a cached, shareable result.
pub struct NetworkProbe<B = HttpBenchmark> {
    benchmark: Arc<B>,
    timeout: Duration,
    interval: Duration,
    cache: Arc<RwLock<Option<NetworkMeasurement>>>,
}

impl NetworkProbe<HttpBenchmark> {
    /// Probe downloading the configured benchmark resource.
    pub fn http(client: reqwest::Client, config: &NetworkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            HttpBenchmark::new(client, &config.benchmark_url, config.max_bytes),
            config.timeout(),
            config.cache_interval(),
        ))
    }
}

impl<B: Benchmark> NetworkProbe<B> {
    pub fn new(benchmark: B, timeout: Duration, interval: Duration) -> Self {
        Self {
            benchmark: Arc::new(benchmark),
            timeout,
            interval,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// The last measurement, fresh or not.
    pub fn cached(&self) -> Option<NetworkMeasurement> {
        *self.cache.read()
    }

    /// Measure throughput.
    ///
    /// Serves the cached reading when it is younger than the interval
    /// unless `force` is set. Every new reading replaces the cache,
    /// including offline ones.
    pub async fn measure(&self, force: bool) -> NetworkMeasurement {
        if !force {
            if let Some(cached) = self.fresh() {
                tracing::trace!("probe cache hit: {:.2} Mbps", cached.speed_mbps);
                return cached;
            }
        }

        let measurement = match self.sample().await {
            Ok(measurement) => measurement,
            Err(e) => {
                tracing::debug!("{e}");
                NetworkMeasurement::offline()
            }
        };
        tracing::debug!("probe measured {:.2} Mbps", measurement.speed_mbps);
        *self.cache.write() = Some(measurement);
        measurement
    }

    /// Run one uncached download, reporting why it failed.
    ///
    /// Does not touch the cache.
    pub async fn sample(&self) -> Result<NetworkMeasurement> {
        let sample = tokio::time::timeout(self.timeout, self.benchmark.fetch())
            .await
            .map_err(|_| {
                Error::ProbeUnreachable(format!("timed out after {:?}", self.timeout))
            })?
            .map_err(|e| Error::ProbeUnreachable(e.to_string()))?;

        Ok(NetworkMeasurement {
            speed_mbps: speed_mbps(sample.bytes, sample.elapsed.as_secs_f64()),
            measured_at: Instant::now(),
        })
    }

    fn fresh(&self) -> Option<NetworkMeasurement> {
        self.cached()
            .filter(|cached| cached.measured_at.elapsed() < self.interval)
    }
}

impl<B> Clone for NetworkProbe<B> {
    fn clone(&self) -> Self {
        Self {
            benchmark: Arc::clone(&self.benchmark),
            timeout: self.timeout,
            interval: self.interval,
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_from_five_mebibytes_in_one_second() {
        let speed = speed_mbps(5 * 1024 * 1024, 1.0);
        assert!((speed - 41.943_04).abs() < 1e-9);
    }

    #[test]
    fn zero_or_negative_elapsed_is_offline() {
        assert_eq!(speed_mbps(1024, 0.0), 0.0);
        assert_eq!(speed_mbps(1024, -1.5), 0.0);
        assert_eq!(speed_mbps(1024, f64::NAN), 0.0);
        assert_eq!(speed_mbps(1024, f64::INFINITY), 0.0);
    }

    #[test]
    fn empty_download_is_offline() {
        assert_eq!(speed_mbps(0, 2.0), 0.0);
    }
}
