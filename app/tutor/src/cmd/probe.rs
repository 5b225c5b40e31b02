//! One-off network measurement.

use crate::config::TutorConfig;
use anyhow::Result;
use llm::Client;
use router::{GenerationProfile, NetworkProbe, Tier};

/// Measure throughput once and print the tier and profile it selects.
pub async fn run(config: &TutorConfig, client: Client) -> Result<()> {
    let policy = config.policy.build()?;
    let probe = NetworkProbe::http(client, &config.network)?;
    println!("benchmark: {}", config.network.benchmark_url);

    let speed = match probe.sample().await {
        Ok(measurement) => measurement.speed_mbps,
        Err(e) => {
            println!("probe failed: {e}");
            0.0
        }
    };
    let tier = policy.tier(speed);
    println!(
        "network: {speed:.2} Mbps ({tier}, threshold {:.1} Mbps)",
        policy.threshold_mbps()
    );
    println!("{}", describe(tier, &policy.profile(tier)));
    Ok(())
}

/// One-line summary of where a tier routes and with which sampling.
pub fn describe(tier: Tier, profile: &GenerationProfile) -> String {
    let backend = match tier {
        Tier::Offline => "local",
        Tier::Degraded | Tier::Full => "remote",
    };
    format!(
        "routes to {backend}: temperature {}, max tokens {}, top_p {}{}",
        profile.temperature(),
        profile.max_output_tokens(),
        profile.nucleus_p(),
        if profile.degraded() { " (degraded)" } else { "" }
    )
}
