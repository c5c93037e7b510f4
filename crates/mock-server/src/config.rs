use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use docdrop_protocol::{DEFAULT_STORAGE_BASE_URL, MAX_FILE_SIZE};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive latency bounds in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No added latency.
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draws a latency uniformly from the range.
    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(rng.random_range(lo..=hi))
    }
}

/// Mock server configuration.
///
/// Serialized as the `[mock]` table of the CLI config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    /// TCP port to listen on (0 = OS-assigned).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Probability in `[0, 1]` that an upload is rejected.
    #[serde(default = "default_failure_rate")]
    pub upload_failure_rate: f64,
    /// Probability in `[0, 1]` that a submission is rejected.
    #[serde(default = "default_failure_rate")]
    pub submit_failure_rate: f64,
    #[serde(default = "default_complete_delay_ms")]
    pub complete_delay_ms: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_storage_base_url")]
    pub storage_base_url: String,
    #[serde(default = "default_upload_latency")]
    pub upload_latency: LatencyRange,
    #[serde(default = "default_submit_latency")]
    pub submit_latency: LatencyRange,
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    3000
}

fn default_failure_rate() -> f64 {
    0.2
}

fn default_upload_latency() -> LatencyRange {
    LatencyRange::new(500, 1500)
}

fn default_submit_latency() -> LatencyRange {
    LatencyRange::new(1000, 3000)
}

fn default_complete_delay_ms() -> u64 {
    200
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

fn default_storage_base_url() -> String {
    DEFAULT_STORAGE_BASE_URL.to_string()
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            upload_failure_rate: default_failure_rate(),
            submit_failure_rate: default_failure_rate(),
            upload_latency: default_upload_latency(),
            submit_latency: default_submit_latency(),
            complete_delay_ms: default_complete_delay_ms(),
            max_file_size: default_max_file_size(),
            storage_base_url: default_storage_base_url(),
        }
    }
}

impl MockConfig {
    /// Deterministic variant: no latency, no injected failures, OS-assigned port.
    pub fn quiet() -> Self {
        Self {
            port: 0,
            upload_failure_rate: 0.0,
            submit_failure_rate: 0.0,
            upload_latency: LatencyRange::none(),
            submit_latency: LatencyRange::none(),
            complete_delay_ms: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sample_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = LatencyRange::new(500, 1500);
        for _ in 0..200 {
            let d = range.sample(&mut rng);
            assert!((500..=1500).contains(&(d.as_millis() as u64)));
        }
        assert_eq!(LatencyRange::none().sample(&mut rng), Duration::ZERO);
        let swapped = LatencyRange::new(20, 10).sample(&mut rng).as_millis();
        assert!((10..=20).contains(&swapped));
    }

    #[test]
    fn empty_table_uses_defaults() {
        let cfg: MockConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, MockConfig::default());
        assert_eq!(cfg.upload_latency, LatencyRange::new(500, 1500));
        assert_eq!(cfg.max_file_size, 5 * 1024 * 1024);
    }

    #[test]
    fn partial_override() {
        let cfg: MockConfig =
            serde_json::from_str(r#"{"port": 8080, "upload_failure_rate": 0.5}"#).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.upload_failure_rate, 0.5);
        assert_eq!(cfg.submit_failure_rate, 0.2);
    }
}
