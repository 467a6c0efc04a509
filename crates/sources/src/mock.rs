//! Mock source - synthetic readings on an interval
//!
//! Generates a slow sine wave with random jitter per simulated device.
//! Used for demos and for loading the pipeline without hardware.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use relay_gateway::GatewayService;
use relay_protocol::Reading;
use tokio_util::sync::CancellationToken;

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// Tick interval between sample rounds
    pub interval: Duration,

    /// Number of simulated devices (one reading each per tick)
    pub device_count: usize,

    /// Measure reported by every simulated device
    pub measure_name: String,

    /// Unit for the measure
    pub unit_of_measure: String,

    /// Mid-point of the generated values
    pub base_value: f64,

    /// Peak deviation of the sine component
    pub amplitude: f64,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            device_count: 1,
            measure_name: "temperature".into(),
            unit_of_measure: "C".into(),
            base_value: 21.0,
            amplitude: 4.0,
        }
    }
}

impl MockSourceConfig {
    /// Set the tick interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the simulated device count
    #[must_use]
    pub fn with_device_count(mut self, count: usize) -> Self {
        self.device_count = count.max(1);
        self
    }
}

/// Interval-driven synthetic intake adapter
pub struct MockSource {
    config: MockSourceConfig,
    service: Arc<GatewayService>,
    cancel: CancellationToken,
}

impl MockSource {
    pub fn new(
        config: MockSourceConfig,
        service: Arc<GatewayService>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            service,
            cancel,
        }
    }

    /// Generate readings until cancelled
    pub async fn run(self) {
        tracing::info!(
            devices = self.config.device_count,
            interval_ms = self.config.interval.as_millis() as u64,
            "mock source started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        let mut tick = 0u64;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            for device in 0..self.config.device_count {
                // Slow sine wave, one full cycle per 60 ticks, offset per
                // device so the dashboard traces do not overlap
                let phase = (tick as f64 + device as f64 * 7.0) / 60.0
                    * std::f64::consts::TAU;
                let jitter: f64 = rand::thread_rng().gen_range(-0.5..0.5);
                let value = self.config.base_value
                    + self.config.amplitude * phase.sin()
                    + jitter;

                let reading = Reading::new(
                    format!("mock-{device}"),
                    &self.config.measure_name,
                    (value * 100.0).round() / 100.0,
                )
                .with_display_name(format!("Mock device {device}"))
                .with_unit(&self.config.unit_of_measure);

                self.service.enqueue(reading);
            }

            tick += 1;
        }

        tracing::info!("mock source stopped");
    }
}
