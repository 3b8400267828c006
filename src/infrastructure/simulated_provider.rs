use crate::domain::ports::PaymentProvider;
use crate::domain::provider::{PaymentOrderRequest, PaymentOrderResponse, ProviderError};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_FAILURE_RATE: f64 = 0.05;
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

const RATE_LIMIT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Stand-in for a banking API: jittered latency and a configurable share of
/// failures.
///
/// Of the failure band, the first 30% are rate limits, the next 30% are
/// transient 503s and the remainder permanent 400s.
pub struct SimulatedProvider {
    failure_rate: f64,
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedProvider {
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same failure pattern on every run with the same seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Draws jitter, the outcome roll and an order id suffix in one lock.
    fn draw(&self) -> Result<(f64, f64, u64), ProviderError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ProviderError::Unexpected("provider rng poisoned".into()))?;
        Ok((
            rng.gen_range(0.5..1.5),
            rng.gen_range(0.0..1.0),
            rng.next_u64(),
        ))
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RATE, DEFAULT_LATENCY)
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    fn name(&self) -> &str {
        "simulated_provider"
    }

    async fn submit_order(
        &self,
        request: &PaymentOrderRequest,
    ) -> Result<PaymentOrderResponse, ProviderError> {
        let (jitter, roll, suffix) = self.draw()?;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency.mul_f64(jitter)).await;
        }

        if roll < self.failure_rate * 0.3 {
            return Err(ProviderError::rate_limited(
                "Simulated rate limit, too many requests",
                Some(RATE_LIMIT_RETRY_AFTER),
            ));
        }
        if roll < self.failure_rate * 0.6 {
            return Err(ProviderError::transient(
                "Simulated transient error, service temporarily unavailable",
                503,
            ));
        }
        if roll < self.failure_rate {
            return Err(ProviderError::permanent(
                "Simulated permanent error, invalid account details",
                400,
            ));
        }

        let rail = request.rail_type.as_str();
        Ok(PaymentOrderResponse {
            order_id: format!("po_{rail}_{suffix:016x}"),
            status: "pending".to_string(),
            provider: self.name().to_string(),
            message: format!(
                "{} payment order created ({} {}.{:02})",
                rail.to_ascii_uppercase(),
                request.currency,
                request.amount_cents / 100,
                (request.amount_cents % 100).abs()
            ),
        })
    }
}
