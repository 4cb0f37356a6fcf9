//! Payment outcome providers.
//!
//! No money moves here. A provider only decides whether a payment succeeds;
//! the coordinator turns that verdict into ticket and seat changes.

use std::str::FromStr;
use std::sync::Arc;

use domain::Money;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Verdict for one payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Success,
    Failed,
}

impl PaymentOutcome {
    /// Returns the outcome name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Success => "SUCCESS",
            PaymentOutcome::Failed => "FAILED",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Success)
    }
}

impl std::fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decides payment outcomes.
///
/// Implementations are stateless with respect to tickets: the same provider
/// is shared by every saga run.
pub trait PaymentOutcomeProvider: Send + Sync {
    /// Decides whether a payment of `amount` succeeds.
    fn decide(&self, amount: Money) -> PaymentOutcome;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

impl<T: PaymentOutcomeProvider + ?Sized> PaymentOutcomeProvider for Arc<T> {
    fn decide(&self, amount: Money) -> PaymentOutcome {
        (**self).decide(amount)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Approves every payment.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

impl PaymentOutcomeProvider for AlwaysApprove {
    fn decide(&self, _amount: Money) -> PaymentOutcome {
        PaymentOutcome::Success
    }

    fn name(&self) -> &'static str {
        "always_success"
    }
}

/// Declines every payment.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecline;

impl PaymentOutcomeProvider for AlwaysDecline {
    fn decide(&self, _amount: Money) -> PaymentOutcome {
        PaymentOutcome::Failed
    }

    fn name(&self) -> &'static str {
        "always_fail"
    }
}

/// Approves payments with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct WeightedRandom {
    success_rate: f64,
}

impl WeightedRandom {
    /// Creates a provider approving with probability `success_rate`,
    /// clamped into `[0, 1]`. NaN counts as 0.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for WeightedRandom {
    /// A fair coin.
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl PaymentOutcomeProvider for WeightedRandom {
    fn decide(&self, _amount: Money) -> PaymentOutcome {
        if rand::thread_rng().gen_bool(self.success_rate) {
            PaymentOutcome::Success
        } else {
            PaymentOutcome::Failed
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Configured choice of payment outcome provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentPolicy {
    AlwaysSuccess,
    AlwaysFail,
    Random { success_rate: f64 },
}

impl PaymentPolicy {
    /// Builds the provider this policy names.
    pub fn into_provider(self) -> Arc<dyn PaymentOutcomeProvider> {
        match self {
            PaymentPolicy::AlwaysSuccess => Arc::new(AlwaysApprove),
            PaymentPolicy::AlwaysFail => Arc::new(AlwaysDecline),
            PaymentPolicy::Random { success_rate } => Arc::new(WeightedRandom::new(success_rate)),
        }
    }

    /// Replaces the success rate of a `Random` policy; other policies are
    /// returned unchanged.
    pub fn with_success_rate(self, rate: f64) -> Self {
        match self {
            PaymentPolicy::Random { .. } => PaymentPolicy::Random { success_rate: rate },
            other => other,
        }
    }
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        PaymentPolicy::Random { success_rate: 0.5 }
    }
}

impl FromStr for PaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always_success" | "success" => Ok(PaymentPolicy::AlwaysSuccess),
            "always_fail" | "fail" => Ok(PaymentPolicy::AlwaysFail),
            "random" => Ok(PaymentPolicy::default()),
            other => Err(format!("unknown payment policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_providers() {
        let amount = Money::from_cents(25_000);
        assert_eq!(AlwaysApprove.decide(amount), PaymentOutcome::Success);
        assert_eq!(AlwaysDecline.decide(amount), PaymentOutcome::Failed);
    }

    #[test]
    fn test_weighted_random_extremes_are_deterministic() {
        let amount = Money::from_cents(100);
        let never = WeightedRandom::new(0.0);
        let always = WeightedRandom::new(1.0);
        for _ in 0..200 {
            assert_eq!(never.decide(amount), PaymentOutcome::Failed);
            assert_eq!(always.decide(amount), PaymentOutcome::Success);
        }
    }

    #[test]
    fn test_weighted_random_clamps_rate() {
        assert_eq!(WeightedRandom::new(3.0).success_rate(), 1.0);
        assert_eq!(WeightedRandom::new(-1.0).success_rate(), 0.0);
        assert_eq!(WeightedRandom::new(f64::NAN).success_rate(), 0.0);
    }

    #[test]
    fn test_fair_coin_produces_both_outcomes() {
        let coin = WeightedRandom::default();
        let amount = Money::from_cents(100);
        let successes = (0..1000)
            .filter(|_| coin.decide(amount).is_success())
            .count();
        assert!(successes > 300 && successes < 700, "got {successes}");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("always_success".parse::<PaymentPolicy>(), Ok(PaymentPolicy::AlwaysSuccess));
        assert_eq!("ALWAYS_FAIL".parse::<PaymentPolicy>(), Ok(PaymentPolicy::AlwaysFail));
        assert_eq!(
            "random".parse::<PaymentPolicy>(),
            Ok(PaymentPolicy::Random { success_rate: 0.5 })
        );
        assert!("sometimes".parse::<PaymentPolicy>().is_err());
    }

    #[test]
    fn test_policy_builds_matching_provider() {
        let provider = PaymentPolicy::AlwaysFail.into_provider();
        assert_eq!(provider.name(), "always_fail");
        assert_eq!(provider.decide(Money::from_cents(1)), PaymentOutcome::Failed);

        let provider = PaymentPolicy::default().with_success_rate(1.0).into_provider();
        assert_eq!(provider.decide(Money::from_cents(1)), PaymentOutcome::Success);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&PaymentOutcome::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentOutcome::Failed).unwrap(),
            "\"FAILED\""
        );
    }
}
