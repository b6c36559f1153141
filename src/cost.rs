//! Token-usage cost estimation.
//!
//! The per-1000-token rates track the provider's price list, which changes
//! independently of this crate, so they live in [`Pricing`] rather than in
//! the arithmetic. The defaults are the gpt-4o list prices.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

/// Raw token counters reported by the service for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// USD price per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_1k: 0.0025,
            output_per_1k: 0.01,
        }
    }
}

impl Pricing {
    /// Estimate the cost of one call.
    pub fn estimate(&self, prompt_tokens: u64, completion_tokens: u64) -> UsageCost {
        let input_cost = prompt_tokens as f64 / 1000.0 * self.input_per_1k;
        let output_cost = completion_tokens as f64 / 1000.0 * self.output_per_1k;
        UsageCost {
            prompt_tokens,
            completion_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }

    pub fn estimate_usage(&self, usage: TokenUsage) -> UsageCost {
        self.estimate(usage.prompt_tokens, usage.completion_tokens)
    }
}

/// Token counts and their USD cost for one call, or a sum of calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageCost {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

impl Add for UsageCost {
    type Output = UsageCost;

    fn add(self, rhs: UsageCost) -> UsageCost {
        UsageCost {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            input_cost: self.input_cost + rhs.input_cost,
            output_cost: self.output_cost + rhs.output_cost,
            total_cost: self.total_cost + rhs.total_cost,
        }
    }
}

impl Sum for UsageCost {
    fn sum<I: Iterator<Item = UsageCost>>(iter: I) -> Self {
        iter.fold(UsageCost::default(), Add::add)
    }
}

impl<'a> Sum<&'a UsageCost> for UsageCost {
    fn sum<I: Iterator<Item = &'a UsageCost>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Display-only conversion of a USD amount into a local currency.
///
/// The rate is a fixed snapshot and is never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDisplay {
    /// Local units per USD.
    pub rate: f64,
    pub symbol: String,
}

impl Default for CurrencyDisplay {
    fn default() -> Self {
        Self {
            rate: 1447.0,
            symbol: "₩".to_string(),
        }
    }
}

impl CurrencyDisplay {
    pub fn convert(&self, usd: f64) -> f64 {
        usd * self.rate
    }

    /// `₩11` style: symbol followed by the amount rounded to whole units.
    pub fn format(&self, usd: f64) -> String {
        format!("{}{:.0}", self.symbol, self.convert(usd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn thousand_in_five_hundred_out() {
        let c = Pricing::default().estimate(1000, 500);
        assert!((c.input_cost - 0.0025).abs() < EPS);
        assert!((c.output_cost - 0.0050).abs() < EPS);
        assert!((c.total_cost - 0.0075).abs() < EPS);
        assert_eq!(c.prompt_tokens, 1000);
        assert_eq!(c.completion_tokens, 500);
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        let c = Pricing::default().estimate(0, 0);
        assert_eq!(c.total_cost, 0.0);
    }

    #[test]
    fn total_matches_formula_across_samples() {
        let p = Pricing::default();
        for &(i, o) in &[(1u64, 1u64), (765, 0), (0, 4096), (1523, 87), (250_000, 12_345)] {
            let c = p.estimate(i, o);
            let expected = i as f64 / 1000.0 * 0.0025 + o as f64 / 1000.0 * 0.01;
            assert!((c.total_cost - expected).abs() < EPS, "({i}, {o})");
        }
    }

    #[test]
    fn cost_is_monotonic_in_both_counts() {
        let p = Pricing::default();
        let mut prev = p.estimate(0, 0).total_cost;
        for n in (0..5000).step_by(250) {
            let c = p.estimate(n, n / 2).total_cost;
            assert!(c >= prev);
            prev = c;
        }
        assert!(p.estimate(10, 5).total_cost <= p.estimate(11, 5).total_cost);
        assert!(p.estimate(10, 5).total_cost <= p.estimate(10, 6).total_cost);
    }

    #[test]
    fn custom_rates_are_honoured() {
        let p = Pricing {
            input_per_1k: 0.0001,
            output_per_1k: 0.0004,
        };
        let c = p.estimate(2000, 1000);
        assert!((c.total_cost - 0.0006).abs() < EPS);
    }

    #[test]
    fn sides_sum_into_session_total() {
        let p = Pricing::default();
        let total: UsageCost = [p.estimate(1000, 500), p.estimate(2000, 100)].iter().sum();
        assert_eq!(total.prompt_tokens, 3000);
        assert_eq!(total.completion_tokens, 600);
        assert!((total.total_cost - (0.0075 + 0.006)).abs() < EPS);
    }

    #[test]
    fn won_display_rounds_to_whole_units() {
        let d = CurrencyDisplay::default();
        // 0.0075 × 1447 = 10.8525
        assert_eq!(d.format(0.0075), "₩11");
        assert_eq!(d.format(0.0), "₩0");
    }
}
