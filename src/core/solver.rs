use tracing::{debug, warn};

use super::types::{DEFAULT_ANNUAL_CONTRIBUTION, RateSolveResult};

const ZERO_RATE_THRESHOLD: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct RateSolveConfig {
    pub annual_payment: f64,
    pub initial_high: f64,
    pub max_doublings: u32,
    pub max_iterations: u32,
    /// Absolute tolerance on the future value, in money units.
    pub tolerance: f64,
    pub decimals: usize,
}

impl Default for RateSolveConfig {
    fn default() -> Self {
        Self {
            annual_payment: DEFAULT_ANNUAL_CONTRIBUTION,
            initial_high: 0.3,
            max_doublings: 100,
            max_iterations: 1000,
            tolerance: 1e-6,
            decimals: 5,
        }
    }
}

/// Future value of `payment` deposited at the start of each year for `years` years.
pub fn annuity_due_future_value(payment: f64, rate: f64, years: u32) -> f64 {
    let n = years as f64;
    if rate <= ZERO_RATE_THRESHOLD {
        return payment * n * (1.0 + rate);
    }
    let growth = 1.0 + rate;
    payment * growth * ((growth.powf(n) - 1.0) / rate)
}

/// Flat annual rate at which 12000 a year reaches `target_future_value`.
pub fn solve_equivalent_rate(target_future_value: f64, years: u32) -> f64 {
    solve_rate(target_future_value, years, RateSolveConfig::default()).rate
}

pub fn solve_rate(
    target_future_value: f64,
    years: u32,
    config: RateSolveConfig,
) -> RateSolveResult {
    let mut result = RateSolveResult {
        target_future_value,
        years,
        annual_payment: config.annual_payment,
        rate: 0.0,
        iterations: 0,
        bracketed: false,
        converged: false,
        message: String::new(),
    };

    if years == 0 || target_future_value <= 0.0 {
        result.message =
            "No meaningful rate for a zero horizon or non-positive target.".to_string();
        return result;
    }
    if !target_future_value.is_finite() {
        result.message = "Target future value is not finite.".to_string();
        return result;
    }
    if !config.annual_payment.is_finite() || config.annual_payment <= 0.0 {
        result.message = "Annual payment must be positive.".to_string();
        return result;
    }

    let fv = |rate: f64| annuity_due_future_value(config.annual_payment, rate, years);

    let mut lo = 0.0;
    let mut hi = config.initial_high;
    for _ in 0..config.max_doublings {
        if fv(hi) > target_future_value {
            break;
        }
        hi *= 2.0;
    }
    result.bracketed = fv(hi) > target_future_value;
    if !result.bracketed {
        warn!(
            target_future_value,
            years,
            upper = hi,
            "equivalent rate not bracketed; bisection result is a best estimate"
        );
    }

    for it in 1..=config.max_iterations {
        result.iterations = it;
        let mid = (lo + hi) * 0.5;
        let current = fv(mid);
        if (current - target_future_value).abs() < config.tolerance {
            result.rate = round_to(mid, config.decimals);
            result.converged = true;
            result.message = "Solved equivalent rate.".to_string();
            debug!(rate = result.rate, iterations = it, "equivalent rate converged");
            return result;
        }
        if current < target_future_value {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    result.rate = round_to((lo + hi) * 0.5, config.decimals);
    result.message =
        "Reached max iterations before tolerance was met; returning best estimate.".to_string();
    debug!(rate = result.rate, "equivalent rate best estimate");
    result
}

/// Rounds the exact binary value to `decimals` places, ties to even.
pub(crate) fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}
