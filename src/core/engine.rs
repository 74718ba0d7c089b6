use tracing::debug;

use super::solver::{RateSolveConfig, round_to, solve_rate};
use super::types::{
    ComparisonParams, ComparisonReport, ComparisonResult, MAX_EXACT_MONEY, ProjectionConfig,
    YearRecord,
};

/// Running balances carried from one year to the next.
#[derive(Debug, Default, Clone, Copy)]
struct SchemeBalances {
    pension: f64,
    refund_invested: f64,
    savings: f64,
}

impl SchemeBalances {
    fn advance(&mut self, contribution: f64, refund_rate: f64, growth: f64) {
        self.pension = (self.pension + contribution) * growth;
        let refund = contribution * refund_rate;
        self.refund_invested = (self.refund_invested + refund) * growth;
        self.savings = (self.savings + contribution) * growth;
    }

    fn pension_scheme_value(self) -> f64 {
        self.pension + self.refund_invested
    }

    /// Withdrawal tax hits the pension principal only, never the reinvested refunds.
    fn pension_scheme_value_after_tax(self, terminal_tax_rate: f64) -> f64 {
        self.pension * (1.0 - terminal_tax_rate) + self.refund_invested
    }
}

pub fn run_comparison(params: &ComparisonParams, config: &ProjectionConfig) -> ComparisonResult {
    let year_records = project_years(
        params.interest_rate(),
        params.years(),
        params.tax_refund_rate().fraction(),
        config,
    );
    build_comparison_result(year_records, params.summary())
}

/// Projects both schemes for `years` years; a zero horizon yields no records.
pub fn project_years(
    rate: f64,
    years: u32,
    refund_rate: f64,
    config: &ProjectionConfig,
) -> Vec<YearRecord> {
    let contribution = config.annual_contribution;
    let growth = 1.0 + rate;
    let mut balances = SchemeBalances::default();
    let mut records = Vec::with_capacity(years as usize);

    for year in 1..=years {
        balances.advance(contribution, refund_rate, growth);
        let total_invested = contribution * year as f64;

        let pension_value = if year == years {
            balances.pension_scheme_value_after_tax(config.terminal_tax_rate)
        } else {
            balances.pension_scheme_value()
        };
        let savings_value = balances.savings;

        records.push(YearRecord {
            year,
            pension_value: round_money(pension_value),
            savings_value: round_money(savings_value),
            pension_return_pct: round_to(return_pct(pension_value, total_invested), 1),
            savings_return_pct: round_to(return_pct(savings_value, total_invested), 1),
        });
    }

    records
}

/// Runs the projection and solves the flat savings rate matching the pension outcome.
pub fn compute(params: &ComparisonParams, config: &ProjectionConfig) -> ComparisonReport {
    let result = run_comparison(params, config);
    let equivalent_rate = solve_rate(
        result.final_pension as f64,
        params.years(),
        RateSolveConfig {
            annual_payment: config.annual_contribution,
            ..RateSolveConfig::default()
        },
    );
    debug!(
        summary = %result.parameter_summary,
        final_pension = result.final_pension,
        final_savings = result.final_savings,
        equivalent_rate = equivalent_rate.rate,
        "comparison computed"
    );

    ComparisonReport {
        params: *params,
        config: *config,
        result,
        equivalent_rate,
    }
}

fn build_comparison_result(
    year_records: Vec<YearRecord>,
    parameter_summary: String,
) -> ComparisonResult {
    let (final_pension, final_savings) = year_records
        .last()
        .map(|last| (last.pension_value, last.savings_value))
        .unwrap_or((0, 0));

    ComparisonResult {
        final_pension,
        final_savings,
        difference: final_pension - final_savings,
        year_records,
        parameter_summary,
    }
}

fn return_pct(value: f64, invested: f64) -> f64 {
    if invested <= 0.0 {
        return 0.0;
    }
    (value - invested) / invested * 100.0
}

/// Callers keep values inside `ComparisonParams::check_value_range`, so the cast is exact.
fn round_money(value: f64) -> i64 {
    debug_assert!(value.abs() <= MAX_EXACT_MONEY, "money value {value} out of range");
    value.round_ties_even() as i64
}
