use serde::Serialize;

use super::error::CalcError;
use super::solver::annuity_due_future_value;

pub const DEFAULT_ANNUAL_CONTRIBUTION: f64 = 12_000.0;
pub const DEFAULT_TERMINAL_TAX_RATE: f64 = 0.03;
pub const MAX_YEARS: u32 = 1_000;
/// Largest money amount (2^53) that survives the f64 projection and i64 rounding exactly.
pub const MAX_EXACT_MONEY: f64 = 9_007_199_254_740_992.0;

/// Tax refund rates offered by the personal income tax brackets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxRefundRate {
    Zero,
    Three,
    Ten,
    Twenty,
    TwentyFive,
    Thirty,
    ThirtyFive,
    FortyFive,
}

impl TaxRefundRate {
    pub const ALL: [TaxRefundRate; 8] = [
        TaxRefundRate::Zero,
        TaxRefundRate::Three,
        TaxRefundRate::Ten,
        TaxRefundRate::Twenty,
        TaxRefundRate::TwentyFive,
        TaxRefundRate::Thirty,
        TaxRefundRate::ThirtyFive,
        TaxRefundRate::FortyFive,
    ];

    pub fn from_percent(pct: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| i64::from(rate.percent()) == pct)
    }

    pub fn percent(self) -> u32 {
        match self {
            TaxRefundRate::Zero => 0,
            TaxRefundRate::Three => 3,
            TaxRefundRate::Ten => 10,
            TaxRefundRate::Twenty => 20,
            TaxRefundRate::TwentyFive => 25,
            TaxRefundRate::Thirty => 30,
            TaxRefundRate::ThirtyFive => 35,
            TaxRefundRate::FortyFive => 45,
        }
    }

    pub fn fraction(self) -> f64 {
        self.percent() as f64 / 100.0
    }
}

/// Contribution and withdrawal-tax settings shared by both schemes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub annual_contribution: f64,
    /// Fraction of the pension principal withheld in the final year.
    pub terminal_tax_rate: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            annual_contribution: DEFAULT_ANNUAL_CONTRIBUTION,
            terminal_tax_rate: DEFAULT_TERMINAL_TAX_RATE,
        }
    }
}

impl ProjectionConfig {
    /// Builds a config from a contribution amount and a terminal tax rate in percent.
    pub fn new(annual_contribution: f64, terminal_tax_rate_pct: f64) -> Result<Self, CalcError> {
        if !annual_contribution.is_finite() || annual_contribution <= 0.0 {
            return Err(CalcError::invalid(
                "annual_contribution",
                "must be a finite amount > 0",
            ));
        }
        if !(0.0..=100.0).contains(&terminal_tax_rate_pct) {
            return Err(CalcError::invalid(
                "terminal_tax_rate",
                "must be between 0 and 100",
            ));
        }
        Ok(Self {
            annual_contribution,
            terminal_tax_rate: terminal_tax_rate_pct / 100.0,
        })
    }
}

/// Validated inputs for one comparison run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonParams {
    interest_rate_pct: f64,
    years: u32,
    tax_refund_rate: TaxRefundRate,
}

impl ComparisonParams {
    pub fn new(
        interest_rate_pct: f64,
        years: i64,
        tax_refund_rate_pct: i64,
    ) -> Result<Self, CalcError> {
        if !interest_rate_pct.is_finite() {
            return Err(CalcError::invalid("rate", "must be a finite number"));
        }
        if interest_rate_pct < 0.0 {
            return Err(CalcError::invalid("rate", "must be >= 0"));
        }
        if years < 1 {
            return Err(CalcError::invalid("years", "must be >= 1"));
        }
        if years > i64::from(MAX_YEARS) {
            return Err(CalcError::invalid("years", format!("must be <= {MAX_YEARS}")));
        }
        let years = years as u32;
        let Some(tax_refund_rate) = TaxRefundRate::from_percent(tax_refund_rate_pct) else {
            return Err(CalcError::invalid(
                "tax_refund_rate",
                format!("{tax_refund_rate_pct} is not one of 0, 3, 10, 20, 25, 30, 35, 45"),
            ));
        };

        let params = Self {
            interest_rate_pct,
            years,
            tax_refund_rate,
        };
        params.check_value_range(&ProjectionConfig::default())?;
        Ok(params)
    }

    /// Rejects horizons whose projected balances leave the exactly representable range.
    ///
    /// Contribution plus refund compounded without the terminal tax bounds both schemes.
    pub fn check_value_range(&self, config: &ProjectionConfig) -> Result<(), CalcError> {
        let yearly = config.annual_contribution * (1.0 + self.tax_refund_rate.fraction());
        let bound = annuity_due_future_value(yearly, self.interest_rate(), self.years);
        if bound.is_finite() && bound <= MAX_EXACT_MONEY {
            return Ok(());
        }
        Err(CalcError::invalid(
            "rate",
            format!(
                "{}% over {} years projects beyond {MAX_EXACT_MONEY:.0}",
                self.interest_rate_pct, self.years
            ),
        ))
    }

    pub fn interest_rate_pct(&self) -> f64 {
        self.interest_rate_pct
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate_pct / 100.0
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn tax_refund_rate(&self) -> TaxRefundRate {
        self.tax_refund_rate
    }

    pub fn summary(&self) -> String {
        format!(
            "{}% rate / {} years / {}% tax refund",
            self.interest_rate_pct,
            self.years,
            self.tax_refund_rate.percent()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: u32,
    pub pension_value: i64,
    pub savings_value: i64,
    pub pension_return_pct: f64,
    pub savings_return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub final_pension: i64,
    pub final_savings: i64,
    pub difference: i64,
    pub year_records: Vec<YearRecord>,
    pub parameter_summary: String,
}

impl ComparisonResult {
    pub fn recommendation(&self) -> Recommendation {
        match self.difference {
            d if d > 0 => Recommendation::Pension { advantage: d },
            d if d < 0 => Recommendation::Savings { advantage: -d },
            _ => Recommendation::Tie,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "leader", rename_all = "camelCase")]
pub enum Recommendation {
    Pension { advantage: i64 },
    Savings { advantage: i64 },
    Tie,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSolveResult {
    pub target_future_value: f64,
    pub years: u32,
    pub annual_payment: f64,
    pub rate: f64,
    pub iterations: u32,
    pub bracketed: bool,
    pub converged: bool,
    pub message: String,
}

/// Projection plus the equivalent savings rate for the pension outcome.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub params: ComparisonParams,
    pub config: ProjectionConfig,
    pub result: ComparisonResult,
    pub equivalent_rate: RateSolveResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_refund_rate_accepts_only_bracket_percentages() {
        for pct in [0, 3, 10, 20, 25, 30, 35, 45] {
            let rate = TaxRefundRate::from_percent(pct).expect("bracket rate");
            assert_eq!(i64::from(rate.percent()), pct);
        }
        for pct in [-3, 1, 15, 40, 50, 100] {
            assert!(TaxRefundRate::from_percent(pct).is_none());
        }
    }

    #[test]
    fn params_keep_rate_as_entered_and_expose_fraction() {
        let params = ComparisonParams::new(1.9, 20, 3).expect("valid params");
        assert_eq!(params.interest_rate_pct(), 1.9);
        assert!((params.interest_rate() - 0.019).abs() < 1e-15);
        assert_eq!(params.summary(), "1.9% rate / 20 years / 3% tax refund");
    }

    #[test]
    fn params_reject_years_beyond_limit() {
        let err = ComparisonParams::new(1.0, i64::from(MAX_YEARS) + 1, 0).expect_err("too long");
        assert!(matches!(err, CalcError::InvalidParameter { name: "years", .. }));
        assert!(ComparisonParams::new(1.0, i64::from(MAX_YEARS), 0).is_ok());
    }

    #[test]
    fn params_reject_projections_beyond_exact_money_range() {
        for (rate, years, refund) in [(5.0, i64::from(MAX_YEARS), 0), (50.0, 100, 45)] {
            let err = ComparisonParams::new(rate, years, refund).expect_err("too large");
            assert!(
                matches!(err, CalcError::InvalidParameter { name: "rate", .. }),
                "{rate}% / {years}y: {err:?}"
            );
        }
    }

    #[test]
    fn params_accept_full_horizon_at_modest_rates() {
        for rate in [0.0, 1.0, 1.9] {
            let params = ComparisonParams::new(rate, i64::from(MAX_YEARS), 45).expect("fits");
            assert_eq!(params.years(), MAX_YEARS);
        }
    }

    #[test]
    fn value_range_scales_with_contribution() {
        let params = ComparisonParams::new(2.0, i64::from(MAX_YEARS), 45).expect("fits by default");
        let large = ProjectionConfig::new(1.0e9, 3.0).expect("valid config");
        assert!(params.check_value_range(&ProjectionConfig::default()).is_ok());
        assert!(params.check_value_range(&large).is_err());
    }

    #[test]
    fn default_config_matches_fixed_constants() {
        let config = ProjectionConfig::default();
        assert_eq!(config.annual_contribution, 12_000.0);
        assert_eq!(config.terminal_tax_rate, 0.03);
        assert_eq!(ProjectionConfig::new(12_000.0, 3.0), Ok(config));
    }

    #[test]
    fn config_rejects_non_positive_contribution_and_out_of_range_tax() {
        assert!(ProjectionConfig::new(0.0, 3.0).is_err());
        assert!(ProjectionConfig::new(f64::NAN, 3.0).is_err());
        assert!(ProjectionConfig::new(12_000.0, -1.0).is_err());
        assert!(ProjectionConfig::new(12_000.0, f64::NAN).is_err());
    }
}
