mod engine;
mod error;
mod solver;
mod types;

pub use engine::{compute, project_years, run_comparison};
pub use error::CalcError;
pub use solver::{RateSolveConfig, annuity_due_future_value, solve_equivalent_rate, solve_rate};
pub use types::{
    ComparisonParams, ComparisonReport, ComparisonResult, DEFAULT_ANNUAL_CONTRIBUTION,
    DEFAULT_TERMINAL_TAX_RATE, MAX_EXACT_MONEY, MAX_YEARS, ProjectionConfig, RateSolveResult,
    Recommendation, TaxRefundRate, YearRecord,
};
