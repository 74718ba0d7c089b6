mod render;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    CalcError, ComparisonParams, ComparisonReport, DEFAULT_ANNUAL_CONTRIBUTION,
    DEFAULT_TERMINAL_TAX_RATE, MAX_YEARS, ProjectionConfig, RateSolveConfig, RateSolveResult,
    Recommendation, YearRecord, compute, solve_rate,
};

pub use render::{format_money, format_pct, recommendation_text, render_report};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pension-calc",
    about = "Personal pension vs. fixed deposit calculator (fixed annual contribution)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 1.9,
        allow_negative_numbers = true,
        help = "Annual deposit interest rate in percent, e.g. 1.9"
    )]
    rate: f64,
    #[arg(
        long,
        default_value_t = 20,
        allow_negative_numbers = true,
        help = "Years left to contribute before retirement"
    )]
    years: i64,
    #[arg(
        long,
        default_value_t = 3,
        allow_negative_numbers = true,
        help = "Tax refund rate in percent: one of 0, 3, 10, 20, 25, 30, 35, 45"
    )]
    tax_refund_rate: i64,
    #[arg(
        long,
        env = "PENSION_CALC_ANNUAL_CONTRIBUTION",
        default_value_t = DEFAULT_ANNUAL_CONTRIBUTION,
        help = "Amount paid into each scheme at the start of every year"
    )]
    annual_contribution: f64,
    #[arg(
        long,
        env = "PENSION_CALC_TERMINAL_TAX_RATE",
        default_value_t = DEFAULT_TERMINAL_TAX_RATE * 100.0,
        help = "Withdrawal tax on the pension principal in the final year, in percent"
    )]
    terminal_tax_rate: f64,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    rate: Option<f64>,
    years: Option<i64>,
    tax_refund_rate: Option<i64>,
    annual_contribution: Option<f64>,
    terminal_tax_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EquivalentRatePayload {
    target_future_value: Option<f64>,
    years: Option<i64>,
    annual_contribution: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    params: ComparisonParams,
    config: ProjectionConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    rate: f64,
    years: u32,
    tax_refund_rate: u32,
    annual_contribution: f64,
    terminal_tax_rate: f64,
    final_pension: i64,
    final_savings: i64,
    difference: i64,
    equivalent_rate: f64,
    equivalent_rate_converged: bool,
    parameter_summary: String,
    recommendation: Recommendation,
    year_records: Vec<YearRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: &Cli) -> Result<ApiRequest, CalcError> {
    let params = ComparisonParams::new(cli.rate, cli.years, cli.tax_refund_rate)?;
    let config = ProjectionConfig::new(cli.annual_contribution, cli.terminal_tax_rate)?;
    params.check_value_range(&config)?;
    Ok(ApiRequest { params, config })
}

/// Runs one comparison from command-line arguments and prints it to stdout.
pub fn run_cli(args: Vec<String>) -> Result<(), String> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| e.exit());
    let request = build_request(&cli).map_err(|e| e.to_string())?;
    let report = compute(&request.params, &request.config);

    let output = match cli.format {
        OutputFormat::Table => render_report(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&build_compare_response(&report))
            .map_err(|e| format!("failed to serialize result: {e}"))?,
    };
    println!("{output}");
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/equivalent-rate", get(equivalent_rate_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "pension calculator HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload)
}

fn compare_handler_impl(payload: ComparePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejected comparison request");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let report = compute(&request.params, &request.config);
    info!(
        summary = %report.result.parameter_summary,
        difference = report.result.difference,
        "comparison served"
    );
    json_response(StatusCode::OK, build_compare_response(&report))
}

async fn equivalent_rate_handler(Query(payload): Query<EquivalentRatePayload>) -> Response {
    match solve_from_payload(payload) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => {
            warn!(error = %e, "rejected equivalent rate request");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: ComparePayload) -> Result<ApiRequest, CalcError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.rate {
        cli.rate = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.tax_refund_rate {
        cli.tax_refund_rate = v;
    }
    if let Some(v) = payload.annual_contribution {
        cli.annual_contribution = v;
    }
    if let Some(v) = payload.terminal_tax_rate {
        cli.terminal_tax_rate = v;
    }

    build_request(&cli)
}

fn solve_from_payload(payload: EquivalentRatePayload) -> Result<RateSolveResult, CalcError> {
    let Some(target) = payload.target_future_value else {
        return Err(CalcError::invalid("target_future_value", "is required"));
    };
    let years = payload.years.unwrap_or(default_cli_for_api().years);
    let years = u32::try_from(years)
        .ok()
        .filter(|years| *years <= MAX_YEARS)
        .ok_or_else(|| CalcError::invalid("years", format!("must be between 0 and {MAX_YEARS}")))?;
    let config = ProjectionConfig::new(
        payload
            .annual_contribution
            .unwrap_or(DEFAULT_ANNUAL_CONTRIBUTION),
        DEFAULT_TERMINAL_TAX_RATE * 100.0,
    )?;

    Ok(solve_rate(
        target,
        years,
        RateSolveConfig {
            annual_payment: config.annual_contribution,
            ..RateSolveConfig::default()
        },
    ))
}

fn default_cli_for_api() -> Cli {
    Cli {
        rate: 1.9,
        years: 20,
        tax_refund_rate: 3,
        annual_contribution: DEFAULT_ANNUAL_CONTRIBUTION,
        terminal_tax_rate: DEFAULT_TERMINAL_TAX_RATE * 100.0,
        format: OutputFormat::Json,
    }
}

fn build_compare_response(report: &ComparisonReport) -> CompareResponse {
    let result = &report.result;
    CompareResponse {
        rate: report.params.interest_rate_pct(),
        years: report.params.years(),
        tax_refund_rate: report.params.tax_refund_rate().percent(),
        annual_contribution: report.config.annual_contribution,
        terminal_tax_rate: report.config.terminal_tax_rate * 100.0,
        final_pension: result.final_pension,
        final_savings: result.final_savings,
        difference: result.difference,
        equivalent_rate: report.equivalent_rate.rate,
        equivalent_rate_converged: report.equivalent_rate.converged,
        parameter_summary: result.parameter_summary.clone(),
        recommendation: result.recommendation(),
        year_records: result.year_records.clone(),
    }
}
