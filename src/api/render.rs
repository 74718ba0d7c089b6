use crate::core::{ComparisonReport, Recommendation};

pub fn format_money(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-¥{grouped}")
    } else {
        format!("¥{grouped}")
    }
}

/// Percent string for a fraction, without trailing zeros: 0.03 -> "3%".
pub fn format_pct(fraction: f64) -> String {
    let text = format!("{:.2}", fraction * 100.0);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}%")
}

pub fn recommendation_text(report: &ComparisonReport) -> String {
    let refund_pct = report.params.tax_refund_rate().percent();
    let terminal_pct = format_pct(report.config.terminal_tax_rate);
    match report.result.recommendation() {
        Recommendation::Pension { advantage } => format!(
            "Recommended: personal pension. Earns {} more; the {refund_pct}% tax refund \
             outweighs the {terminal_pct} withdrawal tax. Refunds are reinvested and \
             compounded every year; the withdrawal tax only reduces the final payout.",
            format_money(advantage)
        ),
        Recommendation::Savings { advantage } => format!(
            "Recommended: plain savings. Earns {} more; a {refund_pct}% tax refund does not \
             cover the {terminal_pct} withdrawal tax.",
            format_money(advantage)
        ),
        Recommendation::Tie => "Both schemes end with the same value.".to_string(),
    }
}

pub fn render_report(report: &ComparisonReport) -> String {
    let result = &report.result;

    let leader = match result.recommendation() {
        Recommendation::Pension { .. } => "pension ahead",
        Recommendation::Savings { .. } => "savings ahead",
        Recommendation::Tie => "tie",
    };

    let mut lines = vec![
        "Final comparison".to_string(),
        format!(
            "{:<18} {:>22} {:>22}",
            "", "Pension (scheme A)", "Savings (scheme B)"
        ),
        format!(
            "{:<18} {:>22} {:>22}",
            "Final value",
            format_money(result.final_pension),
            format_money(result.final_savings)
        ),
        format!(
            "{:<18} {:>22}",
            "Difference",
            format!("{} ({leader})", format_money(result.difference.abs()))
        ),
        format!(
            "{:<18} {:>22} {:>22}",
            "Effective rate",
            format!("{:.1}%", report.equivalent_rate.rate * 100.0),
            format!("{}%", report.params.interest_rate_pct())
        ),
        format!("{:<18} {}", "Parameters", result.parameter_summary),
        String::new(),
        recommendation_text(report),
        String::new(),
        format!(
            "Year by year ({} withdrawal tax at retirement)",
            format_pct(report.config.terminal_tax_rate)
        ),
        format!(
            "{:>6} {:>16} {:>10} {:>16} {:>10}",
            "Year", "Pension", "Return", "Savings", "Return"
        ),
    ];
    lines.extend(result.year_records.iter().map(|record| {
        format!(
            "{:>6} {:>16} {:>10} {:>16} {:>10}",
            record.year,
            format_money(record.pension_value),
            format!("{:.1}%", record.pension_return_pct),
            format_money(record.savings_value),
            format!("{:.1}%", record.savings_return_pct)
        )
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
