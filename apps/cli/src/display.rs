//! Plain-text rendering of an analysis for the terminal.

use std::fmt::Write as _;

use client_core::ProgressUpdate;
use shared::report::{AnalysisResult, FinancialMetrics, ScoreBand};

pub fn progress_line(update: &ProgressUpdate) -> String {
    format!("[{:>3}%] {}", update.percent, update.label)
}

pub fn render_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Verdict: {}", result.final_verdict);
    let _ = writeln!(out, "{}", result.final_comment);

    section(&mut out, "Company Overview", &result.company_overview);
    section(&mut out, "Business Summary", &result.business_summary);
    section(&mut out, "Financial Analysis", &result.financial_analysis);

    if let Some(metrics) = &result.financial_metrics {
        render_metrics(&mut out, metrics);
    }

    list(&mut out, "Key Strengths", &result.key_strengths);
    list(&mut out, "Key Risks", &result.key_risks);

    section(&mut out, "Valuation Analysis", &result.valuation_analysis);
    section(&mut out, "Profit Potential", &result.profit_potential);
    section(
        &mut out,
        "Investment Recommendation",
        &result.investment_recommendation,
    );

    let _ = writeln!(out, "\nScores");
    for (label, value) in result.scores.iter() {
        let _ = writeln!(
            out,
            "  {label:<20} {value:>2}/10  ({})",
            ScoreBand::for_score(value).label()
        );
    }
    let _ = writeln!(out, "  {:<20} {:.1}/10", "Average", result.scores.average());

    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "\n{title}\n  {body}");
}

fn list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "\n{title}");
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

fn render_metrics(out: &mut String, metrics: &FinancialMetrics) {
    let _ = writeln!(out, "\nFinancials");
    let _ = writeln!(
        out,
        "  {:<8} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "Year", "Revenue", "Profit", "Loss", "Margin", "Growth"
    );
    for year in &metrics.yearly_data {
        let _ = writeln!(
            out,
            "  {:<8} {:>10.1} {:>10.1} {:>10.1} {:>7.1}% {:>7.1}%",
            year.year, year.revenue, year.profit, year.loss, year.margin, year.growth_rate
        );
    }
    let _ = writeln!(
        out,
        "  Totals: revenue {:.1}, profit {:.1}, loss {:.1}, average margin {:.1}%",
        metrics.total_revenue, metrics.total_profit, metrics.total_loss, metrics.avg_margin
    );
    let _ = writeln!(
        out,
        "  Revenue trend: {}, profitability trend: {}",
        metrics.revenue_growth_trend, metrics.profitability_trend
    );
}
