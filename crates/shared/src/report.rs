//! Strict schema for the analyzer's success payload.
//!
//! Every field the dashboard binds to is required except `financial_metrics`,
//! which the remote service omits when no yearly figures could be extracted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Apply,
    HighRiskApply,
    Avoid,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Apply => "Apply",
            Verdict::HighRiskApply => "High Risk Apply",
            Verdict::Avoid => "Avoid",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Good,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        if score >= 8 {
            ScoreBand::Strong
        } else if score >= 6 {
            ScoreBand::Good
        } else if score >= 4 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Strong => "strong",
            ScoreBand::Good => "good",
            ScoreBand::Moderate => "moderate",
            ScoreBand::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub financial_strength: u8,
    pub valuation_comfort: u8,
    pub promoter_quality: u8,
    pub demand_strength: u8,
}

impl Scores {
    /// Sub-scores in dashboard order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u8)> {
        [
            ("Financial Strength", self.financial_strength),
            ("Valuation Comfort", self.valuation_comfort),
            ("Promoter Quality", self.promoter_quality),
            ("Demand Strength", self.demand_strength),
        ]
        .into_iter()
    }

    pub fn average(&self) -> f64 {
        let total: u32 = self.iter().map(|(_, value)| u32::from(value)).sum();
        f64::from(total) / 4.0
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let fields = [
            ("financial_strength", self.financial_strength),
            ("valuation_comfort", self.valuation_comfort),
            ("promoter_quality", self.promoter_quality),
            ("demand_strength", self.demand_strength),
        ];
        for (field, value) in fields {
            if value > MAX_SCORE {
                return Err(SchemaError::ScoreOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialYear {
    pub year: String,
    pub revenue: f64,
    pub profit: f64,
    pub loss: f64,
    pub margin: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub yearly_data: Vec<FinancialYear>,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub avg_margin: f64,
    pub revenue_growth_trend: String,
    pub profitability_trend: String,
}

impl FinancialMetrics {
    pub fn peak_revenue(&self) -> Option<f64> {
        self.yearly_data
            .iter()
            .map(|year| year.revenue)
            .reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub company_overview: String,
    pub business_summary: String,
    pub financial_analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_metrics: Option<FinancialMetrics>,
    pub key_strengths: Vec<String>,
    pub key_risks: Vec<String>,
    pub valuation_analysis: String,
    pub profit_potential: String,
    pub investment_recommendation: String,
    pub scores: Scores,
    pub final_verdict: Verdict,
    pub final_comment: String,
}

/// A success payload that passed schema validation, kept alongside the
/// document exactly as the analyzer sent it.
///
/// The typed view drives display. Exports use `document`, so numbers keep
/// their original representation and fields this schema does not know about
/// survive.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    document: Value,
    result: AnalysisResult,
}

impl AnalysisReport {
    pub fn from_json_slice(body: &[u8]) -> Result<Self, SchemaError> {
        let document: Value = serde_json::from_slice(body).map_err(SchemaError::Decode)?;
        Self::from_document(document)
    }

    pub fn from_document(document: Value) -> Result<Self, SchemaError> {
        let result = AnalysisResult::deserialize(&document).map_err(SchemaError::Decode)?;
        result.scores.validate()?;
        Ok(Self { document, result })
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_result(self) -> AnalysisResult {
        self.result
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document)
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
