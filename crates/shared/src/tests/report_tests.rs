use super::*;
use serde_json::{json, Value};

fn sample_body() -> Value {
    json!({
        "company_overview": "Specialty chemicals maker with export focus.",
        "business_summary": "B2B supplier to pharma and agrochem.",
        "financial_analysis": "Revenue up three years running, debt moderate.",
        "financial_metrics": {
            "yearly_data": [
                {"year": "2022", "revenue": 100.5, "profit": 15.2, "loss": 0.0, "margin": 15.1, "growth_rate": 0.0},
                {"year": "2023", "revenue": 125.3, "profit": 22.5, "loss": 0.0, "margin": 17.9, "growth_rate": 24.8},
                {"year": "2024", "revenue": 156.8, "profit": 31.2, "loss": 0.0, "margin": 19.9, "growth_rate": 25.1}
            ],
            "total_revenue": 382.6,
            "total_profit": 68.9,
            "total_loss": 0.0,
            "avg_margin": 17.6,
            "revenue_growth_trend": "increasing",
            "profitability_trend": "improving"
        },
        "key_strengths": ["Market leader", "Sticky customers"],
        "key_risks": ["Raw material prices", "Customer concentration"],
        "valuation_analysis": "Priced in line with peers.",
        "profit_potential": "Modest listing gains expected.",
        "investment_recommendation": "Apply for the long term.",
        "scores": {
            "financial_strength": 8,
            "valuation_comfort": 7,
            "promoter_quality": 9,
            "demand_strength": 6
        },
        "final_verdict": "apply",
        "final_comment": "Solid fundamentals at a fair price."
    })
}

fn decode(body: &Value) -> Result<AnalysisResult, SchemaError> {
    AnalysisReport::from_json_slice(body.to_string().as_bytes()).map(AnalysisReport::into_result)
}

#[test]
fn decodes_complete_payload() {
    let result = decode(&sample_body()).expect("decode");
    assert_eq!(result.final_verdict, Verdict::Apply);
    assert_eq!(result.scores.promoter_quality, 9);
    let metrics = result.financial_metrics.expect("metrics");
    assert_eq!(metrics.yearly_data.len(), 3);
    assert_eq!(metrics.yearly_data[1].year, "2023");
    assert_eq!(metrics.peak_revenue(), Some(156.8));
}

#[test]
fn pretty_json_is_the_received_document() {
    let mut body = sample_body();
    body["financial_metrics"]["total_revenue"] = json!(382);
    body["financial_metrics"]["yearly_data"][0]["loss"] = json!(0);
    body["analysis_version"] = json!("2024-06");

    let report = AnalysisReport::from_json_slice(body.to_string().as_bytes()).expect("decode");
    assert_eq!(report.document(), &body);
    let metrics = report.result().financial_metrics.as_ref().expect("metrics");
    assert_eq!(metrics.total_revenue, 382.0);

    let pretty = report.to_pretty_json().expect("encode");
    assert!(pretty.contains("\"total_revenue\": 382,"), "{pretty}");
    assert!(pretty.contains("\"analysis_version\": \"2024-06\""), "{pretty}");
    let reparsed: Value = serde_json::from_str(&pretty).expect("parse pretty");
    assert_eq!(reparsed, body);
}

#[test]
fn invalid_document_is_rejected_before_it_is_kept() {
    let mut body = sample_body();
    body["scores"]["promoter_quality"] = json!(12);
    assert!(AnalysisReport::from_document(body).is_err());
    assert!(AnalysisReport::from_json_slice(b"not json").is_err());
}

#[test]
fn financial_metrics_are_optional() {
    let mut body = sample_body();
    body.as_object_mut().expect("object").remove("financial_metrics");
    let result = decode(&body).expect("decode");
    assert!(result.financial_metrics.is_none());

    body["financial_metrics"] = Value::Null;
    assert!(decode(&body).expect("decode null").financial_metrics.is_none());
}

#[test]
fn missing_required_field_is_rejected() {
    let mut body = sample_body();
    body.as_object_mut().expect("object").remove("final_comment");
    let err = decode(&body).expect_err("must fail");
    assert!(matches!(err, SchemaError::Decode(_)));
    assert!(err.to_string().contains("final_comment"), "{err}");
}

#[test]
fn unknown_verdict_is_rejected() {
    let mut body = sample_body();
    body["final_verdict"] = json!("strong-buy");
    assert!(matches!(decode(&body), Err(SchemaError::Decode(_))));
}

#[test]
fn verdict_wire_names_are_kebab_case() {
    let mut body = sample_body();
    body["final_verdict"] = json!("high-risk-apply");
    let result = decode(&body).expect("decode");
    assert_eq!(result.final_verdict, Verdict::HighRiskApply);
    assert_eq!(result.final_verdict.to_string(), "High Risk Apply");
}

#[test]
fn out_of_range_score_is_rejected() {
    let mut body = sample_body();
    body["scores"]["demand_strength"] = json!(11);
    let err = decode(&body).expect_err("must fail");
    assert!(matches!(
        err,
        SchemaError::ScoreOutOfRange {
            field: "demand_strength",
            value: 11
        }
    ));
}

#[test]
fn string_typed_score_is_rejected() {
    let mut body = sample_body();
    body["scores"]["valuation_comfort"] = json!("7");
    assert!(matches!(decode(&body), Err(SchemaError::Decode(_))));
}

#[test]
fn score_bands_follow_dashboard_thresholds() {
    assert_eq!(ScoreBand::for_score(10), ScoreBand::Strong);
    assert_eq!(ScoreBand::for_score(8), ScoreBand::Strong);
    assert_eq!(ScoreBand::for_score(7), ScoreBand::Good);
    assert_eq!(ScoreBand::for_score(6), ScoreBand::Good);
    assert_eq!(ScoreBand::for_score(4), ScoreBand::Moderate);
    assert_eq!(ScoreBand::for_score(3), ScoreBand::Weak);
    assert_eq!(ScoreBand::for_score(0), ScoreBand::Weak);
}

#[test]
fn scores_average_and_order() {
    let scores = decode(&sample_body()).expect("decode").scores;
    assert_eq!(scores.average(), 7.5);
    let labels: Vec<_> = scores.iter().map(|(label, _)| label).collect();
    assert_eq!(
        labels,
        [
            "Financial Strength",
            "Valuation Comfort",
            "Promoter Quality",
            "Demand Strength"
        ]
    );
}
