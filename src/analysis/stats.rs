// src/analysis/stats.rs

//! Reads the verdict out of completion texts and aggregates success rates.

use crate::core_types::{AnalysisStats, AnalysisStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence regex is valid")
});

/// Returns the body of the first fenced code block, or the trimmed text when
/// there is none.
///
/// ```
/// use wfg::analysis::stats::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fences("  plain  "), "plain");
/// ```
pub fn strip_code_fences(text: &str) -> &str {
    match FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => text.trim(),
    }
}

/// Parses an analysis text into a JSON object. Anything else is `None`.
pub fn parse_analysis_json(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fences(text)) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn status_of(object: &Map<String, Value>) -> AnalysisStatus {
    match object.get("status").and_then(Value::as_str) {
        Some("success") => AnalysisStatus::Success,
        _ => AnalysisStatus::Fail,
    }
}

/// Classifies a completion: `Success`/`Fail` from the parsed `status` field,
/// `Incomplete` when nothing parseable was returned.
pub fn classify_status(text: &str) -> AnalysisStatus {
    parse_analysis_json(text)
        .map(|object| status_of(&object))
        .unwrap_or(AnalysisStatus::Incomplete)
}

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes success statistics over a batch of analysis texts.
///
/// Texts that do not parse are logged and left out of both the numerator and
/// the denominator.
pub fn compute_stats<'a, I>(texts: I) -> AnalysisStats
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stats = AnalysisStats::default();
    for text in texts {
        stats.total_collected += 1;
        match parse_analysis_json(text) {
            Some(object) => {
                stats.parsed += 1;
                if status_of(&object) == AnalysisStatus::Success {
                    stats.successes += 1;
                }
            }
            None => log::warn!(
                "Analysis result is not valid JSON, excluded from statistics: {:.80}",
                text.trim()
            ),
        }
    }
    if stats.parsed > 0 {
        stats.success_rate = Some(round2(
            stats.successes as f64 / stats.parsed as f64 * 100.0,
        ));
    }
    stats
}

/// String entries of the `recommendations` and `suggestions` arrays.
pub fn recommendations_of(object: &Map<String, Value>) -> Vec<String> {
    ["recommendations", "suggestions"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_variants() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(
            strip_code_fences("Here you go:\n```json\n{\"status\":\"success\"}\n```\nBye"),
            "{\"status\":\"success\"}"
        );
        assert_eq!(strip_code_fences("{\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status("```json\n{\"status\":\"success\"}\n```"),
            AnalysisStatus::Success
        );
        assert_eq!(classify_status("{\"status\":\"fail\"}"), AnalysisStatus::Fail);
        assert_eq!(classify_status("{\"risks\":[]}"), AnalysisStatus::Fail);
        assert_eq!(classify_status("I could not analyze this."), AnalysisStatus::Incomplete);
        assert_eq!(classify_status("[1, 2]"), AnalysisStatus::Incomplete);
    }

    #[test]
    fn test_success_rate_two_of_three() {
        let texts = [
            "```json\n{\"status\":\"success\"}\n```",
            "{\"status\":\"success\"}",
            "{\"status\":\"fail\"}",
        ];
        let stats = compute_stats(texts);
        assert_eq!(stats.total_collected, 3);
        assert_eq!(stats.parsed, 3);
        assert_eq!(stats.successes, 2);
        assert_eq!(stats.success_rate, Some(66.67));
    }

    #[test]
    fn test_malformed_texts_are_excluded() {
        let texts = [
            "{\"status\":\"success\"}",
            "not json at all",
            "{\"status\":\"fail\"}",
            "```json\n{broken\n```",
        ];
        let stats = compute_stats(texts);
        assert_eq!(stats.total_collected, 4);
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.success_rate, Some(50.0));
    }

    #[test]
    fn test_no_parsed_texts_has_no_rate() {
        let stats = compute_stats(["nope"]);
        assert_eq!(stats.parsed, 0);
        assert_eq!(stats.success_rate, None);
        assert_eq!(compute_stats(Vec::<&str>::new()), AnalysisStats::default());
    }

    #[test]
    fn test_recommendations_collects_both_keys() {
        let object = parse_analysis_json(
            r#"{"recommendations":["Validate id", 3],"suggestions":["Add auth"]}"#,
        )
        .unwrap();
        assert_eq!(recommendations_of(&object), vec!["Validate id", "Add auth"]);
    }
}
