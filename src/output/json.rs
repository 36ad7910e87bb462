//! JSON output formatter

use super::OutputFormatter;
use crate::finding::{Finding, Severity};
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    summary: JsonSummary,
    issues: Vec<JsonIssue<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    total_issues: usize,
    errors: usize,
    warnings: usize,
    info: usize,
}

#[derive(Serialize)]
struct JsonIssue<'a> {
    file: &'a str,
    line: u32,
    rule: &'a str,
    message: &'a str,
    priority: u8,
    severity: String,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, findings: &[Finding]) -> String {
        let count = |severity: Severity| findings.iter().filter(|f| f.severity() == severity).count();

        let output = JsonOutput {
            summary: JsonSummary {
                total_issues: findings.len(),
                errors: count(Severity::Error),
                warnings: count(Severity::Warning),
                info: count(Severity::Info),
            },
            issues: findings
                .iter()
                .map(|f| JsonIssue {
                    file: &f.file_path,
                    line: f.line,
                    rule: &f.rule,
                    message: &f.message,
                    priority: f.priority,
                    severity: f.severity().to_string(),
                })
                .collect(),
        };

        if self.pretty {
            serde_json::to_string_pretty(&output).unwrap_or_default()
        } else {
            serde_json::to_string(&output).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let findings = vec![
            Finding {
                rule: "object-external-sharing-no-readwrite".to_string(),
                priority: 1,
                message: "Object external sharing is Public Read/Write".to_string(),
                file_path: "Account.object-meta.xml".to_string(),
                line: 12,
            },
            Finding {
                rule: "missing-description".to_string(),
                priority: 2,
                message: "XML metadata is missing description".to_string(),
                file_path: "Account.object-meta.xml".to_string(),
                line: 0,
            },
        ];

        let output = JsonFormatter::new().format(&findings);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["summary"]["totalIssues"], 2);
        assert_eq!(value["summary"]["errors"], 1);
        assert_eq!(value["summary"]["warnings"], 1);
        assert_eq!(value["summary"]["info"], 0);
        assert_eq!(value["issues"][0]["severity"], "error");
        assert_eq!(value["issues"][0]["line"], 12);
        assert_eq!(value["issues"][1]["rule"], "missing-description");
    }

    #[test]
    fn test_empty_findings() {
        let output = JsonFormatter::new().format(&[]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["totalIssues"], 0);
        assert_eq!(value["issues"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_pretty() {
        let output = JsonFormatter::new().pretty().format(&[]);
        assert!(output.contains('\n'));
    }
}
