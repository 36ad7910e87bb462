//! CSV output formatter

use super::OutputFormatter;
use crate::finding::{Finding, Severity};

/// CSV formatter: one row per finding, header included
#[derive(Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn severity_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "ERROR",
        Severity::Warning => "WARNING",
        Severity::Info => "INFO",
    }
}

impl OutputFormatter for CsvFormatter {
    fn format(&self, findings: &[Finding]) -> String {
        let mut output = String::from("File,Line,Severity,Rule,Message\n");
        for finding in findings {
            output.push_str(&format!(
                "{},{},{},{},{}\n",
                escape(&finding.file_path),
                finding.line,
                severity_str(finding.severity()),
                escape(&finding.rule),
                escape(&finding.message)
            ));
        }
        output
    }
}
