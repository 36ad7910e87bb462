//! Human-readable text output

use super::OutputFormatter;
use crate::finding::{Finding, Severity};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { colored: true }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = match severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        if !self.colored {
            return s.to_string();
        }
        match severity {
            Severity::Error => s.red().bold().to_string(),
            Severity::Warning => s.yellow().bold().to_string(),
            Severity::Info => s.blue().to_string(),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, findings: &[Finding]) -> String {
        let mut output = String::new();

        for finding in findings {
            let rule = if self.colored {
                finding.rule.cyan().to_string()
            } else {
                finding.rule.clone()
            };
            output.push_str(&format!(
                "[{}][{}] {}:{}: {}\n",
                self.severity_str(finding.severity()),
                rule,
                finding.file_path,
                finding.line,
                finding.message
            ));
        }

        output.push_str(&format!(
            "\nSummary: {} {} found\n",
            findings.len(),
            if findings.len() == 1 { "issue" } else { "issues" }
        ));
        output
    }
}
