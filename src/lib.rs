//! Metalint - Salesforce Metadata Linter
//!
//! A fast linter for Salesforce metadata XML files (`*.object-meta.xml`,
//! `*.flow-meta.xml`, ...). Rules query parsed documents through a
//! simplified path API and report findings with source lines.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Discovery -> MetadataDocument -> Engine -> Rule -> Finding
//! ```
//!
//! The built-in catalog can be retuned through an override catalog: a caller
//! may change a built-in rule's priority and file patterns (but never its
//! check logic or description) and may add entirely new rules. When an
//! override catalog is supplied, only the rules it names are evaluated.
//!
//! # Example
//!
//! ```
//! use metalint::{builtin_rules, Engine, MetadataDocument};
//!
//! let doc = MetadataDocument::parse(
//!     "Foo.flow-meta.xml",
//!     "<Flow><status>Draft</status></Flow>",
//! );
//! let rules = builtin_rules().materialize().unwrap();
//! let findings = Engine::new().evaluate(&[doc], &rules).unwrap();
//! assert!(findings.iter().any(|f| f.rule == "flow-inactive"));
//! ```

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod document;
pub mod engine;
pub mod finding;
pub mod output;
pub mod rule;
pub mod rules;

// Re-export main types
pub use catalog::{CatalogError, OverrideCatalog, RuleCatalog, RuleDef, RulePatch};
pub use config::{Config, ConfigError, OutputFormat, SeverityThreshold};
pub use document::{Element, MetadataDocument, XmlNode, XmlTree};
pub use engine::{evaluate_document, Engine};
pub use finding::{Finding, Severity};
pub use output::{CsvFormatter, JsonFormatter, OutputFormatter, TextFormatter};
pub use rule::{CheckFn, Rule, RuleContext, RuleError, DEFAULT_INCLUDE};
pub use rules::builtin_rules;
