//! Rule evaluation: applicability and findings-shaping for one named check

use crate::document::MetadataDocument;
use crate::finding::Finding;
use globset::GlobSet;
use std::sync::Arc;
use thiserror::Error;

/// Default include pattern applied when a rule does not declare its own
pub const DEFAULT_INCLUDE: &str = "**/*.*-meta.xml";

/// A rule's check routine. Reports go through the context; a returned error
/// aborts the whole evaluation batch.
pub type CheckFn = Arc<dyn Fn(&mut RuleContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Error raised when a rule's check fails
#[derive(Debug, Error)]
#[error("rule '{rule}' failed on {path}: {source}")]
pub struct RuleError {
    /// Name of the failing rule
    pub rule: String,

    /// Path of the document being evaluated
    pub path: String,

    /// The underlying check error
    #[source]
    pub source: anyhow::Error,
}

/// What a check sees: the document under evaluation and a report sink
pub struct RuleContext<'a> {
    /// The document being evaluated
    pub file: &'a MetadataDocument,

    rule: &'a Rule,
    emit: &'a mut dyn FnMut(Finding),
}

impl RuleContext<'_> {
    /// Report a finding with no source line (recorded as line 0)
    pub fn report(&mut self, message: impl Into<String>) {
        self.report_at(message, 0);
    }

    /// Report a finding at a source line (0 = unknown)
    pub fn report_at(&mut self, message: impl Into<String>, line: u32) {
        (self.emit)(Finding {
            rule: self.rule.name.clone(),
            priority: self.rule.priority,
            message: message.into(),
            file_path: self.file.path.clone(),
            line,
        });
    }
}

/// A materialized rule: compiled globs plus the check routine
#[derive(Clone)]
pub struct Rule {
    /// Unique rule name
    pub name: String,

    /// Priority ordinal (1 = error, 2 = warning, 3 = info)
    pub priority: u8,

    /// Human-readable explanation of the check
    pub description: String,

    check: CheckFn,
    include: GlobSet,
    exclude: GlobSet,
}

impl Rule {
    pub(crate) fn new(
        name: String,
        priority: u8,
        description: String,
        check: CheckFn,
        include: GlobSet,
        exclude: GlobSet,
    ) -> Self {
        Self {
            name,
            priority,
            description,
            check,
            include,
            exclude,
        }
    }

    /// True iff the path matches at least one include pattern and no exclude
    /// pattern. Backslashes are normalized to `/` before matching; patterns
    /// are authored POSIX-style.
    pub fn applies_to(&self, path: &str) -> bool {
        let path = path.replace('\\', "/");
        self.include.is_match(&path) && !self.exclude.is_match(&path)
    }

    /// Run the check against a document, forwarding findings to `emit`.
    /// Does nothing at all when the rule does not apply to the file.
    pub fn run(
        &self,
        doc: &MetadataDocument,
        emit: &mut dyn FnMut(Finding),
    ) -> Result<(), RuleError> {
        if !self.applies_to(&doc.path) {
            return Ok(());
        }

        let mut ctx = RuleContext {
            file: doc,
            rule: self,
            emit,
        };
        (self.check)(&mut ctx).map_err(|source| RuleError {
            rule: self.name.clone(),
            path: doc.path.clone(),
            source,
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
