//! Evaluation engine: runs every applicable rule against every document
//!
//! Documents are independent and may be evaluated in parallel; within one
//! document rules run strictly in catalog order. Per-document findings are
//! concatenated in input order regardless of completion order, so the same
//! input always produces the same output ordering. The first rule failure
//! aborts the whole batch.

use crate::document::MetadataDocument;
use crate::finding::Finding;
use crate::rule::{Rule, RuleError};
use rayon::prelude::*;

/// The evaluation engine
pub struct Engine {
    parallel: bool,
    jobs: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-document parallelism
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the number of worker threads (0 = auto-detect)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Evaluate all rules against all documents, flattening findings into
    /// one ordered list
    pub fn evaluate(
        &self,
        documents: &[MetadataDocument],
        rules: &[Rule],
    ) -> Result<Vec<Finding>, RuleError> {
        let per_document: Result<Vec<Vec<Finding>>, RuleError> = if self.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(if self.jobs > 0 {
                    self.jobs
                } else {
                    num_cpus::get()
                })
                .build()
                .unwrap_or_else(|_| rayon::ThreadPoolBuilder::new().build().unwrap());

            pool.install(|| {
                documents
                    .par_iter()
                    .map(|doc| evaluate_document(doc, rules))
                    .collect()
            })
        } else {
            documents
                .iter()
                .map(|doc| evaluate_document(doc, rules))
                .collect()
        };

        Ok(per_document?.into_iter().flatten().collect())
    }
}

/// Run every rule against one document, in catalog order
pub fn evaluate_document(
    doc: &MetadataDocument,
    rules: &[Rule],
) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();
    for rule in rules {
        rule.run(doc, &mut |finding| findings.push(finding))?;
    }
    Ok(findings)
}
