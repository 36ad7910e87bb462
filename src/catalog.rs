//! Rule catalogs: declarative definitions, override merging, materialization
//!
//! A catalog is an insertion-ordered map of rule name to definition; the
//! order determines evaluation order and therefore output order. Merging is
//! override-driven: only rule names present in the override catalog survive,
//! and a built-in rule's check logic and description can never be replaced,
//! only its tunable fields (priority, include, exclude).

use crate::rule::{CheckFn, Rule, RuleContext, DEFAULT_INCLUDE};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Error raised while building a rule catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An override introduced a new rule name without supplying a required field
    #[error("override for unknown rule '{rule}' is missing its {field}")]
    Incomplete { rule: String, field: &'static str },

    /// A rule carries an invalid glob pattern
    #[error("invalid glob pattern in rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: globset::Error,
    },
}

/// A complete, declarative rule definition
#[derive(Clone)]
pub struct RuleDef {
    /// Priority ordinal (1 = error, 2 = warning, 3 = info)
    pub priority: u8,

    /// Human-readable explanation, fixed once authored
    pub description: String,

    /// The check routine
    pub check: CheckFn,

    /// Include globs; `None` means the default `**/*.*-meta.xml`
    pub include: Option<Vec<String>>,

    /// Exclude globs
    pub exclude: Vec<String>,
}

impl RuleDef {
    /// Create a definition with the default include patterns
    pub fn new<F>(priority: u8, description: &str, check: F) -> Self
    where
        F: Fn(&mut RuleContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            priority,
            description: description.to_string(),
            check: Arc::new(check),
            include: None,
            exclude: Vec::new(),
        }
    }

    /// Set the include patterns
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = Some(include);
        self
    }

    /// Set the exclude patterns
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }
}

impl std::fmt::Debug for RuleDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleDef")
            .field("priority", &self.priority)
            .field("description", &self.description)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

/// An override entry: every field optional
///
/// Config files deserialize into this; the `check` can only be supplied in
/// code, which is what allows brand-new rules through the API while config
/// files can only retune existing ones.
#[derive(Clone, Default, Deserialize)]
pub struct RulePatch {
    /// Replacement priority
    #[serde(default)]
    pub priority: Option<u8>,

    /// Description for a brand-new rule (ignored for existing names)
    #[serde(default)]
    pub description: Option<String>,

    /// Replacement include globs
    #[serde(default)]
    pub include: Option<Vec<String>>,

    /// Replacement exclude globs
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Check routine for a brand-new rule (never read from config files)
    #[serde(skip)]
    pub check: Option<CheckFn>,
}

impl RulePatch {
    /// Patch that only retunes the priority
    pub fn priority(priority: u8) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    /// Patch carrying a complete new rule
    pub fn new_rule<F>(priority: u8, description: &str, check: F) -> Self
    where
        F: Fn(&mut RuleContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            priority: Some(priority),
            description: Some(description.to_string()),
            check: Some(Arc::new(check)),
            ..Self::default()
        }
    }

    /// Set the include patterns
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = Some(include);
        self
    }

    /// Set the exclude patterns
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = Some(exclude);
        self
    }
}

impl std::fmt::Debug for RulePatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulePatch")
            .field("priority", &self.priority)
            .field("description", &self.description)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}

/// Caller-supplied override catalog, insertion-ordered
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct OverrideCatalog {
    entries: IndexMap<String, RulePatch>,
}

impl OverrideCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override entry, keeping insertion order
    pub fn insert(&mut self, name: impl Into<String>, patch: RulePatch) {
        self.entries.insert(name.into(), patch);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RulePatch)> {
        self.entries.iter()
    }
}

/// An ordered mapping from rule name to definition
#[derive(Clone, Default)]
pub struct RuleCatalog {
    rules: IndexMap<String, RuleDef>,
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCatalog")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, keeping insertion order
    pub fn insert(&mut self, name: impl Into<String>, def: RuleDef) {
        self.rules.insert(name.into(), def);
    }

    /// Definition lookup by name
    pub fn get(&self, name: &str) -> Option<&RuleDef> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RuleDef)> {
        self.rules.iter()
    }

    /// Merge a base catalog with caller overrides.
    ///
    /// Override-driven: the result contains exactly the names present in
    /// `overrides`, in override order. For a name that exists in the base,
    /// tunable fields come from the patch where present while `check` and
    /// `description` are forced back to the base definition. A name unknown
    /// to the base must be a complete new rule.
    pub fn merge(base: &RuleCatalog, overrides: &OverrideCatalog) -> Result<RuleCatalog, CatalogError> {
        let mut merged = RuleCatalog::new();

        for (name, patch) in overrides.iter() {
            let def = match base.get(name) {
                Some(base_def) => {
                    let mut def = base_def.clone();
                    if let Some(priority) = patch.priority {
                        def.priority = priority;
                    }
                    if let Some(include) = &patch.include {
                        def.include = Some(include.clone());
                    }
                    if let Some(exclude) = &patch.exclude {
                        def.exclude = exclude.clone();
                    }
                    def
                }
                None => {
                    let check = patch.check.clone().ok_or_else(|| CatalogError::Incomplete {
                        rule: name.clone(),
                        field: "check",
                    })?;
                    let priority = patch.priority.ok_or_else(|| CatalogError::Incomplete {
                        rule: name.clone(),
                        field: "priority",
                    })?;
                    let description =
                        patch.description.clone().ok_or_else(|| CatalogError::Incomplete {
                            rule: name.clone(),
                            field: "description",
                        })?;
                    RuleDef {
                        priority,
                        description,
                        check,
                        include: patch.include.clone(),
                        exclude: patch.exclude.clone().unwrap_or_default(),
                    }
                }
            };
            merged.insert(name.clone(), def);
        }

        Ok(merged)
    }

    /// Convert every definition into a runnable rule, in catalog order
    pub fn materialize(&self) -> Result<Vec<Rule>, CatalogError> {
        self.rules
            .iter()
            .map(|(name, def)| {
                let default_include = [DEFAULT_INCLUDE.to_string()];
                let include_patterns: &[String] = match &def.include {
                    Some(patterns) => patterns,
                    None => &default_include,
                };
                let include = build_globset(name, include_patterns)?;
                let exclude = build_globset(name, &def.exclude)?;
                Ok(Rule::new(
                    name.clone(),
                    def.priority,
                    def.description.clone(),
                    def.check.clone(),
                    include,
                    exclude,
                ))
            })
            .collect()
    }
}

fn build_globset(rule: &str, patterns: &[String]) -> Result<GlobSet, CatalogError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| CatalogError::Pattern {
            rule: rule.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| CatalogError::Pattern {
        rule: rule.to_string(),
        source,
    })
}
