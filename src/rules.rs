//! Built-in lint rules for Salesforce metadata

use crate::catalog::{RuleCatalog, RuleDef};
use regex::Regex;
use std::sync::OnceLock;

/// The base catalog of built-in rules, in evaluation order
pub fn builtin_rules() -> RuleCatalog {
    let mut catalog = RuleCatalog::new();

    catalog.insert(
        "missing-description",
        RuleDef::new(2, "XML metadata is missing description", |ctx| {
            if ctx.file.get("//description").is_none() {
                ctx.report("XML metadata is missing description");
            }
            Ok(())
        }),
    );

    catalog.insert(
        "deprecated-api-version",
        RuleDef::new(2, "API Version is deprecated (< 30.0)", |ctx| {
            if let Some(api_version) = ctx.file.get("//apiVersion") {
                if let Ok(version) = api_version.text().parse::<f64>() {
                    if version < 30.0 {
                        ctx.report_at(
                            format!("API Version is deprecated: {}", version),
                            api_version.line(),
                        );
                    }
                }
            }
            Ok(())
        }),
    );

    catalog.insert(
        "flow-inactive",
        RuleDef::new(3, "Flow should be active", |ctx| {
            if let Some(status) = ctx.file.get("//status") {
                if status.text() != "Active" {
                    ctx.report_at("Flow is not active", status.line());
                }
            }
            Ok(())
        })
        .with_include(vec!["**/*.flow-meta.xml".to_string()]),
    );

    catalog.insert(
        "object-internal-sharing-no-readwrite",
        RuleDef::new(
            3,
            "Object internal sharing should not be set to Public Read/Write",
            |ctx| {
                if let Some(sharing) = ctx.file.get("//sharingModel") {
                    if sharing.text() == "ReadWrite" {
                        ctx.report_at("Object internal sharing is Public ReadWrite", sharing.line());
                    }
                }
                Ok(())
            },
        )
        .with_include(vec!["**/*.object-meta.xml".to_string()]),
    );

    catalog.insert(
        "object-external-sharing-no-readwrite",
        RuleDef::new(
            1,
            "Object external sharing should not be set to Public ReadWrite",
            |ctx| {
                if let Some(sharing) = ctx.file.get("//externalSharingModel") {
                    if sharing.text() == "ReadWrite" {
                        ctx.report_at("Object external sharing is Public Read/Write", sharing.line());
                    }
                }
                Ok(())
            },
        )
        .with_include(vec!["**/*.object-meta.xml".to_string()]),
    );

    catalog.insert(
        "named-credential-no-hardcoded-password",
        RuleDef::new(
            1,
            "Named Credential should not have a password explicitly set",
            |ctx| {
                let protocol = ctx.file.get("//protocol");
                if protocol.map(|p| p.text() == "Password").unwrap_or(false) {
                    if let Some(password) = ctx.file.get("//password") {
                        ctx.report_at(
                            "Named Credential has a password explicitly set",
                            password.line(),
                        );
                    }
                }
                Ok(())
            },
        )
        .with_include(vec!["**/*.namedCredential-meta.xml".to_string()]),
    );

    catalog.insert(
        "flow-avoid-copy-elements",
        RuleDef::new(
            2,
            "Avoid default API names like \"Copy_X_Of_Element\". Rename copied elements for better Flow readability.",
            |ctx| {
                static COPY_RE: OnceLock<Regex> = OnceLock::new();
                let copy_re =
                    COPY_RE.get_or_init(|| Regex::new(r"Copy_[0-9]+_of_[A-Za-z0-9]+").unwrap());

                for element in ctx.file.get_all("//name") {
                    let name = element.text().to_string();
                    if copy_re.is_match(&name) {
                        ctx.report_at(
                            format!(
                                "Flow element \"{}\" uses copy naming pattern. Consider updating the API name for better readability.",
                                name
                            ),
                            element.line(),
                        );
                    }
                }
                Ok(())
            },
        )
        .with_include(vec!["**/*.flow-meta.xml".to_string()]),
    );

    catalog.insert(
        "flow-get-records-all-fields",
        RuleDef::new(
            2,
            "Get Records elements should not use \"Get All Fields\" without specifying specific fields to query. This can impact performance and should be avoided.",
            |ctx| {
                for lookup in ctx.file.get_all("//recordLookups") {
                    let stores_all = ctx
                        .file
                        .get_in(&lookup, "//storeOutputAutomatically")
                        .map(|e| e.text() == "true")
                        .unwrap_or(false);
                    let has_fields = ctx.file.get_in(&lookup, "//queriedFields").is_some();
                    if stores_all && !has_fields {
                        let name = ctx
                            .file
                            .get_in(&lookup, "//name")
                            .map(|e| e.text().to_string())
                            .unwrap_or_else(|| "Unnamed Get Records element".to_string());
                        ctx.report_at(
                            format!(
                                "Get Records element \"{}\" uses \"Get All Fields\" without specifying specific fields. This can impact performance.",
                                name
                            ),
                            lookup.line(),
                        );
                    }
                }
                Ok(())
            },
        )
        .with_include(vec!["**/*.flow-meta.xml".to_string()]),
    );

    catalog
}
