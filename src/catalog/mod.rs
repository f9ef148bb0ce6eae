//! Query catalog
//!
//! A fixed set of named, parameterized query templates. Natural-language
//! questions resolve to a template through the injected intent classifier;
//! the selected template executes against the graph store with the active
//! snapshot applied as a uniform scope, and results come back deduplicated
//! and JSON-safe. The `ask` boundary never panics and never throws: every
//! outcome is a structured response.

pub mod serialize;
pub mod templates;

pub use templates::{QueryTemplate, TEMPLATES};

use crate::classify::{ClassifyError, Intent, IntentClassifier};
use crate::graph::{GraphBackend, GraphError, SnapshotScope};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced while resolving or executing a catalog query
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("template {template} is missing required parameter {param:?}")]
    MissingParameter { template: String, param: String },

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Store(#[from] GraphError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Structured outcome of one question.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Set when the classifier needs more information; surfaced unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<String>,
    pub results: Vec<serde_json::Value>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AskResponse {
    fn failure(error: String) -> Self {
        AskResponse {
            success: false,
            template: None,
            params: HashMap::new(),
            query: None,
            reasoning: None,
            clarification: None,
            results: Vec::new(),
            count: 0,
            error: Some(error),
        }
    }
}

/// Resolves questions against the template catalog and runs them.
pub struct QueryCatalog<C: IntentClassifier> {
    classifier: C,
}

impl<C: IntentClassifier> QueryCatalog<C> {
    pub fn new(classifier: C) -> Self {
        QueryCatalog { classifier }
    }

    pub fn templates(&self) -> &'static [QueryTemplate] {
        TEMPLATES
    }

    /// Answer a natural-language question.
    ///
    /// Failures of any kind (classification, validation, store) come back
    /// as a structured response with `success: false`, so interactive
    /// callers can render them without crashing.
    pub async fn ask<B: GraphBackend>(
        &self,
        store: &B,
        question: &str,
        active_snapshot: Option<&str>,
    ) -> AskResponse {
        match self.resolve_and_run(store, question, active_snapshot).await {
            Ok(response) => response,
            Err(e) => AskResponse::failure(e.to_string()),
        }
    }

    async fn resolve_and_run<B: GraphBackend>(
        &self,
        store: &B,
        question: &str,
        active_snapshot: Option<&str>,
    ) -> CatalogResult<AskResponse> {
        let intent = self.classifier.classify(question, TEMPLATES).await?;

        let (template_name, params, reasoning) = match intent {
            Intent::Clarify { question } => {
                return Ok(AskResponse {
                    success: true,
                    template: None,
                    params: HashMap::new(),
                    query: None,
                    reasoning: None,
                    clarification: Some(question),
                    results: Vec::new(),
                    count: 0,
                    error: None,
                });
            }
            Intent::Selection {
                template,
                params,
                reasoning,
            } => (template, params, reasoning),
        };

        let template = templates::find(&template_name)
            .ok_or_else(|| CatalogError::UnknownTemplate(template_name.clone()))?;
        let body = templates::build_query(template, &params)?;
        debug!("question {:?} resolved to {}", question, body);

        // Scoping is layered on top of template execution; templates stay
        // scope-free and inherit it automatically.
        let scope = active_snapshot.map(SnapshotScope::new);
        let rows = store.run(&body, scope.as_ref())?;

        let serialized: Vec<serde_json::Value> = rows.iter().map(serialize::serialize_row).collect();
        let results = serialize::dedup_rows(serialized);
        info!(
            "template {} returned {} rows ({} after dedup)",
            template.name,
            rows.len(),
            results.len()
        );

        Ok(AskResponse {
            success: true,
            template: Some(template.name.to_string()),
            params,
            query: Some(body.to_string()),
            reasoning,
            clarification: None,
            count: results.len(),
            results,
            error: None,
        })
    }
}
