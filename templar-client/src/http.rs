//! Blocking HTTP transport for the template server.
//!
//! ```text
//! POST {server}/api/v1/templates/{namespace}?delete={true|false}
//! Content-Type: application/json
//!
//! [ {"id": …, "namespace": …, …}, … ]
//! ```
//!
//! The success body is either a bare array of resulting definitions or an
//! object that also lists pruned identifiers.

use std::time::Duration;

use serde::Deserialize;

use templar_core::{
    ClientConfig, Definition, DefinitionSet, Failure, Namespace, PrunePolicy,
    ReconciliationResult,
};

use crate::classify::{classify, RawError};
use crate::client::ReconciliationClient;

/// [`ReconciliationClient`] backed by a `ureq` agent.
#[derive(Debug)]
pub struct HttpReconciliationClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
    headers: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultCompat {
    Legacy(Vec<Definition>),
    Detailed(ReconciliationResult),
}

impl HttpReconciliationClient {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            base_url: config.base_url().to_string(),
            token: config.token.clone(),
            headers: config
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// The namespace-scoped collection URL, without query string.
    pub fn endpoint(&self, namespace: &Namespace) -> String {
        format!("{}/api/v1/templates/{}", self.base_url, namespace)
    }
}

impl ReconciliationClient for HttpReconciliationClient {
    fn reconcile(
        &self,
        namespace: &Namespace,
        definitions: &DefinitionSet,
        prune: PrunePolicy,
    ) -> Result<ReconciliationResult, Failure> {
        let url = self.endpoint(namespace);
        let delete = if prune.deletes_absent() { "true" } else { "false" };

        let mut request = self
            .agent
            .post(&url)
            .query("delete", delete)
            .set("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        for (name, value) in &self.headers {
            request = request.set(name, value);
        }

        tracing::info!(
            url = %url,
            definitions = definitions.len(),
            prune = %prune,
            "submitting reconciliation"
        );

        let response = match request.send_json(definitions) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|e| format!("unreadable response body: {e}"));
                tracing::warn!(status = code, "server rejected reconciliation");
                return Err(classify(RawError::Status { code, body }));
            }
            Err(ureq::Error::Transport(err)) => {
                tracing::warn!(error = %err, "reconciliation transport error");
                return Err(classify(RawError::Transport(err.to_string())));
            }
        };

        let body = response
            .into_string()
            .map_err(|e| classify(RawError::Decode(e.to_string())))?;
        decode_result(&body)
    }
}

/// Decode a success body in either accepted shape.
pub fn decode_result(body: &str) -> Result<ReconciliationResult, Failure> {
    match serde_json::from_str::<ResultCompat>(body) {
        Ok(ResultCompat::Legacy(definitions)) => Ok(ReconciliationResult {
            definitions,
            deleted: None,
        }),
        Ok(ResultCompat::Detailed(result)) => Ok(result),
        Err(err) => Err(classify(RawError::Decode(err.to_string()))),
    }
}
