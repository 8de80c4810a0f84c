//! Core admission evaluation: one decoded request in, one response out.

use json_patch::Patch;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use thiserror::Error;
use tracing::{debug, info};

use crate::rules::RuleStore;

/// Errors raised while building an admission response.
#[derive(Debug, Error)]
pub enum EvaluateError {
    /// The combined patch could not be serialized to its wire form
    #[error("failed to serialize patch: {0}")]
    SerializePatch(String),
}

/// Evaluate one admission request against the rule store.
///
/// The request is always allowed: this webhook only mutates, it has no
/// reject operation. When at least one rule matches the request's
/// group/version/kind, the concatenated patch is attached (which also sets
/// `patchType: JSONPatch`); otherwise the response carries no patch at all.
/// The request's `uid` is echoed back unchanged in both cases.
pub fn evaluate(
    rules: &RuleStore,
    req: &AdmissionRequest<DynamicObject>,
) -> Result<AdmissionResponse, EvaluateError> {
    let patches = rules.matching_patches(&req.kind);
    let response = AdmissionResponse::from(req);

    if patches.is_empty() {
        debug!(uid = %req.uid, "no patches for request");
        return Ok(response);
    }

    info!(uid = %req.uid, patches = patches.len(), "applying patches");
    response
        .with_patch(Patch(patches))
        .map_err(|e| EvaluateError::SerializePatch(e.to_string()))
}
