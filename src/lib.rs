//! mutating-webhook library crate
//!
//! A config-driven Kubernetes mutating admission webhook. The API server
//! posts `AdmissionReview` envelopes to `/mutate`; the webhook matches the
//! request's group/version/kind against rules loaded from a YAML file at
//! startup and, where rules match, answers with the concatenated JSON
//! patch. Requests are always allowed; the webhook mutates, it never
//! denies.

pub mod config;
pub mod rules;
pub mod webhook;

pub use config::{Config, ConfigError, Mutation, ResourceSelector};
pub use rules::RuleStore;
pub use webhook::{WebhookError, WebhookState, create_webhook_router, run_webhook_server};
