//! Mutating admission webhook: request evaluation and HTTP transport.

pub mod evaluator;
mod server;

pub use evaluator::{EvaluateError, evaluate};
pub use server::{WebhookError, WebhookState, create_webhook_router, run_webhook_server};
