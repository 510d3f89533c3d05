// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod webhook_client;

// Re-exports
pub use config::{SlackWebhookConfig, SlackWebhookConfigError, SLACK_WEBHOOK_URL_ENV};
pub use logging::init_logging;
pub use webhook_client::{ReqwestWebhookTransport, WebhookError, WebhookResponse, WebhookTransport};
