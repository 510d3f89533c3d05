// Application layer modules
pub mod notifier;

// Re-exports
pub use notifier::{build_message_body, NotificationResult, Notifier, NotifierError, SlackMessage};
