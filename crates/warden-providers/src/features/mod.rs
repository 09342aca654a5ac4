pub mod compute_control;
pub mod http_transport;
pub mod secret_resolver;
pub mod webhook_notifier;
