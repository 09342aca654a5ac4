pub mod command_dispatch;
pub mod interaction;
pub mod observability;
pub mod signature;
