pub use warden_core::{
    InteractionCallback, InteractionKind, MessageFlags, WorkerInvocation, WorkerTarget,
};

/// Hex-encoded Ed25519 signature over `timestamp || body`.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
/// Timestamp string that prefixes the signed message.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Metric label for a request rejected before its signature checked out.
pub const UNVERIFIED_LABEL: &str = "unverified";
/// Metric label for a verified body that is not an interaction.
pub const MALFORMED_LABEL: &str = "malformed";

/// Metric label for an interaction's kind.
pub fn kind_label(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::Ping => "ping",
        InteractionKind::ApplicationCommand => "command",
        InteractionKind::Other(_) => "other",
    }
}
