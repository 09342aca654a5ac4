//! Wire model for chat-platform interactions and the callbacks sent back.
//!
//! Only the fields the gateway branches on are decoded; everything else in the
//! payload is ignored.

use crate::{CoreError, MessageFlags, Result, WorkerTarget};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INTERACTION_TYPE_PING: u64 = 1;
pub const INTERACTION_TYPE_APPLICATION_COMMAND: u64 = 2;

pub const CALLBACK_TYPE_PONG: u8 = 1;
pub const CALLBACK_TYPE_CHANNEL_MESSAGE: u8 = 4;

/// Name of the single command family this gateway serves.
pub const SERVER_COMMAND: &str = "server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    Other(u64),
}

impl From<u64> for InteractionKind {
    fn from(value: u64) -> Self {
        match value {
            INTERACTION_TYPE_PING => InteractionKind::Ping,
            INTERACTION_TYPE_APPLICATION_COMMAND => InteractionKind::ApplicationCommand,
            other => InteractionKind::Other(other),
        }
    }
}

/// Only `type` is decoded strictly; `data` is inspected once the type is known.
#[derive(Debug, Deserialize)]
struct RawInteraction {
    #[serde(rename = "type")]
    kind: u64,
    #[serde(default)]
    data: Value,
}

/// Command name plus the first option's value, when that value is a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandData {
    pub name: String,
    pub action: Option<String>,
}

impl CommandData {
    /// Lenient extraction: any unexpected shape leaves `name` empty or `action` unset.
    fn from_value(data: &Value) -> Option<Self> {
        let data = data.as_object()?;
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let action = data
            .get("options")
            .and_then(Value::as_array)
            .and_then(|options| options.first())
            .and_then(|option| option.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { name, action })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub command: Option<CommandData>,
}

impl Interaction {
    /// Decode an interaction from the raw request body.
    ///
    /// Callers must have verified the body's signature first.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let raw: RawInteraction = serde_json::from_slice(body)
            .map_err(|e| CoreError::Validation(format!("malformed interaction payload: {e}")))?;

        let kind = InteractionKind::from(raw.kind);
        let command = match kind {
            InteractionKind::ApplicationCommand => CommandData::from_value(&raw.data),
            _ => None,
        };

        Ok(Self { kind, command })
    }
}

/// Closed set of commands the dispatcher accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Server(WorkerTarget),
}

impl Command {
    pub fn parse(name: &str, action: Option<&str>) -> Option<Self> {
        match name {
            SERVER_COMMAND => action
                .and_then(WorkerTarget::from_action)
                .map(Command::Server),
            _ => None,
        }
    }

    pub fn target(&self) -> WorkerTarget {
        match self {
            Command::Server(target) => *target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackData {
    pub content: String,
    pub flags: MessageFlags,
}

/// Synchronous reply to an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCallback {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CallbackData>,
}

impl InteractionCallback {
    pub fn pong() -> Self {
        Self {
            kind: CALLBACK_TYPE_PONG,
            data: None,
        }
    }

    pub fn channel_message(content: impl Into<String>, flags: MessageFlags) -> Self {
        Self {
            kind: CALLBACK_TYPE_CHANNEL_MESSAGE,
            data: Some(CallbackData {
                content: content.into(),
                flags,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ping() {
        let interaction = Interaction::from_slice(br#"{"type":1}"#).unwrap();
        assert_eq!(interaction.kind, InteractionKind::Ping);
        assert!(interaction.command.is_none());
    }

    #[test]
    fn test_parse_application_command() {
        let body = br#"{"type":2,"data":{"name":"server","options":[{"name":"action","value":"stop"}]}}"#;
        let interaction = Interaction::from_slice(body).unwrap();
        assert_eq!(interaction.kind, InteractionKind::ApplicationCommand);
        assert_eq!(
            interaction.command,
            Some(CommandData {
                name: "server".to_string(),
                action: Some("stop".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_non_string_option_has_no_action() {
        let body = br#"{"type":2,"data":{"name":"server","options":[{"value":3}]}}"#;
        let interaction = Interaction::from_slice(body).unwrap();
        assert_eq!(interaction.command.unwrap().action, None);
    }

    #[test]
    fn test_ping_tolerates_odd_data_shapes() {
        for body in [
            r#"{"type":1,"data":"x"}"#,
            r#"{"type":1,"data":{"name":null}}"#,
            r#"{"type":1,"data":{"options":{}}}"#,
            r#"{"type":1,"data":[1,2,3]}"#,
        ] {
            let interaction = Interaction::from_slice(body.as_bytes()).unwrap();
            assert_eq!(interaction.kind, InteractionKind::Ping);
            assert!(interaction.command.is_none());
        }
    }

    #[test]
    fn test_command_with_malformed_options_has_no_action() {
        for body in [
            r#"{"type":2,"data":{"name":"server","options":{}}}"#,
            r#"{"type":2,"data":{"name":"server","options":["stop"]}}"#,
            r#"{"type":2,"data":{"name":"server","options":null}}"#,
        ] {
            let command = Interaction::from_slice(body.as_bytes())
                .unwrap()
                .command
                .unwrap();
            assert_eq!(command.name, "server");
            assert_eq!(command.action, None);
        }
    }

    #[test]
    fn test_command_with_non_object_data_has_no_command() {
        let interaction = Interaction::from_slice(br#"{"type":2,"data":"server"}"#).unwrap();
        assert_eq!(interaction.kind, InteractionKind::ApplicationCommand);
        assert!(interaction.command.is_none());

        let interaction = Interaction::from_slice(br#"{"type":2,"data":{"name":7}}"#).unwrap();
        assert_eq!(interaction.command.unwrap().name, "");
    }

    #[test]
    fn test_parse_other_type() {
        let interaction = Interaction::from_slice(br#"{"type":3,"data":{}}"#).unwrap();
        assert_eq!(interaction.kind, InteractionKind::Other(3));
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        let err = Interaction::from_slice(br#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(
            Command::parse("server", Some("status")),
            Some(Command::Server(WorkerTarget::Status))
        );
        assert_eq!(Command::parse("server", Some("reboot")), None);
        assert_eq!(Command::parse("server", None), None);
        assert_eq!(Command::parse("Server", Some("start")), None);
        assert_eq!(Command::parse("deploy", Some("start")), None);
    }

    #[test]
    fn test_pong_serializes_verbatim() {
        let json = serde_json::to_string(&InteractionCallback::pong()).unwrap();
        assert_eq!(json, r#"{"type":1}"#);
    }

    #[test]
    fn test_channel_message_serialization() {
        let callback = InteractionCallback::channel_message("ok", MessageFlags::SUPPRESS_NOTIFICATIONS);
        let json = serde_json::to_value(&callback).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": 4, "data": {"content": "ok", "flags": 4096}})
        );
    }

    mod property_ping_ignores_payload {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_json() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                "[a-z]{0,8}".prop_map(Value::from),
            ];
            leaf.prop_recursive(3, 24, 4, |inner| {
                prop_oneof![
                    proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    proptest::collection::btree_map("(name|options|value|[a-z]{1,6})", inner, 0..4)
                        .prop_map(|map| Value::Object(map.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn property_ping_classification_ignores_arbitrary_data(data in arbitrary_json()) {
                let body = serde_json::json!({"type": 1, "data": data});
                let interaction = Interaction::from_slice(body.to_string().as_bytes()).unwrap();
                prop_assert_eq!(interaction.kind, InteractionKind::Ping);
                prop_assert!(interaction.command.is_none());
            }

            #[test]
            fn property_ping_classification_ignores_other_fields(
                name in "[a-z]{0,12}",
                value in "[a-z]{0,12}",
            ) {
                let body = serde_json::json!({
                    "type": 1,
                    "data": {"name": name, "options": [{"value": value}]}
                });
                let interaction = Interaction::from_slice(body.to_string().as_bytes()).unwrap();
                prop_assert_eq!(interaction.kind, InteractionKind::Ping);
            }
        }
    }
}
