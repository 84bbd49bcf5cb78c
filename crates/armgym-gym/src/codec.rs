//! JSON codec for commands and observations.
//!
//! Commands are serialized with only the fields their kind uses. Observation
//! decoding is total: absent fields take their defaults, and any malformed
//! document fails as a whole.
//!
//! Key casing is chosen once per codec. [`KeyCasing::Pascal`] uses
//! `JointAngles`-style keys; [`KeyCasing::Camel`] uses `jointAngles`. Only
//! top-level keys are rewritten.

use armgym_core::config::KeyCasing;
use armgym_core::error::ProtocolError;
use armgym_core::types::{Command, RawObservation};
use serde_json::{Map, Value};

/// Encodes commands and decodes observations for one key casing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCodec {
    casing: KeyCasing,
}

impl CommandCodec {
    pub const fn new(casing: KeyCasing) -> Self {
        Self { casing }
    }

    pub const fn casing(&self) -> KeyCasing {
        self.casing
    }

    /// Serialize `command` to wire bytes.
    pub fn encode(&self, command: &Command) -> Result<Vec<u8>, ProtocolError> {
        let value = serde_json::to_value(command)?;
        self.encode_value(value)
    }

    /// Serialize an arbitrary JSON document, applying the key casing.
    pub fn encode_value(&self, value: Value) -> Result<Vec<u8>, ProtocolError> {
        let value = match self.casing {
            KeyCasing::Pascal => value,
            KeyCasing::Camel => rename_keys(value, lower_first),
        };
        Ok(serde_json::to_vec(&value)?)
    }

    /// Decode an observation reply.
    pub fn decode_observation(&self, bytes: &[u8]) -> Result<RawObservation, ProtocolError> {
        let value = self.decode_value(bytes)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a reply into a JSON object with canonical (Pascal) keys.
    pub fn decode_value(&self, bytes: &[u8]) -> Result<Value, ProtocolError> {
        let value: Value = serde_json::from_slice(bytes)?;
        if !value.is_object() {
            return Err(ProtocolError::NotAnObject(kind_name(&value)));
        }
        Ok(match self.casing {
            KeyCasing::Pascal => value,
            KeyCasing::Camel => rename_keys(value, upper_first),
        })
    }

    /// Decode a command, as the simulator side would.
    pub fn decode_command(&self, bytes: &[u8]) -> Result<Command, ProtocolError> {
        let value = self.decode_value(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

fn rename_keys(value: Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k), v))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn lower_first(key: &str) -> String {
    map_first(key, char::to_ascii_lowercase)
}

fn upper_first(key: &str) -> String {
    map_first(key, char::to_ascii_uppercase)
}

fn map_first(key: &str, f: fn(&char) -> char) -> String {
    let mut chars = key.chars();
    chars
        .next()
        .map(|c| f(&c).to_string() + chars.as_str())
        .unwrap_or_default()
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
