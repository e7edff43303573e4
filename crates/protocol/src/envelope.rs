//! RPC wire messages and the response envelope.
//!
//! Every cross-context exchange is a named operation with a JSON arguments
//! object, answered by exactly one envelope carrying either a data payload
//! or an error string - never both, and never a raised exception.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request message sent from the client context to the service context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Unique request id for correlating the response.
    pub id: u32,
    /// Operation name (e.g. `"accountInfo"`, `"makeInvoice"`).
    #[serde(rename = "type")]
    pub op: String,
    /// Operation arguments as a JSON object; `Null` when the operation
    /// takes none.
    #[serde(default)]
    pub args: Value,
}

/// Response message sent back to the client context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Request id this response correlates to.
    pub id: u32,
    /// Success payload (mutually exclusive with `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message (mutually exclusive with `data`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Typed `{data} | {error}` envelope.
///
/// Handlers signal business failure by returning `Envelope::error(..)`
/// rather than raising across the RPC boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Wraps a success payload.
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Wraps an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    /// Returns true if this envelope carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Converts into a `Result`, treating a missing payload as an error.
    pub fn into_result(self) -> Result<T, String> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err("empty response envelope".to_string()),
        }
    }
}

impl Envelope<Value> {
    /// Deserializes the data payload into a typed envelope, preserving the
    /// error string as-is.
    pub fn into_typed<T: serde::de::DeserializeOwned>(self) -> Result<Envelope<T>, serde_json::Error> {
        Ok(Envelope {
            data: self.data.map(serde_json::from_value).transpose()?,
            error: self.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_format_uses_type_field() {
        let request = RpcRequest {
            id: 7,
            op: "accountInfo".to_string(),
            args: Value::Null,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "accountInfo");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn envelope_never_serializes_both_fields() {
        let ok: Envelope<u32> = Envelope::ok(5);
        assert_eq!(serde_json::to_value(&ok).unwrap(), serde_json::json!({"data": 5}));

        let err: Envelope<u32> = Envelope::error("nope");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"error": "nope"})
        );
    }

    #[test]
    fn into_typed_parses_data_and_preserves_error() {
        let ok: Envelope<Value> = Envelope::ok(serde_json::json!(7));
        let typed: Envelope<u32> = ok.into_typed().unwrap();
        assert_eq!(typed.data, Some(7));

        let err: Envelope<Value> = Envelope::error("boom");
        let typed: Envelope<u32> = err.into_typed().unwrap();
        assert_eq!(typed.error.as_deref(), Some("boom"));

        let mismatched: Envelope<Value> = Envelope::ok(serde_json::json!("not a number"));
        assert!(mismatched.into_typed::<u32>().is_err());
    }

    #[test]
    fn envelope_into_result() {
        assert_eq!(Envelope::ok(1).into_result(), Ok(1));
        assert_eq!(
            Envelope::<u32>::error("boom").into_result(),
            Err("boom".to_string())
        );
    }
}
