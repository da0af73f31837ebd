//! Call and response envelopes for the request/response half of the wire.
//!
//! Outbound calls are `{"action": ..., "params": ..., "echo": ...}`; the
//! gateway answers with `{"status", "retcode", "data", "message",
//! "wording", "echo"}`. The `echo` token is the only thing correlating the
//! two on a multiplexed connection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::lenient;

/// An outbound call frame, borrowed from its parts at send time.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest<'a, P: Serialize> {
    pub action: &'a str,
    pub params: &'a P,
    pub echo: &'a str,
}

/// An inbound response envelope.
///
/// Every field is optional on the wire; `retcode` accepts string-encoded
/// numbers. An envelope without an `echo` can never match a pending call —
/// it is only forwarded on the generic response stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    /// `"ok"` or `"failed"` in practice; anything the gateway sends is kept.
    #[serde(default)]
    pub status: Option<String>,
    /// Numeric return code; 0 means success.
    #[serde(default, deserialize_with = "lenient::i64")]
    pub retcode: i64,
    /// Action-specific payload.
    pub data: Option<T>,
    /// Machine-oriented failure description.
    #[serde(default)]
    pub message: Option<String>,
    /// Human-oriented failure description.
    #[serde(default)]
    pub wording: Option<String>,
    /// The correlation token this envelope answers, if any.
    #[serde(default)]
    pub echo: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Returns `true` if the gateway reported success.
    pub fn is_ok(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ok"))
    }
}

/// One named gateway action and its typed parameter/result shapes.
///
/// The session core is generic over this contract: it only needs the
/// action name, a serializable params shape, and a deserializable result
/// shape. Implement it once per action to get a typed call.
pub trait ApiCall {
    /// The wire name of the action.
    const ACTION: &'static str;
    /// Parameters object sent under `"params"`.
    type Params: Serialize + Send + Sync;
    /// Shape of the `"data"` field in a successful response.
    type Output: DeserializeOwned;
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_action_params_echo() {
        #[derive(Serialize)]
        struct Params {
            group_id: i64,
        }

        let req = ApiRequest {
            action: "get_group_info",
            params: &Params { group_id: 42 },
            echo: "abc123",
        };
        let json: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "get_group_info");
        assert_eq!(json["params"]["group_id"], 42);
        assert_eq!(json["echo"], "abc123");
    }

    #[test]
    fn test_response_full_envelope() {
        let json = r#"{
            "status": "ok", "retcode": 0,
            "data": {"message_id": 99},
            "echo": "tok"
        }"#;
        let resp: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.retcode, 0);
        assert_eq!(resp.echo.as_deref(), Some("tok"));
        assert_eq!(resp.data.unwrap()["message_id"], 99);
    }

    #[test]
    fn test_response_all_fields_optional() {
        let resp: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.retcode, 0);
        assert!(resp.echo.is_none());
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_response_retcode_accepts_string() {
        let resp: ApiResponse = serde_json::from_str(r#"{"retcode": "1400"}"#).unwrap();
        assert_eq!(resp.retcode, 1400);
    }

    #[test]
    fn test_response_failed_status_is_not_ok() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"status": "failed", "retcode": 1}"#).unwrap();
        assert!(!resp.is_ok());
    }
}
