//! Typed actions: the worked examples of the call facade.
//!
//! Each gateway action is an [`ApiCall`] impl — an action name plus a
//! params shape and a result shape. The session core is generic over the
//! contract, so adding an action never touches it; the two actions here
//! (send a group message, fetch group info) are the reference pattern, and
//! [`NekoClient::send_raw`] covers anything without a typed shape yet.

use serde::{Deserialize, Serialize};

use nekolink_protocol::{lenient, ApiCall, ApiResponse, Codec, Segment};
use nekolink_transport::Connector;

use crate::{ClientError, NekoClient};

// ---------------------------------------------------------------------------
// send_group_msg
// ---------------------------------------------------------------------------

/// The `send_group_msg` action.
pub struct SendGroupMsg;

/// Parameters for [`SendGroupMsg`].
#[derive(Debug, Clone, Serialize)]
pub struct SendGroupMsgParams {
    pub group_id: i64,
    pub message: Vec<Segment>,
}

/// Result payload of [`SendGroupMsg`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendGroupMsgOutput {
    /// Identifier of the message that was sent.
    #[serde(deserialize_with = "lenient::i64")]
    pub message_id: i64,
}

impl ApiCall for SendGroupMsg {
    const ACTION: &'static str = "send_group_msg";
    type Params = SendGroupMsgParams;
    type Output = SendGroupMsgOutput;
}

// ---------------------------------------------------------------------------
// get_group_info
// ---------------------------------------------------------------------------

/// The `get_group_info` action.
pub struct GetGroupInfo;

/// Parameters for [`GetGroupInfo`].
#[derive(Debug, Clone, Serialize)]
pub struct GetGroupInfoParams {
    pub group_id: i64,
}

/// Result payload of [`GetGroupInfo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGroupInfoOutput {
    #[serde(deserialize_with = "lenient::i64")]
    pub group_id: i64,
    pub group_name: Option<String>,
    pub group_remark: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub member_count: i64,
    #[serde(deserialize_with = "lenient::i64")]
    pub max_member_count: i64,
    /// 1 while the whole group is muted, 0 otherwise.
    #[serde(deserialize_with = "lenient::i64")]
    pub group_all_shut: i64,
}

impl ApiCall for GetGroupInfo {
    const ACTION: &'static str = "get_group_info";
    type Params = GetGroupInfoParams;
    type Output = GetGroupInfoOutput;
}

// ---------------------------------------------------------------------------
// Convenience methods
// ---------------------------------------------------------------------------

impl<T: Connector, C: Codec> NekoClient<T, C> {
    /// Sends a message to a group.
    ///
    /// Accepts anything that materializes to a segment list — typically a
    /// [`MessageChain`](nekolink_protocol::MessageChain).
    pub async fn send_group_msg(
        &self,
        group_id: i64,
        message: impl Into<Vec<Segment>>,
    ) -> Result<ApiResponse<SendGroupMsgOutput>, ClientError> {
        self.call::<SendGroupMsg>(SendGroupMsgParams {
            group_id,
            message: message.into(),
        })
        .await
    }

    /// Fetches information about a group.
    pub async fn get_group_info(
        &self,
        group_id: i64,
    ) -> Result<ApiResponse<GetGroupInfoOutput>, ClientError> {
        self.call::<GetGroupInfo>(GetGroupInfoParams { group_id }).await
    }
}

// =========================================================================
// Tests
// =========================================================================
