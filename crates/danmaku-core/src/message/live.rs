//! `LIVE`: the room started broadcasting.

use serde::{Deserialize, Serialize};

use crate::message::path::JsonView;

/// A decoded live-start event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Live {
    pub room_id: i64,
    pub live_key: String,
    pub live_platform: String,
    pub live_model: i64,
    /// Unix seconds.
    pub live_time: i64,
    pub sub_session_key: String,
    pub voice_background: String,
}

impl Live {
    /// Decodes a `LIVE` body.  Never fails; missing values are zero.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_view(&JsonView::parse(body))
    }

    /// Decodes from an already parsed body.
    ///
    /// Most fields sit at the root; `live_time` only appears under `data`.
    pub fn from_view(v: &JsonView) -> Self {
        Self {
            room_id: v.get("roomid").int(),
            live_key: v.get("live_key").string(),
            live_platform: v.get("live_platform").string(),
            live_model: v.get("live_model").int(),
            live_time: v.get("data.live_time").int(),
            sub_session_key: v.get("sub_session_key").string(),
            voice_background: v.get("voice_background").string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_live() {
        let body = br#"{"cmd":"LIVE","live_key":"k1","voice_background":"","sub_session_key":"s1",
            "live_platform":"pc","live_model":0,"roomid":"5440","data":{"live_time":1700000000}}"#;

        let live = Live::parse(body);

        assert_eq!(live.room_id, 5440, "string room ids are coerced");
        assert_eq!(live.live_key, "k1");
        assert_eq!(live.live_platform, "pc");
        assert_eq!(live.live_time, 1_700_000_000);
    }

    #[test]
    fn test_minimal_live() {
        let live = Live::parse(br#"{"cmd":"LIVE","roomid":1}"#);
        assert_eq!(live.room_id, 1);
        assert_eq!(live.live_key, "");
    }
}
