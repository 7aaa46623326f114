//! `SUPER_CHAT_MESSAGE`: a paid message pinned to the top of the chat.

use serde::{Deserialize, Serialize};

use crate::message::path::JsonView;

/// A decoded super chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperChat {
    pub id: i64,
    pub uid: i64,
    pub uname: String,
    pub face: String,
    pub guard_level: i64,
    pub user_level: i64,
    pub message: String,
    pub message_jpn: String,
    /// Price in the platform's whole currency unit.
    pub price: i64,
    pub rate: i64,
    /// Unix seconds.
    pub start_time: i64,
    /// Unix seconds.
    pub end_time: i64,
    /// Seconds the message stays pinned.
    pub time: i64,
    pub background_color: String,
    pub medal_name: String,
    pub medal_level: i64,
}

impl SuperChat {
    /// Decodes a `SUPER_CHAT_MESSAGE` body.  Never fails; missing values are zero.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_view(&JsonView::parse(body))
    }

    /// Decodes from an already parsed body.
    pub fn from_view(v: &JsonView) -> Self {
        Self {
            id: v.get("data.id").int(),
            uid: v.get("data.uid").int(),
            uname: v.get("data.user_info.uname").string(),
            face: v.get("data.user_info.face").string(),
            guard_level: v.get("data.user_info.guard_level").int(),
            user_level: v.get("data.user_info.user_level").int(),
            message: v.get("data.message").string(),
            message_jpn: v.get("data.message_jpn").string(),
            price: v.get("data.price").int(),
            rate: v.get("data.rate").int(),
            start_time: v.get("data.start_time").int(),
            end_time: v.get("data.end_time").int(),
            time: v.get("data.time").int(),
            background_color: v.get("data.background_color").string(),
            medal_name: v.get("data.medal_info.medal_name").string(),
            medal_level: v.get("data.medal_info.medal_level").int(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_super_chat() {
        // Arrange
        let body = br##"{
            "cmd": "SUPER_CHAT_MESSAGE",
            "data": {
                "id": "7731", "uid": 99, "price": 30, "rate": 1000,
                "message": "thanks!", "message_jpn": "",
                "start_time": 1700000000, "end_time": 1700000060, "time": 60,
                "background_color": "#EDF5FF",
                "user_info": {"uname": "carol", "face": "http://f", "guard_level": 3, "user_level": 20},
                "medal_info": {"medal_name": "Fans", "medal_level": 12}
            }
        }"##;

        // Act
        let sc = SuperChat::parse(body);

        // Assert
        assert_eq!(sc.id, 7731, "string ids are coerced");
        assert_eq!(sc.uid, 99);
        assert_eq!(sc.uname, "carol");
        assert_eq!(sc.guard_level, 3);
        assert_eq!(sc.price, 30);
        assert_eq!(sc.message, "thanks!");
        assert_eq!(sc.end_time - sc.start_time, sc.time);
        assert_eq!(sc.medal_name, "Fans");
        assert_eq!(sc.medal_level, 12);
    }

    #[test]
    fn test_missing_medal_info_is_zero() {
        let sc = SuperChat::parse(br#"{"cmd":"SUPER_CHAT_MESSAGE","data":{"price":50,"medal_info":null}}"#);
        assert_eq!(sc.price, 50);
        assert_eq!(sc.medal_name, "");
        assert_eq!(sc.medal_level, 0);
    }
}
