//! `DANMU_MSG`: a chat message overlaid on the broadcast.
//!
//! The body has no named fields for the message itself; everything lives in
//! the positional `info` array:
//!
//! ```text
//! info[0]  display metadata  [_, mode, font_size, color, timestamp, rnd, _, uid_crc32, _, msg_type, bubble, ...]
//! info[1]  message text
//! info[2]  sender            [uid, uname, admin, vip, svip, urank, mobile_verify, uname_color]
//! info[3]  fan medal         [level, name, anchor_name, room_id, color, special, ...]
//! info[4]  user level        [level, _, color, rank]
//! info[5]  titles            [old_title, title]
//! info[7]  privilege (guard) type
//! ```

use serde::{Deserialize, Serialize};

use crate::message::path::JsonView;

/// What kind of content a chat message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanmakuKind {
    /// Plain text.
    Text,
    /// A sticker/emoticon.
    Emoticon,
    /// A type this client does not know.
    Other(i64),
}

/// A decoded chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Danmaku {
    pub mode: i64,
    pub font_size: i64,
    pub color: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub rnd: i64,
    pub uid_crc32: String,
    pub msg_type: i64,
    pub bubble: i64,

    pub msg: String,

    pub uid: i64,
    pub uname: String,
    pub admin: bool,
    pub vip: bool,
    pub svip: bool,
    pub urank: i64,
    pub mobile_verify: bool,
    pub uname_color: String,

    pub medal_level: i64,
    pub medal_name: String,
    pub medal_up_name: String,
    pub medal_room_id: i64,
    pub medal_color: i64,
    pub special_medal: String,

    pub user_level: i64,
    pub user_level_color: i64,
    pub user_level_rank: String,

    pub old_title: String,
    pub title: String,

    pub privilege_type: i64,
}

impl Danmaku {
    /// Decodes a `DANMU_MSG` body.  Never fails; missing values are zero.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_view(&JsonView::parse(body))
    }

    /// Decodes from an already parsed body.
    pub fn from_view(v: &JsonView) -> Self {
        Self {
            mode: v.get("info.0.1").int(),
            font_size: v.get("info.0.2").int(),
            color: v.get("info.0.3").int(),
            timestamp: v.get("info.0.4").int(),
            rnd: v.get("info.0.5").int(),
            uid_crc32: v.get("info.0.7").string(),
            msg_type: v.get("info.0.9").int(),
            bubble: v.get("info.0.10").int(),
            msg: v.get("info.1").string(),
            uid: v.get("info.2.0").int(),
            uname: v.get("info.2.1").string(),
            admin: v.get("info.2.2").boolean(),
            vip: v.get("info.2.3").boolean(),
            svip: v.get("info.2.4").boolean(),
            urank: v.get("info.2.5").int(),
            mobile_verify: v.get("info.2.6").boolean(),
            uname_color: v.get("info.2.7").string(),
            medal_level: v.get("info.3.0").int(),
            medal_name: v.get("info.3.1").string(),
            medal_up_name: v.get("info.3.2").string(),
            medal_room_id: v.get("info.3.3").int(),
            medal_color: v.get("info.3.4").int(),
            special_medal: v.get("info.3.5").string(),
            user_level: v.get("info.4.0").int(),
            user_level_color: v.get("info.4.2").int(),
            user_level_rank: v.get("info.4.3").string(),
            old_title: v.get("info.5.0").string(),
            title: v.get("info.5.1").string(),
            privilege_type: v.get("info.7").int(),
        }
    }

    /// Classifies the message from its `msg_type`.
    pub fn kind(&self) -> DanmakuKind {
        match self.msg_type {
            0 => DanmakuKind::Text,
            1 => DanmakuKind::Emoticon,
            other => DanmakuKind::Other(other),
        }
    }
}
