//! `SEND_GIFT`: a viewer sent a gift.

use serde::{Deserialize, Serialize};

use crate::message::path::JsonView;

/// A decoded gift event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub gift_id: i64,
    pub gift_name: String,
    pub gift_type: i64,
    pub num: i64,
    pub uid: i64,
    pub uname: String,
    pub face: String,
    pub guard_level: i64,
    /// Verb shown in the room, e.g. "投喂".
    pub action: String,
    pub price: i64,
    /// `"gold"` for paid gifts, `"silver"` for free ones.
    pub coin_type: String,
    pub total_coin: i64,
    /// Unix seconds.
    pub timestamp: i64,
    pub rnd: String,
    pub tid: String,
    pub medal_name: String,
    pub medal_level: i64,
    pub medal_target_id: i64,
}

impl Gift {
    /// Decodes a `SEND_GIFT` body.  Never fails; missing values are zero.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_view(&JsonView::parse(body))
    }

    /// Decodes from an already parsed body.
    pub fn from_view(v: &JsonView) -> Self {
        Self {
            gift_id: v.get("data.giftId").int(),
            gift_name: v.get("data.giftName").string(),
            gift_type: v.get("data.giftType").int(),
            num: v.get("data.num").int(),
            uid: v.get("data.uid").int(),
            uname: v.get("data.uname").string(),
            face: v.get("data.face").string(),
            guard_level: v.get("data.guard_level").int(),
            action: v.get("data.action").string(),
            price: v.get("data.price").int(),
            coin_type: v.get("data.coin_type").string(),
            total_coin: v.get("data.total_coin").int(),
            timestamp: v.get("data.timestamp").int(),
            rnd: v.get("data.rnd").string(),
            tid: v.get("data.tid").string(),
            medal_name: v.get("data.medal_info.medal_name").string(),
            medal_level: v.get("data.medal_info.medal_level").int(),
            medal_target_id: v.get("data.medal_info.target_id").int(),
        }
    }
}
