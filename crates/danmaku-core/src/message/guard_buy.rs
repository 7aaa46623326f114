//! `GUARD_BUY`: a viewer bought a recurring guard (membership) tier.

use serde::{Deserialize, Serialize};

use crate::message::path::JsonView;

/// A decoded guard purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardBuy {
    pub uid: i64,
    pub username: String,
    /// 1 = highest tier, 3 = lowest.
    pub guard_level: i64,
    pub num: i64,
    pub price: i64,
    pub gift_id: i64,
    pub gift_name: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl GuardBuy {
    /// Decodes a `GUARD_BUY` body.  Never fails; missing values are zero.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_view(&JsonView::parse(body))
    }

    /// Decodes from an already parsed body.
    pub fn from_view(v: &JsonView) -> Self {
        Self {
            uid: v.get("data.uid").int(),
            username: v.get("data.username").string(),
            guard_level: v.get("data.guard_level").int(),
            num: v.get("data.num").int(),
            price: v.get("data.price").int(),
            gift_id: v.get("data.gift_id").int(),
            gift_name: v.get("data.gift_name").string(),
            start_time: v.get("data.start_time").int(),
            end_time: v.get("data.end_time").int(),
        }
    }
}
