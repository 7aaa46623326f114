//! Commands the server is known to send that have no typed decoder.
//!
//! A notification whose `cmd` is in this set is accepted silently.  Anything
//! outside both the typed kinds and this set is logged as unrecognised, which
//! makes new server commands easy to spot in debug logs.

use std::collections::HashSet;

const RECOGNISED: &[&str] = &[
    "ACTIVITY_BANNER_UPDATE_V2",
    "ACTIVITY_MATCH_GIFT",
    "ANCHOR_LOT_AWARD",
    "ANCHOR_LOT_CHECKSTATUS",
    "ANCHOR_LOT_END",
    "ANCHOR_LOT_START",
    "ANIMATION",
    "BOX_ACTIVITY_START",
    "CHANGE_ROOM_INFO",
    "CHASE_FRAME_SWITCH",
    "COMBO_END",
    "COMBO_SEND",
    "COMMON_NOTICE_DANMAKU",
    "CUT_OFF",
    "DANMU_GIFT_LOTTERY_AWARD",
    "DANMU_GIFT_LOTTERY_END",
    "DANMU_GIFT_LOTTERY_START",
    "DANMU_MSG",
    "ENTRY_EFFECT",
    "GUARD_ACHIEVEMENT_ROOM",
    "GUARD_BUY",
    "GUARD_LOTTERY_START",
    "HOT_RANK_CHANGED",
    "HOT_RANK_CHANGED_V2",
    "HOT_RANK_SETTLEMENT",
    "HOT_RANK_SETTLEMENT_V2",
    "HOT_ROOM_NOTIFY",
    "HOUR_RANK_AWARDS",
    "INTERACT_WORD",
    "LITTLE_TIPS",
    "LIVE",
    "LIVE_INTERACTIVE_GAME",
    "LOL_ACTIVITY",
    "LUCK_GIFT_AWARD_USER",
    "MATCH_ROOM_CONF",
    "MATCH_TEAM_GIFT_RANK",
    "MESSAGEBOX_USER_GAIN_MEDAL",
    "NOTICE_MSG",
    "ONLINE_RANK_COUNT",
    "ONLINE_RANK_TOP3",
    "ONLINE_RANK_V2",
    "PANEL",
    "PK_AGAIN",
    "PK_BATTLE_CRIT",
    "PK_BATTLE_END",
    "PK_BATTLE_GIFT",
    "PK_BATTLE_PRE",
    "PK_BATTLE_PROCESS",
    "PK_BATTLE_PRO_TYPE",
    "PK_BATTLE_RANK_CHANGE",
    "PK_BATTLE_SETTLE_USER",
    "PK_BATTLE_SPECIAL_GIFT",
    "PK_BATTLE_START",
    "PK_BATTLE_VOTES_ADD",
    "PK_END",
    "PK_LOTTERY_START",
    "PK_MATCH",
    "PK_MIC_END",
    "PK_PRE",
    "PK_PROCESS",
    "PK_SETTLE",
    "PK_START",
    "PREPARING",
    "RAFFLE_END",
    "RAFFLE_START",
    "ROOM_ADMINS",
    "ROOM_BANNER",
    "ROOM_BLOCK_INTO",
    "ROOM_BLOCK_MSG",
    "ROOM_BOX_USER",
    "ROOM_CHANGE",
    "ROOM_KICKOUT",
    "ROOM_LIMIT",
    "ROOM_LOCK",
    "ROOM_RANK",
    "ROOM_REAL_TIME_MESSAGE_UPDATE",
    "ROOM_REFRESH",
    "ROOM_SILENT_OFF",
    "ROOM_SILENT_ON",
    "ROOM_SKIN_MSG",
    "SCORE_CARD",
    "SEND_GIFT",
    "SEND_TOP",
    "SPECIAL_GIFT",
    "STOP_LIVE_ROOM_LIST",
    "SUPER_CHAT_ENTRANCE",
    "SUPER_CHAT_MESSAGE",
    "SUPER_CHAT_MESSAGE_DELETE",
    "SUPER_CHAT_MESSAGE_JPN",
    "TV_END",
    "TV_START",
    "USER_TOAST_MSG",
    "VOICE_JOIN_STATUS",
    "WARNING",
    "WATCHED_CHANGE",
    "WATCH_LPL_EXPIRED",
    "WEEK_STAR_CLOCK",
    "WELCOME",
    "WELCOME_GUARD",
    "WIDGET_BANNER",
    "WIN_ACTIVITY",
    "WIN_ACTIVITY_USER",
    "WISH_BOTTLE",
    "room_admin_entrance",
];

/// Read-only set of recognised-but-unhandled command names.
///
/// Built once per router and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct KnownCommands(HashSet<&'static str>);

impl KnownCommands {
    pub fn new() -> Self {
        Self(RECOGNISED.iter().copied().collect())
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, cmd: &str) -> bool {
        self.0.contains(cmd)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for KnownCommands {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_common_commands() {
        let known = KnownCommands::new();
        assert!(known.contains("INTERACT_WORD"));
        assert!(known.contains("ONLINE_RANK_COUNT"));
        assert!(known.contains("room_admin_entrance"));
    }

    #[test]
    fn test_membership_is_exact() {
        let known = KnownCommands::new();
        assert!(!known.contains("interact_word"));
        assert!(!known.contains("INTERACT_WORD:1"));
        assert!(!known.contains(""));
    }

    #[test]
    fn test_list_has_no_duplicates() {
        assert_eq!(KnownCommands::new().len(), RECOGNISED.len());
    }
}
