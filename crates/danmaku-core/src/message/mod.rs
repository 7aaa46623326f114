//! Typed notification events.
//!
//! Every notification packet carries one JSON object whose `cmd` field names
//! the event.  Five commands are decoded into typed records; everything else is
//! either offered raw to custom handlers or dropped.
//!
//! # Decoding is total
//!
//! The decoders never fail.  Notification payloads drift between server
//! releases, so a field that is missing or has an unexpected type decodes to
//! its zero value instead of discarding the whole event.
//!
//! # Command suffixes
//!
//! Some servers append `:`-separated variants to the command
//! (`DANMU_MSG:4:0:2:2:2:0`).  [`EventKind::from_cmd`] matches on the part
//! before the first `:`.

pub mod danmaku;
pub mod gift;
pub mod guard_buy;
pub mod live;
pub mod notice;
pub mod path;
pub mod super_chat;

pub use danmaku::{Danmaku, DanmakuKind};
pub use gift::Gift;
pub use guard_buy::GuardBuy;
pub use live::Live;
pub use notice::{CommonNoticeDanmaku, ContentSegment};
pub use path::{Field, JsonView};
pub use super_chat::SuperChat;

use std::fmt;

use tracing::debug;

// ── Event kinds ───────────────────────────────────────────────────────────────

/// The commands that decode into typed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Danmaku,
    SuperChat,
    Gift,
    GuardBuy,
    Live,
}

impl EventKind {
    /// All typed kinds.
    pub const ALL: [EventKind; 5] = [
        EventKind::Danmaku,
        EventKind::SuperChat,
        EventKind::Gift,
        EventKind::GuardBuy,
        EventKind::Live,
    ];

    /// Maps a `cmd` string to its kind, ignoring any `:`-suffix.
    pub fn from_cmd(cmd: &str) -> Option<Self> {
        let base = cmd.split(':').next().unwrap_or(cmd);
        match base {
            "DANMU_MSG" => Some(Self::Danmaku),
            "SUPER_CHAT_MESSAGE" => Some(Self::SuperChat),
            "SEND_GIFT" => Some(Self::Gift),
            "GUARD_BUY" => Some(Self::GuardBuy),
            "LIVE" => Some(Self::Live),
            _ => None,
        }
    }

    /// The wire command for this kind.
    pub fn command(self) -> &'static str {
        match self {
            Self::Danmaku => "DANMU_MSG",
            Self::SuperChat => "SUPER_CHAT_MESSAGE",
            Self::Gift => "SEND_GIFT",
            Self::GuardBuy => "GUARD_BUY",
            Self::Live => "LIVE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

// ── Decoded events ────────────────────────────────────────────────────────────

/// A decoded typed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Danmaku(Danmaku),
    SuperChat(SuperChat),
    Gift(Gift),
    GuardBuy(GuardBuy),
    Live(Live),
}

impl Event {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Danmaku(_) => EventKind::Danmaku,
            Self::SuperChat(_) => EventKind::SuperChat,
            Self::Gift(_) => EventKind::Gift,
            Self::GuardBuy(_) => EventKind::GuardBuy,
            Self::Live(_) => EventKind::Live,
        }
    }

    /// Decodes an already parsed body as `kind`.
    pub fn from_view(kind: EventKind, view: &JsonView) -> Self {
        let cmd = command_in(view);
        if EventKind::from_cmd(&cmd) != Some(kind) {
            debug!(%kind, %cmd, "decoding body whose cmd does not match the requested kind");
        }
        match kind {
            EventKind::Danmaku => Self::Danmaku(Danmaku::from_view(view)),
            EventKind::SuperChat => Self::SuperChat(SuperChat::from_view(view)),
            EventKind::Gift => Self::Gift(Gift::from_view(view)),
            EventKind::GuardBuy => Self::GuardBuy(GuardBuy::from_view(view)),
            EventKind::Live => Self::Live(Live::from_view(view)),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes `body` as an event of `kind`.  Never fails.
pub fn decode(kind: EventKind, body: &[u8]) -> Event {
    Event::from_view(kind, &JsonView::parse(body))
}

/// Reads the `cmd` field of a notification body; empty if absent or not JSON.
pub fn command_of(body: &[u8]) -> String {
    command_in(&JsonView::parse(body))
}

fn command_in(view: &JsonView) -> String {
    view.get("cmd").string()
}
