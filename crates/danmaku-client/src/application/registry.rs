//! Registered event handlers.
//!
//! Typed handler lists are append-only; the custom override map replaces any
//! earlier override for the same command.  Both can be changed while the
//! session is running, so each list sits behind its own `RwLock`.  Handlers
//! are never called with a lock held: readers take a snapshot of the `Arc`s
//! and release the lock before dispatching.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use danmaku_core::{Danmaku, Gift, GuardBuy, Live, SuperChat};

/// A typed event callback.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A custom override callback; receives the raw notification JSON.
pub type CustomHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Every callback registered on a client.
#[derive(Default)]
pub struct HandlerRegistry {
    danmaku: RwLock<Vec<Handler<Danmaku>>>,
    super_chat: RwLock<Vec<Handler<SuperChat>>>,
    gift: RwLock<Vec<Handler<Gift>>>,
    guard_buy: RwLock<Vec<Handler<GuardBuy>>>,
    live: RwLock<Vec<Handler<Live>>>,
    custom: RwLock<HashMap<String, CustomHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────────

    pub fn on_danmaku(&self, f: impl Fn(&Danmaku) + Send + Sync + 'static) {
        push(&self.danmaku, Arc::new(f));
    }

    pub fn on_super_chat(&self, f: impl Fn(&SuperChat) + Send + Sync + 'static) {
        push(&self.super_chat, Arc::new(f));
    }

    pub fn on_gift(&self, f: impl Fn(&Gift) + Send + Sync + 'static) {
        push(&self.gift, Arc::new(f));
    }

    pub fn on_guard_buy(&self, f: impl Fn(&GuardBuy) + Send + Sync + 'static) {
        push(&self.guard_buy, Arc::new(f));
    }

    pub fn on_live(&self, f: impl Fn(&Live) + Send + Sync + 'static) {
        push(&self.live, Arc::new(f));
    }

    /// Registers `f` for the exact command `cmd`, replacing any earlier
    /// override.  Returns `true` if an override was replaced.
    ///
    /// An override suppresses typed decoding and typed handlers for `cmd`.
    pub fn register_custom(
        &self,
        cmd: impl Into<String>,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) -> bool {
        self.custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cmd.into(), Arc::new(f))
            .is_some()
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    /// The override for exactly `cmd`, if any.
    pub fn custom(&self, cmd: &str) -> Option<CustomHandler> {
        self.custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(cmd)
            .cloned()
    }

    pub fn danmaku_handlers(&self) -> Vec<Handler<Danmaku>> {
        snapshot(&self.danmaku)
    }

    pub fn super_chat_handlers(&self) -> Vec<Handler<SuperChat>> {
        snapshot(&self.super_chat)
    }

    pub fn gift_handlers(&self) -> Vec<Handler<Gift>> {
        snapshot(&self.gift)
    }

    pub fn guard_buy_handlers(&self) -> Vec<Handler<GuardBuy>> {
        snapshot(&self.guard_buy)
    }

    pub fn live_handlers(&self) -> Vec<Handler<Live>> {
        snapshot(&self.live)
    }
}

fn push<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>, handler: Arc<T>) {
    list.write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(handler);
}

fn snapshot<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}
