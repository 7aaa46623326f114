//! Routes decoded packets to registered handlers.
//!
//! # Resolution order for notifications
//!
//! ```text
//! cmd has a custom override?     → override(raw JSON), nothing else
//! cmd is one of the typed kinds? → decode once, call every handler of that kind
//! cmd is a recognised command?   → nothing
//! otherwise                      → debug log "unrecognised command"
//! ```
//!
//! Heartbeat replies and enter replies are accepted without effect; any other
//! operation is logged as unexpected.
//!
//! Each callback runs in its own Tokio task inside [`isolate`], so a slow or
//! panicking handler never delays or breaks the others.  Completion order
//! across handlers is unspecified.

use std::sync::Arc;

use danmaku_core::message::{EventKind, JsonView};
use danmaku_core::{Danmaku, Gift, GuardBuy, Live, Operation, Packet, SuperChat};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::fault::isolate;
use crate::application::known_commands::KnownCommands;
use crate::application::registry::{Handler, HandlerRegistry};

/// What [`EventRouter::handle`] did with a packet.
///
/// The join handles of spawned callbacks are returned so callers can wait for
/// them; production callers simply drop the value.
#[derive(Debug)]
pub enum Dispatch {
    /// Heartbeat reply or enter reply; no handler involved.
    Ignored,
    /// A custom override took the notification.
    Override { cmd: String, handle: JoinHandle<()> },
    /// A typed notification was decoded and handed to every handler of `kind`.
    Typed {
        kind: EventKind,
        handlers: Vec<JoinHandle<()>>,
    },
    /// A recognised command without a typed decoder.
    Known { cmd: String },
    /// A command nobody recognises.
    Unknown { cmd: String },
    /// An operation the router does not expect from the server.
    Unexpected { operation: Operation },
}

impl Dispatch {
    /// Number of callbacks spawned for this packet.
    pub fn spawned(&self) -> usize {
        match self {
            Dispatch::Override { .. } => 1,
            Dispatch::Typed { handlers, .. } => handlers.len(),
            _ => 0,
        }
    }

    /// Waits for every spawned callback to finish.
    pub async fn finished(self) {
        let handles = match self {
            Dispatch::Override { handle, .. } => vec![handle],
            Dispatch::Typed { handlers, .. } => handlers,
            _ => Vec::new(),
        };
        for handle in handles {
            // Callbacks are isolated, so a join error only means the runtime
            // is shutting down.
            let _ = handle.await;
        }
    }
}

/// Dispatches packets according to the registered handlers.
pub struct EventRouter {
    registry: Arc<HandlerRegistry>,
    known: KnownCommands,
}

impl EventRouter {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            known: KnownCommands::new(),
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Routes one terminal packet.
    ///
    /// Must be called from within a Tokio runtime; callbacks are spawned.
    pub fn handle(&self, packet: Packet) -> Dispatch {
        match packet.operation {
            Operation::Notification => self.handle_notification(packet.body),
            Operation::HeartbeatReply | Operation::EnterReply => Dispatch::Ignored,
            operation => {
                warn!(
                    "unexpected packet: operation={operation:?} protover={:?} body={}",
                    packet.protocol_version,
                    packet.body_text()
                );
                Dispatch::Unexpected { operation }
            }
        }
    }

    fn handle_notification(&self, body: Vec<u8>) -> Dispatch {
        let view = JsonView::parse(&body);
        let cmd = view.get("cmd").string();

        if let Some(handler) = self.registry.custom(&cmd) {
            let raw = String::from_utf8_lossy(&body).into_owned();
            let label = cmd.clone();
            let handle = tokio::spawn(async move {
                isolate(&label, || handler(raw.as_str()));
            });
            return Dispatch::Override { cmd, handle };
        }

        if let Some(kind) = EventKind::from_cmd(&cmd) {
            let handlers = self.dispatch_typed(kind, &view);
            return Dispatch::Typed { kind, handlers };
        }

        if self.known.contains(&cmd) {
            return Dispatch::Known { cmd };
        }

        debug!("unrecognised command {cmd:?}: {}", String::from_utf8_lossy(&body));
        Dispatch::Unknown { cmd }
    }

    fn dispatch_typed(&self, kind: EventKind, view: &JsonView) -> Vec<JoinHandle<()>> {
        let r = &self.registry;
        match kind {
            EventKind::Danmaku => spawn_all(kind, r.danmaku_handlers(), || Danmaku::from_view(view)),
            EventKind::SuperChat => {
                spawn_all(kind, r.super_chat_handlers(), || SuperChat::from_view(view))
            }
            EventKind::Gift => spawn_all(kind, r.gift_handlers(), || Gift::from_view(view)),
            EventKind::GuardBuy => {
                spawn_all(kind, r.guard_buy_handlers(), || GuardBuy::from_view(view))
            }
            EventKind::Live => spawn_all(kind, r.live_handlers(), || Live::from_view(view)),
        }
    }
}

/// Decodes the record once and spawns one isolated task per handler.
///
/// Nothing is decoded when no handler is registered for `kind`.
fn spawn_all<T, D>(kind: EventKind, handlers: Vec<Handler<T>>, decode: D) -> Vec<JoinHandle<()>>
where
    T: Send + Sync + 'static,
    D: FnOnce() -> T,
{
    if handlers.is_empty() {
        return Vec::new();
    }
    let record = Arc::new(decode());
    handlers
        .into_iter()
        .map(|handler| {
            let record = Arc::clone(&record);
            tokio::spawn(async move {
                isolate(kind.command(), || handler(record.as_ref()));
            })
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
