//! Application layer for danmaku-client.
//!
//! Decides what happens to a decoded packet: which handlers run, in which
//! order of precedence, and how their failures are contained.  Nothing here
//! touches the network; the infrastructure layer feeds packets in.

pub mod fault;
pub mod known_commands;
pub mod registry;
pub mod router;

pub use fault::{format_panic, isolate, PanicMessage};
pub use known_commands::KnownCommands;
pub use registry::{CustomHandler, Handler, HandlerRegistry};
pub use router::{Dispatch, EventRouter};
