//! PvP duels over the shared store.
//!
//! `room` is the shared document and its state machine; `protocol` is the
//! client side: create, join, cancel, host flip, and the idempotent
//! per-client resolution.

pub mod protocol;
pub mod room;

pub use protocol::{PvpClient, RoomError, SETTLE_DELAY};
pub use room::{ParticipantSnapshot, Room, RoomStatus};
