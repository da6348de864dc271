//! One live GTP engine process, and the pure clock-translation logic that
//! feeds it time-setup commands. This crate has no notion of games, pools,
//! or the server it ultimately serves; it only knows how to drive a single
//! spawned process and speak GTP correctly to it.

pub mod adapter;
pub mod capabilities;
pub mod clock_translator;
pub mod error;
pub mod framing;
pub mod state;

pub use adapter::{ChatChannel, EngineProcessAdapter, StderrEvent, Transport};
pub use capabilities::EngineCapabilityProfile;
pub use clock_translator::{ClockColor, ClockSnapshot, PlayerClock};
pub use error::Error;
pub use state::EpaState;
