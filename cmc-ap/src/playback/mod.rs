//! Playback scheduling: schedule layout, transport clock and engine

pub mod engine;
pub mod schedule;
pub mod transport;

pub use engine::PlaybackEngine;
pub use schedule::{Schedule, ScheduledNote};
pub use transport::TransportClock;
