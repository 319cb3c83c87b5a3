//! Guard events and the sinks that report them.
//!
//! The guard loop describes what it is doing as [`GuardEvent`]s and hands
//! them to an [`EventSink`] supplied by the caller.

mod event;
mod sink;

pub use event::GuardEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
