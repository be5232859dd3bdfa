pub mod poll_loop;
pub mod processor;

pub use poll_loop::{spawn_poll_loop, PollLoop, PollState, TickOutcome};
pub use processor::ChatProcessor;
