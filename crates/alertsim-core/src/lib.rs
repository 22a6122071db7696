//! Core pipeline for the message alert delivery simulator: a producer feeds
//! a bounded queue, a pool of sender workers drains it with randomized
//! latency and failure injection, and an orchestrator supervises startup,
//! draining and coordinated shutdown.

pub mod config;
pub mod message;
pub mod monitor;
pub mod producer;
pub mod queue;
pub mod sender;
pub mod sim;
pub mod stats;

pub use config::*;
pub use message::*;
pub use monitor::*;
pub use producer::*;
pub use queue::*;
pub use sender::*;
pub use sim::*;
pub use stats::*;
