mod state;
mod worker;

pub mod error;
pub mod ppr;
pub use error::{PregelError, Result};

mod accumulator;
pub use accumulator::*;

mod combine;
pub use combine::*;

mod config;
pub use config::*;

mod context;
pub use context::*;

mod graph;
pub use graph::*;

mod master;
pub use master::*;

mod program;
pub use program::*;

mod snapshot;
pub use snapshot::*;

mod sparse;
pub use sparse::*;

mod vertex;
pub use vertex::*;

pub use state::State;
pub use worker::Worker;
