//! Core types shared by the promise core, combinators and the lab host.

pub mod state;

pub use state::{PromiseState, Settled};
