//! Match scheduling: state, command queue, and the turn/phase loop.
//!
//! ## Key Types
//!
//! - [`MatchState`]: pools, variables, RNG, queue, cancellation flags
//! - [`CommandQueue`]: FIFO input queue drained one command per tick
//! - [`MatchScheduler`]: the loop driver and trigger firing pass
//! - [`Tick`]: what one `tick()` did (advanced / idle / waiting / ended)

pub mod match_loop;
pub mod queue;
pub mod state;

pub use match_loop::{MatchScheduler, Tick};
pub use queue::CommandQueue;
pub use state::MatchState;
