//! The turn loop — the heart of Parley.
//!
//! The assistant follows an **Ask → Act → Record** cycle:
//!
//! 1. **Receive** a user message and persist it
//! 2. **Ask** the model gateway, with the full session history
//! 3. **If tool calls**: execute them in order, persist each result, loop
//!    back to step 2
//! 4. **If text**: persist it and return it to the caller
//!
//! The loop stops on a plain-text answer, or fails once the configured
//! number of tool rounds is used up.

pub mod assistant;
pub mod executor;
pub mod turn;

#[cfg(test)]
mod test_helpers;

pub use assistant::Assistant;
pub use executor::ToolExecutor;
pub use turn::{DEFAULT_MAX_ROUNDS, TurnController, TurnOutcome, TurnState};
