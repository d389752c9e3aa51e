//! Search orchestration: hedges counted block by block, then every query
//! variant counted, retrieved and written out.

pub mod engine;
pub mod runner;

pub use engine::{RunRequest, run};
pub use runner::QueryOutcome;
