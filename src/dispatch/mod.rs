//! Turning applied mutations into listener invocations.

mod engine;
mod pool;

pub use engine::DispatchEngine;
pub use pool::WorkerPool;
