pub mod config;
pub mod error;
pub mod memory;
pub mod stats;
pub mod trace;
pub mod utils;

pub use config::Config;
pub use error::SimError;
pub use memory::{AccessEvent, Memory, Query};
pub use stats::Stats;
pub use trace::{Access, Reference, Stream, TraceReader};
