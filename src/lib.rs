pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod pipeline;
pub mod render;
pub mod report;

pub use error::{EvalError, Result};
