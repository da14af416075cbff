//! Core application primitives (scheduler, commands, HTTP front end, runtime, signals)

pub mod commands;
pub mod http;
pub mod runtime;
pub mod scheduler;
pub mod shutdown;

pub use commands::*;
pub use http::*;
pub use runtime::*;
pub use scheduler::*;
pub use shutdown::*;
