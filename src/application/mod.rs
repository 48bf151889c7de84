// Application layer - the ledger operations every adapter (CLI, HTTP, tool
// dispatch) calls into.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
