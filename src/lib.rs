pub mod bindings;
pub mod cli;
pub mod db;
pub mod error;
pub mod filters;
pub mod fmt;
pub mod geo;
pub mod loader;
pub mod logging;
pub mod models;
pub mod periods;
pub mod segments;
pub mod settings;
pub mod tui;
pub mod views;

pub use bindings::{evaluate, recompute, recompute_all, Inputs, Signal, ViewId, ViewOutput, BINDINGS};
pub use error::{DataLoadError, Result, RetailError};
pub use loader::DataStore;
pub use models::TransactionRecord;
pub use segments::{classify, Segment};
