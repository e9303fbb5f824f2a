//! Lambda handlers for the institute review platform.
//!
//! Each binary under `src/bin` wires one handler from [`handlers`] to the Lambda runtime.
//! AWS services sit behind the traits in [`clients`] so handlers can run against fakes.

pub mod api;
pub mod classify;
pub mod clients;
pub mod config;
pub mod dates;
pub mod dynamo;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod model;
pub mod ocr;
pub mod prompts;
pub mod query;
pub mod runtime;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AppError, AppResult};
