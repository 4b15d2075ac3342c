//! Purpose: Typed live parameters saved to and hot-reloaded from a JSON file.
//! Exports: `api` (cells, bag, kinds, documents, errors), `notice`, `params_paths`.
//! Role: Library used by applications that tune values at runtime and by the `liveparam` CLI.
//! Invariants: Only the closed kind set in `api::Kind` can be registered.
//! Invariants: Bags are explicit values; the process-wide bag is an opt-in convenience.
pub mod api;
mod core;
mod json;
pub mod notice;
pub mod params_paths;

pub use api::{Bag, BagOptions, LiveParam, bag};
