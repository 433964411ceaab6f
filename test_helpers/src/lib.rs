//! Test helpers shared across crates in the workspace.
//!
//! - [`figment`] writes packaged defaults documents into a `figment::Jail`
//!   working directory that is torn down afterwards.
//! - [`result`] converts crate results into `anyhow` results.
//! - [`tree`] builds settings trees from JSON literals and checks values at
//!   nested paths.

pub mod figment;
pub mod result;
pub mod tree;
