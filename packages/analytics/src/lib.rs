#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter and aggregation pipeline for the inspection dashboard.
//!
//! Every function here is pure: it borrows the loaded record set, never
//! mutates it, and returns freshly built results. An empty selection is a
//! valid input and yields zeroed aggregates rather than an error.

pub mod aggregate;
pub mod filter;
pub mod map;

pub use aggregate::aggregate;
pub use filter::{FilteredView, filter, inspection_rows};
pub use map::{map_markers, map_overlay};
