//! Stowage planning core for pressurized cargo modules.
//!
//! Items are axis-aligned boxes stowed into zoned containers through one open
//! face. The crate plans batch placement, computes retrieval step plans, and
//! identifies and returns waste, exposed over a REST API.

pub mod api;
pub mod config;
pub mod freespace;
pub mod model;
pub mod placement;
pub mod retrieval;
pub mod rotation;
pub mod score;
pub mod store;
pub mod types;
pub mod waste;
pub mod zone;
