//! flightnet-core: Pure aggregation + route library for virtual-aviation
//! networks.
//!
//! No I/O. Feed bodies arrive as text and leave as typed snapshots, the
//! cache runs caller-supplied fetch futures, and the airport/waypoint
//! directory is a trait the host implements. This crate is the shared core
//! used by `flightnet-server` (web API + CLI).

pub mod cache;
pub mod config;
pub mod convert;
pub mod geo;
pub mod ivao;
pub mod progress;
pub mod route;
pub mod types;
pub mod vatsim;

// Re-export commonly used types at crate root
pub use cache::{Cached, StaleCache};
pub use progress::{remaining_percent, total_distance_km};
pub use route::{construct_route, Directory};
pub use types::*;
