//! Route geometry for simulated vehicles.
//!
//! Fetches road loops from an OSRM-compatible router and rail lines from
//! an Overpass-compatible interpreter. Live results are cached for a TTL;
//! when a service fails a synthetic path is generated locally so callers
//! always receive a usable route.

pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod provider;
pub mod rail;
pub mod source;

pub use cache::{CacheKey, RouteCache, RouteMode};
pub use config::RouteConfig;
pub use error::{RouteError, RouteResult};
pub use provider::{RouteOrigin, RouteOutcome, RouteProvider};
pub use source::{HttpRouteSource, RouteSource};
