//! Route provider: cache, live fetch, fallback.

use std::sync::Arc;
use std::time::Instant;

use fleetcast_core::geo::destination;
use fleetcast_core::{BoundingBox, GeoPoint, RoutePath};
use fleetcast_telemetry::Metrics;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, RouteCache, RouteMode};
use crate::config::RouteConfig;
use crate::error::{RouteError, RouteResult};
use crate::fallback::{fallback_line, fallback_loop};
use crate::rail::{check_continuity, extract_segment, longest_way};
use crate::source::{HttpRouteSource, RouteSource};

/// Waypoints placed on the circle for a road loop.
const ROAD_WAYPOINTS: usize = 6;

/// Where a returned route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOrigin {
    Live,
    Cached,
    Fallback,
}

impl RouteOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cached => "cached",
            Self::Fallback => "fallback",
        }
    }
}

/// A route and its origin.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub path: RoutePath,
    pub origin: RouteOrigin,
}

impl RouteOutcome {
    pub fn is_fallback(&self) -> bool {
        self.origin == RouteOrigin::Fallback
    }
}

/// Supplies road and rail paths for simulations.
///
/// Service failures, empty geometry and timeouts are absorbed: the caller
/// receives a synthetic fallback path instead.
pub struct RouteProvider {
    source: Arc<dyn RouteSource>,
    cache: RouteCache,
    config: RouteConfig,
}

impl RouteProvider {
    pub fn new(source: Arc<dyn RouteSource>, config: RouteConfig) -> Self {
        Self {
            cache: RouteCache::new(config.cache_ttl()),
            source,
            config,
        }
    }

    /// Provider backed by the configured HTTP services.
    pub fn http(config: RouteConfig) -> RouteResult<Self> {
        let source = HttpRouteSource::new(&config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Closed street loop through waypoints on a circle of `radius_m`.
    ///
    /// Falls back to an octagon of the same radius.
    pub async fn fetch_road_route(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> RouteResult<RouteOutcome> {
        validate_request(center, radius_m)?;
        let started = Instant::now();
        let mode = RouteMode::Road;
        let key = CacheKey::new(mode, center, radius_m);

        let outcome = match self.cache.get(&key) {
            Some(path) => RouteOutcome {
                path,
                origin: RouteOrigin::Cached,
            },
            None => match self.live_road(center, radius_m).await {
                Ok(path) => {
                    self.cache.insert(key, path.clone());
                    RouteOutcome {
                        path,
                        origin: RouteOrigin::Live,
                    }
                }
                Err(e) => {
                    warn!(%center, radius_m, error = %e, "Road route unavailable, using fallback loop");
                    RouteOutcome {
                        path: fallback_loop(center, radius_m)?,
                        origin: RouteOrigin::Fallback,
                    }
                }
            },
        };

        self.record(mode, &outcome, started);
        Ok(outcome)
    }

    /// Rail line of about `length_m` on the longest nearby way.
    ///
    /// Falls back to a straight line through `center`.
    pub async fn fetch_rail_route(
        &self,
        center: GeoPoint,
        length_m: f64,
    ) -> RouteResult<RouteOutcome> {
        validate_request(center, length_m)?;
        let started = Instant::now();
        let mode = RouteMode::Rail;
        let key = CacheKey::new(mode, center, length_m);

        let outcome = match self.cache.get(&key) {
            Some(path) => RouteOutcome {
                path,
                origin: RouteOrigin::Cached,
            },
            None => match self.live_rail(center, length_m).await {
                Ok(path) => {
                    self.cache.insert(key, path.clone());
                    RouteOutcome {
                        path,
                        origin: RouteOrigin::Live,
                    }
                }
                Err(e) => {
                    warn!(%center, length_m, error = %e, "Rail route unavailable, using fallback line");
                    RouteOutcome {
                        path: fallback_line(center, length_m)?,
                        origin: RouteOrigin::Fallback,
                    }
                }
            },
        };

        self.record(mode, &outcome, started);
        Ok(outcome)
    }

    async fn live_road(&self, center: GeoPoint, radius_m: f64) -> RouteResult<RoutePath> {
        let waypoints = road_waypoints(center, radius_m);
        let points = timeout(
            self.config.request_timeout(),
            self.source.road_geometry(&waypoints),
        )
        .await
        .map_err(|_| RouteError::Timeout(self.config.request_timeout_ms))??;

        let path = usable(RoutePath::new(points)?)?;
        check_continuity(&path, self.config.max_jump_m);
        Ok(path)
    }

    async fn live_rail(&self, center: GeoPoint, length_m: f64) -> RouteResult<RoutePath> {
        let bbox = BoundingBox::around(center, self.config.rail_search_radius_m);
        let ways = timeout(self.config.request_timeout(), self.source.rail_ways(bbox))
            .await
            .map_err(|_| RouteError::Timeout(self.config.request_timeout_ms))??;

        let way = longest_way(&ways)
            .ok_or_else(|| RouteError::NoGeometry("no rail way with geometry".to_string()))?;
        debug!(ways = ways.len(), points = way.len(), "Selected longest rail way");

        let segment = extract_segment(way, center, length_m);
        let path = usable(RoutePath::new(segment)?)?;
        let gaps = check_continuity(&path, self.config.max_jump_m);
        info!(
            points = path.len(),
            length_m = path.length_m().round(),
            gaps,
            "Rail route extracted"
        );
        Ok(path)
    }

    fn record(&self, mode: RouteMode, outcome: &RouteOutcome, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            mode = mode.as_str(),
            origin = outcome.origin.as_str(),
            points = outcome.path.len(),
            elapsed_ms,
            "Route resolved"
        );
        Metrics::route_fetch(mode.as_str(), outcome.origin.as_str(), elapsed_ms);
    }
}

/// Waypoints evenly spaced on a circle, closed back at the first one.
fn road_waypoints(center: GeoPoint, radius_m: f64) -> Vec<GeoPoint> {
    let step = 360.0 / ROAD_WAYPOINTS as f64;
    let mut points: Vec<GeoPoint> = (0..ROAD_WAYPOINTS)
        .map(|i| destination(center, i as f64 * step, radius_m))
        .collect();
    points.push(points[0]);
    points
}

fn usable(path: RoutePath) -> RouteResult<RoutePath> {
    if path.len() < 2 {
        return Err(RouteError::NoGeometry(format!(
            "path has {} point(s)",
            path.len()
        )));
    }
    Ok(path)
}

fn validate_request(center: GeoPoint, size_m: f64) -> RouteResult<()> {
    center.validate()?;
    if !size_m.is_finite() || size_m <= 0.0 {
        return Err(RouteError::InvalidRequest(format!(
            "route size must be positive, got {size_m}"
        )));
    }
    Ok(())
}
