//! Route geometry sources.
//!
//! `HttpRouteSource` talks to two read-only services:
//! - an OSRM-compatible router: `/route/v1/driving/{lng,lat;...}`
//! - an Overpass-compatible interpreter returning `way` elements with geometry

use async_trait::async_trait;
use fleetcast_core::{BoundingBox, GeoPoint};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::RouteConfig;
use crate::error::{RouteError, RouteResult};

/// Provider of raw route geometry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Street geometry of a route visiting `waypoints` in order.
    async fn road_geometry(&self, waypoints: &[GeoPoint]) -> RouteResult<Vec<GeoPoint>>;

    /// Rail ways (rail, subway, light rail, tram) inside `bbox`.
    async fn rail_ways(&self, bbox: BoundingBox) -> RouteResult<Vec<Vec<GeoPoint>>>;
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: GeoJsonLineString,
}

/// GeoJSON coordinates are `[lng, lat]`.
#[derive(Debug, Deserialize)]
struct GeoJsonLineString {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    geometry: Vec<OverpassNode>,
}

#[derive(Debug, Deserialize)]
struct OverpassNode {
    lat: f64,
    lon: f64,
}

fn osrm_geometry(response: OsrmResponse) -> RouteResult<Vec<GeoPoint>> {
    if response.code != "Ok" {
        let detail = response.message.unwrap_or_default();
        return Err(RouteError::Service(format!("{}: {detail}", response.code)));
    }
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::NoGeometry("router returned no routes".to_string()))?;
    let points: Vec<GeoPoint> = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| GeoPoint::new(lat, lng))
        .collect();
    if points.len() < 2 {
        return Err(RouteError::NoGeometry(format!(
            "route geometry has {} point(s)",
            points.len()
        )));
    }
    Ok(points)
}

fn overpass_ways(response: OverpassResponse) -> Vec<Vec<GeoPoint>> {
    response
        .elements
        .into_iter()
        .filter(|e| e.kind == "way" && e.geometry.len() >= 2)
        .map(|e| {
            e.geometry
                .into_iter()
                .map(|n| GeoPoint::new(n.lat, n.lon))
                .collect()
        })
        .collect()
}

/// Overpass QL query for rail ways inside `bbox`.
pub fn rail_query(bbox: BoundingBox) -> String {
    format!(
        "[out:json][timeout:15];(way[\"railway\"~\"^(rail|subway|light_rail|tram)$\"]({:.6},{:.6},{:.6},{:.6}););out geom;",
        bbox.south, bbox.west, bbox.north, bbox.east
    )
}

// ============================================================================
// HttpRouteSource
// ============================================================================

/// `RouteSource` backed by OSRM and Overpass over HTTP.
pub struct HttpRouteSource {
    client: Client,
    osrm_url: String,
    overpass_url: String,
}

impl HttpRouteSource {
    /// Create a source with the configured endpoints and timeout.
    pub fn new(config: &RouteConfig) -> RouteResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RouteError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            osrm_url: config.osrm_url.trim_end_matches('/').to_string(),
            overpass_url: config.overpass_url.clone(),
        })
    }

    /// Driving route URL through `waypoints`.
    pub fn road_url(&self, waypoints: &[GeoPoint]) -> String {
        let coords = waypoints
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/driving/{coords}?overview=full&geometries=geojson",
            self.osrm_url
        )
    }

    async fn get_text(&self, url: Url) -> RouteResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RouteError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::Service(format!("HTTP {status}: {body}")));
        }

        response
            .text()
            .await
            .map_err(|e| RouteError::HttpClient(format!("Failed to read response: {e}")))
    }
}

#[async_trait]
impl RouteSource for HttpRouteSource {
    async fn road_geometry(&self, waypoints: &[GeoPoint]) -> RouteResult<Vec<GeoPoint>> {
        if waypoints.len() < 2 {
            return Err(RouteError::InvalidRequest(
                "road route needs at least two waypoints".to_string(),
            ));
        }
        let url = Url::parse(&self.road_url(waypoints))
            .map_err(|e| RouteError::InvalidRequest(format!("bad router URL: {e}")))?;
        debug!(%url, waypoints = waypoints.len(), "Requesting road route");

        let body = self.get_text(url).await?;
        osrm_geometry(serde_json::from_str(&body)?)
    }

    async fn rail_ways(&self, bbox: BoundingBox) -> RouteResult<Vec<Vec<GeoPoint>>> {
        let query = rail_query(bbox);
        let url = Url::parse_with_params(&self.overpass_url, &[("data", query.as_str())])
            .map_err(|e| RouteError::InvalidRequest(format!("bad interpreter URL: {e}")))?;
        debug!(?bbox, "Requesting rail ways");

        let body = self.get_text(url).await?;
        let ways = overpass_ways(serde_json::from_str(&body)?);
        if ways.is_empty() {
            return Err(RouteError::NoGeometry("no rail ways in area".to_string()));
        }
        Ok(ways)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_url_uses_lng_lat_order() {
        let source = HttpRouteSource::new(&RouteConfig {
            osrm_url: "http://osrm.local/".to_string(),
            ..RouteConfig::default()
        })
        .unwrap();
        let url = source.road_url(&[GeoPoint::new(36.8, 10.18), GeoPoint::new(36.81, 10.19)]);
        assert_eq!(
            url,
            "http://osrm.local/route/v1/driving/10.180000,36.800000;10.190000,36.810000?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_osrm_geometry_parsed() {
        let body = r#"{"code":"Ok","routes":[{"geometry":{"type":"LineString",
            "coordinates":[[10.18,36.80],[10.19,36.81]]}}]}"#;
        let points = osrm_geometry(serde_json::from_str(body).unwrap()).unwrap();
        assert_eq!(points, vec![GeoPoint::new(36.80, 10.18), GeoPoint::new(36.81, 10.19)]);
    }

    #[test]
    fn test_osrm_error_code() {
        let body = r#"{"code":"NoRoute","message":"Impossible route"}"#;
        let err = osrm_geometry(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, RouteError::Service(msg) if msg.contains("NoRoute")));
    }

    #[test]
    fn test_osrm_empty_routes() {
        let body = r#"{"code":"Ok","routes":[]}"#;
        let err = osrm_geometry(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, RouteError::NoGeometry(_)));
    }

    #[test]
    fn test_overpass_keeps_ways_with_geometry() {
        let body = r#"{"elements":[
            {"type":"way","id":1,"geometry":[{"lat":36.8,"lon":10.1},{"lat":36.81,"lon":10.11}]},
            {"type":"way","id":2,"geometry":[{"lat":36.8,"lon":10.1}]},
            {"type":"node","id":3,"lat":36.8,"lon":10.1}
        ]}"#;
        let ways = overpass_ways(serde_json::from_str(body).unwrap());
        assert_eq!(ways.len(), 1);
        assert_eq!(ways[0][1], GeoPoint::new(36.81, 10.11));
    }

    #[test]
    fn test_rail_query_bbox_order() {
        let query = rail_query(BoundingBox {
            south: 1.0,
            west: 2.0,
            north: 3.0,
            east: 4.0,
        });
        assert!(query.contains("(1.000000,2.000000,3.000000,4.000000)"));
        assert!(query.ends_with("out geom;"));
    }
}
