//! Optional navigation capability ports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Source of the vehicle's latest position fix
pub trait PositionSource: Send + Sync {
    /// Last known valid fix, if any
    fn current_fix(&self) -> Option<GeoPoint>;
}

/// Route lookup between two positions
pub trait RouteSource: Send + Sync {
    /// Waypoints from `from` to `to`, if a route exists
    fn directions(&self, from: GeoPoint, to: GeoPoint) -> Option<Vec<GeoPoint>>;
}

/// Capability ports the controller may hold. All absent by default; the
/// control loop never depends on them.
#[derive(Clone, Default)]
pub struct NavigationPorts {
    pub position: Option<Arc<dyn PositionSource>>,
    pub route: Option<Arc<dyn RouteSource>>,
}

impl NavigationPorts {
    pub fn with_position(mut self, source: Arc<dyn PositionSource>) -> Self {
        self.position = Some(source);
        self
    }

    pub fn with_route(mut self, source: Arc<dyn RouteSource>) -> Self {
        self.route = Some(source);
        self
    }

    /// Latest fix from the position port
    pub fn current_fix(&self) -> Option<GeoPoint> {
        self.position.as_ref().and_then(|source| source.current_fix())
    }
}

impl fmt::Debug for NavigationPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationPorts")
            .field("position", &self.position.is_some())
            .field("route", &self.route.is_some())
            .finish()
    }
}
