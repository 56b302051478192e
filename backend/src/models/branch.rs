use crate::types::BranchId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A named office location with a circular geofence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Allowed check-in radius around the branch, in meters.
    pub radius_m: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 50.0;

impl Branch {
    pub fn new(name: String, location: GeoPoint, radius_m: Option<f64>) -> Self {
        let now = Utc::now();
        Self {
            id: BranchId::new(),
            name,
            latitude: location.lat,
            longitude: location.lng,
            radius_m: radius_m.unwrap_or(DEFAULT_GEOFENCE_RADIUS_M),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[validate(range(min = 1.0, max = 100_000.0))]
    pub radius_m: Option<f64>,
}
