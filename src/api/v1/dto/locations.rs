/*
 * Responsibility
 * - /ws/locations でやり取りするフレームの DTO
 */
use serde::{Deserialize, Serialize};

use crate::services::realtime::LocationUpdate;

/// Frame sent by a client: its current position.
#[derive(Debug, Deserialize)]
pub struct LocationPayload {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationPayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err("latitude must be between -90 and 90");
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err("longitude must be between -180 and 180");
        }
        Ok(())
    }
}

/// Frames sent by the server.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Location(LocationUpdate),
    Error { message: String },
}
