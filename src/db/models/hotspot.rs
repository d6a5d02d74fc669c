//! Hotspot model: a 3D-positioned marker tied to a building's model path.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Hotspot {
    pub id: String,
    pub building_model: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub content: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Position as received from clients. Each coordinate is optional so that
/// presence can be checked by definedness; zero is a valid coordinate.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionInput {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotResponse {
    pub id: String,
    pub building_model: String,
    pub position: Position,
    pub content: Option<String>,
}

impl From<Hotspot> for HotspotResponse {
    fn from(h: Hotspot) -> Self {
        Self {
            id: h.id,
            building_model: h.building_model,
            position: Position {
                x: h.x,
                y: h.y,
                z: h.z,
            },
            content: h.content,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHotspotRequest {
    pub building_model: Option<String>,
    pub position: Option<PositionInput>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHotspotRequest {
    pub position: Option<PositionInput>,
    pub content: Option<String>,
}
