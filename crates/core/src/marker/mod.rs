use serde::{Deserialize, Serialize};

use crate::{FretCoachError, Result};

/// Physical fiducial printed on the guitar that the detector looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Marker {
    pub fn new(id: impl Into<String>, width_mm: f32, height_mm: f32) -> Self {
        Self {
            id: id.into(),
            width_mm,
            height_mm,
        }
    }
}

/// Read-only set of markers known for the lifetime of a session.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: Vec<Marker>,
}

impl MarkerRegistry {
    pub fn new(markers: Vec<Marker>) -> Self {
        Self { markers }
    }

    /// The headstock marker plus the inlays at the fifth and twelfth frets.
    pub fn builtin() -> Self {
        Self::new(vec![
            Marker::new("guitar-head", 80.0, 150.0),
            Marker::new("fret-marker-5", 50.0, 50.0),
            Marker::new("fret-marker-12", 50.0, 50.0),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&Marker> {
        self.get(id)
            .ok_or_else(|| FretCoachError::UnknownMarker(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
