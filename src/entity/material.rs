//! Material entity - a single image or video advertising asset
//!
//! Materials are registered by URL and never updated; groups reference them
//! by id.

use serde::{Deserialize, Serialize};

/// Slot length used when a material carries no duration of its own
pub const DEFAULT_SLOT_SECONDS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,

    /// 显示名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub kind: MediaKind,

    /// Storage locator (URL)
    pub path: String,

    /// Playback seconds, images only; videos play their intrinsic length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Material {
    /// Seconds to preselect when adding this material to a group
    pub fn default_slot_seconds(&self) -> u32 {
        match self.kind {
            MediaKind::Image => self.duration.unwrap_or(DEFAULT_SLOT_SECONDS),
            MediaKind::Video => DEFAULT_SLOT_SECONDS,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}

/// Register a material by URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMaterialRequest {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// Filters for the material list
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct MaterialQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_from_wire() {
        let material: Material = serde_json::from_str(
            r#"{"id": 7, "name": "Summer promo", "path": "https://cdn.example/a.png",
                "type": "image", "created_at": "2024-05-01 10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(material.kind, MediaKind::Image);
        assert_eq!(material.display_name(), "Summer promo");
        assert_eq!(material.default_slot_seconds(), DEFAULT_SLOT_SECONDS);
    }

    #[test]
    fn test_image_duration_is_used() {
        let material = Material {
            id: 1,
            name: None,
            kind: MediaKind::Image,
            path: "https://cdn.example/b.jpg".to_string(),
            duration: Some(12),
            created_at: None,
        };
        assert_eq!(material.default_slot_seconds(), 12);
        assert_eq!(material.display_name(), "https://cdn.example/b.jpg");

        let video = Material {
            kind: MediaKind::Video,
            ..material
        };
        assert_eq!(video.default_slot_seconds(), DEFAULT_SLOT_SECONDS);
    }

    #[test]
    fn test_add_request_uses_type_key() {
        let req = AddMaterialRequest {
            name: "Intro".to_string(),
            path: "https://cdn.example/intro.mp4".to_string(),
            kind: MediaKind::Video,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], "video");
    }
}
