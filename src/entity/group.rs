//! Group entity - 素材分组
//!
//! An ordered, timed playlist of materials. The backend stores one row per
//! material slot; `sort` is the dense 1-based playback position.

use serde::{Deserialize, Serialize};

/// One material slot inside a group
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMaterialDetail {
    pub material_id: i64,

    /// 播放顺序 (1..=N)
    pub sort: u32,

    /// 播放时长 (秒)
    pub time: u32,

    /// Display-only, filled in by read endpoints
    #[serde(default, skip_serializing)]
    pub material_name: Option<String>,

    /// Display-only, filled in by read endpoints
    #[serde(default, skip_serializing)]
    pub material_path: Option<String>,
}

impl GroupMaterialDetail {
    pub fn new(material_id: i64, sort: u32, time: u32) -> Self {
        Self {
            material_id,
            sort,
            time,
            material_name: None,
            material_path: None,
        }
    }
}

/// Group row as returned by the list endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_count: Option<u32>,
}

/// Group loaded for editing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetail {
    pub id: i64,

    /// Some backend versions send `group_name`
    #[serde(alias = "group_name")]
    pub name: String,

    #[serde(default)]
    pub details: Vec<GroupMaterialDetail>,
}

/// Body for both create and update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddGroupRequest {
    pub name: String,
    pub details: Vec<GroupMaterialDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fields_not_sent() {
        let mut detail = GroupMaterialDetail::new(3, 1, 10);
        detail.material_name = Some("Banner".to_string());
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"material_id": 3, "sort": 1, "time": 10})
        );
    }

    #[test]
    fn test_detail_accepts_group_name_alias() {
        let detail: GroupDetail = serde_json::from_str(
            r#"{"id": 4, "group_name": "Lobby loop",
                "details": [{"material_id": 9, "sort": 1, "time": 15, "material_name": "Logo"}]}"#,
        )
        .unwrap();
        assert_eq!(detail.name, "Lobby loop");
        assert_eq!(detail.details.len(), 1);
        assert_eq!(detail.details[0].material_name.as_deref(), Some("Logo"));

        let detail: GroupDetail =
            serde_json::from_str(r#"{"id": 5, "name": "Night"}"#).unwrap();
        assert_eq!(detail.name, "Night");
        assert!(detail.details.is_empty());
    }
}
