//! Cabinet entity - rental kiosk, read-only here
//!
//! Plans target cabinets by their string identifier. The backend joins the
//! identifiers with commas; that encoding stays inside the serde impls of
//! [`CabinetSet`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CabinetId(String);

impl CabinetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CabinetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CabinetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Target cabinets of a plan
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CabinetSet(BTreeSet<CabinetId>);

impl CabinetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the comma-joined wire form; blank segments are dropped
    pub fn from_wire(joined: &str) -> Self {
        Self(
            joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CabinetId::new)
                .collect(),
        )
    }

    pub fn to_wire(&self) -> String {
        self.0
            .iter()
            .map(CabinetId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns false if the cabinet was already targeted
    pub fn insert(&mut self, id: impl Into<CabinetId>) -> bool {
        self.0.insert(id.into())
    }

    pub fn remove(&mut self, id: &CabinetId) -> bool {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &CabinetId) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CabinetId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<I: Into<CabinetId>> FromIterator<I> for CabinetSet {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for CabinetSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for CabinetSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let joined = Option::<String>::deserialize(deserializer)?;
        Ok(joined.map(|s| CabinetSet::from_wire(&s)).unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CabinetModel {
    Pm8,
    Pm12,
    Pm20,
}

impl CabinetModel {
    pub fn slots(self) -> u32 {
        match self {
            CabinetModel::Pm8 => 8,
            CabinetModel::Pm12 => 12,
            CabinetModel::Pm20 => 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "wifi")]
    Wifi,
    #[serde(rename = "ethernet")]
    Ethernet,
    #[serde(rename = "4g")]
    Cellular,
}

/// Cabinet as listed by the backend.
///
/// Monitoring fields arrive in snake_case or camelCase depending on the
/// endpoint; the aliases fold both spellings into one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cabinet {
    pub id: i64,
    pub cabinet_id: CabinetId,
    #[serde(default)]
    pub qrcode: String,
    pub model: CabinetModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim: Option<String>,
    #[serde(deserialize_with = "online_flag")]
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, alias = "lastPingAt", skip_serializing_if = "Option::is_none")]
    pub last_ping_at: Option<String>,
    #[serde(default, alias = "signalStrength", skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
    #[serde(default, alias = "ipAddress", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, alias = "connectionType", skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
    #[serde(default, alias = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// `is_online` is `0 | 1` on the wire; booleans are accepted too
fn online_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cabinet_set_wire_form() {
        let set = CabinetSet::from_wire("CAB002, CAB001,,CAB002");
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_wire(), "CAB001,CAB002");
        assert!(set.contains(&CabinetId::from("CAB001")));

        assert!(CabinetSet::from_wire("").is_empty());
        assert!(CabinetSet::from_wire(" , ").is_empty());
    }

    #[test]
    fn test_cabinet_set_serde() {
        let set: CabinetSet = ["B", "A"].into_iter().collect();
        assert_eq!(serde_json::to_value(&set).unwrap(), serde_json::json!("A,B"));

        let parsed: CabinetSet = serde_json::from_str(r#""A,B""#).unwrap();
        assert_eq!(parsed, set);
        let parsed: CabinetSet = serde_json::from_str("null").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut set = CabinetSet::new();
        assert!(set.insert("CAB001"));
        assert!(!set.insert("CAB001"));
        assert!(set.remove(&CabinetId::from("CAB001")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_cabinet_field_spellings() {
        let snake: Cabinet = serde_json::from_str(
            r#"{"id": 1, "cabinet_id": "CAB001", "qrcode": "q", "model": "pm8",
                "is_online": 1, "device_id": "dev-1", "connection_type": "4g",
                "signal_strength": 20}"#,
        )
        .unwrap();
        let camel: Cabinet = serde_json::from_str(
            r#"{"id": 1, "cabinet_id": "CAB001", "qrcode": "q", "model": "pm8",
                "is_online": true, "deviceId": "dev-1", "connectionType": "4g",
                "signalStrength": 20}"#,
        )
        .unwrap();
        assert_eq!(snake, camel);
        assert!(snake.is_online);
        assert_eq!(snake.connection_type, Some(ConnectionType::Cellular));
        assert_eq!(snake.model.slots(), 8);
    }
}
