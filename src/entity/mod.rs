//! Entity module - wire and domain types for the screen advertising API
//!
//! Materials, groups and plans mirror the JSON shapes the backend exchanges;
//! cabinets are only read, for plan targeting.

use serde::{Deserialize, Serialize};

pub mod cabinet;
pub mod group;
pub mod material;
pub mod plan;

/// Paginated list envelope shared by every list endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// Query parameters for list endpoints
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PageQuery {
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: None,
        }
    }
}

impl PageQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            page_size: None,
        }
    }

    pub fn with_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Body returned by create endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
}
