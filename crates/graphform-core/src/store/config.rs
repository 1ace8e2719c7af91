// ── Store configuration ──

use serde::{Deserialize, Serialize};

/// Values a fresh document is seeded with. Only `_options` reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name prefix prepended to every deployed resource.
    pub prefix: String,
    pub region: String,
    /// Availability zones per region, 1 to 3.
    pub zones: i64,
    pub tags: Vec<String>,
    /// Service endpoint type: `private`, `public` or `public-and-private`.
    pub endpoints: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            region: "us-south".into(),
            zones: 3,
            tags: Vec::new(),
            endpoints: "private".into(),
        }
    }
}
