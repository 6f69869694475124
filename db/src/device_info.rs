//! Structured device fingerprint stored with each attendance record.
//!
//! The fingerprint is persisted as JSON in `attendance_records.device_info` and is
//! always read back through [`DeviceInfo::decode`], never as an untyped map.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A WGS84 coordinate reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub platform: String,
    pub browser: String,
    pub version: String,
    pub os: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl DeviceInfo {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Same physical device: user agent, platform, browser and OS all match.
    ///
    /// `version` is deliberately left out so browser auto-updates do not split a device.
    pub fn same_device(&self, other: &DeviceInfo) -> bool {
        self.user_agent == other.user_agent
            && self.platform == other.platform
            && self.browser == other.browser
            && self.os == other.os
    }

    /// Same device seen from the same network address.
    pub fn same_device_and_network(&self, other: &DeviceInfo) -> bool {
        self.same_device(other) && self.ip == other.ip
    }

    /// Hex SHA-256 over the fields compared by [`DeviceInfo::same_device`].
    pub fn device_key(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.user_agent, &self.platform, &self.browser, &self.os] {
            hasher.update(part.as_bytes());
            // unit separator, so ("ab", "c") and ("a", "bc") hash differently
            hasher.update([0x1f]);
        }
        hex::encode(hasher.finalize())
    }
}
