use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Ec2SwitchError;
use crate::platform::PLATFORM_NAME;

/// One configured EC2 instance, exposed as one switch accessory.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub instance_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub display_name: String,
    /// Report `pending` instances as switched on as well as `running` ones.
    #[serde(default)]
    pub pending_is_on: bool,
}

impl Debug for DeviceRecord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("instance_id", &self.instance_id)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("pending_is_on", &self.pending_is_on)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub platform: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

impl PlatformConfig {
    /// Reads either a bare platform block or a host config carrying a
    /// `platforms` array.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Ec2SwitchError> {
        let raw = std::fs::read_to_string(path)?;
        raw.parse()
    }

    pub fn validate(&self) -> Result<(), Ec2SwitchError> {
        if self.platform != PLATFORM_NAME {
            return Err(Ec2SwitchError::PlatformNotConfigured(PLATFORM_NAME.to_string()));
        }
        for device in &self.devices {
            if device.instance_id.trim().is_empty() {
                return Err(Ec2SwitchError::InvalidDevice(format!(
                    "device {:?} has no instanceId",
                    device.display_name
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for PlatformConfig {
    type Err = Ec2SwitchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(raw)?;
        let block = match value.get("platforms").and_then(Value::as_array) {
            Some(platforms) => platforms
                .iter()
                .find(|platform| {
                    platform.get("platform").and_then(Value::as_str) == Some(PLATFORM_NAME)
                })
                .cloned()
                .ok_or_else(|| Ec2SwitchError::PlatformNotConfigured(PLATFORM_NAME.to_string()))?,
            None => value,
        };
        let config: PlatformConfig = serde_json::from_value(block)?;
        config.validate()?;
        Ok(config)
    }
}
