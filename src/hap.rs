use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::config::DeviceRecord;
use crate::error::Ec2SwitchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceType {
    AccessoryInformation,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharacteristicType {
    Manufacturer,
    Model,
    SerialNumber,
    Name,
    On,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CharacteristicValue {
    Bool(bool),
    String(String),
}

impl CharacteristicValue {
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            CharacteristicValue::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        CharacteristicValue::Bool(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        CharacteristicValue::String(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapStatus {
    ServiceCommunicationFailure,
    ResourceDoesNotExist,
    InvalidValueInRequest,
}

impl HapStatus {
    pub fn code(self) -> i32 {
        match self {
            HapStatus::ServiceCommunicationFailure => -70402,
            HapStatus::ResourceDoesNotExist => -70409,
            HapStatus::InvalidValueInRequest => -70410,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapStatusError {
    pub status: HapStatus,
}

impl HapStatusError {
    pub fn new(status: HapStatus) -> Self {
        HapStatusError { status }
    }
}

impl Display for HapStatusError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "HAP status {:?} ({})", self.status, self.status.code())
    }
}

impl Error for HapStatusError {}

pub type GetHandler =
    Box<dyn Fn() -> BoxFuture<'static, Result<CharacteristicValue, Ec2SwitchError>> + Send + Sync>;
pub type SetHandler = Box<
    dyn Fn(CharacteristicValue) -> BoxFuture<'static, Result<(), Ec2SwitchError>> + Send + Sync,
>;

/// The slice of a host accessory an accessory controller is allowed to touch.
///
/// Hosts own the accessory object and its persistence; the plugin only adds
/// services, sets characteristic values and installs get/set handlers.
pub trait Accessory {
    fn uuid(&self) -> Uuid;

    fn display_name(&self) -> &str;

    fn context(&self) -> Option<&DeviceRecord>;

    fn set_context(&mut self, device: DeviceRecord);

    fn get_or_add_service(&mut self, service: ServiceType);

    fn set_characteristic(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    );

    fn on_get(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        handler: GetHandler,
    );

    fn on_set(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        handler: SetHandler,
    );
}

pub trait PlatformHost {
    type Accessory: Accessory;

    fn create_accessory(&mut self, display_name: &str, uuid: Uuid) -> Self::Accessory;

    fn register_platform_accessories(
        &mut self,
        plugin_name: &str,
        platform_name: &str,
        accessories: Vec<Self::Accessory>,
    );

    fn update_platform_accessories(&mut self, accessories: Vec<Self::Accessory>);

    fn unregister_platform_accessories(
        &mut self,
        plugin_name: &str,
        platform_name: &str,
        accessories: Vec<Self::Accessory>,
    );
}

#[cfg(test)]
mod tests {
    use crate::hap::{CharacteristicValue, HapStatus, HapStatusError};

    #[test]
    fn test_status_codes() {
        assert_eq!(HapStatus::ServiceCommunicationFailure.code(), -70402);
        assert_eq!(HapStatus::ResourceDoesNotExist.code(), -70409);
        assert_eq!(
            HapStatusError::new(HapStatus::ServiceCommunicationFailure).to_string(),
            "HAP status ServiceCommunicationFailure (-70402)"
        );
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(CharacteristicValue::from(true).as_bool(), Some(true));
        assert_eq!(CharacteristicValue::from("on").as_bool(), None);
    }
}
