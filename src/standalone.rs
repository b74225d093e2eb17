use std::collections::BTreeMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DeviceRecord;
use crate::error::Ec2SwitchError;
use crate::hap::{
    Accessory, CharacteristicType, CharacteristicValue, GetHandler, HapStatus, HapStatusError,
    PlatformHost, ServiceType, SetHandler,
};
use crate::platform::accessory_uuid;

#[derive(Default)]
struct Service {
    values: BTreeMap<CharacteristicType, CharacteristicValue>,
    get_handlers: BTreeMap<CharacteristicType, GetHandler>,
    set_handlers: BTreeMap<CharacteristicType, SetHandler>,
}

/// In-memory accessory that runs get/set requests straight through its
/// installed handlers.
pub struct StandaloneAccessory {
    uuid: Uuid,
    display_name: String,
    context: Option<DeviceRecord>,
    services: BTreeMap<ServiceType, Service>,
}

impl StandaloneAccessory {
    pub fn new(display_name: &str, uuid: Uuid) -> Self {
        StandaloneAccessory {
            uuid,
            display_name: display_name.to_string(),
            context: None,
            services: BTreeMap::new(),
        }
    }

    pub fn has_service(&self, service: ServiceType) -> bool {
        self.services.contains_key(&service)
    }

    /// Last value set on or read from a characteristic.
    pub fn characteristic(
        &self,
        service: ServiceType,
        characteristic: CharacteristicType,
    ) -> Option<&CharacteristicValue> {
        self.services.get(&service)?.values.get(&characteristic)
    }

    pub async fn get(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
    ) -> Result<CharacteristicValue, HapStatusError> {
        let entry = self
            .services
            .get_mut(&service)
            .ok_or_else(|| HapStatusError::new(HapStatus::ResourceDoesNotExist))?;
        let request = match entry.get_handlers.get(&characteristic) {
            Some(handler) => handler(),
            None => {
                return entry
                    .values
                    .get(&characteristic)
                    .cloned()
                    .ok_or_else(|| HapStatusError::new(HapStatus::ResourceDoesNotExist))
            }
        };

        let value = request.await.map_err(|error| self.handler_failed(error))?;
        if let Some(entry) = self.services.get_mut(&service) {
            entry.values.insert(characteristic, value.clone());
        }
        Ok(value)
    }

    pub async fn set(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Result<(), HapStatusError> {
        let entry = self
            .services
            .get_mut(&service)
            .ok_or_else(|| HapStatusError::new(HapStatus::ResourceDoesNotExist))?;
        if let Some(handler) = entry.set_handlers.get(&characteristic) {
            let request = handler(value.clone());
            request.await.map_err(|error| self.handler_failed(error))?;
        }
        if let Some(entry) = self.services.get_mut(&service) {
            entry.values.insert(characteristic, value);
        }
        Ok(())
    }

    fn handler_failed(&self, error: Ec2SwitchError) -> HapStatusError {
        match error.hap_status() {
            Some(status) => HapStatusError::new(status),
            None => {
                warn!(display_name = %self.display_name, %error, "characteristic handler failed");
                HapStatusError::new(HapStatus::ServiceCommunicationFailure)
            }
        }
    }
}

impl Accessory for StandaloneAccessory {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn context(&self) -> Option<&DeviceRecord> {
        self.context.as_ref()
    }

    fn set_context(&mut self, device: DeviceRecord) {
        self.context = Some(device);
    }

    fn get_or_add_service(&mut self, service: ServiceType) {
        self.services.entry(service).or_default();
    }

    fn set_characteristic(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) {
        self.services
            .entry(service)
            .or_default()
            .values
            .insert(characteristic, value);
    }

    fn on_get(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        handler: GetHandler,
    ) {
        self.services
            .entry(service)
            .or_default()
            .get_handlers
            .insert(characteristic, handler);
    }

    fn on_set(
        &mut self,
        service: ServiceType,
        characteristic: CharacteristicType,
        handler: SetHandler,
    ) {
        self.services
            .entry(service)
            .or_default()
            .set_handlers
            .insert(characteristic, handler);
    }
}

/// Host that keeps registered accessories in memory for the life of the
/// process.
#[derive(Default)]
pub struct StandaloneHost {
    accessories: Vec<StandaloneAccessory>,
    removed: Vec<Uuid>,
}

impl StandaloneHost {
    pub fn new() -> Self {
        StandaloneHost::default()
    }

    pub fn accessories(&self) -> &[StandaloneAccessory] {
        &self.accessories
    }

    pub fn accessory_by_uuid_mut(&mut self, uuid: Uuid) -> Option<&mut StandaloneAccessory> {
        self.accessories
            .iter_mut()
            .find(|accessory| accessory.uuid == uuid)
    }

    /// Resolves an instance id first, then a display name no other accessory
    /// carries.
    pub fn find_accessory_mut(
        &mut self,
        target: &str,
    ) -> Result<&mut StandaloneAccessory, Ec2SwitchError> {
        let uuid = accessory_uuid(target);
        let index = match self
            .accessories
            .iter()
            .position(|accessory| accessory.uuid == uuid)
        {
            Some(index) => index,
            None => {
                let mut named = self
                    .accessories
                    .iter()
                    .enumerate()
                    .filter(|(_, accessory)| accessory.display_name == target)
                    .map(|(index, _)| index);
                match (named.next(), named.next()) {
                    (Some(index), None) => index,
                    (Some(_), Some(_)) => {
                        return Err(Ec2SwitchError::AmbiguousAccessory(target.to_string()))
                    }
                    (None, _) => return Err(Ec2SwitchError::UnknownAccessory(target.to_string())),
                }
            }
        };
        Ok(&mut self.accessories[index])
    }

    pub async fn power_state(&mut self, instance_id: &str) -> Result<bool, Ec2SwitchError> {
        let accessory = self
            .accessory_by_uuid_mut(accessory_uuid(instance_id))
            .ok_or_else(|| Ec2SwitchError::UnknownAccessory(instance_id.to_string()))?;
        let value = accessory
            .get(ServiceType::Switch, CharacteristicType::On)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn set_power_state(&mut self, target: &str, on: bool) -> Result<(), Ec2SwitchError> {
        let accessory = self.find_accessory_mut(target)?;
        accessory
            .set(
                ServiceType::Switch,
                CharacteristicType::On,
                CharacteristicValue::Bool(on),
            )
            .await?;
        Ok(())
    }

    pub fn removed(&self) -> &[Uuid] {
        &self.removed
    }

    fn upsert(&mut self, accessory: StandaloneAccessory) {
        match self
            .accessories
            .iter()
            .position(|existing| existing.uuid == accessory.uuid)
        {
            Some(index) => self.accessories[index] = accessory,
            None => self.accessories.push(accessory),
        }
    }
}

impl PlatformHost for StandaloneHost {
    type Accessory = StandaloneAccessory;

    fn create_accessory(&mut self, display_name: &str, uuid: Uuid) -> StandaloneAccessory {
        StandaloneAccessory::new(display_name, uuid)
    }

    fn register_platform_accessories(
        &mut self,
        plugin_name: &str,
        platform_name: &str,
        accessories: Vec<StandaloneAccessory>,
    ) {
        for accessory in accessories {
            info!(
                plugin_name,
                platform_name,
                display_name = %accessory.display_name,
                "registered accessory"
            );
            self.upsert(accessory);
        }
    }

    fn update_platform_accessories(&mut self, accessories: Vec<StandaloneAccessory>) {
        for accessory in accessories {
            self.upsert(accessory);
        }
    }

    fn unregister_platform_accessories(
        &mut self,
        plugin_name: &str,
        platform_name: &str,
        accessories: Vec<StandaloneAccessory>,
    ) {
        for accessory in accessories {
            info!(
                plugin_name,
                platform_name,
                display_name = %accessory.display_name,
                "unregistered accessory"
            );
            self.accessories.retain(|existing| existing.uuid != accessory.uuid);
            self.removed.push(accessory.uuid);
        }
    }
}
