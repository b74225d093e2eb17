use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::accessory::Ec2SwitchAccessory;
use crate::config::PlatformConfig;
use crate::ec2_instance_client::ClientFactory;
use crate::hap::{Accessory, PlatformHost};

pub const PLUGIN_NAME: &str = "homebridge-aws-ec2";
pub const PLATFORM_NAME: &str = "AWSEC2Platform";

/// Stable accessory id for an instance, so a restart finds the same cached
/// accessory again.
pub fn accessory_uuid(instance_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, instance_id.as_bytes())
}

pub struct Ec2Platform<F, A> {
    config: PlatformConfig,
    factory: F,
    cached_accessories: Vec<A>,
}

impl<F, A> Ec2Platform<F, A>
where
    F: ClientFactory + Clone + 'static,
    A: Accessory,
{
    pub fn new(config: PlatformConfig, factory: F) -> Self {
        info!(
            name = config.name.as_deref().unwrap_or(PLATFORM_NAME),
            devices = config.devices.len(),
            "Finished initializing platform"
        );
        Ec2Platform {
            config,
            factory,
            cached_accessories: Vec::new(),
        }
    }

    /// Hands back an accessory the host restored from its cache at startup.
    pub fn configure_accessory(&mut self, accessory: A) {
        info!(display_name = accessory.display_name(), "Loading accessory from cache");
        self.cached_accessories.push(accessory);
    }

    /// Binds one controller per configured device.
    ///
    /// Cached accessories are reused when their UUID matches a device, new
    /// ones are registered, and cached ones left over are unregistered.
    pub fn discover_devices<H>(&mut self, host: &mut H) -> Vec<Arc<Ec2SwitchAccessory<F>>>
    where
        H: PlatformHost<Accessory = A>,
    {
        let mut cached = std::mem::take(&mut self.cached_accessories);
        let mut seen = HashSet::new();
        let mut restored = Vec::new();
        let mut created = Vec::new();
        let mut controllers = Vec::new();

        for device in &self.config.devices {
            let uuid = accessory_uuid(&device.instance_id);
            if !seen.insert(uuid) {
                warn!(instance_id = %device.instance_id, "Skipping duplicate device");
                continue;
            }

            let controller = Arc::new(Ec2SwitchAccessory::new(
                device.clone(),
                self.factory.clone(),
            ));

            match cached.iter().position(|accessory| accessory.uuid() == uuid) {
                Some(index) => {
                    let mut accessory = cached.swap_remove(index);
                    info!(
                        display_name = accessory.display_name(),
                        "Restoring existing accessory from cache"
                    );
                    accessory.set_context(device.clone());
                    controller.bind(&mut accessory);
                    restored.push(accessory);
                }
                None => {
                    info!(display_name = %device.display_name, "Adding new accessory");
                    let mut accessory = host.create_accessory(&device.display_name, uuid);
                    accessory.set_context(device.clone());
                    controller.bind(&mut accessory);
                    created.push(accessory);
                }
            }
            controllers.push(controller);
        }

        if !restored.is_empty() {
            host.update_platform_accessories(restored);
        }
        if !created.is_empty() {
            host.register_platform_accessories(PLUGIN_NAME, PLATFORM_NAME, created);
        }
        if !cached.is_empty() {
            for accessory in &cached {
                info!(
                    display_name = accessory.display_name(),
                    "Removing existing accessory from cache"
                );
            }
            host.unregister_platform_accessories(PLUGIN_NAME, PLATFORM_NAME, cached);
        }
        controllers
    }
}

#[cfg(test)]
mod tests {
    use crate::accessory::tests::{device, Call, FakeEc2};
    use crate::config::PlatformConfig;
    use crate::error::Ec2SwitchError;
    use crate::hap::{Accessory, CharacteristicType, CharacteristicValue, HapStatus, ServiceType};
    use crate::platform::{accessory_uuid, Ec2Platform, PLATFORM_NAME};
    use crate::standalone::{StandaloneAccessory, StandaloneHost};

    fn config(instance_ids: &[&str]) -> PlatformConfig {
        PlatformConfig {
            platform: PLATFORM_NAME.to_string(),
            name: None,
            devices: instance_ids.iter().map(|id| device(id)).collect(),
        }
    }

    #[test]
    fn test_accessory_uuid_is_stable() {
        assert_eq!(accessory_uuid("i-123"), accessory_uuid("i-123"));
        assert_ne!(accessory_uuid("i-123"), accessory_uuid("i-456"));
    }

    #[tokio::test]
    async fn test_discover_registers_one_accessory_per_device() {
        let fake = FakeEc2::default();
        fake.set_state("i-aaa", "running");
        fake.set_state("i-bbb", "stopped");
        let mut platform = Ec2Platform::new(config(&["i-aaa", "i-bbb"]), fake.factory());
        let mut host = StandaloneHost::new();

        let controllers = platform.discover_devices(&mut host);

        assert_eq!(controllers.len(), 2);
        assert_eq!(host.accessories().len(), 2);
        let accessory = host.find_accessory_mut("Server i-aaa").unwrap();
        assert_eq!(accessory.uuid(), accessory_uuid("i-aaa"));
        assert_eq!(
            accessory.context().map(|device| device.instance_id.as_str()),
            Some("i-aaa")
        );
        assert_eq!(
            accessory.get(ServiceType::Switch, CharacteristicType::On).await,
            Ok(CharacteristicValue::Bool(true))
        );
        let accessory = host.find_accessory_mut("Server i-bbb").unwrap();
        assert_eq!(
            accessory.get(ServiceType::Switch, CharacteristicType::On).await,
            Ok(CharacteristicValue::Bool(false))
        );
        assert_eq!(
            fake.calls(),
            vec![
                Call::Describe("i-aaa".to_string()),
                Call::Describe("i-bbb".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_restores_cached_and_removes_stale() {
        let fake = FakeEc2::default();
        let mut platform = Ec2Platform::new(config(&["i-aaa"]), fake.factory());
        let mut host = StandaloneHost::new();
        platform.configure_accessory(StandaloneAccessory::new(
            "Old name",
            accessory_uuid("i-aaa"),
        ));
        platform.configure_accessory(StandaloneAccessory::new(
            "Gone",
            accessory_uuid("i-gone"),
        ));

        let controllers = platform.discover_devices(&mut host);

        assert_eq!(controllers.len(), 1);
        assert_eq!(host.removed(), &[accessory_uuid("i-gone")]);
        let accessory = host.find_accessory_mut("Old name").unwrap();
        assert!(accessory.has_service(ServiceType::Switch));
        assert_eq!(
            accessory.characteristic(ServiceType::Switch, CharacteristicType::Name),
            Some(&CharacteristicValue::from("Server i-aaa"))
        );
        accessory
            .set(
                ServiceType::Switch,
                CharacteristicType::On,
                CharacteristicValue::Bool(true),
            )
            .await
            .unwrap();
        assert_eq!(fake.calls(), vec![Call::Start("i-aaa".to_string())]);
    }

    #[test]
    fn test_discover_skips_duplicate_instances() {
        let fake = FakeEc2::default();
        let mut platform = Ec2Platform::new(config(&["i-aaa", "i-aaa"]), fake.factory());
        let mut host = StandaloneHost::new();

        let controllers = platform.discover_devices(&mut host);

        assert_eq!(controllers.len(), 1);
        assert_eq!(host.accessories().len(), 1);
    }

    fn shared_name_config() -> PlatformConfig {
        let mut first = device("i-aaa");
        first.display_name = "Lab".to_string();
        let mut second = device("i-bbb");
        second.display_name = "Lab".to_string();
        PlatformConfig {
            platform: PLATFORM_NAME.to_string(),
            name: None,
            devices: vec![first, second],
        }
    }

    #[tokio::test]
    async fn test_power_state_by_instance_with_shared_names() {
        let fake = FakeEc2::default();
        fake.set_state("i-aaa", "running");
        fake.set_state("i-bbb", "stopped");
        let mut platform = Ec2Platform::new(shared_name_config(), fake.factory());
        let mut host = StandaloneHost::new();
        let controllers = platform.discover_devices(&mut host);

        let mut states = Vec::new();
        for controller in &controllers {
            let instance_id = controller.device().instance_id.clone();
            let state = host.power_state(&instance_id).await.unwrap();
            states.push((instance_id, state));
        }

        assert_eq!(
            states,
            vec![("i-aaa".to_string(), true), ("i-bbb".to_string(), false)]
        );
        assert_eq!(
            fake.calls(),
            vec![
                Call::Describe("i-aaa".to_string()),
                Call::Describe("i-bbb".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_set_power_state_with_shared_names() {
        let fake = FakeEc2::default();
        let mut platform = Ec2Platform::new(shared_name_config(), fake.factory());
        let mut host = StandaloneHost::new();
        platform.discover_devices(&mut host);

        let ambiguous = host.set_power_state("Lab", true).await;
        let unknown = host.set_power_state("i-zzz", true).await;
        host.set_power_state("i-bbb", true).await.unwrap();

        assert!(matches!(ambiguous, Err(Ec2SwitchError::AmbiguousAccessory(_))));
        assert!(matches!(unknown, Err(Ec2SwitchError::UnknownAccessory(_))));
        assert_eq!(fake.calls(), vec![Call::Start("i-bbb".to_string())]);
    }

    #[tokio::test]
    async fn test_set_power_state_by_unique_name() {
        let fake = FakeEc2::default();
        let mut platform = Ec2Platform::new(config(&["i-aaa", "i-bbb"]), fake.factory());
        let mut host = StandaloneHost::new();
        platform.discover_devices(&mut host);

        host.set_power_state("Server i-aaa", false).await.unwrap();

        assert_eq!(fake.calls(), vec![Call::Stop("i-aaa".to_string())]);
    }

    #[tokio::test]
    async fn test_power_state_surfaces_communication_failure() {
        let fake = FakeEc2::failing();
        let mut platform = Ec2Platform::new(config(&["i-aaa"]), fake.factory());
        let mut host = StandaloneHost::new();
        platform.discover_devices(&mut host);

        let result = host.power_state("i-aaa").await;

        assert_eq!(
            result.err().and_then(|error| error.hap_status()),
            Some(HapStatus::ServiceCommunicationFailure)
        );
    }
}
