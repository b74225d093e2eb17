use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error};

use crate::config::DeviceRecord;
use crate::ec2_instance_client::{ClientFactory, InstanceControl, InstanceState};
use crate::error::Ec2SwitchError;
use crate::hap::{
    Accessory, CharacteristicType, CharacteristicValue, HapStatus, HapStatusError, ServiceType,
};

const MANUFACTURER: &str = "Default-Manufacturer";
const MODEL: &str = "Default-Model";
const SERIAL_NUMBER: &str = "Default-Serial";

/// One EC2 instance presented as a switch.
///
/// The device record never changes after construction and no instance state
/// is kept between calls: every read goes back to EC2, and every call builds
/// its own client through the factory.
pub struct Ec2SwitchAccessory<F> {
    device: DeviceRecord,
    factory: F,
}

impl<F> Ec2SwitchAccessory<F>
where
    F: ClientFactory + 'static,
{
    pub fn new(device: DeviceRecord, factory: F) -> Self {
        Ec2SwitchAccessory { device, factory }
    }

    pub fn device(&self) -> &DeviceRecord {
        &self.device
    }

    /// Installs accessory information, the switch service and its `On`
    /// handlers on a host accessory.
    pub fn bind<A: Accessory>(self: &Arc<Self>, accessory: &mut A) {
        let information = ServiceType::AccessoryInformation;
        accessory.get_or_add_service(information);
        accessory.set_characteristic(
            information,
            CharacteristicType::Manufacturer,
            MANUFACTURER.into(),
        );
        accessory.set_characteristic(information, CharacteristicType::Model, MODEL.into());
        accessory.set_characteristic(
            information,
            CharacteristicType::SerialNumber,
            SERIAL_NUMBER.into(),
        );

        accessory.get_or_add_service(ServiceType::Switch);
        accessory.set_characteristic(
            ServiceType::Switch,
            CharacteristicType::Name,
            self.device.display_name.as_str().into(),
        );

        let reader = Arc::clone(self);
        accessory.on_get(
            ServiceType::Switch,
            CharacteristicType::On,
            Box::new(move || {
                let reader = Arc::clone(&reader);
                async move {
                    reader
                        .read_power_state()
                        .await
                        .map(CharacteristicValue::Bool)
                }
                .boxed()
            }),
        );

        let writer = Arc::clone(self);
        accessory.on_set(
            ServiceType::Switch,
            CharacteristicType::On,
            Box::new(move |value: CharacteristicValue| {
                let writer = Arc::clone(&writer);
                async move {
                    match value.as_bool() {
                        Some(desired) => writer.write_power_state(desired).await,
                        None => Err(HapStatusError::new(HapStatus::InvalidValueInRequest).into()),
                    }
                }
                .boxed()
            }),
        );
    }

    /// Asks EC2 whether the instance is on.
    ///
    /// A failed describe call surfaces as `SERVICE_COMMUNICATION_FAILURE` so
    /// the host shows the accessory as not responding. A response without a
    /// state reads as off.
    pub async fn read_power_state(&self) -> Result<bool, Ec2SwitchError> {
        let client = self.factory.connect(&self.device)?;

        let state = match client.describe_instance_state(&self.device.instance_id).await {
            Ok(state) => state,
            Err(error) => {
                error!(instance_id = %self.device.instance_id, %error, "AWS Response ->");
                return Err(HapStatusError::new(HapStatus::ServiceCommunicationFailure).into());
            }
        };

        let is_on = state.is_some_and(|state| self.is_powered_on(&state));
        debug!(instance_id = %self.device.instance_id, is_on, "Get Characteristic On ->");
        Ok(is_on)
    }

    /// Starts or stops the instance.
    ///
    /// Failures of the start/stop call are logged and swallowed; the host is
    /// always told the write succeeded.
    pub async fn write_power_state(&self, desired: bool) -> Result<(), Ec2SwitchError> {
        let client = self.factory.connect(&self.device)?;
        let instance_id = self.device.instance_id.as_str();

        if desired {
            match client.start_instance(instance_id).await {
                Ok(state) => debug!(instance_id, ?state, "StartInstances response"),
                Err(error) => error!(instance_id, %error, "StartInstances error"),
            }
        } else {
            match client.stop_instance(instance_id).await {
                Ok(state) => debug!(instance_id, ?state, "StopInstances response"),
                Err(error) => error!(instance_id, %error, "StopInstances error"),
            }
        }
        Ok(())
    }

    // Only `running` counts as on unless the device opts into `pending`.
    fn is_powered_on(&self, state: &InstanceState) -> bool {
        match *state {
            InstanceState::Running => true,
            InstanceState::Pending => self.device.pending_is_on,
            _ => false,
        }
    }
}
