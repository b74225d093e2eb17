use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use rusoto_core::credential::StaticProvider;
use rusoto_core::request::HttpClient;
use rusoto_core::Region;
use rusoto_ec2::{
    DescribeInstancesRequest, Ec2, Ec2Client, InstanceStateChange, StartInstancesRequest,
    StopInstancesRequest,
};

use crate::config::DeviceRecord;
use crate::error::Ec2SwitchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown(String),
}

impl From<&str> for InstanceState {
    fn from(name: &str) -> Self {
        match name {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            other => InstanceState::Unknown(other.to_string()),
        }
    }
}

impl Display for InstanceState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match *self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Unknown(ref other) => other.as_str(),
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait InstanceControl: Send + Sync {
    async fn start_instance(&self, instance_id: &str)
        -> Result<Option<InstanceState>, Ec2SwitchError>;

    async fn stop_instance(&self, instance_id: &str)
        -> Result<Option<InstanceState>, Ec2SwitchError>;

    /// `None` when the response carries no reservation, instance or state.
    async fn describe_instance_state(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceState>, Ec2SwitchError>;
}

/// Builds a fresh client for a device. Invoked once per characteristic call.
pub trait ClientFactory: Send + Sync {
    type Client: InstanceControl;

    fn connect(&self, device: &DeviceRecord) -> Result<Self::Client, Ec2SwitchError>;
}

impl<F, C> ClientFactory for F
where
    F: Fn(&DeviceRecord) -> Result<C, Ec2SwitchError> + Send + Sync,
    C: InstanceControl,
{
    type Client = C;

    fn connect(&self, device: &DeviceRecord) -> Result<C, Ec2SwitchError> {
        self(device)
    }
}

pub struct Ec2InstanceClient {
    client: Ec2Client,
}

#[async_trait]
impl InstanceControl for Ec2InstanceClient {
    async fn start_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceState>, Ec2SwitchError> {
        let request = StartInstancesRequest {
            instance_ids: vec![instance_id.to_string()],
            ..StartInstancesRequest::default()
        };

        let result = self.client.start_instances(request).await?;
        Ok(Self::current_state(result.starting_instances, instance_id))
    }

    async fn stop_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceState>, Ec2SwitchError> {
        let request = StopInstancesRequest {
            instance_ids: vec![instance_id.to_string()],
            ..StopInstancesRequest::default()
        };

        let result = self.client.stop_instances(request).await?;
        Ok(Self::current_state(result.stopping_instances, instance_id))
    }

    async fn describe_instance_state(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceState>, Ec2SwitchError> {
        let request = DescribeInstancesRequest {
            instance_ids: Some(vec![instance_id.to_string()]),
            ..DescribeInstancesRequest::default()
        };

        let result = self.client.describe_instances(request).await?;

        let state = result
            .reservations
            .as_deref()
            .and_then(|reservations| reservations.first())
            .and_then(|reservation| reservation.instances.as_deref())
            .and_then(|instances| instances.first())
            .and_then(|instance| instance.state.as_ref())
            .and_then(|state| state.name.as_deref())
            .map(InstanceState::from);
        Ok(state)
    }
}

impl Ec2InstanceClient {
    pub fn new_with_client(client: Ec2Client) -> Self {
        Ec2InstanceClient { client }
    }

    pub fn connect(device: &DeviceRecord) -> Result<Self, Ec2SwitchError> {
        let region = Region::from_str(&device.region)?;
        if device.access_key_id.is_empty() {
            return Err(Ec2SwitchError::MissingCredentials("accessKeyId"));
        }
        if device.secret_access_key.is_empty() {
            return Err(Ec2SwitchError::MissingCredentials("secretAccessKey"));
        }
        let credentials = StaticProvider::new_minimal(
            device.access_key_id.clone(),
            device.secret_access_key.clone(),
        );
        let client = Ec2Client::new_with(HttpClient::new()?, credentials, region);
        Ok(Self::new_with_client(client))
    }

    fn current_state(
        changes: Option<Vec<InstanceStateChange>>,
        instance_id: &str,
    ) -> Option<InstanceState> {
        changes?
            .into_iter()
            .find(|change| change.instance_id.as_deref() == Some(instance_id))
            .and_then(|change| change.current_state)
            .and_then(|state| state.name)
            .map(|name| InstanceState::from(name.as_str()))
    }
}
