use std::error::Error;

use rusoto_core::region::ParseRegionError;
use rusoto_core::request::TlsError;
use rusoto_core::RusotoError;
use rusoto_ec2::{DescribeInstancesError, StartInstancesError, StopInstancesError};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::hap::{HapStatus, HapStatusError};

#[derive(Debug)]
pub enum Ec2SwitchError {
    InvalidRegion(ParseRegionError),
    MissingCredentials(&'static str),
    HttpClientError(TlsError),
    StartInstancesError(RusotoError<StartInstancesError>),
    StopInstancesError(RusotoError<StopInstancesError>),
    DescribeInstancesError(RusotoError<DescribeInstancesError>),
    ReadConfigError(std::io::Error),
    ParseConfigError(serde_json::Error),
    PlatformNotConfigured(String),
    InvalidDevice(String),
    UnknownAccessory(String),
    AmbiguousAccessory(String),
    Hap(HapStatusError),
}

impl Ec2SwitchError {
    pub fn hap_status(&self) -> Option<HapStatus> {
        match *self {
            Ec2SwitchError::Hap(ref error) => Some(error.status),
            _ => None,
        }
    }
}

impl Display for Ec2SwitchError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Ec2SwitchError::InvalidRegion(ref error) => write!(f, "Invalid region: {}", error),
            Ec2SwitchError::MissingCredentials(field) => {
                write!(f, "Credentials are incomplete: {} is empty", field)
            }
            Ec2SwitchError::HttpClientError(ref error) => {
                write!(f, "Failed to create http client: {}", error)
            }
            Ec2SwitchError::StartInstancesError(ref error) => std::fmt::Display::fmt(error, f),
            Ec2SwitchError::StopInstancesError(ref error) => std::fmt::Display::fmt(error, f),
            Ec2SwitchError::DescribeInstancesError(ref error) => std::fmt::Display::fmt(error, f),
            Ec2SwitchError::ReadConfigError(ref error) => {
                write!(f, "Failed to read config: {}", error)
            }
            Ec2SwitchError::ParseConfigError(ref error) => {
                write!(f, "Failed to parse config: {}", error)
            }
            Ec2SwitchError::PlatformNotConfigured(ref platform) => {
                write!(f, "Platform {} is not configured", platform)
            }
            Ec2SwitchError::InvalidDevice(ref reason) => write!(f, "Invalid device: {}", reason),
            Ec2SwitchError::UnknownAccessory(ref target) => {
                write!(f, "No accessory for instance or name {}", target)
            }
            Ec2SwitchError::AmbiguousAccessory(ref name) => write!(
                f,
                "More than one accessory is named {}, use the instance id",
                name
            ),
            Ec2SwitchError::Hap(ref error) => std::fmt::Display::fmt(error, f),
        }
    }
}

impl Error for Ec2SwitchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Ec2SwitchError::InvalidRegion(ref error) => Some(error),
            Ec2SwitchError::HttpClientError(ref error) => Some(error),
            Ec2SwitchError::StartInstancesError(ref error) => Some(error),
            Ec2SwitchError::StopInstancesError(ref error) => Some(error),
            Ec2SwitchError::DescribeInstancesError(ref error) => Some(error),
            Ec2SwitchError::ReadConfigError(ref error) => Some(error),
            Ec2SwitchError::ParseConfigError(ref error) => Some(error),
            Ec2SwitchError::Hap(ref error) => Some(error),
            _ => None,
        }
    }
}

impl From<ParseRegionError> for Ec2SwitchError {
    fn from(e: ParseRegionError) -> Ec2SwitchError {
        Ec2SwitchError::InvalidRegion(e)
    }
}

impl From<TlsError> for Ec2SwitchError {
    fn from(e: TlsError) -> Ec2SwitchError {
        Ec2SwitchError::HttpClientError(e)
    }
}

impl From<RusotoError<StartInstancesError>> for Ec2SwitchError {
    fn from(e: RusotoError<StartInstancesError>) -> Ec2SwitchError {
        Ec2SwitchError::StartInstancesError(e)
    }
}

impl From<RusotoError<StopInstancesError>> for Ec2SwitchError {
    fn from(e: RusotoError<StopInstancesError>) -> Ec2SwitchError {
        Ec2SwitchError::StopInstancesError(e)
    }
}

impl From<RusotoError<DescribeInstancesError>> for Ec2SwitchError {
    fn from(e: RusotoError<DescribeInstancesError>) -> Ec2SwitchError {
        Ec2SwitchError::DescribeInstancesError(e)
    }
}

impl From<std::io::Error> for Ec2SwitchError {
    fn from(e: std::io::Error) -> Ec2SwitchError {
        Ec2SwitchError::ReadConfigError(e)
    }
}

impl From<serde_json::Error> for Ec2SwitchError {
    fn from(e: serde_json::Error) -> Ec2SwitchError {
        Ec2SwitchError::ParseConfigError(e)
    }
}

impl From<HapStatusError> for Ec2SwitchError {
    fn from(e: HapStatusError) -> Ec2SwitchError {
        Ec2SwitchError::Hap(e)
    }
}
