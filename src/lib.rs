//! HomeKit switch accessories backed by EC2 instances.
//!
//! Each configured device becomes one switch: reading `On` describes the
//! instance, writing it starts or stops the instance.

pub mod accessory;
pub mod config;
pub mod ec2_instance_client;
pub mod error;
pub mod hap;
pub mod platform;
pub mod standalone;
