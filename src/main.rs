use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use homebridge_aws_ec2::config::PlatformConfig;
use homebridge_aws_ec2::ec2_instance_client::Ec2InstanceClient;
use homebridge_aws_ec2::platform::Ec2Platform;
use homebridge_aws_ec2::standalone::StandaloneHost;

#[derive(Parser)]
#[command(name = "homebridge-aws-ec2")]
#[command(about = "Drive EC2 switch accessories without a HomeKit bridge", long_about = None)]
struct Cli {
    /// Platform block or full host config
    #[arg(short, long, env = "EC2_SWITCH_CONFIG", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the power state of every configured instance
    Status,
    /// Start an instance, by instance id or unique display name
    On { target: String },
    /// Stop an instance, by instance id or unique display name
    Off { target: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = PlatformConfig::from_path(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let mut host = StandaloneHost::new();
    let mut platform = Ec2Platform::new(config, Ec2InstanceClient::connect);
    let controllers = platform.discover_devices(&mut host);

    match cli.command {
        Command::Status => {
            for controller in &controllers {
                let device = controller.device();
                match host.power_state(&device.instance_id).await {
                    Ok(true) => println!("{}\t{}\ton", device.display_name, device.instance_id),
                    Ok(false) => println!("{}\t{}\toff", device.display_name, device.instance_id),
                    Err(error) => println!(
                        "{}\t{}\tnot responding ({})",
                        device.display_name, device.instance_id, error
                    ),
                }
            }
        }
        Command::On { target } => power(&mut host, &target, true).await?,
        Command::Off { target } => power(&mut host, &target, false).await?,
    }
    Ok(())
}

async fn power(host: &mut StandaloneHost, target: &str, on: bool) -> anyhow::Result<()> {
    host.set_power_state(target, on).await?;
    println!("{}\t{}", target, if on { "starting" } else { "stopping" });
    Ok(())
}
