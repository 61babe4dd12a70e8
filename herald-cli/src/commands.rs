use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use herald_config::{DestinationKind, HeraldConfig};
use herald_core::events::StatusEvent;
use herald_engine::EventSystem;
use herald_protocol::{PropertyCodec, PropertySet, Value};

use crate::error::CliError;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/herald.yaml plus HERALD_* variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Marshall properties given as NAME=TYPE:VALUE into a wire payload
    Encode(EncodeArgs),
    /// Unmarshall a wire payload and print its properties
    Decode(DecodeArgs),
    /// Publish status events to a topic and print what a subscriber receives
    Loopback(LoopbackArgs),
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct EncodeArgs {
    /// Repeating a name builds an array property
    #[arg(required = true)]
    pub properties: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Payload to decode; read from stdin when omitted
    pub payload: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoopbackArgs {
    #[arg(long, default_value = "herald.loopback")]
    pub topic: String,
    #[arg(long, default_value_t = 3)]
    pub count: usize,
    #[arg(long, default_value = "loopback")]
    pub run_id: String,
    /// Equality selector for the subscriber, e.g. "STATUS = 'done'"
    #[arg(long, default_value = "")]
    pub selector: String,
    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

pub fn run_command(command: Commands, config: &HeraldConfig) -> anyhow::Result<()> {
    match command {
        Commands::Encode(args) => encode(args),
        Commands::Decode(args) => decode(args),
        Commands::Loopback(args) => loopback(args, config),
        Commands::Config => {
            print!("{}", serde_yaml::to_string(config)?);
            Ok(())
        }
    }
}

fn encode(args: EncodeArgs) -> anyhow::Result<()> {
    let properties = parse_properties(&args.properties)?;
    let encoded = PropertyCodec::new().encode(&properties);
    println!("{}", encoded.payload);
    Ok(())
}

fn decode(args: DecodeArgs) -> anyhow::Result<()> {
    let payload = match args.payload {
        Some(payload) => payload,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading payload from stdin")?;
            buffer.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    let properties = PropertyCodec::new().decode(&payload)?;
    print!("{properties}");
    Ok(())
}

fn loopback(args: LoopbackArgs, config: &HeraldConfig) -> anyhow::Result<()> {
    let system = EventSystem::from_config(config)?;
    system.create_receiver(&args.topic, DestinationKind::Topic, &args.selector, 0)?;
    system.create_transmitter(&args.topic, DestinationKind::Topic, false)?;

    let origin = system.create_location_id();
    for stage in 0..args.count {
        let mut properties = PropertySet::new();
        properties.set("STAGEID", i32::try_from(stage).unwrap_or(i32::MAX));
        let mut event = StatusEvent::new(&args.run_id, &origin, &properties)?;
        event
            .event_mut()
            .set_status(if stage + 1 == args.count { "done" } else { "running" });
        system.publish(&args.topic, &mut event)?;
    }
    info!(count = args.count, topic = %args.topic, origin = %origin, "Published status events");

    let mut received = 0;
    while let Some(event) = system.receive(&args.topic)? {
        received += 1;
        println!("{event}");
    }
    info!(received, "Loopback finished");

    if args.metrics {
        if let Some(metrics) = system.metrics() {
            print!("{}", metrics.gather_metrics()?);
        }
    }
    Ok(())
}

fn parse_properties(specs: &[String]) -> Result<PropertySet, CliError> {
    let mut properties = PropertySet::new();
    for spec in specs {
        let (name, value) = parse_property(spec)?;
        properties.add(name, value)?;
    }
    Ok(properties)
}

fn parse_property(spec: &str) -> Result<(String, Value), CliError> {
    let (name, typed) = spec
        .split_once('=')
        .ok_or_else(|| CliError::PropertySyntax(spec.to_string()))?;
    let (kind, raw) = typed
        .split_once(':')
        .ok_or_else(|| CliError::PropertySyntax(spec.to_string()))?;
    if name.is_empty() {
        return Err(CliError::PropertySyntax(spec.to_string()));
    }

    let bad_value = || CliError::BadValue {
        name: name.to_string(),
        kind: kind.to_string(),
        value: raw.to_string(),
    };
    let value = match kind {
        "bool" => Value::Bool(raw.parse().map_err(|_| bad_value())?),
        "short" => Value::Short(raw.parse().map_err(|_| bad_value())?),
        "int" => Value::Int(raw.parse().map_err(|_| bad_value())?),
        "long" => Value::Long(raw.parse().map_err(|_| bad_value())?),
        "float" => Value::Float(raw.parse().map_err(|_| bad_value())?),
        "double" => Value::Double(raw.parse().map_err(|_| bad_value())?),
        "string" => Value::String(raw.to_string()),
        "datetime" => Value::DateTime(raw.parse().map_err(|_| bad_value())?),
        _ => {
            return Err(CliError::UnknownType {
                name: name.to_string(),
                kind: kind.to_string(),
            })
        }
    };
    Ok((name.to_string(), value))
}
