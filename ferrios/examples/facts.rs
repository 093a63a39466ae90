//! Facts example: connect to an IOS device and print what it reports.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example facts -- --host 192.0.2.10 --user admin --password secret
//!
//! # Enable secret, and a JSON settings file
//! cargo run --example facts -- --host rtr1 --user admin --key ~/.ssh/id_ed25519 \
//!     --enable secret --settings settings.json
//!
//! # Facts as JSON
//! cargo run --example facts -- --host rtr1 --user admin --password secret --json
//! ```

use std::env;
use std::path::PathBuf;

use ferrios::{DeviceBuilder, DeviceSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => serde_json::from_str::<DeviceSettings>(&std::fs::read_to_string(path)?)?,
        None => DeviceSettings::default(),
    };

    let mut builder = DeviceBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .platform("cisco_ios")
        .settings(settings);

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }
    if let Some(secret) = &args.enable {
        builder = builder.enable_secret(secret);
    }

    let mut device = builder.build()?;
    println!("Connecting to {}:{}...", args.host, args.port);
    device.open().await?;

    let facts = device.facts().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&*facts)?);
        device.close().await?;
        return Ok(());
    }

    println!("{}", "-".repeat(50));
    println!("Hostname:   {}", facts.hostname);
    println!("Model:      {}", facts.model);
    println!("Serial:     {}", facts.serial_number);
    println!("OS version: {}", facts.os_version);
    println!("Uptime:     {} ({}s)", facts.uptime_string, facts.uptime);
    println!("Interfaces: {}", facts.interfaces.join(", "));
    println!("VLANs:      {:?}", facts.vlans);
    for (key, value) in &facts.extensions {
        println!("{:<11} {}", format!("{}:", key), value);
    }

    let boot = device.boot_options().await?;
    println!("Next boot:  {}", boot.sys.as_deref().unwrap_or("(not set)"));

    match device.redundancy_state().await? {
        Some(state) => println!("HA state:   {}", state),
        None => println!("HA state:   not supported"),
    }
    println!("{}", "-".repeat(50));

    device.close().await?;
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    enable: Option<String>,
    settings: Option<PathBuf>,
    json: bool,
}

impl Args {
    fn parse() -> Self {
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: None,
            key: None,
            enable: None,
            settings: None,
            json: false,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().unwrap_or_default();
            match arg.as_str() {
                "--host" | "-h" => parsed.host = value(),
                "--port" | "-p" => parsed.port = value().parse().unwrap_or(22),
                "--user" | "-u" => parsed.user = value(),
                "--password" | "-P" => parsed.password = Some(value()),
                "--key" | "-k" => parsed.key = Some(PathBuf::from(value())),
                "--enable" | "-e" => parsed.enable = Some(value()),
                "--settings" | "-s" => parsed.settings = Some(PathBuf::from(value())),
                "--json" => parsed.json = true,
                other => eprintln!("Unknown argument: {}", other),
            }
        }
        parsed
    }
}
