//! OS install example: copy an image to the device and boot into it.
//!
//! The image is copied only if the device does not already hold it, then
//! the boot variable is pointed at it and the device is reloaded. A
//! checkpoint of the running configuration is taken first and a local
//! backup is written next to the image.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example install_os -- --host 192.0.2.10 --user admin --password secret \
//!     --image ./c2800nm-adventerprisek9-mz.152-4.M7.bin
//! ```

use std::env;
use std::path::PathBuf;

use ferrios::{CopyOutcome, DeviceBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(image) = args.image else {
        eprintln!("Error: --image is required");
        std::process::exit(1);
    };
    let image_name = image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or("image path has no file name")?;

    let mut device = DeviceBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(&args.password)
        .platform("cisco_ios")
        .build()?;

    device.open().await?;

    let backup = image.with_file_name(format!("{}-before-upgrade.cfg", args.host));
    device.backup_running_config(&backup).await?;
    device.checkpoint("before-upgrade.cfg").await?;
    println!("Saved running config to {}", backup.display());

    match device.file_copy(&image, None, None).await? {
        CopyOutcome::AlreadyPresent => println!("{} already on the device", image_name),
        CopyOutcome::Transferred => println!("Copied {}", image_name),
        CopyOutcome::ChecksumMismatch => {
            eprintln!("A different {} is already on the device; remove it first", image_name);
            std::process::exit(1);
        }
    }

    if device.install_os(&image_name).await? {
        println!("Device now runs {}", image_name);
    } else {
        println!("Device already runs {}", image_name);
    }

    device.close().await?;
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    image: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: String::new(),
            image: None,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().unwrap_or_default();
            match arg.as_str() {
                "--host" | "-h" => parsed.host = value(),
                "--port" | "-p" => parsed.port = value().parse().unwrap_or(22),
                "--user" | "-u" => parsed.user = value(),
                "--password" | "-P" => parsed.password = value(),
                "--image" | "-i" => parsed.image = Some(PathBuf::from(value())),
                other => eprintln!("Unknown argument: {}", other),
            }
        }
        parsed
    }
}
