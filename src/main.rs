//! Proxmox dynamic inventory
//!
//! Prints an Ansible dynamic-inventory document for a Proxmox VE cluster.
//!
//! ```text
//! proxmox-inventory --list --config prod.proxmox.yml
//! proxmox-inventory --host web1 --url https://pve:8006 --user ansible@pve
//! ```
//!
//! Settings come from flags first, then the config file, then the
//! `PROXMOX_URL`, `PROXMOX_USER` and `PROXMOX_PASSWORD` environment variables.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use proxmox_inventory::{
    DiscoveryService, Inventory, InventoryConfig, ProxmoxError, ProxmoxResult,
};

/// Dynamic Ansible inventory for Proxmox VE clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the whole inventory (default)
    #[arg(long, conflicts_with = "host")]
    list: bool,

    /// Print the variables of one host
    #[arg(long, value_name = "NAME")]
    host: Option<String>,

    /// YAML config file; its name must end in proxmox.yml or proxmox.yaml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Controller URL, e.g. https://pve.example.com:8006
    #[arg(long)]
    url: Option<String>,

    /// Login user including the realm, e.g. ansible@pve
    #[arg(long)]
    user: Option<String>,

    /// Login password
    #[arg(long)]
    password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    no_validate_certs: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn as_config(&self) -> InventoryConfig {
        InventoryConfig {
            url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            validate_certs: self.no_validate_certs.then_some(false),
            ..InventoryConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    match run(&args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Inventory run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> ProxmoxResult<String> {
    let file_config = match &args.config {
        Some(path) => InventoryConfig::from_file(path).await?,
        None => InventoryConfig::default(),
    };
    let config = args
        .as_config()
        .or(file_config)
        .or(InventoryConfig::from_env());

    let client = config.build_client()?;
    let mut inventory = Inventory::new();
    let report = DiscoveryService::new(config.discovery_options())
        .execute(&client, &mut inventory)
        .await?;
    info!(
        hosts = inventory.host_count(),
        groups = inventory.group_count(),
        skipped_nodes = ?report.nodes_skipped,
        "Inventory built"
    );

    let document = match (&args.host, args.list) {
        (Some(name), false) => inventory.host_vars(name),
        _ => inventory.to_ansible_json(),
    };
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    };
    rendered.map_err(|e| ProxmoxError::Inventory(e.to_string()))
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
