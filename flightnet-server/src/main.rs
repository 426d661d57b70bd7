//! flightnet: CLI + JSON API server for virtual-aviation network tracking.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use tracing::info;

use flightnet_core::config;
use flightnet_core::geo;
use flightnet_core::progress;
use flightnet_core::types::NetworkSource;

mod directory;
mod feeds;
mod fetch;
mod service;
mod web;

use directory::DirectoryIndex;
use feeds::{unix_now, IvaoFeed, VatsimFeed};
use fetch::ReqwestFetch;
use service::RouteService;

#[derive(Parser)]
#[command(name = "flightnet", version, about = "Multi-network flight tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON API server
    Serve {
        /// Bind address
        #[arg(long, env = "FLIGHTNET_HOST")]
        host: Option<String>,

        /// Bind port
        #[arg(long, env = "FLIGHTNET_PORT")]
        port: Option<u16>,

        /// Airports CSV (optionally .gz)
        #[arg(long, env = "FLIGHTNET_AIRPORTS")]
        airports: Option<PathBuf>,

        /// Waypoints CSV (optionally .gz)
        #[arg(long, env = "FLIGHTNET_WAYPOINTS")]
        waypoints: Option<PathBuf>,

        /// VATSIM snapshot TTL in seconds
        #[arg(long, env = "FLIGHTNET_VATSIM_TTL")]
        vatsim_ttl: Option<f64>,

        /// IVAO snapshot TTL in seconds
        #[arg(long, env = "FLIGHTNET_IVAO_TTL")]
        ivao_ttl: Option<f64>,
    },

    /// List pilots currently online
    Pilots {
        /// Only show one network
        #[arg(long, value_parser = parse_network)]
        network: Option<NetworkSource>,

        /// Filter by callsign, name, or id substring
        #[arg(long)]
        query: Option<String>,
    },

    /// Construct and print a pilot's route
    Route {
        /// VATSIM CID or IVAO VID
        network_id: i64,
    },

    /// Print or create the config file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn parse_network(s: &str) -> Result<NetworkSource, String> {
    match s.to_ascii_lowercase().as_str() {
        "vatsim" => Ok(NetworkSource::Vatsim),
        "ivao" => Ok(NetworkSource::Ivao),
        other => Err(format!("unknown network '{other}' (expected vatsim or ivao)")),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            airports,
            waypoints,
            vatsim_ttl,
            ivao_ttl,
        } => cmd_serve(host, port, airports, waypoints, vatsim_ttl, ivao_ttl).await,
        Commands::Pilots { network, query } => cmd_pilots(network, query).await,
        Commands::Route { network_id } => cmd_route(network_id).await,
        Commands::Config { init } => cmd_config(init),
    }
}

// ---------------------------------------------------------------------------
// Service construction
// ---------------------------------------------------------------------------

/// Feeds + service from a config, with an already-loaded directory.
fn build_service(cfg: &config::Config, directory: DirectoryIndex) -> RouteService {
    let fetcher: Arc<dyn fetch::HttpFetch> = Arc::new(
        ReqwestFetch::new(&cfg.networks.user_agent, cfg.networks.http_timeout_s)
            .unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }),
    );

    let vatsim = VatsimFeed::new(
        fetcher.clone(),
        cfg.networks.vatsim_url.clone(),
        cfg.networks.vatsim_members_url.clone(),
        cfg.networks.vatsim_ttl_s,
    );
    let ivao = IvaoFeed::new(
        fetcher,
        cfg.networks.ivao_url.clone(),
        cfg.networks.ivao_ttl_s,
    );

    RouteService::new(vatsim, ivao, directory, cfg.route.distance_threshold_km)
}

fn load_directory(cfg: &config::Config) -> DirectoryIndex {
    DirectoryIndex::load(
        std::path::Path::new(&cfg.directory.airports),
        std::path::Path::new(&cfg.directory.waypoints),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error loading directory: {e}");
        std::process::exit(1);
    })
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    airports: Option<PathBuf>,
    waypoints: Option<PathBuf>,
    vatsim_ttl: Option<f64>,
    ivao_ttl: Option<f64>,
) {
    let mut cfg = config::load_config();
    if let Some(p) = airports {
        cfg.directory.airports = p.display().to_string();
    }
    if let Some(p) = waypoints {
        cfg.directory.waypoints = p.display().to_string();
    }
    if let Some(ttl) = vatsim_ttl {
        cfg.networks.vatsim_ttl_s = ttl;
    }
    if let Some(ttl) = ivao_ttl {
        cfg.networks.ivao_ttl_s = ttl;
    }
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);

    let directory = load_directory(&cfg);
    info!(
        "directory: {} airports, {} waypoints",
        directory.airport_count(),
        directory.waypoint_count()
    );

    let service = build_service(&cfg, directory);
    let state = Arc::new(web::AppState { service });

    web::serve(state, host, port).await;
}

async fn cmd_pilots(network: Option<NetworkSource>, query: Option<String>) {
    let cfg = config::load_config();
    // The listing never touches the directory; an empty one avoids
    // requiring the CSV files for this command.
    let service = build_service(&cfg, DirectoryIndex::new());

    let listing = match service.search(query.as_deref().unwrap_or(""), unix_now()).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut pilots = listing.pilots;
    if let Some(wanted) = network {
        pilots.retain(|p| p.network == wanted);
    }

    if listing.vatsim_stale {
        eprintln!("warning: VATSIM data is stale");
    }
    if listing.ivao_stale {
        eprintln!("warning: IVAO data is stale");
    }

    println!();
    println!("{} pilots online", pilots.len());
    if pilots.is_empty() {
        return;
    }
    println!();

    let mut table = Table::new();
    table.set_header(vec![
        "Callsign", "ID", "Network", "Lat", "Lon", "Alt (ft)", "Speed", "Flight",
    ]);

    for p in &pilots {
        let flight = p
            .plan
            .as_ref()
            .map(|plan| format!("{} -> {}", plan.departure, plan.arrival))
            .unwrap_or("-".into());
        table.add_row(vec![
            Cell::new(&p.callsign),
            Cell::new(p.network_id),
            Cell::new(p.network),
            Cell::new(format!("{:.4}", p.latitude)),
            Cell::new(format!("{:.4}", p.longitude)),
            Cell::new(
                p.altitude_ft
                    .map(|a| a.to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                p.ground_speed_kt
                    .map(|s| s.to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(flight),
        ]);
    }

    println!("{table}");
}

async fn cmd_route(network_id: i64) {
    let cfg = config::load_config();
    let directory = load_directory(&cfg);
    let service = build_service(&cfg, directory);

    let route = match service.construct_route(network_id, unix_now()).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!(
        "{} on {}: {} -> {}",
        network_id, route.network, route.departure, route.arrival
    );
    println!();

    let mut table = Table::new();
    table.set_header(vec!["#", "Ident", "Lat", "Lon", "Leg (km)"]);

    let mut prev: Option<&flightnet_core::types::Waypoint> = None;
    for (i, wp) in route.waypoints.iter().enumerate() {
        let leg = prev
            .map(|p| {
                format!(
                    "{:.0}",
                    geo::haversine_km(
                        p.longitude_deg,
                        p.latitude_deg,
                        wp.longitude_deg,
                        wp.latitude_deg,
                    )
                )
            })
            .unwrap_or("-".into());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&wp.ident),
            Cell::new(format!("{:.4}", wp.latitude_deg)),
            Cell::new(format!("{:.4}", wp.longitude_deg)),
            Cell::new(leg),
        ]);
        prev = Some(wp);
    }

    println!("{table}");
    println!(
        "Total: {:.0} km over {} points",
        progress::total_distance_km(&route.waypoints),
        route.waypoints.len()
    );
}

fn cmd_config(init: bool) {
    if init {
        let path = config::config_file();
        if path.exists() {
            eprintln!("Config already exists at {}", path.display());
            std::process::exit(1);
        }
        match config::save_config(&config::Config::default()) {
            Ok(path) => println!("Wrote {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let path = config::config_file();
    if path.exists() {
        println!("# {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    } else {
        let cfg = config::Config::default();
        println!("No config file at {} (using defaults)", path.display());
        println!();
        println!("  server:  {}:{}", cfg.server.host, cfg.server.port);
        println!("  vatsim:  {} (ttl {}s)", cfg.networks.vatsim_url, cfg.networks.vatsim_ttl_s);
        println!("  ivao:    {} (ttl {}s)", cfg.networks.ivao_url, cfg.networks.ivao_ttl_s);
        println!("  route:   distance threshold {} km", cfg.route.distance_threshold_km);
        println!(
            "  data:    {} / {}",
            cfg.directory.airports, cfg.directory.waypoints
        );
    }
}
