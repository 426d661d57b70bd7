//! On-disk airport and waypoint directory.
//!
//! Two CSV files loaded once at startup into ident-keyed maps: airports in
//! the OurAirports column layout, waypoints as `ident,latitude,longitude`.
//! Either file may be gzip compressed (`.gz` extension). Lookups are
//! uppercase-normalized; duplicate idents collapse to the last row.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info};

use flightnet_core::route::Directory;
use flightnet_core::types::Waypoint;

/// Error type for directory loading.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Columns read from the airports file; remaining columns are ignored.
#[derive(Debug, Deserialize)]
struct AirportRow {
    ident: String,
    latitude_deg: f64,
    longitude_deg: f64,
}

/// Columns read from the waypoints file. The OurAirports spellings are
/// accepted as aliases so both files can share one export pipeline.
#[derive(Debug, Deserialize)]
struct WaypointRow {
    #[serde(alias = "name")]
    ident: String,
    #[serde(alias = "latitude_deg")]
    latitude: f64,
    #[serde(alias = "longitude_deg")]
    longitude: f64,
}

/// Ident-keyed position index backing route construction.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    airports: HashMap<String, Waypoint>,
    waypoints: HashMap<String, Waypoint>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both files. A missing or unreadable file is an error; malformed
    /// individual rows are skipped.
    pub fn load(airports_csv: &Path, waypoints_csv: &Path) -> Result<Self, DirectoryError> {
        let mut index = DirectoryIndex::new();
        index.airports = load_rows(airports_csv, |row: AirportRow| Waypoint {
            ident: row.ident,
            latitude_deg: row.latitude_deg,
            longitude_deg: row.longitude_deg,
        })?;
        index.waypoints = load_rows(waypoints_csv, |row: WaypointRow| Waypoint {
            ident: row.ident,
            latitude_deg: row.latitude,
            longitude_deg: row.longitude,
        })?;
        info!(
            "directory loaded: {} airports, {} waypoints",
            index.airports.len(),
            index.waypoints.len()
        );
        Ok(index)
    }

    pub fn airport_count(&self) -> usize {
        self.airports.len()
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }
}

impl Directory for DirectoryIndex {
    fn airport(&self, ident: &str) -> Option<Waypoint> {
        self.airports.get(&normalize(ident)).cloned()
    }

    fn waypoints(&self, idents: &[&str]) -> HashMap<String, Waypoint> {
        // Keyed by the ident as passed, so callers can look their own
        // tokens back up regardless of case.
        let mut out = HashMap::new();
        for ident in idents {
            if let Some(wp) = self.waypoints.get(&normalize(ident)) {
                out.insert((*ident).to_string(), wp.clone());
            }
        }
        out
    }
}

fn normalize(ident: &str) -> String {
    ident.trim().to_ascii_uppercase()
}

fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>, DirectoryError> {
    if !path.exists() {
        return Err(DirectoryError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        debug!("decompressing {}", path.display());
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn load_rows<R, F>(path: &Path, to_waypoint: F) -> Result<HashMap<String, Waypoint>, DirectoryError>
where
    R: serde::de::DeserializeOwned,
    F: Fn(R) -> Waypoint,
{
    let reader = open_maybe_gz(path)?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(reader));

    let mut out = HashMap::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<R>() {
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let mut wp = to_waypoint(row);
        wp.ident = normalize(&wp.ident);
        if wp.ident.is_empty() {
            skipped += 1;
            continue;
        }
        out.insert(wp.ident.clone(), wp);
    }
    if skipped > 0 {
        debug!("{skipped} malformed rows skipped in {}", path.display());
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
