//! OSRM dataset preparation: fetch a Geofabrik extract and preprocess it
//! with the `osrm/osrm-backend` docker image so `osrm-routed` can serve it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

const OSRM_IMAGE: &str = "osrm/osrm-backend";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset io: {0}")]
    Io(#[from] io::Error),

    #[error("extract download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{step} failed: {status}")]
    ProcessFailure { step: String, status: String },
}

#[derive(Debug, Clone)]
pub struct GeofabrikRegion {
    /// Geofabrik region path, e.g. "australia-oceania/australia".
    pub path: String,
}

impl GeofabrikRegion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("region")
    }

    pub fn url(&self) -> String {
        format!(
            "https://download.geofabrik.de/{}-latest.osm.pbf",
            self.path.trim_matches('/')
        )
    }
}

/// Preprocessing pipeline; must match `osrm-routed --algorithm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsrmAlgorithm {
    /// Multi-level Dijkstra: extract, partition, customize.
    Mld,
    /// Contraction hierarchies: extract, contract.
    Ch,
}

impl OsrmAlgorithm {
    pub fn as_arg(&self) -> &'static str {
        match self {
            OsrmAlgorithm::Mld => "mld",
            OsrmAlgorithm::Ch => "ch",
        }
    }

    fn artifacts(&self) -> &'static [&'static str] {
        match self {
            OsrmAlgorithm::Mld => &["osrm.partition", "osrm.mldgr", "osrm.cells"],
            OsrmAlgorithm::Ch => &["osrm.hsgr"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDatasetConfig {
    pub region: GeofabrikRegion,
    pub data_root: PathBuf,
    pub algorithm: OsrmAlgorithm,
    /// Lua profile inside the image, e.g. "car" or "truck".
    pub profile: String,
}

impl OsrmDatasetConfig {
    pub fn new(region: GeofabrikRegion, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
            algorithm: OsrmAlgorithm::Mld,
            profile: "car".to_string(),
        }
    }
}

/// A region ready to be served.
#[derive(Debug, Clone)]
pub struct OsrmDataset {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
    pub algorithm: OsrmAlgorithm,
}

impl OsrmDataset {
    /// Downloads and preprocesses whatever is missing. Existing artifacts are
    /// reused, so repeated calls are cheap.
    pub fn ensure(config: &OsrmDatasetConfig) -> Result<Self, DatasetError> {
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let data_dir = data_root.join(config.region.name());
        fs::create_dir_all(&data_dir)?;

        let stem = format!("{}-latest", config.region.name());
        let pbf_path = data_dir.join(format!("{}.osm.pbf", stem));
        if !pbf_path.exists() {
            tracing::info!(url = %config.region.url(), "downloading OSM extract");
            download(&config.region.url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}.osrm", stem));
        let osrm_arg = format!("/data/{}.osrm", stem);
        if !osrm_base.exists() {
            let profile = format!("/opt/{}.lua", config.profile);
            let pbf_arg = format!("/data/{}.osm.pbf", stem);
            run_in_docker("osrm-extract", &["-p", &profile, &pbf_arg], &data_dir)?;
        }

        if !artifacts_ready(&osrm_base, config.algorithm) {
            match config.algorithm {
                OsrmAlgorithm::Mld => {
                    run_in_docker("osrm-partition", &[&osrm_arg], &data_dir)?;
                    run_in_docker("osrm-customize", &[&osrm_arg], &data_dir)?;
                }
                OsrmAlgorithm::Ch => {
                    run_in_docker("osrm-contract", &[&osrm_arg], &data_dir)?;
                }
            }
        }

        Ok(Self {
            data_dir,
            osrm_base,
            algorithm: config.algorithm,
        })
    }

    /// File name of the `.osrm` base as seen inside the container's `/data`.
    pub fn container_path(&self) -> String {
        let name = self
            .osrm_base
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        format!("/data/{}", name)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), DatasetError> {
    let mut response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    response.copy_to(&mut writer)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn artifacts_ready(osrm_base: &Path, algorithm: OsrmAlgorithm) -> bool {
    osrm_base.exists()
        && algorithm
            .artifacts()
            .iter()
            .all(|extension| osrm_base.with_extension(extension).exists())
}

fn run_in_docker(step: &str, args: &[&str], data_dir: &Path) -> Result<(), DatasetError> {
    tracing::info!(step, "running OSRM preprocessing");
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg(OSRM_IMAGE)
        .arg(step)
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(DatasetError::ProcessFailure {
            step: step.to_string(),
            status: status.to_string(),
        })
    }
}
