use std::io;

pub type Result<T, E = RegionError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum RegionError {
    #[error("{0} region info is empty")]
    Empty(String),

    #[error("default cluster of {0} does not exist")]
    NoDefault(String),

    #[error("{name} has {count} clusters marked as default")]
    MultipleDefaults { name: String, count: usize },

    #[error("region name is empty")]
    EmptyName,

    #[error("{0} endpoint host can't be empty")]
    EmptyHost(&'static str),

    #[error("{0} endpoint http port is empty")]
    ZeroHttpPort(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not parse region file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("control plane request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("mongodb query failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("control plane unavailable")]
    ControlPlaneRetriesExceeded,
}
