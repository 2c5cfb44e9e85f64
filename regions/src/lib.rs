//! Region directory: the ordered list of backend clusters the gateway
//! forwards to, loaded and validated once at startup.

pub mod config;
pub mod directory;
pub mod errors;
pub mod metrics_defs;
pub mod source;
pub mod types;

use config::{Config, RegionSourceType};
use metrics_defs::REGIONS_LOADED;
use shared::gauge;
use source::{ControlPlaneRegionSource, FileRegionSource, MongoRegionSource, RegionSource};
use std::sync::Arc;

pub use directory::RegionDirectory;
pub use errors::RegionError;
pub use types::{Endpoint, Port, Region};

pub fn get_source(source_type: &RegionSourceType) -> Arc<dyn RegionSource> {
    match source_type {
        RegionSourceType::File { path } => Arc::new(FileRegionSource::new(path.clone())),
        RegionSourceType::ControlPlane { url } => Arc::new(ControlPlaneRegionSource::new(url)),
        RegionSourceType::Mongodb(mongo) => Arc::new(MongoRegionSource::new(mongo.clone())),
    }
}

/// Loads the region directory described by `config`.
pub async fn load(config: &Config) -> Result<RegionDirectory, RegionError> {
    let source = get_source(&config.source);
    let directory = RegionDirectory::load(&config.name, source.as_ref()).await?;

    gauge!(REGIONS_LOADED).set(directory.len() as f64);
    for region in directory.all_regions() {
        tracing::info!(
            name = %region.name,
            label = region.label(),
            gateway = %region.gateway,
            is_default = region.is_default,
            "loaded region"
        );
    }

    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_region;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_from_file() {
        let records = vec![
            test_region("aws-us-west-2", "standby.example.com", false),
            test_region("aws-us-west-2", "default.example.com", true),
        ];
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{}", serde_yaml::to_string(&records).unwrap()).unwrap();

        let config = Config {
            name: "aws-us-west-2".into(),
            source: RegionSourceType::File {
                path: tmp.path().to_path_buf(),
            },
        };
        let directory = load(&config).await.unwrap();

        assert_eq!(directory.len(), 2);
        assert!(directory.all_regions()[0].is_default);

        let config = Config {
            name: "ali-cn-beijing".into(),
            ..config
        };
        assert!(matches!(load(&config).await, Err(RegionError::Empty(_))));
    }
}
