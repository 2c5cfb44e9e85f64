use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum RegionSourceType {
    File { path: PathBuf },
    ControlPlane { url: Url },
    Mongodb(MongoConfig),
}

/// Connection settings of the MongoDB database holding the `regions` collection.
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct MongoConfig {
    /// Host (and port, unless `srv` is set) of the cluster
    pub address: String,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Resolve `address` through DNS SRV records (`mongodb+srv://`)
    #[serde(default = "default_srv")]
    pub srv: bool,
}

fn default_srv() -> bool {
    true
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    /// Region group to load, e.g. "aws-us-west-2"
    pub name: String,
    pub source: RegionSourceType,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("region name is empty")]
    EmptyName,
    #[error("mongodb {0} is empty")]
    EmptyMongoField(&'static str),
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let RegionSourceType::Mongodb(mongo) = &self.source {
            if mongo.address.is_empty() {
                return Err(ValidationError::EmptyMongoField("address"));
            }
            if mongo.database.is_empty() {
                return Err(ValidationError::EmptyMongoField("database"));
            }
        }
        Ok(())
    }
}
