//! Places the region records can be loaded from.
use crate::config::MongoConfig;
use crate::errors::{RegionError, Result};
use crate::metrics_defs::{CONTROL_PLANE_FETCH_DURATION, CONTROL_PLANE_RETRIES};
use crate::types::Region;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection};
use reqwest::StatusCode;
use shared::{counter, histogram};
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::{Duration, sleep};
use url::Url;

const BASE_DELAY: u64 = 500;
const MAX_RETRIES: u32 = 3;

const REGION_COLLECTION: &str = "regions";
const MONGO_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Returns every record whose name is `name`, in storage order.
    async fn fetch(&self, name: &str) -> Result<Vec<Region>>;

    fn kind(&self) -> &'static str;
}

/// Reads the whole region table from a YAML file.
///
/// The file holds a sequence of region records covering any number of
/// region names; only the requested name is returned.
pub struct FileRegionSource {
    path: PathBuf,
}

impl FileRegionSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileRegionSource { path: path.into() }
    }
}

#[async_trait]
impl RegionSource for FileRegionSource {
    async fn fetch(&self, name: &str) -> Result<Vec<Region>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<Region> = serde_yaml::from_str(&contents)?;

        Ok(records.into_iter().filter(|r| r.name == name).collect())
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

/// Fetches region records from the control plane's `regions/` endpoint.
pub struct ControlPlaneRegionSource {
    client: reqwest::Client,
    full_url: String,
}

impl ControlPlaneRegionSource {
    pub fn new(base_url: &Url) -> Self {
        let full_url = format!("{}/{}/", base_url.as_str().trim_end_matches('/'), "regions");

        ControlPlaneRegionSource {
            client: reqwest::Client::new(),
            full_url,
        }
    }
}

#[async_trait]
impl RegionSource for ControlPlaneRegionSource {
    async fn fetch(&self, name: &str) -> Result<Vec<Region>> {
        const RETRIABLE_STATUS_CODES: &[StatusCode] = &[
            StatusCode::TOO_MANY_REQUESTS,     // 429
            StatusCode::INTERNAL_SERVER_ERROR, // 500
            StatusCode::BAD_GATEWAY,           // 502
            StatusCode::SERVICE_UNAVAILABLE,   // 503
            StatusCode::GATEWAY_TIMEOUT,       // 504
        ];

        let mut url =
            Url::parse(&self.full_url).map_err(|e| RegionError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("name", name);

        let start = Instant::now();
        let mut retries = 0;

        loop {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();

            if status.is_success() {
                let records = response.json::<Vec<Region>>().await?;
                histogram!(CONTROL_PLANE_FETCH_DURATION).record(start.elapsed().as_secs_f64());
                return Ok(records.into_iter().filter(|r| r.name == name).collect());
            }

            if RETRIABLE_STATUS_CODES.contains(&status) && retries < MAX_RETRIES {
                // Backoff between retries
                let retry_millis = BASE_DELAY * 2_u64.pow(retries);
                tracing::warn!(%status, retry_millis, "control plane unavailable, retrying");
                counter!(CONTROL_PLANE_RETRIES).increment(1);
                sleep(Duration::from_millis(retry_millis)).await;
                retries += 1;
                continue;
            }

            tracing::error!(%status, retries, "giving up on control plane");
            return Err(RegionError::ControlPlaneRetriesExceeded);
        }
    }

    fn kind(&self) -> &'static str {
        "control_plane"
    }
}

/// Queries the `regions` collection of a MongoDB database.
pub struct MongoRegionSource {
    config: MongoConfig,
    server_selection_timeout: Duration,
}

impl MongoRegionSource {
    pub fn new(config: MongoConfig) -> Self {
        MongoRegionSource {
            config,
            server_selection_timeout: MONGO_SERVER_SELECTION_TIMEOUT,
        }
    }

    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }

    /// Connection string without credentials; those are set on the options.
    fn connection_string(&self) -> String {
        let scheme = match self.config.srv {
            true => "mongodb+srv",
            false => "mongodb",
        };
        format!(
            "{scheme}://{}/?retryWrites=true&w=majority",
            self.config.address
        )
    }

    async fn client(&self) -> Result<Client> {
        let mut options = ClientOptions::parse(self.connection_string()).await?;
        if let Some(username) = &self.config.username {
            options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(self.config.password.clone())
                    .build(),
            );
        }
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.server_selection_timeout = Some(self.server_selection_timeout);

        Ok(Client::with_options(options)?)
    }
}

#[async_trait]
impl RegionSource for MongoRegionSource {
    async fn fetch(&self, name: &str) -> Result<Vec<Region>> {
        let start = Instant::now();
        let client = self.client().await?;
        let collection: Collection<Region> = client
            .database(&self.config.database)
            .collection(REGION_COLLECTION);

        let mut cursor = collection
            .find(doc! { "name": name })
            .sort(doc! { "is_default": -1 })
            .await?;
        let mut records = Vec::new();
        while cursor.advance().await? {
            records.push(cursor.deserialize_current()?);
        }

        tracing::info!(
            address = %self.config.address,
            database = %self.config.database,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "queried regions from mongodb"
        );
        Ok(records)
    }

    fn kind(&self) -> &'static str {
        "mongodb"
    }
}
