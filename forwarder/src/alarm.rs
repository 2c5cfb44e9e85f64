//! Operator alarms for forwarding failures.
//!
//! Delivery is best effort: a notifier never reports an error back to the
//! request that raised the alarm.
use crate::config::MonitorConfig;
use crate::metrics_defs::ALARMS;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use shared::counter;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Upper bound for one webhook delivery.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Builds the notifier described by the monitor configuration.
pub fn get_notifier(config: &MonitorConfig) -> Result<Arc<dyn Notifier>, reqwest::Error> {
    match (config.enable, &config.webhook_url) {
        (true, Some(url)) => {
            tracing::info!(webhook_url = %url, "alarm notifications enabled");
            Ok(Arc::new(WebhookNotifier::new(url.clone(), WEBHOOK_TIMEOUT)?))
        }
        _ => {
            tracing::info!("alarm notifications disabled");
            Ok(Arc::new(NoopNotifier {}))
        }
    }
}

/// Text of the alarm raised when sending to a cluster fails.
pub fn failure_message(path: &str, cluster_label: &str) -> String {
    format!(
        "【Sends Failure】Sending event to {} of {} cluster failed",
        resource_from_path(path),
        cluster_label
    )
}

/// The resource a request targets: the second to last path segment, e.g.
/// the event bus in `/namespaces/default/eventbus/{bus}/events`.
///
/// Paths with fewer than two segments are returned unchanged.
pub fn resource_from_path(path: &str) -> &str {
    path.rsplit('/').nth(1).unwrap_or(path)
}

#[derive(Serialize)]
struct Alarm<'a> {
    message: &'a str,
}

/// Posts alarms as JSON to a webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: Url,
}

impl WebhookNotifier {
    pub fn new(webhook_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(WebhookNotifier {
            client,
            webhook_url,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) {
        let result = self
            .client
            .post(self.webhook_url.clone())
            .json(&Alarm { message })
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                counter!(ALARMS, "result" => "sent").increment(1);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, body = %body, "alarm webhook returned non-200");
                counter!(ALARMS, "result" => "failed").increment(1);
            }
            Err(e) => {
                tracing::warn!(error = %e, "alarm webhook request failed");
                counter!(ALARMS, "result" => "failed").increment(1);
            }
        }
    }
}

/// Drops alarms. Used when notifications are disabled.
pub struct NoopNotifier {}

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, message: &str) {
        tracing::debug!(alarm = message, "alarm notifications disabled, dropping alarm");
        counter!(ALARMS, "result" => "disabled").increment(1);
    }
}
