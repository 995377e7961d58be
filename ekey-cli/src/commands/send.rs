//! Send command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use ekey_core::{RESULT_MATCH, TYPE_FINGER};
use serde_json::{json, Value};
use tracing::{debug, info};

/// The bridge answered with a non-success status.
#[derive(Debug)]
pub struct Rejected {
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bridge rejected the notification with status {}", self.status)?;
        if !self.body.is_empty() {
            write!(f, ": {}", self.body)?;
        }
        Ok(())
    }
}

impl std::error::Error for Rejected {}

/// What to put into the synthetic notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub user: String,
    pub finger: i64,
    pub result: i64,
    pub device: String,
}

impl Notification {
    /// Controller-shaped body stamped with the current time.
    pub fn to_body(&self) -> Value {
        json!({
            "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "type": TYPE_FINGER,
            "result": self.result,
            "detail": 0,
            "ctlDevId": self.device,
            "acqDevId": self.device,
            "params": {
                "userId": self.user,
                "fingerIndex": self.finger,
            }
        })
    }
}

/// Execute the send command.
pub async fn execute(url: String, token: Option<String>, notification: Notification) -> Result<()> {
    let body = notification.to_body();
    debug!(%url, %body, "Posting notification");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let mut request = client.post(&url).json(&body);
    if let Some(token) = &token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to reach bridge at {url}"))?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    info!(status = status.as_u16(), "Bridge responded");

    if !status.is_success() {
        return Err(Rejected {
            status: status.as_u16(),
            body: text,
        }
        .into());
    }

    let outcome = if notification.result == RESULT_MATCH {
        "match".green()
    } else {
        "no match".yellow()
    };
    println!(
        "{} {} {} ({})",
        "Delivered".green().bold(),
        notification.user,
        outcome,
        status
    );
    Ok(())
}
