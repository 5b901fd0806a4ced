// SPDX-License-Identifier: MIT

//! Webhook alert sink for security-relevant events.
//!
//! Delivery is best-effort: alert failures are logged and swallowed so a
//! dead webhook can never break a login path.

use serde_json::json;

/// Fire-and-forget webhook notifier. Unconfigured when no webhook URL is
/// set, in which case every send is a no-op.
#[derive(Clone)]
pub struct AlertSink {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl AlertSink {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Notify on a failed login attempt.
    pub async fn failed_login(&self, attempted_password_len: usize, remote_addr: &str) {
        let Some(url) = &self.webhook_url else {
            return;
        };

        let body = json!({
            "embeds": [{
                "title": "Failed login attempt",
                "color": 15158332,
                "fields": [
                    { "name": "Source", "value": remote_addr, "inline": true },
                    {
                        "name": "Password length",
                        "value": attempted_password_len.to_string(),
                        "inline": true
                    },
                ],
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }]
        });

        match self.http.post(url).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "Alert webhook rejected payload");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to deliver alert webhook");
            }
        }
    }
}
