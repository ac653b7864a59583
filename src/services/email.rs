//! Outbound email notifications via the Resend REST API.
//!
//! Email is best-effort: when `RESEND_API_KEY` is absent every send is a
//! logged no-op, and delivery failures are logged rather than surfaced.
//! Nothing in the portal flow depends on an email arriving.

use serde_json::json;

const RESEND_URL: &str = "https://api.resend.com/emails";
const FROM_ADDRESS: &str = "Finance Guru <notifications@financeguru.com>";

/// Resend-backed mailer. Construct once and share.
pub struct Mailer {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl Mailer {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("RESEND_API_KEY not configured; email notifications are disabled");
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            // Builder only fails on TLS backend misconfiguration
            .unwrap_or_default();
        Self { http, api_key }
    }

    /// Send one email. No-op when unconfigured; failures are logged only.
    async fn send(&self, to: &str, subject: &str, html: &str) {
        let Some(api_key) = &self.api_key else {
            return;
        };

        let body = json!({
            "from": FROM_ADDRESS,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        match self
            .http
            .post(RESEND_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::info!(%to, "notification email sent");
            }
            Ok(response) => {
                tracing::error!(status = %response.status(), %to, "email API rejected the message");
            }
            Err(err) => {
                tracing::error!(error = %err, %to, "failed to reach email API");
            }
        }
    }

    /// Notify a developer that an admin approved their API key.
    pub async fn send_key_approved(&self, to: &str, name: &str, api_key: &str) {
        let html = format!(
            "<h2>Your API key is active</h2>\
             <p>Hi {name},</p>\
             <p>Your Finance Guru API key request has been approved. You can start \
             making requests right away:</p>\
             <pre>{api_key}</pre>\
             <p>See the API documentation in your developer dashboard for examples.</p>\
             <p>— The Finance Guru team</p>"
        );
        self.send(to, "Your Finance Guru API key has been approved", &html)
            .await;
    }
}
