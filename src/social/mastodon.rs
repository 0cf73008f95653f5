// src/social/mastodon.rs
//! Mastodon REST client (v1 API) for the endpoints the loop needs.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{SocialConfig, Visibility};
use crate::error::{ModerationError, Result};
use crate::social::text::extract_text;
use crate::social::{parse_created_at, Author, Notification, SocialClient};

#[derive(Clone)]
pub struct MastodonClient {
    http: Client,
    base_url: String,
    access_token: String,
}

/// Subset of the status entity returned by `POST /api/v1/statuses`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostedStatus {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAccount {
    id: String,
    acct: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    id: String,
    #[serde(default)]
    content: String,
    account: ApiAccount,
}

#[derive(Debug, Deserialize)]
struct ApiNotification {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    status: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct ApiCredentials {
    username: String,
}

#[derive(Serialize)]
struct NewStatus<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<&'a str>,
}

impl MastodonClient {
    pub fn new(cfg: &SocialConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("mention-moderator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            access_token: cfg.access_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.bearer_auth(&self.access_token)
    }

    async fn checked(resp: Response, what: &str) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(ModerationError::TransientIo(format!(
            "{what}: HTTP {status}: {snippet}"
        )))
    }

    /// Post a status; `in_reply_to` and `visibility` are optional.
    pub async fn post_status(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Result<PostedStatus> {
        let body = NewStatus {
            status: text,
            in_reply_to_id: in_reply_to,
            visibility: visibility.map(Visibility::as_str),
        };
        let resp = self
            .authed(self.http.post(self.url("/api/v1/statuses")))
            .json(&body)
            .send()
            .await?;
        let resp = Self::checked(resp, "post status").await?;
        resp.json::<PostedStatus>()
            .await
            .map_err(|e| ModerationError::MalformedResponse(format!("status entity: {e}")))
    }

    async fn account_action(&self, author_id: &str, verb: &str) -> Result<()> {
        let path = format!("/api/v1/accounts/{author_id}/{verb}");
        let resp = self.authed(self.http.post(self.url(&path))).send().await?;
        Self::checked(resp, verb).await?;
        Ok(())
    }
}

fn to_notification(n: ApiNotification) -> Option<Notification> {
    if n.kind != "mention" {
        return None;
    }
    let Some(status) = n.status else {
        warn!(notification_id = %n.id, "mention without status, skipping");
        return None;
    };
    let created_at = status.account.created_at.as_deref().and_then(parse_created_at);
    if created_at.is_none() {
        warn!(
            handle = %status.account.acct,
            "account creation date missing or unparseable, treating as established"
        );
    }
    Some(Notification {
        id: n.id,
        status_id: status.id,
        author: Author {
            id: status.account.id,
            handle: status.account.acct,
            created_at,
        },
        text: extract_text(&status.content),
    })
}

#[async_trait::async_trait]
impl SocialClient for MastodonClient {
    async fn verify_credentials(&self) -> Result<String> {
        let resp = self
            .authed(
                self.http
                    .get(self.url("/api/v1/accounts/verify_credentials")),
            )
            .send()
            .await?;
        let resp = Self::checked(resp, "verify credentials").await?;
        let me: ApiCredentials = resp
            .json()
            .await
            .map_err(|e| ModerationError::MalformedResponse(format!("credentials: {e}")))?;
        Ok(me.username)
    }

    async fn fetch_mentions(&self) -> Result<Vec<Notification>> {
        let resp = self
            .authed(self.http.get(self.url("/api/v1/notifications")))
            .query(&[("types[]", "mention")])
            .send()
            .await?;
        let resp = Self::checked(resp, "fetch notifications").await?;
        let raw: Vec<ApiNotification> = resp
            .json()
            .await
            .map_err(|e| ModerationError::MalformedResponse(format!("notifications: {e}")))?;
        Ok(raw.into_iter().filter_map(to_notification).collect())
    }

    async fn mute(&self, author_id: &str) -> Result<()> {
        self.account_action(author_id, "mute").await
    }

    async fn block(&self, author_id: &str) -> Result<()> {
        self.account_action(author_id, "block").await
    }

    async fn send_warning(
        &self,
        status_id: &str,
        text: &str,
        visibility: Visibility,
    ) -> Result<()> {
        self.post_status(text, Some(status_id), Some(visibility))
            .await
            .map(|_| ())
    }
}
