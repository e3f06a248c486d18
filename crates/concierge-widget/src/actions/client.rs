//! Action backend client

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::debug;
use url::Url;

use super::types::{ActionDefinition, ActionList, ActionResult, FlowContext};
use crate::config::WidgetConfig;
use crate::error::{Error, Result};

/// REST endpoints the widget consumes
#[async_trait]
pub trait ActionBackend: Send + Sync {
    /// `GET /actions?locale=<code>`
    async fn fetch_actions(&self, locale: &str) -> Result<Vec<ActionDefinition>>;

    /// `POST /actions/:actionId` with a bearer session token
    async fn submit_action(
        &self,
        action_id: &str,
        token: &str,
        body: &FlowContext,
    ) -> Result<ActionResult>;
}

/// HTTP implementation of [`ActionBackend`]
#[derive(Debug, Clone)]
pub struct HttpActionBackend {
    client: reqwest::Client,
    actions_url: Url,
}

impl HttpActionBackend {
    /// Build a client for the configured origin
    pub fn new(config: &WidgetConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            actions_url: config.endpoint("actions")?,
        })
    }

    fn action_url(&self, action_id: &str) -> Result<Url> {
        let mut url = self.actions_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("cannot append to {}", self.actions_url)))?
            .push(action_id);
        Ok(url)
    }
}

#[async_trait]
impl ActionBackend for HttpActionBackend {
    async fn fetch_actions(&self, locale: &str) -> Result<Vec<ActionDefinition>> {
        let response = self
            .client
            .get(self.actions_url.clone())
            .query(&[("locale", locale)])
            .send()
            .await?
            .error_for_status()?;

        let list: ActionList = response.json().await?;
        debug!(locale, count = list.actions.len(), "Fetched action definitions");
        Ok(list.actions)
    }

    async fn submit_action(
        &self,
        action_id: &str,
        token: &str,
        body: &FlowContext,
    ) -> Result<ActionResult> {
        let response = self
            .client
            .post(self.action_url(action_id)?)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        // Business failures come back as 4xx with an ActionResult body.
        match serde_json::from_slice::<ActionResult>(&bytes) {
            Ok(result) => Ok(result),
            Err(_) if !status.is_success() => Err(Error::Http {
                status: status.as_u16(),
            }),
            Err(e) => Err(Error::Decode(e.to_string())),
        }
    }
}
