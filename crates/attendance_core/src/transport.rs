//! Backend transport: the three reads/writes the controller needs, and the
//! reqwest implementation that talks to the spreadsheet endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Identity,
    protocol::{BackendAction, CurrentCheckinResponse, RoutesResponse, WriteRequest},
};
use tracing::debug;

#[async_trait]
pub trait AttendanceBackend: Send + Sync {
    async fn fetch_routes(&self, identity: &Identity) -> Result<RoutesResponse>;
    async fn fetch_current_checkin(&self, identity: &Identity) -> Result<CurrentCheckinResponse>;
    /// Delivers a write. The response body is never inspected.
    async fn post_write(&self, request: &WriteRequest) -> Result<()>;
}

pub struct HttpBackend {
    http: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build backend http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    fn read_query<'a>(action: BackendAction, identity: &'a Identity) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("action", action.as_str())];
        if !identity.is_unknown() {
            query.push(("salespersonName", identity.as_str()));
        }
        query
    }
}

#[async_trait]
impl AttendanceBackend for HttpBackend {
    async fn fetch_routes(&self, identity: &Identity) -> Result<RoutesResponse> {
        debug!(endpoint = %self.endpoint, "fetching routes");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&Self::read_query(BackendAction::Routes, identity))
            .send()
            .await
            .context("routes request failed")?
            .error_for_status()?
            .json()
            .await
            .context("malformed routes response")?;
        Ok(response)
    }

    async fn fetch_current_checkin(&self, identity: &Identity) -> Result<CurrentCheckinResponse> {
        debug!(endpoint = %self.endpoint, "fetching current check-in");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&Self::read_query(BackendAction::CurrentCheckin, identity))
            .send()
            .await
            .context("current check-in request failed")?
            .error_for_status()?
            .json()
            .await
            .context("malformed current check-in response")?;
        Ok(response)
    }

    async fn post_write(&self, request: &WriteRequest) -> Result<()> {
        let action = request.action();
        debug!(endpoint = %self.endpoint, %action, "posting write");
        self.http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .with_context(|| format!("{action} request failed"))?
            .error_for_status()?;
        Ok(())
    }
}
