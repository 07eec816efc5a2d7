//! REST adapter for an RDFox server.

use super::ReasonerPort;
use crate::error::{ConnectorError, Result};
use crate::rdf::query::{QueryLanguage, ResultFormat};
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the reasoner.
#[derive(Debug, Clone)]
pub struct ReasonerServerData {
    pub host: String,
    pub port: u16,
    /// Base64 encoded `user:password`
    pub auth_base64: String,
    pub data_store: String,
}

pub struct RdfoxAdapter {
    base_url: String,
    auth_header: String,
    data_store: String,
    client: Client,
}

impl RdfoxAdapter {
    pub fn new(server: &ReasonerServerData) -> Result<Self> {
        if server.data_store.is_empty() {
            return Err(ConnectorError::Configuration(
                "Data store name must be provided".to_string(),
            ));
        }
        let client = Client::builder().timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).build()?;

        Ok(Self {
            base_url: format!("http://{}:{}", server.host, server.port),
            auth_header: format!("Basic {}", server.auth_base64),
            data_store: server.data_store.clone(),
            client,
        })
    }

    pub fn data_store(&self) -> &str {
        &self.data_store
    }

    /// Creates the datastore unless it already exists.
    pub fn initialize(&self) -> Result<()> {
        info!("Initializing reasoner datastore '{}'", self.data_store);
        if self.check_data_store() {
            info!("Datastore '{}' already exists", self.data_store);
            return Ok(());
        }

        let response = self
            .request(self.client.post(self.datastore_url("")))
            .header(CONTENT_TYPE, "application/json")
            .send()?;
        if !response.status().is_success() {
            return Err(ConnectorError::Unavailable(format!(
                "Failed to create datastore '{}': {}",
                self.data_store,
                response.status()
            )));
        }
        info!("Datastore '{}' created", self.data_store);
        Ok(())
    }

    fn datastore_url(&self, suffix: &str) -> String {
        format!("{}/datastores/{}{}", self.base_url, self.data_store, suffix)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, &self.auth_header)
    }

    /// Sends the request and returns the body of a successful response.
    fn send(&self, builder: RequestBuilder) -> Option<String> {
        let response = match builder.send() {
            Ok(response) => response,
            Err(e) => {
                debug!("Reasoner request failed: {}", e);
                return None;
            }
        };
        let status = response.status();
        let body = response.text().unwrap_or_default();
        if status.is_success() {
            Some(body)
        } else {
            debug!("Reasoner answered {}: {}", status, body);
            None
        }
    }
}

impl ReasonerPort for RdfoxAdapter {
    fn check_data_store(&self) -> bool {
        let builder = self
            .request(self.client.get(format!("{}/datastores", self.base_url)))
            .header(ACCEPT, "text/csv; charset=UTF-8");
        self.send(builder).is_some_and(|body| body.contains(&self.data_store))
    }

    fn load_data(&self, data: &str, content_type: &str) -> bool {
        let builder = self
            .request(self.client.post(self.datastore_url("/content")))
            .header(CONTENT_TYPE, content_type)
            .body(data.to_string());
        self.send(builder).is_some()
    }

    fn query_data_as(&self, query: &str, language: QueryLanguage, format: ResultFormat) -> String {
        let builder = self
            .request(self.client.post(self.datastore_url("/sparql")))
            .header(CONTENT_TYPE, language.content_type())
            .header(ACCEPT, format.accept_type())
            .body(query.to_string());
        self.send(builder).unwrap_or_default()
    }
}
