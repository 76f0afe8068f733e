// Entity catalog API.
//
// Session establishment is a strict sequence: index document, endpoint map,
// server id/port lookup, CSRF token fetch. Any step failing fails `connect`
// and the session is permanently unusable; callers reconnect from scratch.
// The endpoint map is immutable after discovery, the token is replaced after
// a successful login.

mod annotations;
mod auth;
mod listings;
mod orphaned;
mod rois;
mod search;

pub use auth::{CredentialProvider, Credentials, LoginOutcome, SessionDetails};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::error::Error;
use crate::monitor::LoadMonitor;
use crate::transport::RequestSender;

/// Default bound on concurrent orphaned-image detail requests.
pub const DEFAULT_ORPHANED_BATCH_SIZE: usize = 16;

const OWNERS_URL_KEY: &str = "url:experimenters";
const GROUPS_URL_KEY: &str = "url:experimentergroups";
const PROJECTS_URL_KEY: &str = "url:projects";
const DATASETS_URL_KEY: &str = "url:datasets";
const IMAGES_URL_KEY: &str = "url:images";
const SCREENS_URL_KEY: &str = "url:screens";
const PLATES_URL_KEY: &str = "url:plates";
const PLATE_ACQUISITIONS_URL_KEY: &str = "url:plateacquisitions";
const TOKEN_URL_KEY: &str = "url:token";
const SERVERS_URL_KEY: &str = "url:servers";
const LOGIN_URL_KEY: &str = "url:login";

/// Index document at `{host}/api/`, listing the available API versions.
#[derive(Debug, Deserialize)]
struct ApiIndex {
    data: Vec<ApiVersion>,
}

#[derive(Debug, Deserialize)]
struct ApiVersion {
    #[serde(rename = "url:base")]
    base: String,
}

#[derive(Debug, Deserialize)]
struct ServerList {
    data: Vec<ServerInfo>,
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    id: i64,
    port: u16,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    data: String,
}

/// Absolute URIs for the small fixed set of catalog endpoints, resolved once
/// from the server's index document.
#[derive(Debug, Clone)]
pub(crate) struct EndpointMap {
    pub owners: Url,
    pub groups: Url,
    pub projects: Url,
    pub datasets: Url,
    pub images: Url,
    pub screens: Url,
    pub plates: Url,
    pub plate_acquisitions: Url,
    pub token: Url,
    pub servers: Url,
    pub login: Url,
}

impl EndpointMap {
    fn from_raw(raw: &HashMap<String, String>) -> Result<Self, Error> {
        fn take(raw: &HashMap<String, String>, key: &'static str) -> Result<Url, Error> {
            let value = raw.get(key).ok_or(Error::MissingEndpoint { key })?;
            Ok(Url::parse(value)?)
        }

        Ok(Self {
            owners: take(raw, OWNERS_URL_KEY)?,
            groups: take(raw, GROUPS_URL_KEY)?,
            projects: take(raw, PROJECTS_URL_KEY)?,
            datasets: take(raw, DATASETS_URL_KEY)?,
            images: take(raw, IMAGES_URL_KEY)?,
            screens: take(raw, SCREENS_URL_KEY)?,
            plates: take(raw, PLATES_URL_KEY)?,
            plate_acquisitions: take(raw, PLATE_ACQUISITIONS_URL_KEY)?,
            token: take(raw, TOKEN_URL_KEY)?,
            servers: take(raw, SERVERS_URL_KEY)?,
            login: take(raw, LOGIN_URL_KEY)?,
        })
    }
}

/// Typed client for the catalog endpoint family: authentication, entity
/// listings, single-entity fetches, ROIs, and the orphaned-image population
/// machinery.
#[derive(Debug)]
pub struct CatalogApi {
    sender: Arc<RequestSender>,
    monitor: Arc<LoadMonitor>,
    host: Url,
    endpoints: EndpointMap,
    server_id: i64,
    port: u16,
    token: RwLock<String>,
    orphaned_batch_size: usize,
}

impl CatalogApi {
    /// Establish a catalog session against `host`.
    ///
    /// Runs endpoint discovery, the server id/port lookup, and the CSRF
    /// token fetch. Any failure is fatal: the returned error cannot be
    /// retried on this instance, the caller must call `connect` again.
    pub async fn connect(
        sender: Arc<RequestSender>,
        monitor: Arc<LoadMonitor>,
        host: Url,
        orphaned_batch_size: usize,
    ) -> Result<Self, Error> {
        let index_url = host.join("api/")?;
        let index: ApiIndex = sender.get_json(&index_url).await?;
        let latest = index.data.last().ok_or_else(|| Error::SessionInit {
            message: format!("no API versions advertised at {index_url}"),
        })?;
        let base_url = Url::parse(&latest.base)?;

        let raw: HashMap<String, String> = sender.get_json(&base_url).await?;
        let endpoints = EndpointMap::from_raw(&raw).inspect_err(|e| {
            error!("endpoint discovery at {base_url} failed: {e}");
        })?;

        let servers: ServerList = sender.get_json(&endpoints.servers).await?;
        let server = servers.data.first().ok_or_else(|| Error::SessionInit {
            message: format!("no servers listed at {}", endpoints.servers),
        })?;

        let token: TokenResponse = sender.get_json(&endpoints.token).await?;
        debug!("catalog session ready against {host} (server {})", server.id);

        Ok(Self {
            sender,
            monitor,
            host,
            server_id: server.id,
            port: server.port,
            token: RwLock::new(token.data),
            endpoints,
            orphaned_batch_size,
        })
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    pub fn server_id(&self) -> i64 {
        self.server_id
    }

    pub fn server_port(&self) -> u16 {
        self.port
    }

    /// The CSRF token currently attached to write requests.
    pub fn token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_token(&self, token: String) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = token;
    }

    pub(crate) fn sender(&self) -> &RequestSender {
        &self.sender
    }

    pub(crate) fn monitor(&self) -> &LoadMonitor {
        &self.monitor
    }

    pub(crate) fn endpoints(&self) -> &EndpointMap {
        &self.endpoints
    }

    pub(crate) fn orphaned_batch_size(&self) -> usize {
        self.orphaned_batch_size.max(1)
    }
}
