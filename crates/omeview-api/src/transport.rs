// Shared transport for all three endpoint families.
//
// One `reqwest::Client` per session: the cookie jar must be shared across
// the catalog, gateway, and ROI-write surfaces because the CSRF session
// cookie set during authentication applies to all of them. Redirects are
// followed (icons and thumbnails may live behind one).

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use reqwest::cookie::Jar;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Fixed per-request timeout. Timeouts are reported like any other
/// transport failure; callers see no distinction.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Transport configuration for building the session's HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Session-scoped cookie jar, shared by every request.
    pub cookie_jar: Arc<Jar>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
            cookie_jar: Arc::new(Jar::default()),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .cookie_provider(Arc::clone(&self.cookie_jar))
            .user_agent(concat!("omeview/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}

/// Raw HTTP request sender shared by the catalog and gateway APIs.
///
/// Converts bodies to text, JSON, or decoded raster images, and classifies
/// every outcome into a single [`Error`]. Cheap to clone behind an `Arc`.
#[derive(Debug)]
pub struct RequestSender {
    http: reqwest::Client,
}

impl RequestSender {
    /// Create a sender from a [`TransportConfig`].
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    /// Create a sender from a pre-built `reqwest::Client`.
    ///
    /// The client should carry a cookie jar; POSTs to CSRF-protected
    /// endpoints fail without the session cookie.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send a GET request and return the body as UTF-8 text.
    pub async fn get_text(&self, url: &Url) -> Result<String, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }

    /// Send a GET request and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Send a GET request and decode the body as a raster image.
    pub async fn get_image(&self, url: &Url) -> Result<DynamicImage, Error> {
        debug!("GET {url} (image)");

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        image::load_from_memory(&bytes).map_err(|e| Error::ImageDecode(e.to_string()))
    }

    /// Send a POST request with an `application/x-www-form-urlencoded` body.
    ///
    /// The CSRF token and referer are caller-supplied; the catalog API owns
    /// minting and refreshing the token.
    pub async fn post_form(
        &self,
        url: &Url,
        body: String,
        referer: &str,
        token: &str,
    ) -> Result<String, Error> {
        debug!("POST {url} (form)");

        let resp = self
            .http
            .post(url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("X-CSRFToken", token)
            .header("Referer", referer)
            .body(body)
            .send()
            .await?;

        self.read_text(url, resp).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &B,
        referer: &str,
        token: &str,
    ) -> Result<String, Error> {
        debug!("POST {url} (json)");

        let resp = self
            .http
            .post(url.clone())
            .header("X-CSRFToken", token)
            .header("Referer", referer)
            .json(body)
            .send()
            .await?;

        self.read_text(url, resp).await
    }

    /// Probe a URL with a GET request. Never errors.
    pub async fn is_reachable(&self, url: &Url) -> bool {
        match self.http.get(url.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("probe of {url} failed: {e}");
                false
            }
        }
    }

    async fn read_text(&self, url: &Url, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}
