// Authentication against the discovered login endpoint.
//
// The POST body carries the password url-encoded; the composed body is wiped
// after the request is handed to the transport. A declined credential prompt
// short-circuits before any network call and yields `Cancelled`, which UI
// layers treat as a silent dismissal rather than an error.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::CatalogApi;

/// Username and password pair for the login POST.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// External collaborator that prompts the user for credentials.
///
/// Returning `None` means the prompt was declined; login then reports
/// [`LoginOutcome::Cancelled`] without touching the network.
pub trait CredentialProvider: Send + Sync {
    fn request_credentials(&self) -> Option<Credentials>;
}

/// Typed login result. `Failed` and `Cancelled` are distinct on purpose:
/// the UI shows an error for the former and stays silent for the latter.
#[derive(Debug)]
pub enum LoginOutcome {
    Success(SessionDetails),
    Failed,
    Cancelled,
}

/// Details of the authenticated session, read from the login response's
/// event context. Every member is optional; success is judged by the HTTP
/// status and body parseability alone.
#[derive(Debug, Clone, Default)]
pub struct SessionDetails {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub session_uuid: Option<String>,
    pub group_id: Option<i64>,
}

impl SessionDetails {
    fn from_body(body: &Value) -> Self {
        let context = &body["eventContext"];
        Self {
            user_id: context["userId"].as_i64(),
            username: context["userName"].as_str().map(str::to_owned),
            session_uuid: context["sessionUuid"].as_str().map(str::to_owned),
            group_id: context["groupId"].as_i64(),
        }
    }
}

impl CatalogApi {
    /// Authenticate to the server.
    ///
    /// Explicit `credentials` take precedence; without them the `prompt`
    /// collaborator is asked. No network request is made when the prompt
    /// declines. On success the CSRF token is refreshed, because the server
    /// rotates it with the new session cookie.
    pub async fn login(
        &self,
        credentials: Option<Credentials>,
        prompt: &dyn CredentialProvider,
    ) -> LoginOutcome {
        let Some(credentials) = credentials.or_else(|| prompt.request_credentials()) else {
            debug!("login cancelled before any request");
            return LoginOutcome::Cancelled;
        };

        let mut encoded_password: String =
            form_urlencoded::byte_serialize(credentials.password.expose_secret().as_bytes())
                .collect();
        let mut body = format!(
            "server={}&username={}&password={encoded_password}",
            self.server_id(),
            credentials.username
        );
        encoded_password.zeroize();

        let login_url = self.endpoints().login.clone();
        let token = self.token();
        let response = self
            .sender()
            .post_form(&login_url, body.clone(), login_url.as_str(), &token)
            .await;
        body.zeroize();

        match response {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(parsed) => {
                    self.refresh_token().await;
                    LoginOutcome::Success(SessionDetails::from_body(&parsed))
                }
                Err(e) => {
                    warn!("login response was not parseable: {e}");
                    LoginOutcome::Failed
                }
            },
            Err(e) => {
                warn!("login against {login_url} failed: {e}");
                LoginOutcome::Failed
            }
        }
    }

    /// Probe whether the server can be browsed without authenticating.
    pub async fn can_skip_authentication(&self) -> bool {
        self.sender().is_reachable(&self.endpoints().projects).await
    }

    async fn refresh_token(&self) {
        match self
            .sender()
            .get_json::<super::TokenResponse>(&self.endpoints().token)
            .await
        {
            Ok(token) => self.set_token(token.data),
            Err(e) => warn!("token refresh after login failed, keeping old token: {e}"),
        }
    }
}
