use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::AdminError;
use crate::models::{LoginRequest, LoginResponse, PasswordChange, SiteTexts, Stats};
use crate::session::Session;

const LOGIN_REJECTED: &str = "Utilizator sau parolă incorectă!";
const VALIDATION_FAILED: &str = "Validare eșuată.";

/// Authenticated HTTP access to the admin backend.
///
/// Cheap to clone: the `reqwest::Client` pool and the session are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, session)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Starts a request carrying the current bearer token, if any.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `builder` and classifies the status. `401` always wins.
    pub async fn execute(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response, AdminError> {
        let response = builder.send().await.map_err(|e| {
            warn!("Request to {endpoint} failed: {e}");
            AdminError::transport(endpoint, e)
        })?;

        let status = response.status();
        debug!("{endpoint} -> {status}");

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(AdminError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(AdminError::NotFound { endpoint: endpoint.to_string() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = server_error(&body).unwrap_or_else(|| format!("HTTP {status}"));
            warn!("{endpoint} answered {status}: {reason}");
            return Err(AdminError::unavailable(endpoint, reason));
        }
        Ok(response)
    }

    /// Reads a JSON body; an empty body reads as `null`.
    pub async fn read_json(&self, endpoint: &str, response: Response) -> Result<Value, AdminError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AdminError::transport(endpoint, e))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            error!("Undecodable body from {endpoint}: {e}");
            AdminError::decode(endpoint, e)
        })
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, AdminError> {
        let response = self.execute(path, self.request(Method::GET, path)).await?;
        self.read_json(path, response).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, AdminError> {
        let response = self
            .execute(path, self.request(Method::POST, path).json(body))
            .await?;
        self.read_json(path, response).await
    }

    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<(), AdminError> {
        self.execute(path, self.request(Method::DELETE, path).query(query))
            .await
            .map(drop)
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, AdminError> {
        let value = self.get_json(path).await?;
        decode_value(path, value)
    }

    // ── Authentication ───────────────────────────────────────────────────────

    /// Logs in and checks the fresh token against `/validate`.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AdminError> {
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        // Sent without credentials so a stale token cannot trigger expiry.
        let builder = self.http.post(self.url("login")).json(&body);
        let response = builder
            .send()
            .await
            .map_err(|e| AdminError::transport("login", e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AdminError::transport("login", e))?;
        let reply: LoginResponse = serde_json::from_slice(&bytes).unwrap_or_default();

        let token = match (status.is_success(), reply.token) {
            (true, Some(token)) if !token.trim().is_empty() => token,
            _ => {
                let message = reply.error.unwrap_or_else(|| LOGIN_REJECTED.to_string());
                warn!("Login rejected ({status}): {message}");
                return Err(AdminError::LoginRejected { message });
            }
        };

        self.session.init(token);
        match self.validate().await {
            Ok(true) => {
                info!("Logged in as {}", body.username);
                Ok(())
            }
            Ok(false) | Err(_) => {
                self.session.teardown();
                Err(AdminError::LoginRejected { message: VALIDATION_FAILED.to_string() })
            }
        }
    }

    /// True when the backend accepts the current token.
    pub async fn validate(&self) -> Result<bool, AdminError> {
        if !self.session.is_active() {
            return Ok(false);
        }
        match self.execute("validate", self.request(Method::GET, "validate")).await {
            Ok(_) => Ok(true),
            Err(AdminError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ── Dashboard and settings ───────────────────────────────────────────────

    pub async fn stats(&self) -> Result<Stats, AdminError> {
        self.get_typed("stats").await
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), AdminError> {
        let body = PasswordChange {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.post_json("admin-password", &body).await?;
        info!("Admin password changed");
        Ok(())
    }

    pub async fn site_texts(&self) -> Result<SiteTexts, AdminError> {
        let value = self.get_json("site-texts").await?;
        if value.is_null() {
            return Ok(SiteTexts::new());
        }
        decode_value("site-texts", value)
    }

    pub async fn save_site_texts(&self, texts: &SiteTexts) -> Result<(), AdminError> {
        self.post_json("site-texts", texts).await?;
        info!("Saved {} site text fields", texts.len());
        Ok(())
    }
}

pub(crate) fn decode_value<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, AdminError> {
    serde_json::from_value(value).map_err(|e| {
        error!("Unexpected payload from {endpoint}: {e}");
        AdminError::decode(endpoint, e)
    })
}

/// The backend reports failures as `{"error": "..."}`.
fn server_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let api = ApiClient::new("http://localhost:8001/api/", Session::new());
        assert_eq!(api.base_url(), "http://localhost:8001/api");
        assert_eq!(api.url("messages"), "http://localhost:8001/api/messages");
        assert_eq!(api.url("/admin/reviews"), "http://localhost:8001/api/admin/reviews");
    }

    #[test]
    fn server_error_text_is_extracted() {
        assert_eq!(server_error(r#"{"error":"Invalid"}"#).as_deref(), Some("Invalid"));
        assert_eq!(server_error("<html>oops</html>"), None);
        assert_eq!(server_error(r#"{"success":false}"#), None);
    }
}
