//! Client for the remote user directory service.
//!
//! All record data lives in a third-party REST API; this module owns the
//! record shape and the four pass-through calls (list, fetch, replace,
//! delete). Responses with a non-success status are reported as errors so
//! callers treat them exactly like transport failures.

pub mod dispatch;

use crate::error::{Result, simple_error};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One user record as the directory service returns it.
///
/// The service payload carries more (nested address, company); only the
/// fields the screens show are modeled, and unknown fields are ignored on
/// deserialization. `id` is assigned by the service and never changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

/// Blocking HTTP client bound to one directory base URL.
pub struct DirectoryClient {
    base_url: Url,
    http: Client,
}

impl DirectoryClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        // No request timeout: a stalled request leaves its screen loading.
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(None)
            .build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Into::into)
    }

    /// `GET /users` — the full collection, in service order.
    pub fn list_users(&self) -> Result<Vec<UserRecord>> {
        let url = self.endpoint("users")?;
        let response = self.http.get(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(simple_error(format_http_error("GET", &url, response.status())));
        }
        let users: Vec<UserRecord> = response.json()?;
        debug!("listed {} users from {}", users.len(), url);
        Ok(users)
    }

    /// `GET /users/{id}` — one record, or an error if absent.
    pub fn fetch_user(&self, id: u64) -> Result<UserRecord> {
        let url = self.endpoint(&format!("users/{id}"))?;
        let response = self.http.get(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(simple_error(format_http_error("GET", &url, response.status())));
        }
        response.json().map_err(Into::into)
    }

    /// `PUT /users/{id}` — replace the record with a full body.
    ///
    /// The service echoes the updated record; the echo is parsed but the
    /// caller already applied the change locally before this call resolves.
    pub fn update_user(&self, record: &UserRecord) -> Result<UserRecord> {
        let url = self.endpoint(&format!("users/{}", record.id))?;
        let response = self.http.put(url.clone()).json(record).send()?;
        if !response.status().is_success() {
            return Err(simple_error(format_http_error("PUT", &url, response.status())));
        }
        response.json().map_err(Into::into)
    }

    /// `DELETE /users/{id}` — no response body required.
    pub fn delete_user(&self, id: u64) -> Result<()> {
        let url = self.endpoint(&format!("users/{id}"))?;
        let response = self.http.delete(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(simple_error(format_http_error("DELETE", &url, response.status())));
        }
        Ok(())
    }
}

fn format_http_error(method: &str, url: &Url, status: StatusCode) -> String {
    format!("{method} {url} returned non-success status: {status}")
}
