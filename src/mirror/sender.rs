use reqwest::Client;
use thiserror::Error;

use crate::mirror::sender::entries::{ApiResponse, FsGetData, FsListData, LoginData, RemoteEntry};

pub(crate) mod entries;

/// User agent sent with every request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Failures talking to the remote API.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    /// The server rejected the credentials. Fatal for the whole run.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// A directory listing was rejected. The walker skips the subtree.
    #[error("listing `{path}` failed: {reason}")]
    Listing { path: String, reason: String },
    /// The legacy per-file signature lookup was rejected.
    #[error("file info for `{path}` failed: {reason}")]
    FileInfo { path: String, reason: String },
    /// Transport or decode failure underneath any endpoint.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// The sender shared by every component that talks to the remote host. Wraps
/// one [Client] so all requests reuse the same connection pool.
#[derive(Debug, Clone)]
pub(crate) struct RequestSender {
    client: Client,
    /// Host base, no trailing slash.
    host: String,
}

impl RequestSender {
    pub(crate) fn new(host: &str) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(RequestSender {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    /// The shared HTTP client, for the download workers.
    pub(crate) fn client(&self) -> Client {
        self.client.clone()
    }

    /// Exchanges credentials for a session token.
    pub(crate) async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let response: ApiResponse<LoginData> = self
            .client
            .post(format!("{}/api/auth/login", self.host))
            .form(&[("Username", username), ("Password", password)])
            .send()
            .await?
            .json()
            .await?;

        match response.data {
            Some(data) if response.code == 200 => Ok(data.token),
            _ => Err(ApiError::Auth(response.message)),
        }
    }

    /// Lists the children of a remote directory. The whole directory comes
    /// back in one response; an empty directory yields an empty vec.
    pub(crate) async fn list(&self, token: &str, path: &str) -> Result<Vec<RemoteEntry>, ApiError> {
        let response: ApiResponse<FsListData> = self
            .client
            .post(format!("{}/api/fs/list", self.host))
            .header("Authorization", token)
            .form(&[("path", path)])
            .send()
            .await?
            .json()
            .await?;

        match response.data {
            Some(data) if response.code == 200 => Ok(data.content.unwrap_or_default()),
            _ => Err(ApiError::Listing {
                path: path.to_string(),
                reason: response.message,
            }),
        }
    }

    /// Fetches the access signature for a single file. Legacy fallback for
    /// listings that carry no signature; one extra round trip per file.
    pub(crate) async fn file_info(&self, token: &str, path: &str) -> Result<FsGetData, ApiError> {
        let response: ApiResponse<FsGetData> = self
            .client
            .post(format!("{}/api/fs/get", self.host))
            .header("Authorization", token)
            .form(&[("path", path)])
            .send()
            .await?
            .json()
            .await?;

        match response.data {
            Some(data) if response.code == 200 => Ok(data),
            _ => Err(ApiError::FileInfo {
                path: path.to_string(),
                reason: response.message,
            }),
        }
    }

    /// Builds the direct-access URL for a remote file, signed when a
    /// signature is available.
    pub(crate) fn download_url(&self, remote_path: &str, name: &str, sign: &str) -> String {
        let mut url = format!("{}/d{}/{}", self.host, remote_path, name);
        if !sign.is_empty() {
            url.push_str("?sign=");
            url.push_str(sign);
        }
        url
    }
}
