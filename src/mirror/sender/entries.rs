use serde::Deserialize;

/// Envelope every API endpoint wraps its payload in. A request only counts
/// as successful when `code` is 200, regardless of the HTTP status.
#[derive(Deserialize, Debug)]
pub(crate) struct ApiResponse<T> {
    /// Application-level status code.
    pub(crate) code: i64,
    /// Human-readable outcome, filled on failures.
    #[serde(default)]
    pub(crate) message: String,
    /// Endpoint payload; absent on failures.
    pub(crate) data: Option<T>,
}

/// Payload of `/api/auth/login`.
#[derive(Deserialize, Debug)]
pub(crate) struct LoginData {
    /// Session token, sent back verbatim in the `Authorization` header.
    pub(crate) token: String,
}

/// Payload of `/api/fs/list`.
#[derive(Deserialize, Debug)]
pub(crate) struct FsListData {
    /// Child entries of the listed directory. The server sends `null` for an
    /// empty directory, so this is optional rather than an empty list.
    #[serde(default)]
    pub(crate) content: Option<Vec<RemoteEntry>>,
}

/// One child of a listed remote directory.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct RemoteEntry {
    /// File or directory name, no path separators.
    pub(crate) name: String,
    /// Whether the entry is a directory.
    pub(crate) is_dir: bool,
    /// Pre-computed access signature; empty when the listing carried none.
    #[serde(default)]
    pub(crate) sign: String,
}

/// Payload of `/api/fs/get`, trimmed to the one field the legacy signature
/// fallback needs.
#[derive(Deserialize, Debug)]
pub(crate) struct FsGetData {
    #[serde(default)]
    pub(crate) sign: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_entries() {
        let body = r#"{
            "code": 200,
            "message": "success",
            "data": {
                "content": [
                    {"name": "movie.mp4", "is_dir": false, "sign": "abc"},
                    {"name": "extras", "is_dir": true}
                ]
            }
        }"#;
        let resp: ApiResponse<FsListData> = serde_json::from_str(body).unwrap();
        assert_eq!(resp.code, 200);
        let content = resp.data.unwrap().content.unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0].name, "movie.mp4");
        assert_eq!(content[0].sign, "abc");
        assert!(content[1].is_dir);
        assert!(content[1].sign.is_empty());
    }

    #[test]
    fn null_content_means_empty_directory() {
        let body = r#"{"code": 200, "message": "success", "data": {"content": null}}"#;
        let resp: ApiResponse<FsListData> = serde_json::from_str(body).unwrap();
        assert!(resp.data.unwrap().content.is_none());
    }

    #[test]
    fn failure_envelope_has_no_data() {
        let body = r#"{"code": 500, "message": "object not found"}"#;
        let resp: ApiResponse<FsListData> = serde_json::from_str(body).unwrap();
        assert_eq!(resp.code, 500);
        assert_eq!(resp.message, "object not found");
        assert!(resp.data.is_none());
    }
}
