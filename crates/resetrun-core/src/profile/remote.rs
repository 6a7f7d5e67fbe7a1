//! Remote profile documents, one per identity.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use super::types::Profile;
use crate::error::RemoteError;
use crate::storage::RemoteConfig;

/// Where profiles are synchronized to.
///
/// `fetch` returns the raw document so the caller can validate it field by
/// field; `Ok(None)` means the identity has no document yet.
#[async_trait]
pub trait ProfileRemote: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn fetch(&self, uid: &str) -> Result<Option<Value>, RemoteError>;

    /// Merge `profile` into the stored document.
    async fn write(&self, uid: &str, profile: &Profile) -> Result<(), RemoteError>;
}

/// Serialized profile stamped with the write time.
fn stamped(profile: &Profile) -> Result<Value, RemoteError> {
    let mut doc = serde_json::to_value(profile).map_err(|e| RemoteError::Unavailable(e.to_string()))?;
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
    }
    Ok(doc)
}

/// Build the remote selected by configuration.
pub fn remote_from_config(config: &RemoteConfig) -> Result<Arc<dyn ProfileRemote>, RemoteError> {
    if !config.enabled {
        return Ok(Arc::new(OfflineRemote));
    }
    Ok(Arc::new(HttpProfileRemote::from_config(config)?))
}

/// JSON over HTTP: `GET`/`PUT {base}/profiles/{uid}`.
#[derive(Debug, Clone)]
pub struct HttpProfileRemote {
    client: Client,
    base: Url,
    api_token: Option<String>,
}

impl HttpProfileRemote {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Unavailable(format!(
                "'{base_url}' cannot be used as a base URL"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            api_token,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(
            &config.base_url,
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn profile_url(&self, uid: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("profiles").push(uid);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ProfileRemote for HttpProfileRemote {
    async fn fetch(&self, uid: &str) -> Result<Option<Value>, RemoteError> {
        let resp = self
            .authorize(self.client.get(self.profile_url(uid)))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = resp.text().await?;
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(|e| RemoteError::Malformed {
                        uid: uid.to_string(),
                        message: e.to_string(),
                    })
            }
            status => Err(RemoteError::Status {
                uid: uid.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn write(&self, uid: &str, profile: &Profile) -> Result<(), RemoteError> {
        let body = stamped(profile)?;
        let resp = self
            .authorize(self.client.put(self.profile_url(uid)))
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status {
                uid: uid.to_string(),
                status: resp.status().as_u16(),
            })
        }
    }
}

/// In-process document store with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryProfileRemote {
    docs: Mutex<HashMap<String, Value>>,
    fail_fetch: AtomicBool,
    fail_write: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryProfileRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uid: &str, doc: Value) {
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(uid.to_string(), doc);
    }

    pub fn doc(&self, uid: &str) -> Option<Value> {
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(uid)
            .cloned()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRemote for MemoryProfileRemote {
    async fn fetch(&self, uid: &str) -> Result<Option<Value>, RemoteError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("fetch failure injected".into()));
        }
        Ok(self.doc(uid))
    }

    async fn write(&self, uid: &str, profile: &Profile) -> Result<(), RemoteError> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("write failure injected".into()));
        }
        let Value::Object(incoming) = stamped(profile)? else {
            return Err(RemoteError::Unavailable("profile is not an object".into()));
        };

        let mut docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        let doc = docs
            .entry(uid.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        match doc.as_object_mut() {
            Some(existing) => existing.extend(incoming),
            None => *doc = Value::Object(incoming),
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Remote store switched off: nothing is found, nothing is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl ProfileRemote for OfflineRemote {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn fetch(&self, _uid: &str) -> Result<Option<Value>, RemoteError> {
        Ok(None)
    }

    async fn write(&self, _uid: &str, _profile: &Profile) -> Result<(), RemoteError> {
        Err(RemoteError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn remote(server: &mockito::ServerGuard, token: Option<&str>) -> HttpProfileRemote {
        HttpProfileRemote::new(
            &server.url(),
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/profiles/alice")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"onboardingComplete": true}"#)
            .create_async()
            .await;

        let doc = remote(&server, Some("secret")).fetch("alice").await.unwrap();
        assert_eq!(doc, Some(json!({"onboardingComplete": true})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_missing_profile_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/profiles/bob")
            .with_status(404)
            .create_async()
            .await;

        assert_eq!(remote(&server, None).fetch("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fetch_surfaces_server_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/profiles/alice")
            .with_status(503)
            .create_async()
            .await;

        let err = remote(&server, None).fetch("alice").await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn fetch_rejects_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/profiles/alice")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = remote(&server, None).fetch("alice").await.unwrap_err();
        assert!(matches!(err, RemoteError::Malformed { .. }));
    }

    #[tokio::test]
    async fn write_puts_stamped_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/profiles/alice")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"onboardingComplete": false, "preferences": null})),
                Matcher::Regex("\"updatedAt\"".into()),
            ]))
            .with_status(204)
            .create_async()
            .await;

        let profile = Profile::from_local(None, None);
        remote(&server, None).write("alice", &profile).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn write_reports_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/profiles/alice")
            .with_status(403)
            .create_async()
            .await;

        let profile = Profile::from_local(None, None);
        let err = remote(&server, None).write("alice", &profile).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 403, .. }));
    }

    #[test]
    fn uid_is_a_single_path_segment() {
        let remote =
            HttpProfileRemote::new("http://localhost:8787/api", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            remote.profile_url("a/b c").as_str(),
            "http://localhost:8787/api/profiles/a%2Fb%20c"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(matches!(
            HttpProfileRemote::new("not a url", None, Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn disabled_config_builds_offline_remote() {
        let remote = remote_from_config(&RemoteConfig::default()).unwrap();
        assert!(!remote.is_enabled());
    }

    #[tokio::test]
    async fn memory_remote_merges_top_level_fields() {
        let remote = MemoryProfileRemote::new();
        remote.insert("alice", json!({"extra": 1, "onboardingComplete": true}));

        remote
            .write("alice", &Profile::from_local(None, None))
            .await
            .unwrap();
        let doc = remote.fetch("alice").await.unwrap().unwrap();
        assert_eq!(doc["extra"], 1);
        assert_eq!(doc["onboardingComplete"], false);
        assert!(doc.get("updatedAt").is_some());
        assert_eq!(remote.write_count(), 1);

        remote.set_fail_fetch(true);
        assert!(remote.fetch("alice").await.is_err());
    }
}
