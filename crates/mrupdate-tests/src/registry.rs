//! mockito-backed Modrinth registry

use crate::fixtures::VersionFixture;
use mockito::{Matcher, Mock, Server, ServerGuard};
use mrupdate_lib::api::{LiveModrinthClient, RegistryConfig};
use mrupdate_lib::engine::UpdateEngine;
use mrupdate_lib::modpack::hashing::sha1_hex;
use mrupdate_lib::networking::{NetworkingConfig, NetworkingManager};
use serde_json::json;
use std::sync::Arc;

/// Registry fake; unregistered routes answer 501, which the client treats
/// as "not found"
pub struct RegistryFixture {
    server: ServerGuard,
}

impl RegistryFixture {
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// A manifest-style download URL carrying `data/<id>/versions/`
    pub fn manifest_url(&self, project_id: &str, version_id: &str, file_name: &str) -> String {
        format!(
            "{}/data/{}/versions/{}/{}",
            self.server.url(),
            project_id,
            version_id,
            file_name
        )
    }

    pub fn cdn_url(&self, file_name: &str) -> String {
        format!("{}/cdn/{}", self.server.url(), file_name)
    }

    pub async fn project(
        &mut self,
        id: &str,
        slug: &str,
        title: &str,
        server_side: &str,
    ) -> Mock {
        let body = json!({
            "id": id,
            "slug": slug,
            "title": title,
            "client_side": "required",
            "server_side": server_side,
        });
        self.server
            .mock("GET", format!("/project/{}", id).as_str())
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    pub async fn missing_project(&mut self, id: &str) -> Mock {
        self.server
            .mock("GET", format!("/project/{}", id).as_str())
            .with_status(404)
            .with_body(r#"{"error":"not_found"}"#)
            .create_async()
            .await
    }

    pub async fn versions(&mut self, project_id: &str, versions: &[VersionFixture]) -> Mock {
        let body: Vec<_> = versions.iter().map(VersionFixture::to_json).collect();
        self.server
            .mock("GET", format!("/project/{}/version", project_id).as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(serde_json::Value::Array(body).to_string())
            .create_async()
            .await
    }

    pub async fn hash(&mut self, sha1: &str, version: &VersionFixture) -> Mock {
        self.server
            .mock("GET", format!("/version_file/{}", sha1).as_str())
            .match_query(Matcher::UrlEncoded("algorithm".into(), "sha1".into()))
            .with_status(200)
            .with_body(version.to_json().to_string())
            .create_async()
            .await
    }

    /// Serve `contents` at `url`'s path; returns the mock and the SHA-1
    pub async fn file(&mut self, url: &str, contents: &[u8]) -> (Mock, String) {
        let path = self.path_of(url);
        let mock = self
            .server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_body(contents)
            .create_async()
            .await;
        (mock, sha1_hex(contents))
    }

    pub async fn failing_file(&mut self, url: &str, status: usize) -> Mock {
        let path = self.path_of(url);
        self.server
            .mock("GET", path.as_str())
            .with_status(status)
            .create_async()
            .await
    }

    fn path_of(&self, url: &str) -> String {
        url.strip_prefix(&self.server.url())
            .unwrap_or(url)
            .to_string()
    }

    /// Engine over the live client with `jobs` concurrent lookups
    pub fn engine(&self, jobs: usize) -> UpdateEngine<LiveModrinthClient> {
        let networking = NetworkingManager::new(NetworkingConfig::from_settings(jobs, 30))
            .unwrap_or_else(|err| panic!("networking setup failed: {}", err));
        let client = LiveModrinthClient::new(
            networking.client().clone(),
            RegistryConfig {
                base_url: self.server.url(),
            },
        );
        UpdateEngine::new(Arc::new(client), networking)
    }
}
