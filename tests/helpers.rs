#![allow(dead_code)]

use axum::Router;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

use foxmirror::{app_state::AppState, config::Config, mirror::router};

/// A mirror wired to a mock origin, with throwaway cache directories.
pub struct TestMirror {
    pub origin: MockServer,
    pub state: AppState,
    pub asset_dir: TempDir,
    pub package_dir: TempDir,
}

impl TestMirror {
    pub fn app(&self) -> Router {
        router(self.state.clone())
    }

    pub fn origin_url(&self, path: &str) -> String {
        format!("{}/{}", self.origin.uri(), path.trim_start_matches('/'))
    }

    /// Files in a cache directory, temp files included.
    pub fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub async fn test_mirror() -> TestMirror {
    let origin = MockServer::start().await;
    let asset_dir = tempfile::tempdir().unwrap();
    let package_dir = tempfile::tempdir().unwrap();

    let config = Config::new(
        "127.0.0.1:0",
        Url::parse(&format!("{}/", origin.uri())).unwrap(),
        asset_dir.path(),
        package_dir.path(),
        "html",
    );
    let state = AppState::from_config(config).unwrap();

    TestMirror {
        origin,
        state,
        asset_dir,
        package_dir,
    }
}
