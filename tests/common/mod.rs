//! Common test utilities for completion-sync integration tests

#![allow(dead_code)]

use completion_sync::fetcher::asset_name;
use completion_sync::{Config, Syncer, TempRegistry};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scratch layout for one test run
pub struct TestDirs {
    /// Keeps the root alive for the duration of the test
    pub root: tempfile::TempDir,
    /// Output directory handed to the syncer
    pub output: PathBuf,
    /// Where the temp registry creates its directories
    pub scratch: PathBuf,
}

impl TestDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("zsh");
        let scratch = root.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        Self {
            root,
            output,
            scratch,
        }
    }

    /// Number of entries left in the scratch directory
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch).unwrap().count()
    }

    /// Sorted file names in the output directory
    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Config pointing both API and download hosts at `server`
pub fn test_config(server: &MockServer, dirs: &TestDirs) -> Config {
    Config {
        output_dir: dirs.output.clone(),
        api_base_url: server.uri(),
        download_base_url: server.uri(),
        max_concurrent_tasks: 4,
        request_timeout: Duration::from_secs(20),
        ..Default::default()
    }
}

/// Syncer whose temp dirs land in `dirs.scratch`
pub fn test_syncer(config: Config, dirs: &TestDirs) -> Syncer {
    Syncer::with_temp_registry(config, TempRegistry::in_dir(&dirs.scratch)).unwrap()
}

fn append_files<W: std::io::Write>(builder: &mut tar::Builder<W>, files: &[(&str, &[u8])]) {
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
}

/// gzip tarball bytes with the given files
pub fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_files(&mut builder, files);
    builder.into_inner().unwrap().finish().unwrap()
}

/// xz tarball bytes with the given files
pub fn tar_xz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    let mut builder = tar::Builder::new(encoder);
    append_files(&mut builder, files);
    builder.into_inner().unwrap().finish().unwrap()
}

/// Mount the latest-release endpoint for `repo`
pub async fn mount_latest(server: &MockServer, repo: &str, tag: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{repo}/releases/latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tag_name": tag,
            "draft": false,
        })))
        .mount(server)
        .await;
}

/// Mount the asset download for `repo` at `tag` with the given response
pub async fn mount_asset(server: &MockServer, repo: &str, tag: &str, response: ResponseTemplate) {
    let asset = asset_name(repo, tag);
    Mock::given(method("GET"))
        .and(path(format!("/{repo}/releases/download/{tag}/{asset}")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount both endpoints of a working release
pub async fn mount_release(server: &MockServer, repo: &str, tag: &str, archive: Vec<u8>) {
    mount_latest(server, repo, tag).await;
    mount_asset(
        server,
        repo,
        tag,
        ResponseTemplate::new(200).set_body_bytes(archive),
    )
    .await;
}

/// Read a file from the output directory
pub fn read_output(dirs: &TestDirs, name: &str) -> Vec<u8> {
    std::fs::read(dirs.output.join(name)).unwrap()
}

/// Whether `dir` contains leftover staging files
pub fn has_part_files(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().any(|e| {
        e.unwrap()
            .file_name()
            .to_string_lossy()
            .ends_with(".completion-sync.part")
    })
}
