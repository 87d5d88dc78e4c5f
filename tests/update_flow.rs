//! Integration tests for the update flow
//!
//! These tests drive the public `Updater` API against a local mock release
//! server and a temporary directory tree, checking the current reference, the
//! artifacts on disk and the ledger after each action.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use mockito::{Mock, Server, ServerGuard};
use tempfile::TempDir;
use url::Url;

use update_cursor::app::{
    ArtifactPattern, Ledger, LedgerAction, LedgerEntry, LocalVersion, Sha256Digest,
    UpdateOutcome, Updater, UpdaterSettings, VersionPolicy,
};
use update_cursor::errors::{AppError, SwitchError};

const RELEASE_PATH: &str = "/download/stable/linux-x64";
const HOP_PATH: &str = "/api/download/stable";

/// Create integration test settings rooted in `root`
fn create_test_settings(server: &ServerGuard, root: &Path) -> UpdaterSettings {
    UpdaterSettings {
        download_url: Url::parse(&format!("{}{}", server.url(), RELEASE_PATH)).unwrap(),
        download_dir: root.join("Downloads").join("Cursor"),
        pattern: ArtifactPattern::new("Cursor-<version>-x86_64.AppImage").unwrap(),
        current_link: root.join("Downloads").join("Cursor").join("Cursor.AppImage"),
        ledger_path: root.join("config").join("cursor-versions.log"),
        version_policy: VersionPolicy::NoUpdate,
    }
}

fn artifact_path(version: &str) -> String {
    format!("/production/Cursor-{}-x86_64.AppImage", version)
}

/// Release URL -> hop -> versioned artifact, for HEAD requests
async fn mock_resolution(server: &mut ServerGuard, version: &str) -> Vec<Mock> {
    vec![
        server
            .mock("HEAD", RELEASE_PATH)
            .with_status(302)
            .with_header("location", HOP_PATH)
            .create_async()
            .await,
        server
            .mock("HEAD", HOP_PATH)
            .with_status(307)
            .with_header("location", &artifact_path(version))
            .create_async()
            .await,
        server
            .mock("HEAD", artifact_path(version).as_str())
            .with_status(200)
            .create_async()
            .await,
    ]
}

/// The same chain for GET requests, each expected `hits` times
async fn mock_download(
    server: &mut ServerGuard,
    version: &str,
    body: &str,
    hits: usize,
) -> Vec<Mock> {
    vec![
        server
            .mock("GET", RELEASE_PATH)
            .with_status(302)
            .with_header("location", HOP_PATH)
            .expect(hits)
            .create_async()
            .await,
        server
            .mock("GET", HOP_PATH)
            .with_status(302)
            .with_header("location", &artifact_path(version))
            .expect(hits)
            .create_async()
            .await,
        server
            .mock("GET", artifact_path(version).as_str())
            .with_status(200)
            .with_body(body)
            .expect(hits)
            .create_async()
            .await,
    ]
}

async fn assert_all(mocks: &[Mock]) {
    for mock in mocks {
        mock.assert_async().await;
    }
}

fn link_target_name(link: &Path) -> String {
    std::fs::read_link(link)
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

#[tokio::test]
async fn test_fresh_install_through_redirect_chain() {
    let mut server = Server::new_async().await;
    let _resolve = mock_resolution(&mut server, "1.4.5").await;
    let download = mock_download(&mut server, "1.4.5", "cursor 1.4.5 appimage", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let updater = Updater::new(create_test_settings(&server, temp_dir.path())).unwrap();

    let report = updater.check().await.unwrap();
    assert_eq!(report.local, LocalVersion::Absent);
    assert_eq!(report.remote, "1.4.5");
    assert!(report.update_available);

    let installed = match updater.update().await.unwrap() {
        UpdateOutcome::Installed(report) => report,
        other => panic!("Expected an install, got {:?}", other),
    };
    assert_eq!(installed.version, "1.4.5");
    assert_eq!(
        installed.digest,
        Sha256Digest::of_bytes(b"cursor 1.4.5 appimage")
    );

    let link = &updater.settings().current_link;
    assert!(std::fs::symlink_metadata(link)
        .unwrap()
        .file_type()
        .is_symlink());
    assert_eq!(link_target_name(link), "Cursor-1.4.5-x86_64.AppImage");

    let entries = updater.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].version, "1.4.5");
    assert_eq!(entries[0].action, LedgerAction::Update);
    assert_eq!(entries[0].file_name, "Cursor-1.4.5-x86_64.AppImage");
    assert_eq!(entries[0].digest.len(), 64);

    assert_all(&download).await;
}

#[tokio::test]
async fn test_already_current_makes_no_download() {
    let mut server = Server::new_async().await;
    let _resolve = mock_resolution(&mut server, "1.4.5").await;
    let download = mock_download(&mut server, "1.4.5", "unused", 0).await;

    let temp_dir = TempDir::new().unwrap();
    let settings = create_test_settings(&server, temp_dir.path());
    std::fs::create_dir_all(&settings.download_dir).unwrap();
    let artifact = settings.download_dir.join("Cursor-1.4.5-x86_64.AppImage");
    std::fs::write(&artifact, "installed").unwrap();
    std::os::unix::fs::symlink(&artifact, &settings.current_link).unwrap();

    let updater = Updater::new(settings).unwrap();
    match updater.update().await.unwrap() {
        UpdateOutcome::AlreadyCurrent { local, remote } => {
            assert_eq!(local, LocalVersion::Installed("1.4.5".to_string()));
            assert_eq!(remote, "1.4.5");
        }
        other => panic!("Expected AlreadyCurrent, got {:?}", other),
    }

    assert!(updater.list().await.unwrap().is_empty());
    assert!(!updater.settings().ledger_path.exists());
    assert_all(&download).await;
}

#[tokio::test]
async fn test_switch_to_missing_version_records_nothing() {
    let server = Server::new_async().await;
    let temp_dir = TempDir::new().unwrap();
    let updater = Updater::new(create_test_settings(&server, temp_dir.path())).unwrap();

    let result = updater.switch("9.9.9").await;
    assert!(matches!(
        result,
        Err(AppError::Switch(SwitchError::VersionNotFound { .. }))
    ));
    assert!(updater.list().await.unwrap().is_empty());
    assert!(!updater.settings().current_link.exists());
}

#[tokio::test]
async fn test_upgrade_then_switch_back() {
    let mut server = Server::new_async().await;
    let _resolve = mock_resolution(&mut server, "1.5.0").await;
    let _download = mock_download(&mut server, "1.5.0", "new release", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let settings = create_test_settings(&server, temp_dir.path());
    std::fs::create_dir_all(&settings.download_dir).unwrap();
    let old = settings.download_dir.join("Cursor-1.4.5-x86_64.AppImage");
    std::fs::write(&old, "old release").unwrap();
    std::os::unix::fs::symlink(&old, &settings.current_link).unwrap();

    let updater = Updater::new(settings).unwrap();
    assert!(matches!(
        updater.update().await.unwrap(),
        UpdateOutcome::Installed(_)
    ));
    let link = updater.settings().current_link.clone();
    assert_eq!(std::fs::read_to_string(&link).unwrap(), "new release");
    // link and artifacts share a directory, so the stored target is relative
    assert_eq!(
        std::fs::read_link(&link).unwrap(),
        PathBuf::from("Cursor-1.5.0-x86_64.AppImage")
    );

    // ledger timestamps have second precision; keep the two entries apart
    tokio::time::sleep(Duration::from_millis(1100)).await;
    updater.switch("1.4.5").await.unwrap();
    assert_eq!(std::fs::read_to_string(&link).unwrap(), "old release");
    assert_eq!(
        std::fs::read_to_string(updater.settings().download_dir.join(".cursor-version")).unwrap(),
        "VERSION=1.4.5\n"
    );

    let entries = updater.list().await.unwrap();
    let actions: Vec<&LedgerAction> = entries.iter().map(|e| &e.action).collect();
    assert_eq!(actions, vec![&LedgerAction::Update, &LedgerAction::Switch]);
    assert_eq!(entries[1].digest, "");

    assert!(entries[1].timestamp > entries[0].timestamp);
    let latest = updater.ledger().latest().await.unwrap();
    assert_eq!(latest.version, "1.4.5");
}

#[tokio::test]
async fn test_latest_keeps_earlier_entry_within_same_second() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Ledger::new(temp_dir.path().join("versions.log"));
    let when = chrono::Utc::now();

    for (version, action) in [("1.5.0", LedgerAction::Update), ("1.4.5", LedgerAction::Switch)] {
        let entry = LedgerEntry::new(
            version,
            format!("Cursor-{}-x86_64.AppImage", version),
            "",
            action,
        )
        .with_timestamp(when);
        ledger.append(&entry).await.unwrap();
    }

    assert_eq!(ledger.latest().await.unwrap().version, "1.5.0");
}

#[tokio::test]
async fn test_force_refetches_current_version() {
    let mut server = Server::new_async().await;
    let _resolve = mock_resolution(&mut server, "1.4.5").await;
    let download = mock_download(&mut server, "1.4.5", "fresh bytes", 1).await;

    let temp_dir = TempDir::new().unwrap();
    let settings = create_test_settings(&server, temp_dir.path());
    std::fs::create_dir_all(&settings.download_dir).unwrap();
    let artifact = settings.download_dir.join("Cursor-1.4.5-x86_64.AppImage");
    std::fs::write(&artifact, "corrupt").unwrap();
    std::os::unix::fs::symlink(&artifact, &settings.current_link).unwrap();

    let updater = Updater::new(settings).unwrap();
    let report = updater.force().await.unwrap();

    assert!(report.downloaded);
    assert_eq!(std::fs::read_to_string(&artifact).unwrap(), "fresh bytes");
    assert_eq!(report.digest, Sha256Digest::of_bytes(b"fresh bytes"));

    let entries = updater.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, LedgerAction::Force);
    assert_all(&download).await;
}

#[tokio::test]
async fn test_plain_copy_with_ambiguous_size_uses_highest() {
    let mut server = Server::new_async().await;
    let _resolve = mock_resolution(&mut server, "1.3.0").await;

    let temp_dir = TempDir::new().unwrap();
    let settings = create_test_settings(&server, temp_dir.path());
    std::fs::create_dir_all(&settings.download_dir).unwrap();
    for version in ["1.2.0", "1.3.0"] {
        std::fs::write(
            settings
                .download_dir
                .join(format!("Cursor-{}-x86_64.AppImage", version)),
            "same size",
        )
        .unwrap();
    }
    std::fs::write(&settings.current_link, "same size").unwrap();

    let updater = Updater::new(settings).unwrap();
    let report = updater.check().await.unwrap();

    assert_eq!(
        report.local,
        LocalVersion::Ambiguous(vec!["1.3.0".to_string(), "1.2.0".to_string()])
    );
    assert!(!report.update_available);
}
