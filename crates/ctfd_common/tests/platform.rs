// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use chrono::NaiveDate;
use ctfd_common::assets::{self, download_challenge, MARKER_FILE_NAME};
use ctfd_common::client::token::{TokenError, TokenGenerator};
use ctfd_common::client::CtfdClient;
use ctfd_common::error::ClientError;
use ctfd_common::flags::{submit_flag, FlagOutcome};
use ctfd_common::instance::{InstanceAction, InstanceManager, InstanceOutcome};
use ctfd_common::models::responses::ApiResponse;
use ctfd_common::session::PlatformSession;
use ctfd_common::store::{LocalStore, Section, SessionSection, WriteMode};
use ctfd_common::sync::{synchronize, SyncError};
use ctfd_mock::{MockPlatform, MockServer, MOCK_PASSWORD, MOCK_TOKEN, MOCK_USER};
use reqwest::StatusCode;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

struct Fixture {
    server: MockServer,
    client: CtfdClient,
    store: LocalStore,
    root: PathBuf,
    config_dir: PathBuf,
    _temp: TempDir,
}

async fn fixture() -> Fixture {
    let server = ctfd_mock::spawn(MockPlatform::default()).await.unwrap();
    let session = PlatformSession::new(&server.url(), MOCK_TOKEN).unwrap();
    let client = CtfdClient::connect(session, true).await.unwrap();

    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("challenges");
    let config_dir = root.join(".ctfd");
    let store = LocalStore::new(&config_dir);
    let section = SessionSection {
        url: server.url(),
        token: MOCK_TOKEN.to_string(),
    };
    store
        .save(Section::Ctfd, &section, WriteMode::Replace)
        .await
        .unwrap();

    Fixture {
        server,
        client,
        store,
        root,
        config_dir,
        _temp: temp,
    }
}

#[tokio::test]
async fn should_reject_an_unknown_token_when_probing() {
    let server = ctfd_mock::spawn(MockPlatform::default()).await.unwrap();
    let session = PlatformSession::new(&server.url(), "not-a-token").unwrap();

    let err = CtfdClient::connect(session, true).await.err().unwrap();

    match err {
        ClientError::Unavailable { status, .. } => assert_eq!(status, StatusCode::FORBIDDEN),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn should_skip_the_probe_when_asked() {
    let server = ctfd_mock::spawn(MockPlatform::default()).await.unwrap();
    let session = PlatformSession::new(&server.url(), "not-a-token").unwrap();

    assert!(CtfdClient::connect(session, false).await.is_ok());
}

#[tokio::test]
async fn should_refuse_to_resync_without_force() {
    let f = fixture().await;

    let first = synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();
    assert_eq!(first.len(), 5);

    let err = synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadySynced));

    let second = synchronize(&f.client, &f.store, &f.root, true)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(f.store.load().await.challenges(), second);
}

#[tokio::test]
async fn should_keep_the_session_section_when_syncing() {
    let f = fixture().await;

    synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();

    let session = f.store.load().await.session().unwrap();
    assert_eq!(session.url, f.server.url());
    assert_eq!(session.token, MOCK_TOKEN);
}

#[tokio::test]
async fn should_recover_download_flags_from_marker_files() {
    let f = fixture().await;
    let marker = assets::marker_path(&f.root, "rev", "Baby RE");
    tokio::fs::create_dir_all(marker.parent().unwrap())
        .await
        .unwrap();
    tokio::fs::write(&marker, "# Baby RE").await.unwrap();

    let challenges = synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();

    let downloaded: Vec<u64> = challenges
        .iter()
        .filter(|c| c.is_downloaded)
        .map(|c| c.id)
        .collect();
    // Same name, other category
    assert_eq!(downloaded, vec![1]);
}

#[tokio::test]
async fn should_prefer_the_id_over_the_name() {
    let f = fixture().await;
    synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();
    let state = f.store.load().await;

    let challenge = state
        .find_challenge(Some(2), Some("Sanity Check"))
        .unwrap();
    assert_eq!(challenge.id, 2);

    let challenge = state.find_challenge(None, Some("Sanity Check")).unwrap();
    assert_eq!(challenge.id, 5);
}

#[tokio::test]
async fn should_download_a_challenge_and_mark_it() {
    let f = fixture().await;
    synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();
    let challenge = f.store.load().await.find_challenge(Some(1), None).unwrap();

    let downloaded =
        download_challenge(&f.client, &f.store, &challenge, &f.root, &f.config_dir, &())
            .await
            .unwrap();

    assert_eq!(downloaded.dir, f.root.join("rev").join("baby-re"));
    assert_eq!(downloaded.files.len(), 1);
    let crackme = tokio::fs::read(downloaded.dir.join("crackme")).await.unwrap();
    assert_eq!(crackme.len(), 20_000);
    assert_eq!(downloaded.files[0].expected, Some(20_000));

    let readme = tokio::fs::read_to_string(downloaded.dir.join(MARKER_FILE_NAME))
        .await
        .unwrap();
    assert!(readme.starts_with("# Baby RE"));
    assert!(readme.contains("crackme"));

    let submit = tokio::fs::read_to_string(downloaded.dir.join("submit.sh"))
        .await
        .unwrap();
    assert!(submit.contains("--challenge-id 1"));
    assert!(!submit.contains("{CHALLENGE_ID}"));
    assert!(!submit.contains("{CONFIG_DIR}"));
    assert!(!downloaded.dir.join("launch.sh").exists());

    let stored = f.store.load().await.find_challenge(Some(1), None).unwrap();
    assert!(stored.is_downloaded);
    let other = f.store.load().await.find_challenge(Some(2), None).unwrap();
    assert!(!other.is_downloaded);
}

#[tokio::test]
async fn should_install_the_launch_script_for_container_challenges() {
    let f = fixture().await;
    synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();
    let challenge = f.store.load().await.find_challenge(Some(4), None).unwrap();

    let downloaded =
        download_challenge(&f.client, &f.store, &challenge, &f.root, &f.config_dir, &())
            .await
            .unwrap();

    assert_eq!(downloaded.scripts.len(), 2);
    let launch = tokio::fs::read_to_string(downloaded.dir.join("launch.sh"))
        .await
        .unwrap();
    assert!(launch.contains("--challenge-id 4"));
}

#[tokio::test]
async fn should_stream_files_without_a_content_length() {
    let f = fixture().await;
    let dest = f.root.join("capture.pcap");
    tokio::fs::create_dir_all(&f.root).await.unwrap();

    let report = f
        .client
        .download_file("/files/0c5e2d/capture.pcap", &dest, &())
        .await
        .unwrap();

    assert_eq!(report.expected, None);
    assert_eq!(report.written, 50_000);
    let content = tokio::fs::read(&dest).await.unwrap();
    assert_eq!(content.len(), 50_000);
    assert_eq!(content[251], 0);
}

/// Accepts one connection, answers it with `body` and returns the lowercased request head.
async fn serve_once(listener: TcpListener, body: &'static [u8]) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    socket.write_all(head.as_bytes()).await.unwrap();
    socket.write_all(body).await.unwrap();
    socket.shutdown().await.ok();

    String::from_utf8_lossy(&request).to_lowercase()
}

#[tokio::test]
async fn should_not_send_the_token_to_other_hosts() {
    let f = fixture().await;
    tokio::fs::create_dir_all(&f.root).await.unwrap();
    let bucket = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "http://{}/bucket/chall.zip?X-Amz-Signature=abc",
        bucket.local_addr().unwrap()
    );
    let request = tokio::spawn(serve_once(bucket, b"zip"));

    let report = f
        .client
        .download_file(&url, f.root.join("chall.zip"), &())
        .await
        .unwrap();

    assert_eq!(report.written, 3);
    let request = request.await.unwrap();
    assert!(request.starts_with("get /bucket/chall.zip?x-amz-signature=abc"));
    assert!(!request.contains("authorization"));
    assert!(!request.contains(&MOCK_TOKEN.to_lowercase()));
}

#[tokio::test]
async fn should_fail_downloads_of_missing_files() {
    let f = fixture().await;
    tokio::fs::create_dir_all(&f.root).await.unwrap();

    let err = f
        .client
        .download_file("/files/0000/missing.bin", f.root.join("missing.bin"), &())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { status, .. } if status == StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn should_report_missing_challenges_as_not_found() {
    let f = fixture().await;

    let response = f.client.get_challenge(999).await.unwrap();

    assert!(matches!(response, ApiResponse::NotFound(_)));
}

#[tokio::test]
async fn should_submit_flags_without_touching_the_local_state() {
    let f = fixture().await;
    synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();
    let before = tokio::fs::read(f.store.path()).await.unwrap();
    let challenge = f.store.load().await.find_challenge(Some(5), None).unwrap();

    let outcome = submit_flag(&f.client, &challenge, "flag{nope}").await.unwrap();
    assert!(matches!(outcome, FlagOutcome::Incorrect { .. }));

    let outcome = submit_flag(&f.client, &challenge, "flag{sanity}").await.unwrap();
    assert_eq!(
        outcome,
        FlagOutcome::Correct {
            message: "Correct".to_string(),
            instance: None,
        }
    );

    let outcome = submit_flag(&f.client, &challenge, "flag{sanity}").await.unwrap();
    assert_eq!(outcome.status(), "already_solved");

    assert!(f.server.is_solved(5));
    let after = tokio::fs::read(f.store.path()).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn should_stop_the_instance_after_a_correct_container_flag() {
    let f = fixture().await;
    synchronize(&f.client, &f.store, &f.root, false)
        .await
        .unwrap();
    let challenge = f.store.load().await.find_challenge(Some(3), None).unwrap();
    let manager = InstanceManager::new(&f.client);
    let started = manager.start(3).await.unwrap();
    assert!(matches!(started, InstanceOutcome::Started(_)));
    assert_eq!(f.server.running_instance(), Some(3));

    let outcome = submit_flag(&f.client, &challenge, "flag{portal}").await.unwrap();

    assert_eq!(
        outcome,
        FlagOutcome::Correct {
            message: "Correct".to_string(),
            instance: Some(InstanceOutcome::Stopped),
        }
    );
    assert_eq!(f.server.running_instance(), None);
}

#[tokio::test]
async fn should_follow_the_instance_lifecycle() {
    let f = fixture().await;
    let manager = InstanceManager::new(&f.client);

    let started = manager.run(InstanceAction::Start, 3).await.unwrap();
    let info = started.connection().unwrap();
    assert_eq!(info.connection_string(), "http://127.0.0.1:30003");

    let again = manager.run(InstanceAction::Start, 3).await.unwrap();
    assert!(matches!(again, InstanceOutcome::AlreadyRunning(_)));
    assert!(!again.is_failure());

    let other = manager.run(InstanceAction::Start, 4).await.unwrap();
    assert_eq!(
        other,
        InstanceOutcome::Failed {
            message: ctfd_mock::STOP_FIRST_ERROR.to_string(),
            must_stop_first: true,
        }
    );

    let extended = manager.run(InstanceAction::Extend, 3).await.unwrap();
    assert!(matches!(extended, InstanceOutcome::Extended(_)));

    let not_running = manager.run(InstanceAction::Extend, 4).await.unwrap();
    assert!(matches!(
        not_running,
        InstanceOutcome::Failed {
            must_stop_first: false,
            ..
        }
    ));

    assert_eq!(
        manager.run(InstanceAction::Stop, 3).await.unwrap(),
        InstanceOutcome::Stopped
    );
    // Stopping twice is still a success
    assert_eq!(
        manager.run(InstanceAction::Stop, 3).await.unwrap(),
        InstanceOutcome::Stopped
    );

    let tcp = manager.run(InstanceAction::Start, 4).await.unwrap();
    assert_eq!(
        tcp.connection().unwrap().connection_string(),
        "nc 127.0.0.1 30004"
    );
}

#[tokio::test]
async fn should_fetch_the_scoreboard_and_solves() {
    let f = fixture().await;

    let scoreboard = f.client.get_scoreboard(2).await.unwrap().ok().unwrap();
    assert_eq!(scoreboard.len(), 2);
    let first = &scoreboard[&1];
    assert_eq!(first.name, "Cyberlandslaget");
    assert_eq!(first.total_score(), 1250);

    let solves = f.client.get_solves(1).await.unwrap().ok().unwrap();
    assert_eq!(solves.len(), 2);
    assert_eq!(solves[0].name, "Cyberlandslaget");

    let none = f.client.get_solves(2).await.unwrap().ok().unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn should_generate_a_token_with_credentials() {
    let server = ctfd_mock::spawn(MockPlatform::default()).await.unwrap();
    let generator = TokenGenerator::new(&server.url()).unwrap();
    let expiration = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

    let token = generator
        .generate(MOCK_USER, MOCK_PASSWORD, expiration)
        .await
        .unwrap();

    assert_eq!(token.value, MOCK_TOKEN);
}

#[tokio::test]
async fn should_fail_token_generation_with_a_wrong_password() {
    let server = ctfd_mock::spawn(MockPlatform::default()).await.unwrap();
    let generator = TokenGenerator::new(&server.url()).unwrap();
    let expiration = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

    let err = generator
        .generate(MOCK_USER, "wrong", expiration)
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::LoginFailed(_)));
}
