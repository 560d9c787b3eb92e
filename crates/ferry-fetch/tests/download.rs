//! Lifecycle tests for downloads driven through [`DownloadService`].

mod common;

use std::time::Duration;

use common::{MockClient, eventually};
use ferry_fetch::core::staging_file_name;
use ferry_fetch::{DownloadService, Error, JobState, ServiceConfig, StartRequest};
use tempfile::{TempDir, tempdir};

fn service(grace: Duration) -> (DownloadService<MockClient>, MockClient, TempDir) {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    let config = ServiceConfig::new(dir.path().join("downloads")).cancel_grace(grace);
    let service = DownloadService::new(client.clone(), config).unwrap();
    (service, client, dir)
}

#[tokio::test]
async fn test_progress_then_completion() {
    let (service, client, dir) = service(Duration::from_millis(10));
    let feed = client.stream("http://mock/movie.mp4", Some(1_000_000));

    let started = service.start(StartRequest::new("http://mock/movie.mp4")).unwrap();
    assert_eq!(started.file_name, "movie.mp4");
    let id = started.id;

    feed.chunk(250_000);
    feed.chunk(250_000);
    eventually(|| service.progress(id).is_ok_and(|r| r.downloaded_size == 500_000)).await;

    let report = service.progress(id).unwrap();
    assert_eq!(report.file_name, "movie.mp4");
    assert_eq!(report.total_size, Some(1_000_000));
    assert_eq!(report.percentage.as_deref(), Some("50.00%"));

    feed.chunk(250_000);
    feed.chunk(250_000);
    let outcome = started.completion.await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(outcome.downloaded_size, 1_000_000);
    assert!(outcome.cleanup.is_none());
    assert!(matches!(service.progress(id), Err(Error::NotFound(_))));

    let path = dir.path().join("downloads").join("movie.mp4");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 1_000_000);
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_unknown_length_reports_raw_bytes() {
    let (service, client, _dir) = service(Duration::from_millis(10));
    let feed = client.stream("http://mock/live/stream", None);

    let started = service.start(StartRequest::new("http://mock/live/stream")).unwrap();
    let id = started.id;

    feed.chunk(4096);
    eventually(|| service.progress(id).is_ok_and(|r| r.downloaded_size == 4096)).await;

    let report = service.progress(id).unwrap();
    assert_eq!(report.total_size, None);
    assert_eq!(report.percentage, None);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["totalSize"].is_null());
    assert!(json["percentage"].is_null());

    drop(feed);
    let outcome = started.completion.await.unwrap();
    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.downloaded_size, 4096);
}

#[tokio::test]
async fn test_cancel_before_first_chunk() {
    let (service, client, dir) = service(Duration::from_millis(20));
    let _feed = client.stream("http://mock/big.iso", Some(1 << 30));

    let started = service.start(StartRequest::new("http://mock/big.iso")).unwrap();
    service.cancel(started.id).unwrap();

    let outcome = started.completion.await.unwrap();
    assert_eq!(outcome.state, JobState::Canceled);
    assert!(matches!(outcome.result, Err(Error::Canceled)));
    assert_eq!(outcome.downloaded_size, 0);
    assert!(matches!(service.progress(started.id), Err(Error::NotFound(_))));
    assert!(!dir.path().join("downloads").join("big.iso").exists());
}

#[tokio::test]
async fn test_cancel_mid_stream_deletes_after_grace() {
    let (service, client, dir) = service(Duration::from_millis(300));
    let feed = client.stream("http://mock/big.iso", Some(1 << 30));
    let downloads = dir.path().join("downloads");

    let started = service.start(StartRequest::new("http://mock/big.iso")).unwrap();
    let id = started.id;
    let staging = downloads.join(staging_file_name("big.iso", id));
    feed.chunk(1024);
    eventually(|| service.progress(id).is_ok_and(|r| r.downloaded_size == 1024)).await;

    service.cancel(id).unwrap();
    eventually(|| service.progress(id).is_err()).await;
    // Gone from the registry, partial file still waiting for the grace period.
    assert!(staging.exists());

    let outcome = started.completion.await.unwrap();
    assert_eq!(outcome.state, JobState::Canceled);
    assert_eq!(outcome.downloaded_size, 1024);
    assert!(outcome.cleanup.unwrap().removed);
    assert!(!staging.exists());
    assert!(!downloads.join("big.iso").exists());
}

#[tokio::test]
async fn test_retry_during_grace_keeps_completed_file() {
    let (service, client, dir) = service(Duration::from_millis(300));
    let path = dir.path().join("downloads").join("retry.bin");

    let first_feed = client.stream("http://mock/retry.bin", Some(10));
    let first = service.start(StartRequest::new("http://mock/retry.bin")).unwrap();
    first_feed.chunk(4);
    eventually(|| service.progress(first.id).is_ok_and(|r| r.downloaded_size == 4)).await;
    service.cancel(first.id).unwrap();
    eventually(|| service.progress(first.id).is_err()).await;

    let second_feed = client.stream("http://mock/retry.bin", Some(10));
    let second = service.start(StartRequest::new("http://mock/retry.bin")).unwrap();
    second_feed.bytes(&b"0123456789"[..]);
    assert!(second.completion.await.unwrap().is_completed());
    assert!(path.exists());

    let first = first.completion.await.unwrap();
    assert_eq!(first.state, JobState::Canceled);
    assert!(first.cleanup.unwrap().removed);
    assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");
}

#[tokio::test]
async fn test_failed_job_leaves_concurrent_same_name_job_alone() {
    let (service, client, dir) = service(Duration::from_millis(10));
    let path = dir.path().join("downloads").join("shared.bin");

    let failing = client.stream("http://mock/a/shared.bin", Some(8));
    let healthy = client.stream("http://mock/b/shared.bin", Some(8));
    let a = service.start(StartRequest::new("http://mock/a/shared.bin")).unwrap();
    let b = service.start(StartRequest::new("http://mock/b/shared.bin")).unwrap();
    assert_eq!(a.file_name, b.file_name);

    healthy.bytes(&b"good"[..]);
    failing.chunk(4);
    eventually(|| service.progress(b.id).is_ok_and(|r| r.downloaded_size == 4)).await;
    failing.fail("connection reset");
    assert!(matches!(a.completion.await.unwrap().state, JobState::Failed(_)));

    healthy.bytes(&b"data"[..]);
    assert!(b.completion.await.unwrap().is_completed());
    assert_eq!(std::fs::read(&path).unwrap(), b"gooddata");
}

#[tokio::test]
async fn test_local_write_failure_fails_job_and_spares_existing_entry() {
    let (service, client, dir) = service(Duration::from_millis(10));
    let downloads = dir.path().join("downloads");
    let occupied = downloads.join("occupied.bin");
    std::fs::create_dir(&occupied).unwrap();
    std::fs::write(occupied.join("keep.txt"), b"keep").unwrap();

    let feed = client.stream("http://mock/occupied.bin", Some(6));
    let started = service.start(StartRequest::new("http://mock/occupied.bin")).unwrap();
    feed.bytes(&b"remote"[..]);

    let outcome = started.completion.await.unwrap();
    assert!(matches!(outcome.state, JobState::Failed(_)));
    assert!(matches!(outcome.result, Err(Error::Io(_))));
    assert!(outcome.cleanup.unwrap().removed);
    assert!(matches!(service.progress(started.id), Err(Error::NotFound(_))));
    assert!(service.registry().is_empty());

    assert!(occupied.is_dir());
    assert_eq!(std::fs::read(occupied.join("keep.txt")).unwrap(), b"keep");
    let leftovers: Vec<_> = std::fs::read_dir(&downloads).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[tokio::test]
async fn test_cancel_after_completion_is_not_found() {
    let (service, client, _dir) = service(Duration::from_millis(10));
    let feed = client.stream("http://mock/small.txt", Some(5));

    let started = service.start(StartRequest::new("http://mock/small.txt")).unwrap();
    feed.bytes(&b"hello"[..]);
    let outcome = started.completion.await.unwrap();
    assert!(outcome.is_completed());

    assert!(matches!(service.cancel(started.id), Err(Error::NotFound(id)) if id == started.id));
}

#[tokio::test]
async fn test_cancel_while_waiting_for_headers() {
    let (service, client, dir) = service(Duration::from_millis(10));
    client.hang("http://mock/slow.bin");

    let started = service.start(StartRequest::new("http://mock/slow.bin")).unwrap();
    eventually(|| service.progress(started.id).is_ok()).await;
    service.cancel(started.id).unwrap();

    let outcome = started.completion.await.unwrap();
    assert_eq!(outcome.state, JobState::Canceled);
    assert!(outcome.cleanup.is_none());
    assert!(!dir.path().join("downloads").join("slow.bin").exists());
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let (service, client, _dir) = service(Duration::from_millis(10));
    let first = client.stream("http://mock/a.bin", Some(10));
    let second = client.stream("http://mock/b.bin", Some(10));

    let a = service.start(StartRequest::new("http://mock/a.bin")).unwrap();
    let b = service.start(StartRequest::new("http://mock/b.bin")).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(service.registry().len(), 2);

    service.cancel(a.id).unwrap();
    second.chunk(10);

    let (a, b) = (a.completion.await.unwrap(), b.completion.await.unwrap());
    assert_eq!(a.state, JobState::Canceled);
    assert_eq!(b.state, JobState::Completed);
    drop(first);
}

#[tokio::test]
async fn test_connect_failure_fails_job() {
    let (service, client, dir) = service(Duration::from_millis(10));
    client.fail("http://mock/missing.bin", "connection refused");

    let started = service.start(StartRequest::new("http://mock/missing.bin")).unwrap();
    let outcome = started.completion.await.unwrap();

    assert!(matches!(&outcome.state, JobState::Failed(cause) if cause.contains("connection refused")));
    assert!(matches!(outcome.result, Err(Error::Network(_))));
    assert!(outcome.cleanup.is_none());
    assert!(matches!(service.progress(started.id), Err(Error::NotFound(_))));
    assert!(!dir.path().join("downloads").join("missing.bin").exists());
}

#[tokio::test]
async fn test_mid_stream_error_discards_partial_file() {
    let (service, client, dir) = service(Duration::from_millis(10));
    let feed = client.stream("http://mock/flaky.bin", Some(100));

    let started = service.start(StartRequest::new("http://mock/flaky.bin")).unwrap();
    feed.chunk(40);
    feed.fail("connection reset");

    let outcome = started.completion.await.unwrap();
    assert!(matches!(outcome.state, JobState::Failed(_)));
    assert_eq!(outcome.downloaded_size, 40);
    assert!(outcome.cleanup.unwrap().removed);
    assert!(!dir.path().join("downloads").join("flaky.bin").exists());
}

#[tokio::test]
async fn test_body_longer_than_announced_fails() {
    let (service, client, _dir) = service(Duration::from_millis(10));
    let feed = client.stream("http://mock/liar.bin", Some(10));

    let started = service.start(StartRequest::new("http://mock/liar.bin")).unwrap();
    feed.chunk(6);
    feed.chunk(6);

    let outcome = started.completion.await.unwrap();
    assert!(matches!(
        outcome.result,
        Err(Error::Overrun {
            expected: 10,
            received: 12
        })
    ));
    assert_eq!(outcome.downloaded_size, 6);
}

#[tokio::test]
async fn test_explicit_file_name_wins() {
    let (service, client, dir) = service(Duration::from_millis(10));
    let feed = client.stream("http://mock/v1/asset?id=7", Some(3));

    let started = service
        .start(StartRequest::new("http://mock/v1/asset?id=7").file_name("asset-7.bin"))
        .unwrap();
    assert_eq!(started.file_name, "asset-7.bin");

    feed.bytes(&b"abc"[..]);
    assert!(started.completion.await.unwrap().is_completed());
    assert_eq!(std::fs::read(dir.path().join("downloads").join("asset-7.bin")).unwrap(), b"abc");
}

#[tokio::test]
async fn test_start_validation() {
    let (service, _client, _dir) = service(Duration::from_millis(10));

    let missing = service.start(StartRequest::default()).unwrap_err();
    assert!(matches!(&missing, Error::Validation(msg) if msg == "URL is required"));

    let blank = service.start(StartRequest::new("   ")).unwrap_err();
    assert!(matches!(blank, Error::Validation(_)));

    let relative = service.start(StartRequest::new("/files/a.bin")).unwrap_err();
    assert!(matches!(relative, Error::Validation(_)));

    let ftp = service.start(StartRequest::new("ftp://mock/a.bin")).unwrap_err();
    assert!(matches!(ftp, Error::Validation(_)));

    let escape = service
        .start(StartRequest::new("http://mock/a.bin").file_name("../a.bin"))
        .unwrap_err();
    assert!(matches!(escape, Error::Validation(_)));

    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let (service, _client, _dir) = service(Duration::from_millis(10));
    let id = ferry_fetch::JobId::new();

    assert!(matches!(service.progress(id), Err(Error::NotFound(_))));
    assert!(matches!(service.cancel(id), Err(Error::NotFound(_))));
}
