//! ダウンロードの統合テスト
//!
//! ローカルの TcpListener で最小限の HTTP サーバを立てて検証する。

use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use travel_photos::config::DownloadSettings;
use travel_photos::download::{Downloader, ImageDownloader};
use travel_photos::error::DownloadError;

const BODY: &[u8] = b"\xFF\xD8\xFFfake-jpeg-bytes";

enum Reply {
    /// そのまま書き込んで接続を閉じる
    Raw(Vec<u8>),
    /// ヘッダを返さずに待たせる
    Hang,
}

fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n", status, body.len());
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let mut out = head.into_bytes();
    out.extend_from_slice(body);
    out
}

/// パスごとの応答を返すサーバを起動し、ベースURLを返す
async fn spawn_server<F>(route: F) -> String
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let route = Arc::new(route);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let route = route.clone();

            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&buf);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                match route(&path) {
                    Reply::Raw(bytes) => {
                        let _ = socket.write_all(&bytes).await;
                        let _ = socket.shutdown().await;
                    }
                    Reply::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            });
        }
    });

    format!("http://{}", addr)
}

/// `/r/N` → `/r/N-1` → ... → `/r/0`（画像）
fn redirect_chain(path: &str) -> Reply {
    match path.strip_prefix("/r/").and_then(|n| n.parse::<u32>().ok()) {
        Some(0) => Reply::Raw(http_response("200 OK", &[("Content-Type", "image/jpeg")], BODY)),
        Some(n) => {
            let location = format!("/r/{}", n - 1);
            Reply::Raw(http_response("302 Found", &[("Location", location.as_str())], b""))
        }
        None => Reply::Raw(http_response("404 Not Found", &[], b"not found")),
    }
}

fn downloader(timeout_secs: u64) -> Downloader {
    Downloader::new(&DownloadSettings {
        timeout_secs,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_download_success() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    downloader(5).download(&format!("{}/r/0", base), &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), BODY);
}

/// 上限5なら4回のリダイレクトまでは追跡する
#[tokio::test]
async fn test_follows_redirects_within_budget() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    downloader(5)
        .download_with_redirects(&format!("{}/r/4", base), &dest, 5)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), BODY);
}

/// 5回以上のリダイレクトに上限5 → TooManyRedirects
#[tokio::test]
async fn test_too_many_redirects() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    for hops in [5, 6] {
        let result = downloader(5)
            .download_with_redirects(&format!("{}/r/{}", base, hops), &dest, 5)
            .await;

        assert!(
            matches!(result, Err(DownloadError::TooManyRedirects { max: 5, .. })),
            "{} hops: unexpected: {:?}",
            hops,
            result
        );
        assert!(!dest.exists());
    }
}

/// 上限0ではリクエスト自体を行わない
#[tokio::test]
async fn test_zero_redirect_budget() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    let result = downloader(5)
        .download_with_redirects(&format!("{}/r/0", base), &dest, 0)
        .await;

    assert!(matches!(result, Err(DownloadError::TooManyRedirects { max: 0, .. })));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_trait_uses_configured_redirect_limit() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    let downloader = Downloader::new(&DownloadSettings {
        max_redirects: 1,
        ..Default::default()
    })
    .unwrap();

    let result = downloader.download(&format!("{}/r/2", base), &dest).await;
    assert!(matches!(result, Err(DownloadError::TooManyRedirects { max: 1, .. })));
}

#[tokio::test]
async fn test_unexpected_status() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    let result = downloader(5).download(&format!("{}/missing", base), &dest).await;

    assert!(matches!(result, Err(DownloadError::UnexpectedStatus { status: 404, .. })));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_redirect_without_location_is_unexpected_status() {
    let base = spawn_server(|_: &str| Reply::Raw(http_response("301 Moved Permanently", &[], b""))).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    let result = downloader(5).download(&format!("{}/a", base), &dest).await;
    assert!(matches!(result, Err(DownloadError::UnexpectedStatus { status: 301, .. })));
}

#[tokio::test]
async fn test_timeout_aborts_request() {
    let base = spawn_server(|_: &str| Reply::Hang).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    let started = std::time::Instant::now();
    let result = downloader(1).download(&format!("{}/slow", base), &dest).await;

    assert!(matches!(result, Err(DownloadError::Timeout { secs: 1, .. })), "unexpected: {:?}", result);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!dest.exists());
}

/// 転送途中で切断されたら途中のファイルを残さない
#[tokio::test]
async fn test_truncated_body_removes_partial_file() {
    let base = spawn_server(|_: &str| {
        let mut bytes = b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n".to_vec();
        bytes.extend_from_slice(&[0xAB; 4096]);
        Reply::Raw(bytes)
    })
    .await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("photo_001.jpg");

    let result = downloader(5).download(&format!("{}/partial", base), &dest).await;

    assert!(result.is_err());
    assert!(!dest.exists(), "partial file left behind");
}

#[tokio::test]
async fn test_unwritable_destination_is_io_error() {
    let base = spawn_server(redirect_chain).await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("no-such-dir").join("photo_001.jpg");

    let result = downloader(5).download(&format!("{}/r/0", base), &dest).await;

    assert!(matches!(result, Err(DownloadError::Io(_))));
    assert!(!dest.exists());
}
