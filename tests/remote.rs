// Hosted backend against a local stand-in for the auth and REST APIs

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tunestream::backend::{Backend, CredentialStore, RemoteBackend};
use tunestream::config::BackendConfig;
use tunestream::Library;

fn token_body(access: &str, refresh: &str, expires_in: i64) -> String {
    serde_json::json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": expires_in,
        "refresh_token": refresh,
        "user": { "id": "u1", "email": "a@b.com" }
    })
    .to_string()
}

// The password grant hands out a token that is already inside the refresh
// margin, so the next table request has to refresh it first
fn respond(request_line: &str) -> (u16, String) {
    if request_line.contains("grant_type=password") {
        (200, token_body("a1", "r1", 30))
    } else if request_line.contains("grant_type=refresh_token") {
        (200, token_body("a2", "r2", 3600))
    } else if request_line.contains("/rest/v1/liked_songs") {
        (200, "[]".to_string())
    } else if request_line.contains("/auth/v1/logout") {
        (204, String::new())
    } else {
        (404, "{}".to_string())
    }
}

async fn handle(mut socket: TcpStream) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let head_end = loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..head_end]).to_string();
    let content_length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while data.len() < head_end + content_length {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    let (status, body) = respond(&request_line);
    let response = format!(
        "HTTP/1.1 {status} OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn fake_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle(socket));
        }
    });
    format!("http://{addr}")
}

fn remote(url: &str) -> Arc<RemoteBackend> {
    let config = BackendConfig {
        url: Some(url.to_string()),
        anon_key: "anon".to_string(),
    };
    Arc::new(RemoteBackend::new(url, &config))
}

#[tokio::test]
async fn refreshed_tokens_are_saved_for_the_next_run() {
    let url = fake_server().await;
    let dir = tempfile::tempdir().unwrap();
    let backend = remote(&url);
    let library =
        Library::new(backend.clone()).with_credentials(CredentialStore::new(dir.path()));

    library.sign_in("a@b.com", "secret1").await.unwrap();
    let saved = CredentialStore::new(dir.path()).load().unwrap();
    assert_eq!(saved.refresh_token, "r1");

    assert!(library.liked_songs().await.unwrap().is_empty());

    assert_eq!(backend.credential().unwrap().refresh_token, "r2");
    let saved = CredentialStore::new(dir.path()).load().unwrap();
    assert_eq!(saved.refresh_token, "r2");
    assert_eq!(saved.access_token, "a2");
}

#[tokio::test]
async fn logging_out_removes_the_saved_login() {
    let url = fake_server().await;
    let dir = tempfile::tempdir().unwrap();
    let library = Library::new(remote(&url)).with_credentials(CredentialStore::new(dir.path()));

    library.sign_in("a@b.com", "secret1").await.unwrap();
    assert!(CredentialStore::new(dir.path()).load().is_some());

    library.sign_out().await.unwrap();
    assert!(CredentialStore::new(dir.path()).load().is_none());
    assert!(!library.session().is_signed_in());
}
