//! Status mapping of the HTTP backend against a local canned server

use pretty_assertions::assert_eq;
use taxon_model::{CategoryId, ChannelId, TeamId, UserId};
use taxon_remote::{HttpConfig, HttpRemote, RemoteError, RemotePort};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const FORBIDDEN: &str = r#"{"id":"api.context.permissions.app_error","message":"You do not have the appropriate permissions.","status_code":403}"#;

/// Read one request and return its request line
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    head.lines().next().unwrap_or_default().to_string()
}

fn respond(request_line: &str) -> (u16, &'static str, &'static str) {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    match (method, path) {
        ("GET", p) if p.starts_with("/api/v4/teams/t1/channels/name/") => {
            (404, "Not Found", r#"{"message":"Unable to find the channel."}"#)
        }
        ("POST", "/api/v4/channels/c1/members") => (403, "Forbidden", FORBIDDEN),
        ("DELETE", "/api/v4/users/u1/teams/t1/channels/categories/cat1") => {
            (200, "OK", r#"{"status":"OK"}"#)
        }
        ("GET", "/api/v4/users/u1") => (
            200,
            "OK",
            r#"{"id":"u1","username":"boris","roles":"system_user","locale":"en"}"#,
        ),
        ("GET", "/api/v4/users/username/a%2Fb") => (
            200,
            "OK",
            r#"{"id":"u2","username":"a/b"}"#,
        ),
        _ => (502, "Bad Gateway", "upstream unavailable"),
    }
}

/// Serve canned responses until the test ends; returns the server URL
async fn canned_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let request_line = read_request(&mut stream).await;
                let (status, reason, body) = respond(&request_line);
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            });
        }
    });

    format!("http://{addr}")
}

async fn remote() -> HttpRemote {
    HttpRemote::new(HttpConfig::new(canned_server().await, "secret")).unwrap()
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let remote = remote().await;

    let err = remote
        .get_channel_by_name(&TeamId::new("t1"), "kaag-cup")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err, RemoteError::not_found("channel", "kaag-cup"));
}

#[tokio::test]
async fn test_forbidden_maps_to_rejected_with_platform_message() {
    let remote = remote().await;

    let err = remote
        .add_channel_member(&ChannelId::new("c1"), &UserId::new("u1"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RemoteError::rejected(403, "You do not have the appropriate permissions.")
    );
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_delete_accepts_any_success_body() {
    let remote = remote().await;

    remote
        .delete_sidebar_category(&UserId::new("u1"), &TeamId::new("t1"), &CategoryId::new("cat1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_success_body_decodes() {
    let remote = remote().await;

    let user = remote.get_user(&UserId::new("u1")).await.unwrap();

    assert_eq!(user.username, "boris");
    assert_eq!(user.roles, "system_user");
}

#[tokio::test]
async fn test_username_is_sent_as_one_path_segment() {
    let remote = remote().await;

    let user = remote.get_user_by_username("a/b").await.unwrap();

    assert_eq!(user.id, UserId::new("u2"));
}

#[tokio::test]
async fn test_other_failures_keep_raw_body() {
    let remote = remote().await;

    let err = remote
        .get_public_channels_for_team(&TeamId::new("t1"), 0, 100)
        .await
        .unwrap_err();

    assert_eq!(err, RemoteError::rejected(502, "upstream unavailable"));
}
