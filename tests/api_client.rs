use mailsched::api::{Attachment, MailApi, MailApiClient, NewMail};
use mailsched::error::AppError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one canned response and hands back the raw request it answered.
async fn one_shot(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut stream).await;
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0_u8; 4096];
    loop {
        let size = stream.read(&mut buf).await.expect("read");
        if size == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..size]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(split) = text.find("\r\n\r\n") {
            let length = text[..split]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= split + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

const ITEM: &str = r#"{"itemId":"1","title":"A","content":"x","mailDestination":"a@b.com","sendDate":"2024-03-01T02:30:00Z","sendWithAttachment":false}"#;

#[tokio::test]
async fn lists_mails_with_bearer_token() {
    let (base, server) = one_shot("200 OK", &format!("[{ITEM}]")).await;
    let client = MailApiClient::new(&format!("{base}/prod")).expect("client");

    let items = client.list_all("tok-1").await.expect("list");
    let request = server.await.expect("server");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, "1");
    assert!(request.starts_with("GET /prod/mails HTTP/1.1"));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: bearer tok-1")
    );
}

#[tokio::test]
async fn search_sends_keyword_query() {
    let (base, server) = one_shot("200 OK", &format!(r#"{{"items":[{ITEM}]}}"#)).await;
    let client = MailApiClient::new(&base).expect("client");

    let items = client.search("tok", "spring sale").await.expect("search");
    let request = server.await.expect("server");

    assert_eq!(items.len(), 1);
    assert!(request.starts_with("GET /mails/search?keyword=spring+sale HTTP/1.1"));
}

#[tokio::test]
async fn create_posts_camel_case_body() {
    let created = r#"{"itemId":"9","title":"Hi","content":"x","mailDestination":"a@b.com","sendDate":"2024-03-01T02:30:00Z","sendWithAttachment":true,"presignedUrl":"https://bucket.example.com/put"}"#;
    let (base, server) = one_shot("201 Created", created).await;
    let client = MailApiClient::new(&base).expect("client");
    let mail = NewMail {
        content: "x".to_string(),
        mail_destination: "a@b.com".to_string(),
        send_date: "2024-03-01T02:30:00Z".to_string(),
        title: "Hi".to_string(),
        send_with_attachment: true,
    };

    let response = client.create("tok", &mail).await.expect("create");
    let request = server.await.expect("server");

    assert_eq!(response.item.item_id, "9");
    assert_eq!(
        response.presigned_url.as_deref(),
        Some("https://bucket.example.com/put")
    );
    assert!(request.starts_with("POST /mails HTTP/1.1"));
    assert!(request.contains(r#""mailDestination":"a@b.com""#));
    assert!(request.contains(r#""sendWithAttachment":true"#));
}

#[tokio::test]
async fn delete_targets_item_path() {
    let (base, server) = one_shot("204 No Content", "").await;
    let client = MailApiClient::new(&base).expect("client");

    client.delete("tok", "item 7").await.expect("delete");
    let request = server.await.expect("server");

    assert!(request.starts_with("DELETE /mails/item%207 HTTP/1.1"));
}

#[tokio::test]
async fn expired_session_maps_to_auth_error() {
    let (base, server) = one_shot("401 Unauthorized", r#"{"message":"Unauthorized"}"#).await;
    let client = MailApiClient::new(&base).expect("client");

    let err = client.list_all("stale").await.expect_err("should fail");
    server.await.expect("server");

    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn upload_puts_raw_bytes_without_bearer() {
    let (base, server) = one_shot("200 OK", "").await;
    let client = MailApiClient::new("https://api.example.com").expect("client");
    let file = Attachment {
        filename: "notes.txt".to_string(),
        mime_type: "text/plain".to_string(),
        data: b"hello".to_vec(),
    };

    client
        .upload_attachment(&format!("{base}/bucket/key?sig=abc"), &file)
        .await
        .expect("upload");
    let request = server.await.expect("server");
    let lowered = request.to_ascii_lowercase();

    assert!(request.starts_with("PUT /bucket/key?sig=abc HTTP/1.1"));
    assert!(lowered.contains("content-type: text/plain"));
    assert!(!lowered.contains("authorization:"));
    assert!(request.ends_with("hello"));
}

#[tokio::test]
async fn rejected_upload_is_upload_error() {
    let (base, server) = one_shot("403 Forbidden", "").await;
    let client = MailApiClient::new("https://api.example.com").expect("client");
    let file = Attachment {
        filename: "notes.txt".to_string(),
        mime_type: "text/plain".to_string(),
        data: b"hello".to_vec(),
    };

    let err = client
        .upload_attachment(&format!("{base}/bucket/key"), &file)
        .await
        .expect_err("should fail");
    server.await.expect("server");

    match err {
        AppError::Upload(message) => assert!(message.contains("notes.txt")),
        other => panic!("expected upload error, got {other:?}"),
    }
}
