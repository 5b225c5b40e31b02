//! Tests for the HTTP transport: header construction and line framing.

use futures_util::{StreamExt, stream};
use haka_llm::{HttpProvider, lines};
use std::io;

async fn split(chunks: &[&'static [u8]]) -> Vec<Result<String, String>> {
    let input = stream::iter(chunks.iter().copied().map(Ok::<_, io::Error>));
    lines(input)
        .map(|line| line.map_err(|e| e.to_string()))
        .collect()
        .await
}

#[test]
fn bearer_carries_key_and_json_headers() {
    let provider = HttpProvider::bearer(
        haka_llm::Client::new(),
        "sk-test",
        "http://example.com/v1/chat/completions",
    )
    .expect("bearer provider");

    let headers = provider.headers();
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["accept"], "application/json");
    assert_eq!(provider.endpoint(), "http://example.com/v1/chat/completions");
}

#[test]
fn bearer_rejects_unprintable_key() {
    assert!(HttpProvider::bearer(haka_llm::Client::new(), "bad\nkey", "http://x").is_err());
}

#[tokio::test]
async fn lines_reassemble_across_chunks() {
    let lines = split(&[b"data: {\"a\"", b":1}\ndata: [DO", b"NE]\n"]).await;
    assert_eq!(
        lines,
        vec![
            Ok("data: {\"a\":1}\n".to_owned()),
            Ok("data: [DONE]\n".to_owned()),
        ]
    );
}

#[tokio::test]
async fn lines_keep_split_characters_intact() {
    let lines = split(&[b"na\xC3", b"\xAFve\n\xE6\x97", b"\xA5\n"]).await;
    assert_eq!(lines, vec![Ok("naïve\n".to_owned()), Ok("日\n".to_owned())]);
}

#[tokio::test]
async fn lines_yield_unterminated_tail() {
    let lines = split(&[b"first\nsec", b"ond"]).await;
    assert_eq!(
        lines,
        vec![Ok("first\n".to_owned()), Ok("second".to_owned())]
    );
}

#[tokio::test]
async fn lines_reject_invalid_utf8() {
    let lines = split(&[b"ok\n", b"\xFF\xFE\n"]).await;
    assert_eq!(lines[0], Ok("ok\n".to_owned()));
    assert!(lines[1].as_ref().unwrap_err().contains("utf-8"));
}

#[tokio::test]
async fn lines_pass_transport_errors_through() {
    let input = stream::iter(vec![
        Ok::<&'static [u8], _>(b"partial"),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
    ]);
    let lines: Vec<_> = lines(input).collect().await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].as_ref().unwrap_err().to_string().contains("connection reset"));
}
