// SPDX-License-Identifier: MIT

use formwire::error::FormError;
use formwire::request::{Request, parse_from_request};
use std::io::{Cursor, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

const BODY: &str = concat!(
    "------WebKitFormBoundary7MA4YWxkTrZu0gW\r\n",
    "Content-Disposition: form-data; name=\"field1\"\r\n",
    "\r\n",
    "value1\r\n",
    "------WebKitFormBoundary7MA4YWxkTrZu0gW\r\n",
    "Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n",
    "Content-Type: text/plain\r\n",
    "\r\n",
    "line one\r\nline two\r\n",
    "------WebKitFormBoundary7MA4YWxkTrZu0gW--\r\n"
);

fn raw_request(content_type: &str, body: &str) -> Vec<u8> {
    format!(
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

fn serve_and_read(raw: Vec<u8>) -> Result<Request, FormError> {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // Split writes so the body arrives after the head
        let split = raw.len() / 2;
        let _ = stream.write_all(&raw[..split]);
        let _ = stream.flush();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let _ = stream.write_all(&raw[split..]);
        let _ = stream.flush();
    });

    let mut client = TcpStream::connect(addr).unwrap();
    let result = Request::from_reader(&mut client);
    handle.join().unwrap();
    result
}

#[test]
fn test_parse_from_request() {
    let request = Request::new("POST", "/upload")
        .with_header(
            "Content-Type",
            "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW",
        )
        .with_body(BODY);

    let form = parse_from_request(&request).unwrap();
    assert_eq!(form.len(), 2);
    assert_eq!(form.get("field1").and_then(|p| p.text()), Some("value1"));

    let file = form.get("file").unwrap();
    assert_eq!(file.filename().as_deref(), Some("notes.txt"));
    assert_eq!(file.content_type(), Some("text/plain"));
    assert_eq!(file.text(), Some("line one\r\nline two"));
}

#[test]
fn test_parse_raw_request_from_reader() {
    let raw = raw_request(
        r#"multipart/form-data; boundary="----WebKitFormBoundary7MA4YWxkTrZu0gW""#,
        BODY,
    );
    let request = Request::from_reader(&mut Cursor::new(raw)).unwrap();
    assert_eq!(request.body.as_ref().map(Vec::len), Some(BODY.len()));

    let form = parse_from_request(&request).unwrap();
    assert_eq!(form.len(), 2);
}

#[test]
fn test_parse_raw_request_from_socket() {
    let raw = raw_request(
        "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW",
        BODY,
    );
    let request = serve_and_read(raw).unwrap();
    let form = parse_from_request(&request).unwrap();
    assert_eq!(form.get("field1").unwrap().data, b"value1");
}

#[test]
fn test_non_multipart_content_type() {
    let request = Request::new("POST", "/")
        .with_header("Content-Type", "application/json")
        .with_body("{}");
    let err = parse_from_request(&request).unwrap_err();
    assert!(matches!(err, FormError::MissingBoundary(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_request_without_body() {
    let request = Request::new("POST", "/")
        .with_header("content-type", "multipart/form-data; boundary=XYZ");
    assert!(matches!(
        parse_from_request(&request),
        Err(FormError::UnexpectedEndOfInput(_))
    ));
}
