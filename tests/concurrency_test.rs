use formwire::multipart;
use std::sync::Arc;
use std::sync::mpsc;
use threadpool::ThreadPool;

fn build_body(boundary: &str, fields: usize) -> Vec<u8> {
    let mut body = Vec::new();
    for i in 0..fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"field{i}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(b"Content-Transfer-Encoding: base64\r\n\r\n");
        body.extend_from_slice(b"aGVsbG8=");
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[test]
fn test_concurrent_parsing_of_independent_buffers() {
    let pool = ThreadPool::new(8);
    let (tx, rx) = mpsc::channel();

    for job in 0..64usize {
        let tx = tx.clone();
        pool.execute(move || {
            let boundary = format!("boundary{job}");
            let body = build_body(&boundary, job % 5 + 1);
            let result = multipart::parse(&body, boundary.as_bytes()).map(|form| form.len());
            tx.send((job, result)).unwrap();
        });
    }
    drop(tx);

    let mut seen = 0;
    for (job, result) in rx {
        assert_eq!(result.unwrap(), job % 5 + 1);
        seen += 1;
    }
    assert_eq!(seen, 64);
}

#[test]
fn test_shared_buffer_parses_identically_across_threads() {
    let body = Arc::new(build_body("shared", 10));
    let expected = multipart::parse(&body, b"shared").unwrap();
    let pool = ThreadPool::new(4);
    let (tx, rx) = mpsc::channel();

    for _ in 0..16 {
        let body = Arc::clone(&body);
        let tx = tx.clone();
        pool.execute(move || {
            tx.send(multipart::parse(&body, b"shared").unwrap()).unwrap();
        });
    }
    drop(tx);

    for form in rx {
        assert_eq!(form, expected);
        assert!(form.iter().all(|part| part.data == b"hello"));
    }
}
