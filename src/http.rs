use std::io::Read;
use std::thread;
use std::time::Duration;

fn should_retry_http_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

/// GET `url` and stream the response body as it arrives. The refresh
/// endpoint writes its body incrementally; `on_progress` is invoked with
/// the full text received so far after every chunk, and the complete body
/// is returned once the stream ends.
///
/// Retryable failures (408/429/5xx, transport errors) are retried only
/// while no body bytes have been received; a stream that dies midway is
/// reported as an error rather than replayed from the start.
pub(crate) fn stream_text_with_retries(
    url: &str,
    referer: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
    attempts: usize,
    retry_delay: Duration,
    on_progress: &mut dyn FnMut(&str),
) -> Result<String, String> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .timeout_write(read_timeout)
            .build();

        let request = agent.get(url).set("Referer", referer);

        match request.call() {
            Ok(response) => {
                let mut reader = response.into_reader();
                let mut received = Vec::new();
                let mut buf = [0_u8; 4096];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            return Ok(String::from_utf8_lossy(&received).into_owned());
                        }
                        Ok(read) => {
                            received.extend_from_slice(&buf[..read]);
                            on_progress(&String::from_utf8_lossy(&received));
                        }
                        Err(err) => {
                            if received.is_empty() && attempt < attempts {
                                thread::sleep(retry_delay);
                                break;
                            }
                            return Err(format!("request failed: stream interrupted: {err}"));
                        }
                    }
                }
            }
            Err(ureq::Error::Status(status, response)) => {
                let response_body = response.into_string().ok().unwrap_or_default();
                let body = response_body.trim();
                let status_error = if body.is_empty() {
                    format!("HTTP status {status}")
                } else {
                    let truncated = body.chars().take(240).collect::<String>();
                    format!("HTTP status {status} ({truncated})")
                };

                if should_retry_http_status(status) && attempt < attempts {
                    thread::sleep(retry_delay);
                    continue;
                }

                if should_retry_http_status(status) {
                    return Err(format!(
                        "request failed after {attempts} attempt(s): {status_error}"
                    ));
                }

                return Err(format!("request failed: {status_error}"));
            }
            Err(ureq::Error::Transport(err)) => {
                let transport_error = format!("transport error: {err}");
                if attempt < attempts {
                    thread::sleep(retry_delay);
                    continue;
                }
                return Err(format!(
                    "request failed after {attempts} attempt(s): {transport_error}"
                ));
            }
        }
    }

    Err("request failed: exhausted attempts without a concrete error".to_string())
}

/// The refresh endpoint reports progress as `<p>...</p>` fragments inside
/// its growing HTML body. Pulls the inner text of every complete fragment,
/// in order of appearance.
pub(crate) fn extract_status_lines(body: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = body;
    while let Some(open) = rest.find("<p") {
        let after_open = &rest[open..];
        let Some(tag_end) = after_open.find('>') else {
            break;
        };
        let inner_start = &after_open[tag_end + 1..];
        let Some(close) = inner_start.find("</p>") else {
            break;
        };
        let text = strip_tags(&inner_start[..close]);
        let text = text.trim();
        if !text.is_empty() {
            lines.push(text.to_string());
        }
        rest = &inner_start[close + 4..];
    }
    lines
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Behavior {
        Respond(u16, String),
        /// 200 response whose body is written in pieces with a pause
        /// between them, like the refresh endpoint.
        StreamChunks(Vec<String>, Duration),
    }

    struct TestServer {
        base_url: String,
        requests: Arc<AtomicUsize>,
        shutdown_tx: mpsc::Sender<()>,
        join_handle: Option<std::thread::JoinHandle<()>>,
    }

    impl TestServer {
        fn spawn(behaviors: Vec<Behavior>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            listener.set_nonblocking(true).expect("set nonblocking");
            let addr = listener.local_addr().expect("local addr");

            let requests = Arc::new(AtomicUsize::new(0));
            let requests_clone = Arc::clone(&requests);
            let shared_behaviors = Arc::new(Mutex::new(VecDeque::from(behaviors)));
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let join_handle = std::thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }
                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            requests_clone.fetch_add(1, Ordering::SeqCst);
                            let behavior = {
                                let mut queue = shared_behaviors.lock().expect("lock behaviors");
                                queue
                                    .pop_front()
                                    .unwrap_or_else(|| Behavior::Respond(200, "ok".to_string()))
                            };
                            std::thread::spawn(move || {
                                consume_request(&mut stream);
                                serve_behavior(&mut stream, behavior);
                            });
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            });

            Self {
                base_url: format!("http://{addr}"),
                requests,
                shutdown_tx,
                join_handle: Some(join_handle),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn consume_request(stream: &mut TcpStream) {
        let _ = stream.set_read_timeout(Some(Duration::from_millis(200)));
        let mut buf = [0_u8; 1024];
        let mut data = Vec::new();
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    data.extend_from_slice(&buf[..read]);
                    if data.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn serve_behavior(stream: &mut TcpStream, behavior: Behavior) {
        match behavior {
            Behavior::Respond(status, body) => {
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    503 => "Service Unavailable",
                    _ => "Status",
                };
                let payload = body.as_bytes();
                let _ = write!(
                    stream,
                    "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    payload.len()
                );
                let _ = stream.write_all(payload);
                let _ = stream.flush();
            }
            Behavior::StreamChunks(chunks, pause) => {
                let total: usize = chunks.iter().map(|chunk| chunk.len()).sum();
                let _ = write!(
                    stream,
                    "HTTP/1.1 200 OK\r\nContent-Length: {total}\r\nConnection: close\r\n\r\n"
                );
                let _ = stream.flush();
                for chunk in chunks {
                    let _ = stream.write_all(chunk.as_bytes());
                    let _ = stream.flush();
                    std::thread::sleep(pause);
                }
            }
        }
    }

    #[test]
    fn streams_progress_and_returns_full_body() {
        let server = TestServer::spawn(vec![Behavior::StreamChunks(
            vec![
                "<p>Fetching AniList data...</p>".to_string(),
                "<p>Fetching MAL scores...</p>".to_string(),
                "<p>Done.</p>".to_string(),
            ],
            Duration::from_millis(30),
        )]);

        let mut snapshots = Vec::new();
        let result = stream_text_with_retries(
            &server.base_url,
            "https://example.test",
            Duration::from_millis(500),
            Duration::from_millis(500),
            1,
            Duration::from_millis(1),
            &mut |so_far| snapshots.push(so_far.to_string()),
        );

        let body = result.expect("stream should complete");
        assert!(body.ends_with("<p>Done.</p>"));
        assert!(!snapshots.is_empty());
        // Each snapshot is a prefix of the final body.
        for snapshot in &snapshots {
            assert!(body.starts_with(snapshot.as_str()));
        }
        assert_eq!(
            extract_status_lines(&body),
            vec!["Fetching AniList data...", "Fetching MAL scores...", "Done."]
        );
    }

    #[test]
    fn retries_retryable_status_before_streaming() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::Respond(200, "<p>ok</p>".to_string()),
        ]);

        let result = stream_text_with_retries(
            &server.base_url,
            "https://example.test",
            Duration::from_millis(500),
            Duration::from_millis(500),
            3,
            Duration::from_millis(1),
            &mut |_| {},
        );

        assert_eq!(result.expect("should recover"), "<p>ok</p>");
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn does_not_retry_hard_client_errors() {
        let server = TestServer::spawn(vec![Behavior::Respond(404, "not-found".to_string())]);

        let result = stream_text_with_retries(
            &server.base_url,
            "https://example.test",
            Duration::from_millis(500),
            Duration::from_millis(500),
            5,
            Duration::from_millis(1),
            &mut |_| {},
        );

        let err = result.expect_err("404 should not be retried");
        assert!(err.contains("HTTP status 404"), "unexpected error: {err}");
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn extract_status_lines_ignores_incomplete_trailing_fragment() {
        let body = "<p class=\"status\">First</p><div>noise</div><p>Sec<strong>ond</strong></p><p>cut off";
        assert_eq!(extract_status_lines(body), vec!["First", "Second"]);
    }

    #[test]
    fn extract_status_lines_handles_empty_body() {
        assert!(extract_status_lines("").is_empty());
        assert!(extract_status_lines("no paragraphs here").is_empty());
    }
}
