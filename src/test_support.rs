//! Blocking HTTP/1.1 test server used by unit tests.
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ServerBehavior {
    pub status: u16,
    pub delay: Duration,
    /// Connections closed right after the request was read, without a response.
    pub drop_first: usize,
    /// Serve further requests on the same connection instead of closing it.
    pub keep_alive: bool,
    /// Announce a longer body than is sent, then close the connection.
    pub truncated_body: bool,
}

impl ServerBehavior {
    pub(crate) const fn ok() -> Self {
        Self {
            status: 200,
            delay: Duration::ZERO,
            drop_first: 0,
            keep_alive: false,
            truncated_body: false,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ServerStats {
    pub connections: AtomicUsize,
    pub responses: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub last_request: Mutex<String>,
}

impl ServerStats {
    pub(crate) fn last_request(&self) -> String {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) struct TestServer {
    pub url: String,
    pub stats: Arc<ServerStats>,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

pub(crate) fn spawn_server(behavior: ServerBehavior) -> Result<TestServer, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let stats = Arc::new(ServerStats::default());
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let server_stats = Arc::clone(&stats);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((stream, _)) => {
                    let index = server_stats.connections.fetch_add(1, Ordering::SeqCst);
                    let connection_stats = Arc::clone(&server_stats);
                    thread::spawn(move || {
                        handle_client(stream, behavior, index, &connection_stats);
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(2));
                }
                Err(_) => break,
            }
        }
    });

    Ok(TestServer {
        url: format!("http://{}/", addr),
        stats,
        shutdown: shutdown_tx,
        thread: Some(handle),
    })
}

/// Returns a URL on a local port that nothing listens on.
pub(crate) fn unreachable_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

fn handle_client(mut stream: TcpStream, behavior: ServerBehavior, index: usize, stats: &ServerStats) {
    if stream.set_nonblocking(false).is_err()
        || stream.set_read_timeout(Some(Duration::from_secs(5))).is_err()
    {
        return;
    }
    let mut first = true;
    while let Some(request) = read_request(&mut stream) {
        if first && index < behavior.drop_first {
            break;
        }
        first = false;
        if !respond(&mut stream, behavior, request, stats) || !behavior.keep_alive {
            break;
        }
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Writes one response; returns whether the connection may serve another request.
fn respond(
    stream: &mut TcpStream,
    behavior: ServerBehavior,
    request: String,
    stats: &ServerStats,
) -> bool {
    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
    stats.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    if let Ok(mut last) = stats.last_request.lock() {
        *last = request;
    }
    if !behavior.delay.is_zero() {
        thread::sleep(behavior.delay);
    }
    let (content_length, connection) = match (behavior.truncated_body, behavior.keep_alive) {
        (true, _) => (100, "close"),
        (false, true) => (2, "keep-alive"),
        (false, false) => (2, "close"),
    };
    let response = format!(
        "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: {}\r\n\r\nOK",
        behavior.status, content_length, connection
    );
    stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    if stream.write_all(response.as_bytes()).is_err() || stream.flush().is_err() {
        return false;
    }
    stats.responses.fetch_add(1, Ordering::SeqCst);
    !behavior.truncated_body
}

fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut raw = Vec::new();
    let mut buffer = [0u8; 1024];
    let header_end = loop {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            return None;
        }
        raw.extend_from_slice(buffer.get(..read)?);
        if let Some(pos) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos.saturating_add(4);
        }
    };

    let head = String::from_utf8_lossy(raw.get(..header_end)?).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while raw.len() < header_end.saturating_add(content_length) {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(buffer.get(..read)?);
    }
    Some(String::from_utf8_lossy(&raw).into_owned())
}
