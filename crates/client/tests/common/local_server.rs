//! Minimal HTTP/1.1 server for integration tests.
//!
//! Replays canned raw responses, one per accepted connection, and records the
//! raw request bytes each connection sent.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub struct LocalServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl LocalServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a server answering successive connections with `responses`, in order.
/// Connections beyond the list are closed without a response.
pub fn start(responses: Vec<Vec<u8>>) -> LocalServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    thread::spawn(move || {
        let mut responses = responses.into_iter();
        for mut stream in listener.incoming().flatten() {
            let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
            let request = read_request(&mut stream);
            recorded.lock().unwrap().push(request);
            match responses.next() {
                Some(response) => {
                    let _ = stream.write_all(&response);
                }
                None => return,
            }
        }
    });

    LocalServer { port, requests }
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    while !data.ends_with(b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}
