//! Loopback upstream serving canned HTTP/1.1 replies

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Upstream answering exactly one request
pub struct Upstream {
    pub addr: SocketAddr,
    request: JoinHandle<String>,
}

impl Upstream {
    /// Serve one connection, building the raw reply from the raw request head
    pub async fn once<R>(reply: R) -> Self
    where
        R: FnOnce(&str) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let request = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let head = read_head(&mut stream).await;
            stream.write_all(&reply(&head)).await.unwrap();
            let _ = stream.shutdown().await;
            head
        });

        Self { addr, request }
    }

    /// Request head as received, lowercased
    pub async fn request(self) -> String {
        self.request.await.unwrap()
    }
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..read]);
    }
    String::from_utf8_lossy(&head).to_ascii_lowercase()
}

/// Raw HTTP/1.1 response closing the connection after the body
pub fn reply(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let mut raw = head.into_bytes();
    raw.extend_from_slice(body);
    raw
}

/// Header lines of a request head, one `name: value` string each
pub fn header_lines(head: &str) -> Vec<&str> {
    head.split("\r\n").skip(1).filter(|line| !line.is_empty()).collect()
}
