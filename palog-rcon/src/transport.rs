//! Connection seam between [`RconClient`](crate::RconClient) and the wire.
//!
//! A [`Dialer`] opens and authenticates one connection; the resulting
//! [`Session`] runs commands and is closed by the client after every command.
//! Responses are raw bytes so that garbled output can still be salvaged.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ExecuteError, TransportError};
use crate::packet::{self, Packet, SERVERDATA_AUTH, SERVERDATA_AUTH_RESPONSE, SERVERDATA_EXECCOMMAND};

/// Opens authenticated RCON sessions.
#[allow(async_fn_in_trait)]
pub trait Dialer {
    type Session: Session;

    /// Connect to `endpoint` and authenticate, giving up after `timeout`.
    async fn dial(
        &self,
        endpoint: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self::Session, TransportError>;
}

/// One authenticated connection.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Run `command` and return the raw response body.
    ///
    /// On failure the error carries whatever part of the body had arrived.
    async fn execute(&mut self, command: &str, deadline: Duration) -> Result<Vec<u8>, ExecuteError>;

    /// Tear the connection down.
    async fn close(self);
}

/// Dials real TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

pub struct TcpSession {
    stream: TcpStream,
    next_id: i32,
}

impl Dialer for TcpDialer {
    type Session = TcpSession;

    async fn dial(
        &self,
        endpoint: &str,
        password: &str,
        dial_timeout: Duration,
    ) -> Result<TcpSession, TransportError> {
        let handshake = async {
            let stream = TcpStream::connect(endpoint).await?;
            let mut session = TcpSession { stream, next_id: 1 };
            session.authenticate(password).await?;
            Ok::<_, TransportError>(session)
        };

        timeout(dial_timeout, handshake)
            .await
            .map_err(|_| TransportError::Timeout(dial_timeout))?
    }
}

impl TcpSession {
    async fn send(&mut self, kind: i32, body: &[u8]) -> io::Result<i32> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.stream.write_all(&packet::encode(id, kind, body)).await?;
        Ok(id)
    }

    async fn exchange(&mut self, command: &str, received: &mut Vec<u8>) -> io::Result<Packet> {
        self.send(SERVERDATA_EXECCOMMAND, command.as_bytes()).await?;
        read_packet(&mut self.stream, received).await
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), TransportError> {
        let id = self.send(SERVERDATA_AUTH, password.as_bytes()).await?;
        let mut buf = Vec::new();
        loop {
            let reply = read_packet(&mut self.stream, &mut buf).await?;
            // Some servers send an empty response value ahead of the verdict.
            if reply.kind != SERVERDATA_AUTH_RESPONSE {
                continue;
            }
            if reply.id != id {
                return Err(TransportError::AuthRejected);
            }
            return Ok(());
        }
    }
}

impl Session for TcpSession {
    async fn execute(&mut self, command: &str, deadline: Duration) -> Result<Vec<u8>, ExecuteError> {
        // Palworld answers every command with a single packet.
        let mut received = Vec::new();
        let result = timeout(deadline, self.exchange(command, &mut received)).await;

        match result {
            Ok(Ok(reply)) => Ok(reply.body),
            Ok(Err(e)) => Err(ExecuteError::with_partial(packet::partial_body(&received), e.into())),
            Err(_) => Err(ExecuteError::with_partial(
                packet::partial_body(&received),
                TransportError::Timeout(deadline),
            )),
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "rcon shutdown failed");
        }
    }
}

/// Read until `buf` holds a whole packet, then take it off the front.
///
/// Bytes of an unfinished packet stay in `buf` if this future is dropped or fails.
async fn read_packet(stream: &mut TcpStream, buf: &mut Vec<u8>) -> io::Result<Packet> {
    let mut chunk = [0u8; 4096];
    loop {
        if let Some((packet, used)) = packet::decode(buf)? {
            buf.drain(..used);
            return Ok(packet);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const PASSWORD: &str = "secret";

    /// Read one whole packet off a server-side socket.
    async fn recv(stream: &mut TcpStream) -> Packet {
        let mut buf = Vec::new();
        read_packet(stream, &mut buf).await.unwrap()
    }

    /// Accept one client, answer its login, then hand the socket to `serve`.
    async fn server<F, Fut>(serve: F) -> String
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let auth = recv(&mut stream).await;
            let verdict = if auth.body == PASSWORD.as_bytes() { auth.id } else { -1 };
            stream.write_all(&packet::encode(auth.id, 0, b"")).await.unwrap();
            stream
                .write_all(&packet::encode(verdict, SERVERDATA_AUTH_RESPONSE, b""))
                .await
                .unwrap();
            serve(stream).await;
        });
        endpoint
    }

    #[tokio::test]
    async fn test_execute_returns_raw_bytes() {
        let body = b"name,playeruid,steamid\nAl\xE3\x81,123456789,1\n\0\0";
        let endpoint = server(move |mut stream| async move {
            let command = recv(&mut stream).await;
            assert_eq!(command.kind, SERVERDATA_EXECCOMMAND);
            assert_eq!(command.body, b"ShowPlayers");
            stream.write_all(&packet::encode(command.id, 0, body)).await.unwrap();
        })
        .await;

        let mut session = TcpDialer
            .dial(&endpoint, PASSWORD, Duration::from_secs(1))
            .await
            .unwrap();
        let output = session.execute("ShowPlayers", Duration::from_secs(1)).await.unwrap();
        session.close().await;

        assert_eq!(output, body);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let endpoint = server(|_| async {}).await;
        let result = TcpDialer.dial(&endpoint, "wrong", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TransportError::AuthRejected)));
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_body() {
        let endpoint = server(|mut stream| async move {
            let command = recv(&mut stream).await;
            // Promise a long body, deliver only part of it and stall.
            let mut buf = packet::encode(command.id, 0, &[b'x'; 100]);
            buf.truncate(12 + 30);
            buf[12..42].copy_from_slice(b"name,playeruid,steamid\nAlice,1");
            stream.write_all(&buf).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;

        let mut session = TcpDialer
            .dial(&endpoint, PASSWORD, Duration::from_secs(1))
            .await
            .unwrap();
        let err = session
            .execute("ShowPlayers", Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err.source, TransportError::Timeout(_)));
        assert_eq!(err.partial, b"name,playeruid,steamid\nAlice,1");
    }

    #[tokio::test]
    async fn test_dial_times_out_without_login_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = TcpDialer.dial(&endpoint, PASSWORD, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(TransportError::Timeout(_))));
    }
}
