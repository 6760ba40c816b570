use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::auth::AuthTable;
use crate::config::Config;
use crate::http::handler;
use crate::http::io::HttpStream;
use crate::http::parser::{parse_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;
use crate::resolver::{self, Lookup, PathInfo};

/// Handles a single HTTP client connection.
///
/// The `Connection` manages the lifecycle of one accepted stream: reading
/// and parsing the request, resolving and gating it, and emitting exactly
/// one response. It implements a state machine to handle the stages of
/// request/response processing.
///
/// # State Machine
///
/// The connection moves through these states:
///
/// 1. **Reading**: Reads data from the client and parses the incoming HTTP request
/// 2. **Dispatching**: Resolves the URL against the document root and runs the auth gate
/// 3. **Responding**: Sends the response (file stream, listing, redirect, challenge, or error)
/// 4. **Closing**: Connection is being terminated
///
/// Every response carries `Connection: close`, so the machine never cycles
/// back to Reading; after Responding the connection is torn down.
///
/// # Example
///
/// ```ignore
/// use palisade::http::connection::Connection;
/// use tokio::net::TcpListener;
///
/// let listener = TcpListener::bind("127.0.0.1:8080").await?;
///
/// loop {
///     let (socket, peer) = listener.accept().await?;
///     let cfg = cfg.clone();
///     let realms = realms.clone();
///     tokio::spawn(async move {
///         let mut conn = Connection::new(socket, peer, cfg, realms);
///         let _ = conn.run().await;
///     });
/// }
/// ```
pub struct Connection<S> {
    io: HttpStream<S>,
    peer: SocketAddr,
    config: Arc<Config>,
    realms: Arc<AuthTable>,
    buffer: BytesMut,
    state: State,
    request_start: Option<Instant>,
}

/// Represents the state of an HTTP connection in its processing lifecycle.
enum State {
    /// Reading state: Connection is waiting for HTTP request data
    Reading,
    /// Dispatching state: A complete request has been parsed and needs resolving
    Dispatching(Request),
    /// Responding state: The dispatch decision is ready to be executed
    Responding(Request, Action),
    /// Closing state: Connection should be closed
    Closing,
}

/// What the dispatcher decided to answer.
enum Action {
    Serve(PathInfo),
    Redirect(String),
    Challenge,
    NotAllowed,
    NotFound,
}

enum ReadError {
    Malformed(ParseError),
    Io(io::Error),
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(
        stream: S,
        peer: SocketAddr,
        config: Arc<Config>,
        realms: Arc<AuthTable>,
    ) -> Self {
        let timeout = Duration::from_secs(config.server.network_timeout);

        Self {
            io: HttpStream::new(stream, timeout),
            peer,
            config,
            realms,
            buffer: BytesMut::with_capacity(4096),
            state: State::Reading,
            request_start: None,
        }
    }

    /// Runs the connection state machine until the connection closes.
    ///
    /// Each request is logged with method, path, status code, and duration.
    /// I/O failures anywhere abort the current response and fall through to
    /// Closing without writing further bytes.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, State::Reading) {
                State::Reading => {
                    tracing::debug!("Connection state: Reading");
                    match self.read_request().await {
                        Ok(Some(req)) => {
                            self.request_start = Some(Instant::now());
                            tracing::info!(
                                method = ?req.method,
                                url = %req.url,
                                peer = %self.peer,
                                "Received HTTP request"
                            );
                            self.state = State::Dispatching(req);
                        }
                        Ok(None) => {
                            tracing::debug!("Client closed connection");
                            self.state = State::Closing;
                        }
                        Err(ReadError::Malformed(e)) => {
                            tracing::debug!(error = ?e, "Malformed request");
                            let _ = self
                                .io
                                .send_error(StatusCode::BadRequest, "Bad Request")
                                .await;
                            self.state = State::Closing;
                        }
                        Err(ReadError::Io(e)) => {
                            tracing::debug!(error = %e, "Read failed");
                            self.state = State::Closing;
                        }
                    }
                }

                State::Dispatching(mut req) => {
                    tracing::debug!("Connection state: Dispatching");
                    let action = self.dispatch(&mut req);
                    self.state = State::Responding(req, action);
                }

                State::Responding(req, action) => {
                    tracing::debug!("Connection state: Responding");
                    match self.respond(&req, action).await {
                        Ok(status) => {
                            if let Some(start) = self.request_start.take() {
                                tracing::info!(
                                    method = ?req.method,
                                    url = %req.url,
                                    status = status,
                                    duration_ms = start.elapsed().as_millis(),
                                    "HTTP request completed"
                                );
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "Response aborted");
                        }
                    }
                    self.state = State::Closing;
                }

                State::Closing => {
                    tracing::debug!("Connection state: Closing");
                    self.io.close().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads and parses a complete HTTP request from the client.
    ///
    /// The internal buffer handles partial reads; the parser is retried on
    /// every received fragment until it yields a request or rejects the
    /// bytes.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))` - A complete, valid HTTP request has been parsed
    /// - `Ok(None)` - The client closed the connection before sending a request
    /// - `Err(_)` - An I/O error occurred or the HTTP is malformed
    async fn read_request(&mut self) -> Result<Option<Request>, ReadError> {
        loop {
            // Try parsing whatever we already have
            match parse_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data, fall through to read
                }

                Err(e) => {
                    return Err(ReadError::Malformed(e));
                }
            }

            let mut temp = [0u8; 1024];
            let n = self.io.recv(&mut temp).await.map_err(ReadError::Io)?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    /// Decides how to answer: resolve the URL, then run the auth gate.
    fn dispatch(&self, req: &mut Request) -> Action {
        if matches!(req.method, Method::Other(_)) {
            return Action::NotAllowed;
        }

        match resolver::resolve(&self.config, &req.url) {
            Lookup::NotFound => Action::NotFound,
            Lookup::Redirect { location } => Action::Redirect(location),
            Lookup::Found(pi) => {
                if self.realms.check(req, &pi) {
                    Action::Serve(pi)
                } else {
                    Action::Challenge
                }
            }
        }
    }

    /// Executes the dispatch decision. Returns the status code sent.
    async fn respond(&mut self, req: &Request, action: Action) -> io::Result<u16> {
        match action {
            Action::Serve(pi) => handler::serve(&mut self.io, &self.config, req, &pi).await,

            Action::Redirect(location) => {
                self.io
                    .send(
                        format!(
                            "HTTP/1.1 302 Found\r\n\
                             Location: {}\r\n\
                             Connection: close\r\n\r\n",
                            location
                        )
                        .as_bytes(),
                    )
                    .await?;
                Ok(302)
            }

            Action::Challenge => {
                // The fixed body is exactly 23 bytes, so this response can
                // use Content-Length framing regardless of version.
                self.io
                    .send(
                        format!(
                            "{} 401 Authorization Required\r\n\
                             WWW-Authenticate: Basic realm=\"{}\"\r\n\
                             Content-Type: text/plain\r\n\
                             Content-Length: 23\r\n\r\n\
                             Authorization Required\n",
                            req.version.as_str(),
                            self.config.auth.realm
                        )
                        .as_bytes(),
                    )
                    .await?;
                Ok(401)
            }

            Action::NotAllowed => {
                self.io
                    .send_error(StatusCode::MethodNotAllowed, "Method Not Allowed")
                    .await?;
                Ok(405)
            }

            Action::NotFound => {
                self.io
                    .send_error(StatusCode::NotFound, "No such file or directory")
                    .await?;
                Ok(404)
            }
        }
    }
}
