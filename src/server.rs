//! Minimal HTTP/1.1 front end: one request per connection, answered with
//! `Connection: close`.
//!
//! Routes:
//! - `POST /` runs the body as a query
//! - `GET /tables` lists the tables
//! - `POST /save` persists the database
//!
//! Anything else is answered with `400 Bad Request`.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, warn};

use crate::shared::SharedDatabase;

/// Upper bound of the request line plus headers.
pub const MAX_HEADER_SIZE: usize = 16 * 1024;
/// Upper bound of a request body.
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug)]
enum RequestError {
    Malformed(&'static str),
    TooLarge,
    Io(io::Error),
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
    json: bool,
}

impl Response {
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: vec![],
            json: false,
        }
    }

    pub fn json(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            json: true,
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, self.reason());
        if self.json {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        ));

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// HTTP listener bound to an address and serving one [SharedDatabase].
pub struct Server {
    listener: TcpListener,
    db: SharedDatabase,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs, db: SharedDatabase) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, db })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the task is dropped, serving each one on
    /// its own task.
    pub async fn serve(self) -> io::Result<()> {
        info!("listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    let db = self.db.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(db, stream).await {
                            warn!(%peer, "connection error: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {e}");
                }
            }
        }
    }
}

async fn handle_connection(db: SharedDatabase, mut stream: TcpStream) -> io::Result<()> {
    let response = match read_request(&mut stream).await {
        Ok(request) => {
            // the pipeline and the file IO of a save are blocking
            match tokio::task::spawn_blocking(move || route(&db, &request)).await {
                Ok(response) => response,
                Err(e) => {
                    error!("request handler failed: {e}");
                    Response::empty(500)
                }
            }
        }
        Err(RequestError::TooLarge) => {
            warn!("request body too large");
            Response::empty(413)
        }
        Err(RequestError::Malformed(reason)) => {
            warn!("malformed request: {reason}");
            Response::empty(400)
        }
        Err(RequestError::Io(e)) => return Err(e),
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await
}

/// Dispatches one request to the database.
pub fn route(db: &SharedDatabase, request: &Request) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/") => match db.execute(&request.body) {
            Ok(Some(json)) => Response::json(json),
            Ok(None) => Response::empty(200),
            Err(e) => {
                warn!(error = %e, "query rejected");
                Response::empty(400)
            }
        },
        ("GET", "/tables") => match serde_json::to_vec(&db.metadata()) {
            Ok(json) => Response::json(json),
            Err(e) => {
                error!("failed to encode metadata: {e}");
                Response::empty(500)
            }
        },
        ("POST", "/save") => match db.save() {
            Ok(()) => Response::empty(200),
            Err(e) => {
                error!("save failed: {e}");
                Response::empty(500)
            }
        },
        (method, path) => {
            warn!(%method, %path, "no route");
            Response::empty(400)
        }
    }
}

async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, RequestError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEADER_SIZE {
            return Err(RequestError::Malformed("headers too large"));
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Malformed("connection closed before end of headers"));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end])
        .map_err(|_| RequestError::Malformed("headers are not UTF-8"))?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(_version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::Malformed("bad request line"));
    };
    let method = method.to_string();
    let path = target.split('?').next().unwrap_or_default().to_string();

    let mut content_length = 0;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            return Err(RequestError::Malformed("bad header line"));
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| RequestError::Malformed("bad content length"))?;
        }
    }
    if content_length > MAX_BODY_SIZE {
        return Err(RequestError::TooLarge);
    }

    let mut body = buf.split_off(header_end + 4);
    while body.len() < content_length {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Malformed("connection closed before end of body"));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(Request { method, path, body })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
