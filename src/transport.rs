//! Framed duplex channel between coordinator and workers.
//!
//! One length-delimited frame carries one protocol message, so a single
//! send is atomic and disconnects surface as end-of-stream on the read
//! half. TCP keeps per-connection ordering for us.

use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::{JobcastError, Result};

pub type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

pub fn framed(stream: TcpStream) -> FramedStream {
    Framed::new(stream, LengthDelimitedCodec::new())
}

/// Extract `host:port` from a connect url.
///
/// Accepts `tcp://host:port`, `ws://host:port` (scheme kept for
/// compatibility with the reference wire), and bare `host:port`.
pub fn parse_url(url: &str) -> Result<String> {
    let trimmed = url.trim();

    let addr = trimmed
        .strip_prefix("tcp://")
        .or_else(|| trimmed.strip_prefix("ws://"))
        .unwrap_or(trimmed);

    let addr = addr.trim_end_matches('/');

    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(addr.to_string())
        }
        _ => Err(JobcastError::BadUrl(url.to_string())),
    }
}

pub async fn connect(url: &str) -> Result<FramedStream> {
    let addr = parse_url(url)?;
    let stream = TcpStream::connect(&addr).await?;
    Ok(framed(stream))
}
