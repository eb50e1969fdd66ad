use serde::de::DeserializeOwned;
use serde::Serialize;
use shelfie::{Intent, Update};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::trace;

use super::{IntentSource, Link, UpdateSink};
use crate::TransportError;

/// Reads one JSON document per line.
pub struct JsonLineReader<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> JsonLineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Returns `None` at the end of the stream. Blank lines are skipped.
    pub async fn read<T: DeserializeOwned>(&mut self) -> Result<Option<T>, TransportError> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            trace!(message = %line, "Received");
            return Ok(Some(serde_json::from_str(line)?));
        }
    }
}

/// Writes one JSON document per line.
pub struct JsonLineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> JsonLineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write<T: Serialize>(&mut self, message: &T) -> Result<(), TransportError> {
        let mut json = serde_json::to_string(message)?;
        trace!(message = %json, "Sending");
        json.push('\n');
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> IntentSource for JsonLineReader<R> {
    async fn next_intent(&mut self) -> Result<Option<Intent>, TransportError> {
        self.read().await
    }
}

#[async_trait::async_trait]
impl<W: AsyncWrite + Unpin + Send> UpdateSink for JsonLineWriter<W> {
    async fn push(&mut self, update: &Update) -> Result<(), TransportError> {
        self.write(update).await
    }
}

/// Serves a client over any byte stream, e.g. a socket or a pipe.
pub fn stream_link<R, W>(peer: &str, reader: R, writer: W) -> Link
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    Link {
        peer: String::from(peer),
        source: Box::new(JsonLineReader::new(reader)),
        sink: Box::new(JsonLineWriter::new(writer)),
    }
}

pub fn tcp_link(stream: TcpStream) -> Link {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => String::from("unknown"),
    };
    let (reader, writer) = stream.into_split();
    stream_link(&peer, reader, writer)
}

/// The client side of a stream connection.
pub struct StreamClient<R, W> {
    reader: JsonLineReader<R>,
    writer: JsonLineWriter<W>,
}

impl<R, W> StreamClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: JsonLineReader::new(reader),
            writer: JsonLineWriter::new(writer),
        }
    }

    pub async fn send(&mut self, intent: &Intent) -> Result<(), TransportError> {
        self.writer.write(intent).await
    }

    /// Returns `None` once the server has closed the connection.
    pub async fn next_update(&mut self) -> Result<Option<Update>, TransportError> {
        self.reader.read().await
    }
}

#[cfg(test)]
mod tests {
    use shelfie::Action;

    use super::*;

    #[tokio::test]
    async fn lines_in_both_directions() {
        let (client_io, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let mut link = stream_link("test", server_read, server_write);
        let (client_read, client_write) = tokio::io::split(client_io);
        let mut client = StreamClient::new(client_read, client_write);

        let intent = Intent::new("alice", "s1", Action::Ping);
        client.send(&intent).await.unwrap();
        assert_eq!(link.source.next_intent().await.unwrap(), Some(intent));

        link.sink.push(&Update::Heartbeat).await.unwrap();
        assert_eq!(client.next_update().await.unwrap(), Some(Update::Heartbeat));

        drop(client);
        assert!(link.source.next_intent().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let (mut client_io, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let mut link = stream_link("test", server_read, server_write);
        client_io.write_all(b"\n{\"type\":\"Dance\"}\n").await.unwrap();
        assert!(matches!(
            link.source.next_intent().await,
            Err(TransportError::Malformed(_))
        ));
    }
}
