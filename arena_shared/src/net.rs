//! Frame transport.
//!
//! One persistent TCP stream carries length-prefixed UTF-8 JSON text frames:
//! a u32 big-endian length, then that many payload bytes, one message per
//! frame. Decoding the text is the caller's job — a frame whose payload is
//! not valid JSON must be droppable without disturbing the stream, so the
//! transport hands out raw text.

use std::net::SocketAddr;

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use serde::Serialize;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
};

/// Upper bound for one frame payload. A length prefix beyond this leaves the
/// stream unsyncable, so it is a transport fault rather than a droppable
/// payload.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Read half of a frame connection.
#[derive(Debug)]
pub struct FrameReader {
    read: OwnedReadHalf,
}

impl FrameReader {
    /// Receives one text frame.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        let mut len_buf = [0u8; 4];
        self.read
            .read_exact(&mut len_buf)
            .await
            .context("read frame len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_LEN {
            anyhow::bail!("frame length {len} exceeds {MAX_FRAME_LEN}");
        }
        let mut payload = vec![0u8; len];
        self.read
            .read_exact(&mut payload)
            .await
            .context("read frame payload")?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }
}

/// Write half of a frame connection.
#[derive(Debug)]
pub struct FrameWriter {
    write: OwnedWriteHalf,
}

impl FrameWriter {
    /// Sends one text frame.
    pub async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        let payload = text.as_bytes();
        if payload.len() > MAX_FRAME_LEN {
            anyhow::bail!("frame length {} exceeds {MAX_FRAME_LEN}", payload.len());
        }
        let mut buf = BytesMut::with_capacity(4 + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(payload);
        self.write.write_all(&buf).await.context("write frame")?;
        Ok(())
    }

    /// Serializes `msg` as JSON and sends it as one frame.
    pub async fn send(&mut self, msg: &impl Serialize) -> anyhow::Result<()> {
        let text = serde_json::to_string(msg).context("serialize msg")?;
        self.send_text(&text).await
    }
}

/// A connected frame transport.
#[derive(Debug)]
pub struct FrameConn {
    reader: FrameReader,
    writer: FrameWriter,
}

impl FrameConn {
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        Ok(Self::new(stream))
    }

    pub fn new(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: FrameReader { read },
            writer: FrameWriter { write },
        }
    }

    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.reader.recv().await
    }

    pub async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.writer.send_text(text).await
    }

    pub async fn send(&mut self, msg: &impl Serialize) -> anyhow::Result<()> {
        self.writer.send(msg).await
    }

    /// Splits into independently owned halves so reads and writes can live
    /// on different tasks.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        (self.reader, self.writer)
    }
}

/// TCP listener producing frame connections.
pub struct FrameListener {
    listener: TcpListener,
}

impl FrameListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(FrameConn, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((FrameConn::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}
