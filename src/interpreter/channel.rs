use std::{
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    sync::Mutex,
};

use crate::error::RuntimeError;
use crate::interpreter::evaluator::core::EvalResult;

/// One direction-split TCP connection: buffered reads, direct writes.
struct Conn {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Conn {
    fn from_stream(stream: TcpStream, line: usize) -> EvalResult<Self> {
        let writer = stream.try_clone()
                           .map_err(|e| RuntimeError::SocketIo { details: e.to_string(),
                                                                 line })?;
        Ok(Self { reader: BufReader::new(stream),
                  writer })
    }
}

/// A connected client channel, or an accepted server-side connection.
///
/// Messages are line-framed UTF-8: [`send`](Self::send) appends a newline to
/// the payload and [`recv`](Self::recv) reads up to and including the next
/// newline, stripping it from the returned value, so a round trip preserves
/// the payload exactly.
///
/// The handle exclusively owns its OS socket. [`close`](Self::close) is
/// idempotent; `send` and `recv` on a closed handle report
/// [`RuntimeError::ChannelClosed`].
pub struct ClientChannel {
    conn: Mutex<Option<Conn>>,
}

impl ClientChannel {
    /// Connects a TCP client socket to `host:port`.
    ///
    /// # Errors
    /// Returns `RuntimeError::SocketIo` when the connection fails.
    pub fn connect(host: &str, port: u16, line: usize) -> EvalResult<Self> {
        let stream = TcpStream::connect((host, port))
            .map_err(|e| RuntimeError::SocketIo { details: e.to_string(),
                                                  line })?;
        Self::from_stream(stream, line)
    }

    /// Wraps an already-connected stream, as produced by `accept`.
    pub(crate) fn from_stream(stream: TcpStream, line: usize) -> EvalResult<Self> {
        Ok(Self { conn: Mutex::new(Some(Conn::from_stream(stream, line)?)), })
    }

    /// Writes `text` followed by the line delimiter.
    ///
    /// # Errors
    /// Returns `ChannelClosed` on a closed handle or `SocketIo` when the
    /// write fails.
    pub fn send(&self, text: &str, line: usize) -> EvalResult<()> {
        let mut guard = self.conn
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let conn = guard.as_mut()
                        .ok_or(RuntimeError::ChannelClosed { line })?;

        conn.writer
            .write_all(text.as_bytes())
            .and_then(|()| conn.writer.write_all(b"\n"))
            .and_then(|()| conn.writer.flush())
            .map_err(|e| RuntimeError::SocketIo { details: e.to_string(),
                                                  line })
    }

    /// Reads one line-framed message, without the delimiter.
    ///
    /// At end of stream the bytes read so far (possibly none) are returned.
    ///
    /// # Errors
    /// Returns `ChannelClosed` on a closed handle or `SocketIo` when the
    /// read fails.
    pub fn recv(&self, line: usize) -> EvalResult<String> {
        let mut guard = self.conn
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let conn = guard.as_mut()
                        .ok_or(RuntimeError::ChannelClosed { line })?;

        let mut buffer = String::new();
        conn.reader
            .read_line(&mut buffer)
            .map_err(|e| RuntimeError::SocketIo { details: e.to_string(),
                                                  line })?;

        if buffer.ends_with('\n') {
            buffer.pop();
            if buffer.ends_with('\r') {
                buffer.pop();
            }
        }
        Ok(buffer)
    }

    /// Releases the socket. Further `close` calls are no-ops.
    pub fn close(&self) {
        self.conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
    }
}

/// A listening server channel.
///
/// Created by an `s_channel` declaration, which binds the listener
/// immediately. Each [`accept`](Self::accept) blocks until a client connects
/// and yields the per-client connection as a [`ClientChannel`].
pub struct ServerChannel {
    listener: Mutex<Option<TcpListener>>,
}

impl ServerChannel {
    /// Binds a TCP listener at `host:port`.
    ///
    /// # Errors
    /// Returns `RuntimeError::SocketIo` when the bind fails.
    pub fn bind(host: &str, port: u16, line: usize) -> EvalResult<Self> {
        let listener = TcpListener::bind((host, port))
            .map_err(|e| RuntimeError::SocketIo { details: e.to_string(),
                                                  line })?;
        Ok(Self { listener: Mutex::new(Some(listener)), })
    }

    /// Blocks until a client connects and returns the connection.
    ///
    /// # Errors
    /// Returns `ChannelClosed` on a closed handle or `SocketIo` when the
    /// accept fails.
    pub fn accept(&self, line: usize) -> EvalResult<ClientChannel> {
        let guard = self.listener
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
        let listener = guard.as_ref()
                            .ok_or(RuntimeError::ChannelClosed { line })?;

        let (stream, _) = listener.accept()
                                  .map_err(|e| RuntimeError::SocketIo { details: e.to_string(),
                                                                        line })?;
        ClientChannel::from_stream(stream, line)
    }

    /// Stops listening. Further `close` calls are no-ops.
    pub fn close(&self) {
        self.listener
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
    }
}
