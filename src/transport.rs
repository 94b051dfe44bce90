//! Network transports carrying GELF payloads to the collector.
//!
//! Two wire transports are supported: TCP with a mandatory TLS handshake
//! (null-byte message framing, as GELF-over-TCP requires) and plain UDP
//! datagrams. Both are consumed through the minimal [`Transport`]
//! capability so the write path can swap in fakes under test.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use native_tls::{TlsConnector, TlsStream};

use crate::error::Error;
use crate::settings::{TransportConfig, TransportKind};

/// One open connection to the collector.
///
/// Implementations deliver a single framed message per [`send`] call and
/// release OS resources on [`close`]. The caller owns the lifecycle: a
/// handle is replaced wholesale on reconnect, never reused.
///
/// [`send`]: Transport::send
/// [`close`]: Transport::close
pub trait Transport: Send {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

/// Builds fresh transport handles during reconnect attempts.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Transport>, Error>;
}

/// Connector backed by a resolved [`TransportConfig`].
#[derive(Clone, Debug)]
pub struct ConfigConnector {
    config: TransportConfig,
}

impl ConfigConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Connector for ConfigConnector {
    fn connect(&self) -> Result<Box<dyn Transport>, Error> {
        connect(&self.config)
    }
}

/// Establish a live connection for the configured transport kind.
pub fn connect(config: &TransportConfig) -> Result<Box<dyn Transport>, Error> {
    match config.kind {
        TransportKind::Tls => Ok(Box::new(TlsTransport::connect(config)?)),
        TransportKind::Udp => Ok(Box::new(UdpTransport::connect(config)?)),
    }
}

/// TLS-secured TCP transport with GELF null-byte framing.
pub struct TlsTransport {
    stream: TlsStream<TcpStream>,
}

impl TlsTransport {
    /// Open a TCP connection and negotiate TLS.
    ///
    /// Certificate verification is on unless the configuration explicitly
    /// opts out. The configured timeout bounds the TCP connect, the
    /// handshake, and subsequent writes.
    pub fn connect(config: &TransportConfig) -> Result<Self, Error> {
        let stream = connect_tcp(&config.host, config.port, config.connect_timeout)
            .map_err(Error::ConnectionFailed)?;
        stream
            .set_read_timeout(Some(config.connect_timeout))
            .and_then(|()| stream.set_write_timeout(Some(config.connect_timeout)))
            .map_err(Error::ConnectionFailed)?;

        let mut builder = TlsConnector::builder();
        if config.skip_tls_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        let connector = builder
            .build()
            .map_err(|e| Error::ConnectionFailed(io::Error::other(e)))?;
        let stream = connector
            .connect(&config.host, stream)
            .map_err(|e| Error::ConnectionFailed(io::Error::other(e)))?;
        Ok(Self { stream })
    }
}

impl Transport for TlsTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.stream.write_all(&null_frame(payload))?;
        self.stream.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown()?;
        self.stream.get_ref().shutdown(Shutdown::Both)
    }
}

/// Connectionless UDP transport; one datagram per message.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Allocate a local socket and fix the collector as its peer.
    ///
    /// Send-and-forget: success here only means address resolution and
    /// local resource allocation worked.
    pub fn connect(config: &TransportConfig) -> Result<Self, Error> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(Error::ConnectionFailed)?;
        socket
            .connect((config.host.as_str(), config.port))
            .map_err(Error::ConnectionFailed)?;
        Ok(Self { socket })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.socket.send(payload).map(|_| ())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// GELF over TCP delimits messages with a single null byte.
fn null_frame(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 1);
    framed.extend_from_slice(payload);
    framed.push(0);
    framed
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {host}:{port}"),
        )
    }))
}
