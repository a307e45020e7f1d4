//! Non-blocking UDP socket wrapper for mio-based receive loops.
//!
//! The transport is fire-and-forget datagrams: no connection, no
//! retransmission. This wrapper adds `WouldBlock`-free try variants and
//! receive-buffer sizing (via rustix, which mio does not expose) so a mixer
//! ingesting bursts from many sources can widen its kernel buffer.

use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::os::fd::{AsFd, BorrowedFd};

use mio::event::Source;
use mio::net::UdpSocket as MioUdpSocket;
use mio::{Interest, Registry, Token};

/// A non-blocking UDP socket.
///
/// Use with mio's [`Poll`] for readiness notification; after a readable
/// event, drain with [`try_recv_from`] until it returns `None`.
///
/// [`Poll`]: mio::Poll
/// [`try_recv_from`]: UdpSocket::try_recv_from
pub struct UdpSocket {
    inner: MioUdpSocket,
}

impl UdpSocket {
    /// Creates a UDP socket bound to `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let inner = MioUdpSocket::bind(addr)?;
        Ok(Self { inner })
    }

    /// Returns the local address this socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be retrieved.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Sends one datagram to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, including `WouldBlock` when the
    /// socket is not ready for writing.
    pub fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, dest)
    }

    /// Attempts to receive, returning `Ok(None)` instead of `WouldBlock`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure other than `WouldBlock`.
    pub fn try_recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.inner.recv_from(buf) {
            Ok((n, addr)) => Ok(Some((n, addr))),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sets the socket's kernel receive buffer size.
    ///
    /// # Errors
    ///
    /// Returns an error if the option cannot be set.
    pub fn set_recv_buffer_size(&self, size: usize) -> io::Result<()> {
        rustix::net::sockopt::set_socket_recv_buffer_size(self.inner.as_fd(), size)?;
        Ok(())
    }

    /// Gets the socket's kernel receive buffer size.
    ///
    /// # Errors
    ///
    /// Returns an error if the option cannot be retrieved.
    pub fn recv_buffer_size(&self) -> io::Result<usize> {
        Ok(rustix::net::sockopt::get_socket_recv_buffer_size(
            self.inner.as_fd(),
        )?)
    }
}

impl AsFd for UdpSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.inner.as_fd()
    }
}

impl Source for UdpSocket {
    fn register(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        self.inner.register(registry, token, interests)
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        self.inner.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        self.inner.deregister(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_ephemeral_and_query_addr() {
        let socket = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = socket.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn recv_buffer_size_is_tunable() {
        let socket = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        socket.set_recv_buffer_size(256 * 1024).unwrap();
        // Kernels round the requested size; just check it grew past zero.
        assert!(socket.recv_buffer_size().unwrap() > 0);
    }

    #[test]
    fn empty_socket_recv_would_block() {
        let socket = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let mut buf = [0u8; 16];
        assert!(socket.try_recv_from(&mut buf).unwrap().is_none());
    }
}
