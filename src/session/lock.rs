//! Single-instance lock.
//!
//! The lock is a listening socket on a fixed loopback port. The OS refuses a
//! second bind while the first listener is open and frees the port when the
//! process exits, so a crashed instance never leaves a stale claim.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};

use crate::error::AlreadyRunningError;
use crate::{Error, Result};

/// Process-wide exclusive claim, held until dropped or released.
#[derive(Debug)]
pub struct InstanceLock {
    listener: TcpListener,
    addr: SocketAddr,
}

impl InstanceLock {
    /// Claim `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if another process (or another lock
    /// in this process) holds the address, or [`Error::Io`] if the socket
    /// cannot be bound for another reason.
    pub fn acquire(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| {
            if e.kind() == ErrorKind::AddrInUse {
                Error::from(AlreadyRunningError {
                    address: addr.to_string(),
                })
            } else {
                Error::Io(e)
            }
        })?;

        tracing::debug!(%addr, "Instance lock acquired");
        Ok(Self { listener, addr })
    }

    /// Address the lock was requested on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Address actually bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Release the claim.
    pub fn release(self) {
        tracing::debug!(addr = %self.addr, "Instance lock released");
        drop(self.listener);
    }
}
