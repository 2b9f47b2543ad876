//! The cross-process rendezvous carrying the id-mapping handshake.
//!
//! A close-on-exec SEQPACKET socketpair, one endpoint per process,
//! used for exactly two messages: the child reports whether it got a
//! user namespace, and the parent acknowledges once the id-mapping
//! table is in place. Each side closes its endpoint when its role
//! ends; the peer observes closure as a short read and gets an exit
//! path instead of an indefinite hang.

use std::os::fd::{AsRawFd, OwnedFd};

use cordon_common::error::{CordonError, Result};
use nix::sys::socket::{AddressFamily, SockFlag, SockType, socketpair};

const MSG_LEN: usize = size_of::<i32>();

/// Creates the handshake channel.
///
/// # Errors
///
/// Returns [`CordonError::SyncProtocol`] if the socketpair cannot be
/// created.
pub fn channel() -> Result<(ParentEndpoint, ChildEndpoint)> {
    let (parent, child) = socketpair(
        AddressFamily::Unix,
        SockType::SeqPacket,
        None,
        SockFlag::SOCK_CLOEXEC,
    )
    .map_err(|_| CordonError::SyncProtocol { stage: "socketpair" })?;
    Ok((ParentEndpoint { fd: parent }, ChildEndpoint { fd: child }))
}

/// Launcher-side endpoint: reads the child's report, answers with a
/// status.
#[derive(Debug)]
pub struct ParentEndpoint {
    fd: OwnedFd,
}

impl ParentEndpoint {
    /// Blocks until the child reports whether it created a user
    /// namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::SyncProtocol`] on a short read, which
    /// includes the child dying before it could report.
    pub fn recv_userns_report(&self) -> Result<bool> {
        Ok(recv_i32(&self.fd, "child-report")? != 0)
    }

    /// Tells the child the mapping phase is complete.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::SyncProtocol`] on a short write.
    pub fn send_ack(&self) -> Result<()> {
        send_i32(&self.fd, 0, "parent-ack")
    }
}

/// Sandbox-side endpoint: reports the namespace attempt, waits for
/// the mapping acknowledgement.
#[derive(Debug)]
pub struct ChildEndpoint {
    fd: OwnedFd,
}

impl ChildEndpoint {
    /// Reports whether a user namespace was created.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::SyncProtocol`] on a short write.
    pub fn send_userns_report(&self, created: bool) -> Result<()> {
        send_i32(&self.fd, i32::from(created), "child-report")
    }

    /// Blocks until the parent acknowledges the mapping phase.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::SyncProtocol`] on a short read (the
    /// parent died or gave up) or on a nonzero status.
    pub fn recv_ack(&self) -> Result<()> {
        if recv_i32(&self.fd, "parent-ack")? != 0 {
            return Err(CordonError::SyncProtocol {
                stage: "parent-ack-status",
            });
        }
        Ok(())
    }
}

fn send_i32(fd: &OwnedFd, value: i32, stage: &'static str) -> Result<()> {
    let bytes = value.to_ne_bytes();
    let written = nix::unistd::write(fd.as_raw_fd(), &bytes)
        .map_err(|_| CordonError::SyncProtocol { stage })?;
    if written != MSG_LEN {
        return Err(CordonError::SyncProtocol { stage });
    }
    Ok(())
}

fn recv_i32(fd: &OwnedFd, stage: &'static str) -> Result<i32> {
    let mut bytes = [0u8; MSG_LEN];
    let read = nix::unistd::read(fd.as_raw_fd(), &mut bytes)
        .map_err(|_| CordonError::SyncProtocol { stage })?;
    if read != MSG_LEN {
        return Err(CordonError::SyncProtocol { stage });
    }
    Ok(i32::from_ne_bytes(bytes))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn report_and_ack_round_trip() {
        let (parent, child) = channel().unwrap();
        child.send_userns_report(true).unwrap();
        assert!(parent.recv_userns_report().unwrap());
        parent.send_ack().unwrap();
        child.recv_ack().unwrap();
    }

    #[test]
    fn report_false_survives_the_trip() {
        let (parent, child) = channel().unwrap();
        child.send_userns_report(false).unwrap();
        assert!(!parent.recv_userns_report().unwrap());
    }

    #[test]
    fn peer_close_reads_as_protocol_failure() {
        let (parent, child) = channel().unwrap();
        drop(parent);
        match child.recv_ack() {
            Err(CordonError::SyncProtocol { stage }) => assert_eq!(stage, "parent-ack"),
            other => panic!("expected SyncProtocol, got {other:?}"),
        }
    }

    #[test]
    fn write_after_peer_close_is_a_protocol_failure() {
        let (parent, child) = channel().unwrap();
        drop(parent);
        assert!(child.send_userns_report(true).is_err());
    }
}
