//! # Transport Layer
//!
//! Moves opaque packets between the authority and a peer. Replication
//! code only sees the [`Transport`] trait; the loopback implementation
//! runs both ends in one process.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use strata_shared::MAX_PACKET_SIZE;

use crate::error::{NetworkError, NetworkResult};

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
}

/// A datagram-style packet channel.
pub trait Transport: Send {
    /// Sends one packet.
    ///
    /// # Errors
    ///
    /// [`NetworkError::PacketTooLarge`] above the size limit,
    /// [`NetworkError::Disconnected`] if the other end is gone.
    fn send(&mut self, packet: &[u8]) -> NetworkResult<()>;

    /// Takes the next received packet, if any, without blocking.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Disconnected`] once the other end is gone and every
    /// queued packet was taken.
    fn recv(&mut self) -> NetworkResult<Option<Vec<u8>>>;

    /// Largest packet this transport accepts.
    fn max_packet_size(&self) -> usize;

    /// Statistics so far.
    fn stats(&self) -> TransportStats;
}

/// In-process transport over a pair of unbounded channels.
#[derive(Debug)]
pub struct LoopbackTransport {
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
    max_packet_size: usize,
    stats: TransportStats,
}

impl LoopbackTransport {
    /// Two connected ends with the default MTU.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::pair_with_mtu(MAX_PACKET_SIZE)
    }

    /// Two connected ends with a custom size limit.
    #[must_use]
    pub fn pair_with_mtu(max_packet_size: usize) -> (Self, Self) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();
        let end = |sender, receiver| Self {
            sender,
            receiver,
            max_packet_size,
            stats: TransportStats::default(),
        };
        (end(a_tx, a_rx), end(b_tx, b_rx))
    }

    /// Packets waiting to be received on this end.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, packet: &[u8]) -> NetworkResult<()> {
        if packet.len() > self.max_packet_size {
            self.stats.send_errors += 1;
            return Err(NetworkError::PacketTooLarge {
                size: packet.len(),
                max: self.max_packet_size,
            });
        }
        if self.sender.send(packet.to_vec()).is_err() {
            self.stats.send_errors += 1;
            return Err(NetworkError::Disconnected);
        }
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += packet.len() as u64;
        Ok(())
    }

    fn recv(&mut self) -> NetworkResult<Option<Vec<u8>>> {
        match self.receiver.try_recv() {
            Ok(packet) => {
                self.stats.packets_received += 1;
                self.stats.bytes_received += packet.len() as u64;
                Ok(Some(packet))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NetworkError::Disconnected),
        }
    }

    fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_delivers_in_order() {
        let (mut a, mut b) = LoopbackTransport::pair();
        a.send(b"one").unwrap();
        a.send(b"two").unwrap();
        assert_eq!(b.pending(), 2);
        assert_eq!(b.recv().unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(b.recv().unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(b.recv().unwrap(), None);
        assert_eq!(a.stats().bytes_sent, 6);
        assert_eq!(b.stats().packets_received, 2);
    }

    #[test]
    fn test_size_limit_and_disconnect() {
        let (mut a, b) = LoopbackTransport::pair_with_mtu(4);
        assert_eq!(
            a.send(&[0; 5]),
            Err(NetworkError::PacketTooLarge { size: 5, max: 4 })
        );
        drop(b);
        assert_eq!(a.send(&[0; 2]), Err(NetworkError::Disconnected));
        assert_eq!(a.recv(), Err(NetworkError::Disconnected));
        assert_eq!(a.stats().send_errors, 2);
    }
}
