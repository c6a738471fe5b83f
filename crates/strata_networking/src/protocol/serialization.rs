//! # Packet Serialization
//!
//! ```text
//! [u8 type][u32 tick][body]
//!
//! EntityAdded / EntityDestroyed body:
//!   [u32 entity]
//!
//! EntityUpdates body:
//!   [u16 update count]
//!   per update:    [u32 entity][u16 component count]
//!   per component: [u16 kind][u32 payload len][payload]
//! ```
//!
//! All integers little-endian. Decoding never reads past the buffer and
//! rejects trailing bytes.

use strata_core::codec::{ByteReader, ByteWriter};
use strata_core::error::CodecError;
use strata_shared::{EntityId, EntityUpdate};
use tracing::warn;

use super::packets::{framed_update_len, Packet, PacketType};
use crate::error::{NetworkError, NetworkResult};

/// Smallest possible framed update: entity id plus component count.
const MIN_UPDATE_SIZE: usize = 4 + 2;

/// Smallest possible framed component: kind id plus length prefix.
const MIN_COMPONENT_SIZE: usize = 2 + 4;

/// Encodes a packet.
#[must_use]
pub fn encode_packet(packet: &Packet) -> Vec<u8> {
    let mut out = ByteWriter::with_capacity(packet.encoded_len());
    out.write_u8(packet.packet_type() as u8);
    out.write_u32(packet.tick());
    match packet {
        Packet::EntityAdded { entity, .. } | Packet::EntityDestroyed { entity, .. } => {
            out.write_u32(entity.get());
        }
        Packet::EntityUpdates { updates, .. } => {
            let count = u16::try_from(updates.len()).unwrap_or(u16::MAX);
            out.write_u16(count);
            for update in updates.iter().take(usize::from(count)) {
                write_update(&mut out, update);
            }
        }
    }
    out.into_vec()
}

fn write_update(out: &mut ByteWriter, update: &EntityUpdate) {
    out.write_u32(update.entity.get());
    let count = u16::try_from(update.components.len()).unwrap_or(u16::MAX);
    out.write_u16(count);
    for component in update.components.iter().take(usize::from(count)) {
        out.write_u16(component.kind);
        out.write_len(component.bytes.len());
        out.write_bytes(&component.bytes);
    }
}

/// Decodes one packet occupying all of `bytes`.
///
/// # Errors
///
/// [`NetworkError::UnknownPacketType`], [`NetworkError::Framing`] for
/// truncated or impossible lengths, [`NetworkError::TrailingBytes`].
pub fn decode_packet(bytes: &[u8]) -> NetworkResult<Packet> {
    let mut reader = ByteReader::new(bytes);
    let type_byte = reader.read_u8()?;
    let packet_type =
        PacketType::from_u8(type_byte).ok_or(NetworkError::UnknownPacketType(type_byte))?;
    let tick = reader.read_u32()?;

    let packet = match packet_type {
        PacketType::EntityAdded => Packet::EntityAdded {
            tick,
            entity: EntityId(reader.read_u32()?),
        },
        PacketType::EntityDestroyed => Packet::EntityDestroyed {
            tick,
            entity: EntityId(reader.read_u32()?),
        },
        PacketType::EntityUpdates => {
            let count = usize::from(reader.read_u16()?);
            if count * MIN_UPDATE_SIZE > reader.remaining() {
                return Err(CodecError::MalformedLength {
                    length: count,
                    remaining: reader.remaining(),
                }
                .into());
            }
            let mut updates = Vec::with_capacity(count);
            for _ in 0..count {
                updates.push(read_update(&mut reader)?);
            }
            Packet::EntityUpdates { tick, updates }
        }
    };

    if reader.remaining() > 0 {
        return Err(NetworkError::TrailingBytes(reader.remaining()));
    }
    Ok(packet)
}

fn read_update(reader: &mut ByteReader<'_>) -> NetworkResult<EntityUpdate> {
    let mut update = EntityUpdate::new(EntityId(reader.read_u32()?));
    let count = usize::from(reader.read_u16()?);
    if count * MIN_COMPONENT_SIZE > reader.remaining() {
        return Err(CodecError::MalformedLength {
            length: count,
            remaining: reader.remaining(),
        }
        .into());
    }
    for _ in 0..count {
        let kind = reader.read_u16()?;
        let len = reader.read_len(1)?;
        update.push(kind, reader.take(len)?.to_vec());
    }
    Ok(update)
}

/// Packs updates into as few packets of at most `max_size` bytes as
/// possible, preserving order.
///
/// An update that cannot fit in an empty packet is dropped with a warning
/// and reported in the second return value.
#[must_use]
pub fn pack_updates(
    tick: u32,
    updates: Vec<EntityUpdate>,
    max_size: usize,
) -> (Vec<Packet>, Vec<NetworkError>) {
    let budget = max_size.saturating_sub(Packet::UPDATES_OVERHEAD);
    let mut packets = Vec::new();
    let mut rejected = Vec::new();
    let mut current: Vec<EntityUpdate> = Vec::new();
    let mut used = 0;

    for update in updates {
        let size = framed_update_len(&update);
        if size > budget {
            warn!(
                entity = %update.entity,
                size,
                max_size,
                "Update exceeds packet size, dropping"
            );
            rejected.push(NetworkError::UpdateTooLarge {
                entity: update.entity,
                size: size + Packet::UPDATES_OVERHEAD,
                max: max_size,
            });
            continue;
        }
        if used + size > budget || current.len() == usize::from(u16::MAX) {
            packets.push(Packet::EntityUpdates {
                tick,
                updates: std::mem::take(&mut current),
            });
            used = 0;
        }
        used += size;
        current.push(update);
    }
    if !current.is_empty() {
        packets.push(Packet::EntityUpdates {
            tick,
            updates: current,
        });
    }
    (packets, rejected)
}
