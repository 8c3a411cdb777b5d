use std::io::{Read, Write};

use minecraft_derive::MinecraftData;

use crate::datatypes::{Error, MString, MinecraftData, VarInt};

/// Handshake protocol version sent by default; servers answer status requests for any version.
pub const DEFAULT_PROTOCOL_VERSION: i32 = 999;

/// Upper bound accepted for a status JSON body. Favicons make these large.
pub const MAX_STATUS_JSON_BYTES: usize = 1 << 21;

pub trait Packet: MinecraftData {
    const ID: VarInt;

    /// wrapper around Self::decode so that the interface is more symmetric
    fn decode_packet<R: Read>(reader: &mut R) -> Result<Self, Error> {
        Self::decode(reader)
    }

    fn encode_packet<W: Write>(self, writer: &mut W) -> Result<(), Error> {
        let len = Self::ID.num_bytes() + self.num_bytes();
        VarInt(len as i32).encode(writer)?;
        Self::ID.encode(writer)?;
        self.encode(writer)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PacketHeader {
    pub len: VarInt,
    pub id: VarInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, MinecraftData)]
pub enum HandshakeIntent {
    #[mc_repr(1)]
    Status,
}

#[derive(Debug, Clone, MinecraftData)]
pub struct HandshakePacket {
    pub protocol_version: VarInt,
    pub server_address: MString<255>,
    pub server_port: u16,
    pub intent: HandshakeIntent,
}

impl Packet for HandshakePacket {
    const ID: VarInt = VarInt(0x00);
}

#[derive(Debug, Clone, Copy, MinecraftData)]
pub struct StatusRequestPacket;

impl Packet for StatusRequestPacket {
    const ID: VarInt = VarInt(0x00);
}

#[derive(Debug, Clone, MinecraftData)]
pub struct StatusResponsePacket {
    pub json_response: MString<MAX_STATUS_JSON_BYTES>,
}

impl Packet for StatusResponsePacket {
    const ID: VarInt = VarInt(0x00);
}
