use std::{
    io::{self, BufReader, BufWriter, Read, Write},
    net::{SocketAddr, TcpStream},
    time::Duration,
};

use crate::{
    datatypes::{Error, MString, MinecraftData, VarInt, VarIntTooBig},
    error::PingError,
    packet::{
        HandshakeIntent, HandshakePacket, Packet, PacketHeader, StatusRequestPacket,
        StatusResponsePacket,
    },
    status::StatusResponse,
};

/// One status exchange with a server. Dropping it closes the socket.
pub struct Connection<R, W> {
    addr: SocketAddr,
    reader: R,
    writer: W,
}

impl Connection<BufReader<TcpStream>, BufWriter<TcpStream>> {
    /// Connects with `timeout` bounding the connect and every later read and write.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, PingError> {
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|source| {
            if is_timeout(&source) {
                PingError::Timeout { addr }
            } else {
                PingError::Connect { addr, source }
            }
        })?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Connection {
            addr,
            writer: BufWriter::new(stream.try_clone()?),
            reader: BufReader::new(stream),
        })
    }
}

impl<R: Read, W: Write> Connection<R, W> {
    pub fn new(addr: SocketAddr, reader: R, writer: W) -> Self {
        Connection { addr, reader, writer }
    }

    fn send_packet<P: Packet>(&mut self, packet: P) -> Result<(), PingError> {
        let mut bytes = Vec::new();
        packet
            .encode_packet(&mut bytes)
            .map_err(|err| self.classify(err, premature_end))?;
        tracing::trace!(addr = %self.addr, id = P::ID.0, len = bytes.len(), "sending packet");
        self.writer
            .write_all(&bytes)
            .and_then(|()| self.writer.flush())
            .map_err(|err| self.io_error(err))
    }

    fn recv_packet_header(&mut self) -> Result<PacketHeader, PingError> {
        let len = self.recv_varint(|| PingError::Io(io::ErrorKind::UnexpectedEof.into()))?;
        let id = self.recv_varint(premature_end)?;
        Ok(PacketHeader { len, id })
    }

    fn recv_varint(&mut self, on_eof: fn() -> PingError) -> Result<VarInt, PingError> {
        VarInt::decode(&mut self.reader).map_err(|err| self.classify(err, on_eof))
    }

    fn recv_packet<P: Packet>(&mut self) -> Result<P, PingError> {
        P::decode_packet(&mut self.reader).map_err(|err| self.classify(err, premature_end))
    }

    /// Takes self because this closes the connection.
    ///
    /// `host` and `port` are what the handshake announces, which after an
    /// SRV redirect differ from the socket address actually dialled.
    pub fn get_status(mut self, host: &str, port: u16, protocol_version: i32) -> Result<String, PingError> {
        let server_address: MString<255> = host
            .to_string()
            .try_into()
            .map_err(|err: Error| PingError::protocol(err.to_string()))?;
        self.send_packet(HandshakePacket {
            protocol_version: VarInt(protocol_version),
            server_address,
            server_port: port,
            intent: HandshakeIntent::Status,
        })?;
        self.send_packet(StatusRequestPacket)?;

        let header = self.recv_packet_header()?;
        if header.id != StatusResponsePacket::ID {
            return Err(PingError::protocol("Invalid packetID"));
        }
        let resp = self.recv_packet::<StatusResponsePacket>()?;
        let body = resp.json_response.into_inner();
        if body.is_empty() {
            return Err(PingError::protocol("Invalid string length"));
        }
        tracing::trace!(addr = %self.addr, len = body.len(), "received status");
        Ok(body)
    }

    pub fn ping(self, host: &str, port: u16, protocol_version: i32) -> Result<StatusResponse, PingError> {
        StatusResponse::parse(&self.get_status(host, port, protocol_version)?)
    }

    fn io_error(&self, err: io::Error) -> PingError {
        if is_timeout(&err) {
            PingError::Timeout { addr: self.addr }
        } else {
            PingError::Io(err)
        }
    }

    /// Maps a codec failure; `on_eof` decides what running out of bytes means at this point.
    fn classify(&self, err: Error, on_eof: fn() -> PingError) -> PingError {
        if err.downcast_ref::<VarIntTooBig>().is_some() {
            return PingError::protocol(VarIntTooBig.to_string());
        }
        match err.downcast::<io::Error>() {
            Ok(io) if io.kind() == io::ErrorKind::UnexpectedEof => on_eof(),
            Ok(io) => self.io_error(io),
            Err(other) => PingError::protocol(format!("{other:#}")),
        }
    }
}

fn premature_end() -> PingError {
    PingError::protocol("Premature end of stream")
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}
