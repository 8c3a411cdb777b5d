use anyhow::anyhow;
use std::io::{Read, Write};

pub type Error = anyhow::Error;

pub trait MinecraftData: Sized {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, Error>;
    fn encode<W: Write>(self, writer: &mut W) -> Result<(), Error>;
    fn num_bytes(&self) -> usize;
}

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// A VarInt never occupies more than five bytes on the wire.
pub const MAX_VARINT_BYTES: usize = 5;

/// Raised when a VarInt keeps its continuation bit set past [`MAX_VARINT_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("VarInt too big")]
pub struct VarIntTooBig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub i32);

/// Byte-at-a-time VarInt accumulator.
#[derive(Debug, Default)]
pub struct VarIntDecoder {
    value: u32,
    position: usize,
}

impl VarIntDecoder {
    /// Feeds one byte; returns the value once a byte without the continuation bit arrives.
    pub fn push(&mut self, byte: u8) -> Result<Option<VarInt>, VarIntTooBig> {
        self.value |= ((byte & SEGMENT_BITS) as u32) << (7 * self.position);
        self.position += 1;
        if (byte & CONTINUE_BIT) == 0 {
            return Ok(Some(VarInt(self.value as i32)));
        }
        if self.position >= MAX_VARINT_BYTES {
            return Err(VarIntTooBig);
        }
        Ok(None)
    }
}

impl MinecraftData for VarInt {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let mut decoder = VarIntDecoder::default();
        let mut buf = [0u8];
        loop {
            reader.read_exact(&mut buf)?;
            if let Some(value) = decoder.push(buf[0])? {
                return Ok(value);
            }
        }
    }

    fn encode<W: Write>(self, writer: &mut W) -> Result<(), Error> {
        let mut value = self.0 as u32;
        loop {
            if (value & !(SEGMENT_BITS as u32)) == 0 {
                writer.write_all(&[value as u8])?;
                return Ok(());
            }

            writer.write_all(&[(value as u8 & SEGMENT_BITS) | CONTINUE_BIT])?;

            value >>= 7;
        }
    }

    fn num_bytes(&self) -> usize {
        if self.0 == 0 {
            return 1;
        }
        let bits = (self.0 as u32).ilog2() + 1;
        bits.div_ceil(7) as usize
    }
}

/// A length-prefixed UTF-8 string of at most `N` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MString<const N: usize>(String);

impl<const N: usize> MString<N> {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const N: usize> TryFrom<String> for MString<N> {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() > N {
            return Err(anyhow!("string is too long!"));
        }
        Ok(MString(value))
    }
}

impl<const N: usize> MinecraftData for MString<N> {
    fn decode<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let len = VarInt::decode(reader)?.0;
        if len < 0 {
            return Err(anyhow!("cannot have negative length string"));
        }
        let len = len as usize;
        if len > N {
            return Err(anyhow!("string is too long!"));
        }
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(MString(String::from_utf8(buf)?))
    }

    fn encode<W: Write>(self, writer: &mut W) -> Result<(), Error> {
        if self.0.len() > N {
            return Err(anyhow!("string is too long!"));
        }
        VarInt(self.0.len() as i32).encode(writer)?;
        writer.write_all(self.0.as_bytes())?;

        Ok(())
    }

    fn num_bytes(&self) -> usize {
        VarInt(self.0.len() as i32).num_bytes() + self.0.len()
    }
}

macro_rules! impl_minecraft_data_for_int {
    ($int:ty) => {
        impl MinecraftData for $int {
            fn decode<R: Read>(reader: &mut R) -> Result<Self, Error> {
                let mut buf = [0u8; <$int>::BITS as usize / 8];
                reader.read_exact(&mut buf)?;
                Ok(<$int>::from_be_bytes(buf))
            }

            fn encode<W: Write>(self, writer: &mut W) -> Result<(), Error> {
                writer.write_all(&self.to_be_bytes())?;
                Ok(())
            }

            fn num_bytes(&self) -> usize {
                <$int>::BITS as usize / 8
            }
        }
    };
}

impl_minecraft_data_for_int!(u16);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(value: i32) -> Vec<u8> {
        let mut bytes = Vec::new();
        VarInt(value).encode(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn varint_known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7F]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(255), vec![0xFF, 0x01]);
        assert_eq!(encoded(25565), vec![0xDD, 0xC7, 0x01]);
        assert_eq!(encoded(i32::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
        assert_eq!(encoded(-1), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn varint_rejects_sixth_continuation_byte() {
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let err = VarInt::decode(&mut bytes.as_slice()).unwrap_err();
        assert!(err.downcast_ref::<VarIntTooBig>().is_some());
    }

    #[test]
    fn varint_stops_after_five_bytes() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        let mut reader = bytes.as_slice();
        assert!(VarInt::decode(&mut reader).is_err());
        assert_eq!(reader, &[0x00]);
    }

    #[test]
    fn varint_truncated_input_is_io_error() {
        let bytes = [0x80, 0x80];
        let err = VarInt::decode(&mut bytes.as_slice()).unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn mstring_rejects_oversized_values() {
        assert!(MString::<4>::try_from("hello".to_string()).is_err());

        let mut bytes = Vec::new();
        VarInt(5).encode(&mut bytes).unwrap();
        bytes.extend_from_slice(b"hello");
        assert!(MString::<4>::decode(&mut bytes.as_slice()).is_err());
        assert_eq!(MString::<5>::decode(&mut bytes.as_slice()).unwrap().as_str(), "hello");
    }

    proptest! {
        #[test]
        fn varint_round_trips(value in any::<u32>()) {
            let bytes = encoded(value as i32);
            prop_assert_eq!(bytes.len(), VarInt(value as i32).num_bytes());
            let decoded = VarInt::decode(&mut bytes.as_slice()).unwrap();
            prop_assert_eq!(decoded.0 as u32, value);
        }

        #[test]
        fn varint_sets_continuation_on_all_but_last(value in 128u32..) {
            let bytes = encoded(value as i32);
            prop_assert!(bytes.len() >= 2);
            let (last, rest) = bytes.split_last().unwrap();
            prop_assert!(rest.iter().all(|b| b & CONTINUE_BIT != 0));
            prop_assert_eq!(last & CONTINUE_BIT, 0);
        }
    }
}
