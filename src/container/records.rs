//! Container record types and framing
//!
//! The container is a self-describing binary format: an 8-byte magic
//! followed by framed records of `opcode (u8) + body length (u32 LE) +
//! body`. Strings and byte blobs inside bodies are u32-length-prefixed.
//!
//! Record kinds:
//! - Header:  profile, library (informational)
//! - Schema:  id, name, encoding kind, descriptor bytes
//! - Channel: id, schema id, topic, message encoding
//! - Message: channel id, flags, optional sequence, log time (ns), payload
//! - DataEnd: crc32 of everything between the magic and this record
//!
//! Consumers must skip record kinds they do not recognize; the format is
//! allowed to grow auxiliary kinds.

use super::errors::SegmentUnreadable;

/// Container magic bytes
pub const MAGIC: [u8; 8] = *b"\x89TLC\r\n\x1a\n";

/// Record opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Header = 0x01,
    Schema = 0x02,
    Channel = 0x03,
    Message = 0x04,
    DataEnd = 0x7F,
}

impl OpCode {
    /// Convert from u8; unknown opcodes yield None and are skipped
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(OpCode::Header),
            0x02 => Some(OpCode::Schema),
            0x03 => Some(OpCode::Channel),
            0x04 => Some(OpCode::Message),
            0x7F => Some(OpCode::DataEnd),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Schema descriptor carried by the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    pub id: u16,
    pub name: String,
    /// Encoding kind string ("record", "json", or anything newer)
    pub encoding: String,
    /// Opaque descriptor bytes interpreted per encoding
    pub descriptor: Vec<u8>,
}

impl SchemaRecord {
    pub fn decode(body: &[u8]) -> Result<Self, SegmentUnreadable> {
        let mut cursor = Cursor::new(body);
        let id = cursor.u16()?;
        let name = cursor.lp_string()?;
        let encoding = cursor.lp_string()?;
        let descriptor = cursor.lp_bytes()?;
        Ok(Self {
            id,
            name,
            encoding,
            descriptor,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.id.to_le_bytes());
        put_lp(&mut body, self.name.as_bytes());
        put_lp(&mut body, self.encoding.as_bytes());
        put_lp(&mut body, &self.descriptor);
        body
    }
}

/// Channel descriptor binding a topic to a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub id: u16,
    pub schema_id: u16,
    pub topic: String,
    pub message_encoding: String,
}

impl ChannelRecord {
    pub fn decode(body: &[u8]) -> Result<Self, SegmentUnreadable> {
        let mut cursor = Cursor::new(body);
        let id = cursor.u16()?;
        let schema_id = cursor.u16()?;
        let topic = cursor.lp_string()?;
        let message_encoding = cursor.lp_string()?;
        Ok(Self {
            id,
            schema_id,
            topic,
            message_encoding,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.id.to_le_bytes());
        body.extend_from_slice(&self.schema_id.to_le_bytes());
        put_lp(&mut body, self.topic.as_bytes());
        put_lp(&mut body, self.message_encoding.as_bytes());
        body
    }
}

/// Flag bit marking an explicit sequence counter
const FLAG_HAS_SEQUENCE: u8 = 0b0000_0001;

/// One framed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub channel_id: u16,
    /// Sequence counter; 0 when the frame carried none
    pub sequence: u32,
    /// Log time in nanoseconds since the epoch
    pub log_time_nanos: u64,
    pub payload: Vec<u8>,
}

impl MessageRecord {
    pub fn decode(body: &[u8]) -> Result<Self, SegmentUnreadable> {
        let mut cursor = Cursor::new(body);
        let channel_id = cursor.u16()?;
        let flags = cursor.u8()?;
        let sequence = if flags & FLAG_HAS_SEQUENCE != 0 {
            cursor.u32()?
        } else {
            0
        };
        let log_time_nanos = cursor.u64()?;
        let payload = cursor.rest();
        Ok(Self {
            channel_id,
            sequence,
            log_time_nanos,
            payload,
        })
    }

    pub fn encode(&self, with_sequence: bool) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.channel_id.to_le_bytes());
        body.push(if with_sequence { FLAG_HAS_SEQUENCE } else { 0 });
        if with_sequence {
            body.extend_from_slice(&self.sequence.to_le_bytes());
        }
        body.extend_from_slice(&self.log_time_nanos.to_le_bytes());
        body.extend_from_slice(&self.payload);
        body
    }
}

/// Frame a record: opcode + u32 LE body length + body
pub fn frame(op: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + body.len());
    out.push(op);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn put_lp(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// Bounds-checked body cursor
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SegmentUnreadable> {
        if self.pos + n > self.data.len() {
            return Err(SegmentUnreadable(format!(
                "need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.data.len() - self.pos
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SegmentUnreadable> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, SegmentUnreadable> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, SegmentUnreadable> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, SegmentUnreadable> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn lp_bytes(&mut self) -> Result<Vec<u8>, SegmentUnreadable> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn lp_string(&mut self) -> Result<String, SegmentUnreadable> {
        let bytes = self.lp_bytes()?;
        String::from_utf8(bytes).map_err(|e| SegmentUnreadable(format!("invalid UTF-8: {}", e)))
    }

    fn rest(&mut self) -> Vec<u8> {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice.to_vec()
    }
}
