//! Container writer
//!
//! Produces well-formed containers for tooling and tests. Records are
//! appended in call order; the caller is responsible for emitting schemas
//! and channels before the messages that reference them.

use crc32fast::Hasher;

use super::records::{frame, ChannelRecord, MessageRecord, OpCode, SchemaRecord, MAGIC};

/// Builds a container byte stream in memory
pub struct ContainerWriter {
    buf: Vec<u8>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self {
            buf: MAGIC.to_vec(),
        }
    }

    /// Writes the informational header record.
    pub fn header(mut self, profile: &str, library: &str) -> Self {
        let mut body = Vec::new();
        put_lp(&mut body, profile.as_bytes());
        put_lp(&mut body, library.as_bytes());
        self.push(OpCode::Header, &body);
        self
    }

    pub fn add_schema(&mut self, schema: &SchemaRecord) {
        self.push(OpCode::Schema, &schema.encode());
    }

    pub fn add_channel(&mut self, channel: &ChannelRecord) {
        self.push(OpCode::Channel, &channel.encode());
    }

    pub fn add_message(&mut self, message: &MessageRecord) {
        self.push(OpCode::Message, &message.encode(true));
    }

    /// Writes a message frame without the sequence field.
    pub fn add_message_unsequenced(&mut self, message: &MessageRecord) {
        self.push(OpCode::Message, &message.encode(false));
    }

    /// Appends a raw frame; used to exercise reader skip paths.
    pub fn add_raw(&mut self, op: u8, body: &[u8]) {
        self.buf.extend_from_slice(&frame(op, body));
    }

    /// Finishes the stream with a DataEnd record carrying the crc32 of all
    /// bytes between the magic and this record. A zero crc means "absent".
    pub fn finish(mut self) -> Vec<u8> {
        let mut hasher = Hasher::new();
        hasher.update(&self.buf[MAGIC.len()..]);
        let crc = hasher.finalize();
        self.push(OpCode::DataEnd, &crc.to_le_bytes());
        self.buf
    }

    /// Finishes the stream without a closing record.
    pub fn finish_unterminated(self) -> Vec<u8> {
        self.buf
    }

    fn push(&mut self, op: OpCode, body: &[u8]) {
        self.buf.extend_from_slice(&frame(op.as_u8(), body));
    }
}

impl Default for ContainerWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn put_lp(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}
