//! Container reader
//!
//! Validates the magic eagerly, then decodes frames lazily as the iterator
//! is driven. The stream is fully buffered in memory; laziness buys
//! early-exit queries the ability to stop decoding, not streaming I/O.
//!
//! Recovery policy: anything scoped to one record (unknown opcode,
//! undecodable body, dangling schema/channel reference) is logged and
//! skipped. Only a bad magic or a frame header cut short mid-stream
//! surfaces as an error.

use std::collections::HashMap;
use std::rc::Rc;

use crc32fast::Hasher;
use tracing::warn;

use super::errors::{ContainerError, ContainerResult};
use super::records::{ChannelRecord, MessageRecord, OpCode, SchemaRecord, MAGIC};

/// A decoded message joined with its channel and schema
#[derive(Debug, Clone)]
pub struct StreamedMessage {
    pub schema: Rc<SchemaRecord>,
    pub channel: Rc<ChannelRecord>,
    pub message: MessageRecord,
}

/// Lazy single-pass decoder over a buffered container
#[derive(Debug)]
pub struct ContainerReader {
    data: Vec<u8>,
    pos: usize,
    schemas: HashMap<u16, Rc<SchemaRecord>>,
    channels: HashMap<u16, Rc<ChannelRecord>>,
    skipped: u64,
    done: bool,
}

impl ContainerReader {
    /// Validates the magic and positions the cursor at the first frame.
    pub fn new(data: Vec<u8>) -> ContainerResult<Self> {
        if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
            return Err(ContainerError::BadMagic);
        }
        Ok(Self {
            data,
            pos: MAGIC.len(),
            schemas: HashMap::new(),
            channels: HashMap::new(),
            skipped: 0,
            done: false,
        })
    }

    /// Count of records skipped so far (unknown opcodes, undecodable
    /// bodies, messages with dangling references).
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Reads the next frame header and body, or None at end of input.
    fn next_frame(&mut self) -> ContainerResult<Option<(u8, usize, usize)>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let remaining = self.data.len() - self.pos;
        if remaining < 5 {
            return Err(ContainerError::Truncated(format!(
                "{} trailing bytes, expected a frame header",
                remaining
            )));
        }
        let op = self.data[self.pos];
        let len = u32::from_le_bytes([
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
            self.data[self.pos + 4],
        ]) as usize;
        let body_start = self.pos + 5;
        if body_start + len > self.data.len() {
            return Err(ContainerError::Truncated(format!(
                "frame body of {} bytes exceeds remaining {}",
                len,
                self.data.len() - body_start
            )));
        }
        let frame_start = self.pos;
        self.pos = body_start + len;
        Ok(Some((op, body_start, frame_start)))
    }

    fn handle_data_end(&self, body: &[u8], frame_start: usize) {
        if body.len() != 4 {
            warn!(len = body.len(), "malformed end-of-data record");
            return;
        }
        let stored = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        if stored == 0 {
            return;
        }
        let mut hasher = Hasher::new();
        hasher.update(&self.data[MAGIC.len()..frame_start]);
        let computed = hasher.finalize();
        if computed != stored {
            // Integrity is advisory; decoded messages are still served.
            warn!(stored, computed, "container checksum mismatch");
        }
    }
}

impl Iterator for ContainerReader {
    type Item = StreamedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (op, body_start, frame_start) = match self.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, "container ended abnormally");
                    self.done = true;
                    return None;
                }
            };
            let body = self.data[body_start..self.pos].to_vec();
            match OpCode::from_u8(op) {
                Some(OpCode::Header) => {}
                Some(OpCode::Schema) => match SchemaRecord::decode(&body) {
                    Ok(schema) => {
                        self.schemas.insert(schema.id, Rc::new(schema));
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping undecodable schema record");
                        self.skipped += 1;
                    }
                },
                Some(OpCode::Channel) => match ChannelRecord::decode(&body) {
                    Ok(channel) => {
                        self.channels.insert(channel.id, Rc::new(channel));
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping undecodable channel record");
                        self.skipped += 1;
                    }
                },
                Some(OpCode::Message) => {
                    let message = match MessageRecord::decode(&body) {
                        Ok(message) => message,
                        Err(e) => {
                            warn!(error = %e, "skipping undecodable message record");
                            self.skipped += 1;
                            continue;
                        }
                    };
                    let channel = match self.channels.get(&message.channel_id) {
                        Some(channel) => Rc::clone(channel),
                        None => {
                            warn!(
                                channel_id = message.channel_id,
                                "skipping message on unknown channel"
                            );
                            self.skipped += 1;
                            continue;
                        }
                    };
                    let schema = match self.schemas.get(&channel.schema_id) {
                        Some(schema) => Rc::clone(schema),
                        None => {
                            warn!(
                                schema_id = channel.schema_id,
                                topic = %channel.topic,
                                "skipping message with unknown schema"
                            );
                            self.skipped += 1;
                            continue;
                        }
                    };
                    return Some(StreamedMessage {
                        schema,
                        channel,
                        message,
                    });
                }
                Some(OpCode::DataEnd) => {
                    self.handle_data_end(&body, frame_start);
                    self.done = true;
                    return None;
                }
                None => {
                    warn!(opcode = op, "skipping unrecognized record kind");
                    self.skipped += 1;
                }
            }
        }
        None
    }
}
