//! Length-prefixed telemetry container format

mod errors;
mod reader;
mod records;
mod writer;

pub use errors::{ContainerError, ContainerResult, SegmentUnreadable};
pub use reader::{ContainerReader, StreamedMessage};
pub use records::{ChannelRecord, MessageRecord, OpCode, SchemaRecord, MAGIC};
pub use writer::ContainerWriter;
