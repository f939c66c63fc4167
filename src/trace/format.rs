//! Binary trace wire format.
//!
//! ## File layout
//! ```text
//! No file header: the stream opens with the setup records.
//!
//! Every record: opcode(u16) + payload_len(u16) + payload(payload_len bytes)
//!
//! Opcodes:
//!   0x101: BeginIteration     → timestamp_us(i64)                                                   = 4 + 8 bytes
//!   0x102: BeginTask          → timestamp_us(i64) + cpu(u32)                                        = 4 + 12 bytes
//!   0x103: EndTask            → timestamp_us(i64) + cpu(u32) + x(u32) + y(u32) + w(u32) + h(u32)    = 4 + 28 bytes
//!   0x104: SetProcessorCount  → count(u32)                                                          = 4 + 4 bytes
//!   0x106: SetDimension       → dimension(u32)                                                      = 4 + 4 bytes
//!   0x107: EndIteration       → timestamp_us(i64)                                                   = 4 + 8 bytes
//!   0x108: SetLabel           → label bytes (UTF-8, no terminator)                                  = 4 + N bytes
//! ```
//!
//! All integers are little-endian. Timestamps are monotonic microseconds.
//!
//! The explicit payload length lets readers skip opcodes they do not know.
//! A known opcode with a longer payload than expected is accepted and the tail is
//! ignored; a shorter one is `InvalidData`.
//!
//! 0x105 carried an iteration count in an earlier layout and is no longer written.

use crate::trace::events::TraceEvent;
use std::io::{Error, ErrorKind, Read, Result, Write};

pub const RECORD_HEADER_SIZE: usize = 4; // opcode + payload_len
pub const MAX_LABEL_LEN: usize = u16::MAX as usize;

// Wire codes
pub const OP_BEGIN_ITERATION: u16 = 0x101;
pub const OP_BEGIN_TASK: u16 = 0x102;
pub const OP_END_TASK: u16 = 0x103;
pub const OP_SET_PROCESSOR_COUNT: u16 = 0x104;
pub const OP_SET_DIMENSION: u16 = 0x106;
pub const OP_END_ITERATION: u16 = 0x107;
pub const OP_SET_LABEL: u16 = 0x108;

const ITERATION_PAYLOAD: usize = 8;
const BEGIN_TASK_PAYLOAD: usize = 12;
const END_TASK_PAYLOAD: usize = 28;
const U32_PAYLOAD: usize = 4;

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Event(TraceEvent),
    /// An opcode this reader does not understand; its payload was skipped.
    Unknown { opcode: u16, payload_len: u16 },
}

/// Returns the opcode an event is written with.
pub fn opcode(event: &TraceEvent) -> u16 {
    match event {
        TraceEvent::SetProcessorCount { .. } => OP_SET_PROCESSOR_COUNT,
        TraceEvent::SetDimension { .. } => OP_SET_DIMENSION,
        TraceEvent::SetLabel { .. } => OP_SET_LABEL,
        TraceEvent::BeginIteration { .. } => OP_BEGIN_ITERATION,
        TraceEvent::EndIteration { .. } => OP_END_ITERATION,
        TraceEvent::BeginTask { .. } => OP_BEGIN_TASK,
        TraceEvent::EndTask { .. } => OP_END_TASK,
    }
}

/// Longest prefix of `label` that fits in a record, cut on a char boundary.
fn wire_label(label: &str) -> &str {
    if label.len() <= MAX_LABEL_LEN {
        return label;
    }
    let mut end = MAX_LABEL_LEN;
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    &label[..end]
}

fn payload_size(event: &TraceEvent) -> usize {
    match event {
        TraceEvent::SetProcessorCount { .. } | TraceEvent::SetDimension { .. } => U32_PAYLOAD,
        TraceEvent::SetLabel { label } => wire_label(label).len(),
        TraceEvent::BeginIteration { .. } | TraceEvent::EndIteration { .. } => ITERATION_PAYLOAD,
        TraceEvent::BeginTask { .. } => BEGIN_TASK_PAYLOAD,
        TraceEvent::EndTask { .. } => END_TASK_PAYLOAD,
    }
}

/// Returns the wire size of an event, record header included.
pub fn wire_event_size(event: &TraceEvent) -> usize {
    RECORD_HEADER_SIZE + payload_size(event)
}

/// Write any event to the wire format.
pub fn write_event(w: &mut impl Write, event: &TraceEvent) -> Result<()> {
    w.write_all(&opcode(event).to_le_bytes())?;
    w.write_all(&(payload_size(event) as u16).to_le_bytes())?;
    match event {
        TraceEvent::SetProcessorCount { count } => {
            w.write_all(&count.to_le_bytes())?;
        }
        TraceEvent::SetDimension { dimension } => {
            w.write_all(&dimension.to_le_bytes())?;
        }
        TraceEvent::SetLabel { label } => {
            w.write_all(wire_label(label).as_bytes())?;
        }
        TraceEvent::BeginIteration { timestamp_micros }
        | TraceEvent::EndIteration { timestamp_micros } => {
            w.write_all(&timestamp_micros.to_le_bytes())?;
        }
        TraceEvent::BeginTask {
            timestamp_micros,
            processor,
        } => {
            w.write_all(&timestamp_micros.to_le_bytes())?;
            w.write_all(&processor.to_le_bytes())?;
        }
        TraceEvent::EndTask {
            timestamp_micros,
            processor,
            x,
            y,
            width,
            height,
        } => {
            w.write_all(&timestamp_micros.to_le_bytes())?;
            w.write_all(&processor.to_le_bytes())?;
            w.write_all(&x.to_le_bytes())?;
            w.write_all(&y.to_le_bytes())?;
            w.write_all(&width.to_le_bytes())?;
            w.write_all(&height.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Read the opcode of the next record. `Ok(None)` only when the stream ends
/// exactly on a record boundary; a lone trailing byte is `UnexpectedEof`.
fn read_opcode(r: &mut impl Read) -> Result<Option<u16>> {
    let mut op = [0u8; 2];
    let mut filled = 0;
    while filled < op.len() {
        match r.read(&mut op[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(None),
        2 => Ok(Some(u16::from_le_bytes(op))),
        _ => Err(Error::new(ErrorKind::UnexpectedEof, "truncated record opcode")),
    }
}

/// Little-endian field reader over one record's payload.
struct Payload<'a> {
    bytes: &'a [u8],
    opcode: u16,
}

impl Payload<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.bytes.len() < N {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("payload too short for opcode {:#x}", self.opcode),
            ));
        }
        let (head, tail) = self.bytes.split_at(N);
        self.bytes = tail;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }
}

/// Read one record. Returns `Ok(None)` at a clean EOF.
///
/// `scratch` holds the payload and is reused across calls. EOF inside a record
/// surfaces as `ErrorKind::UnexpectedEof`, which callers treat as truncation.
pub fn read_record(r: &mut impl Read, scratch: &mut Vec<u8>) -> Result<Option<Record>> {
    let Some(opcode) = read_opcode(r)? else {
        return Ok(None);
    };
    let mut len_bytes = [0u8; 2];
    r.read_exact(&mut len_bytes)?;
    let payload_len = u16::from_le_bytes(len_bytes);

    scratch.clear();
    scratch.resize(payload_len as usize, 0);
    r.read_exact(scratch)?;

    let mut p = Payload {
        bytes: scratch.as_slice(),
        opcode,
    };
    let event = match opcode {
        OP_SET_PROCESSOR_COUNT => TraceEvent::SetProcessorCount { count: p.u32()? },
        OP_SET_DIMENSION => TraceEvent::SetDimension {
            dimension: p.u32()?,
        },
        OP_SET_LABEL => TraceEvent::SetLabel {
            label: String::from_utf8_lossy(p.bytes).into_owned(),
        },
        OP_BEGIN_ITERATION => TraceEvent::BeginIteration {
            timestamp_micros: p.i64()?,
        },
        OP_END_ITERATION => TraceEvent::EndIteration {
            timestamp_micros: p.i64()?,
        },
        OP_BEGIN_TASK => TraceEvent::BeginTask {
            timestamp_micros: p.i64()?,
            processor: p.u32()?,
        },
        OP_END_TASK => TraceEvent::EndTask {
            timestamp_micros: p.i64()?,
            processor: p.u32()?,
            x: p.u32()?,
            y: p.u32()?,
            width: p.u32()?,
            height: p.u32()?,
        },
        _ => {
            return Ok(Some(Record::Unknown {
                opcode,
                payload_len,
            }));
        }
    };
    Ok(Some(Record::Event(event)))
}
