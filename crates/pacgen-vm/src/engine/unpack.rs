//! Incremental unpacking of variable values.

use pacgen_bytecode::Unpack;
use pacgen_core::ByteOrder;

use super::error::ParseError;
use super::stream::Stream;
use super::value::Value;

/// Result of an unpack attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Unpacked {
    /// The value and the stream offset just past it.
    Value(Value, usize),
    /// Not enough bytes yet; nothing was consumed.
    Insufficient,
}

/// Unpack a value starting at `position`.
///
/// `length` is the evaluated run length of a `Bytes` unpack.
pub fn unpack(
    unpack: &Unpack,
    length: Option<usize>,
    stream: &Stream,
    position: usize,
) -> Result<Unpacked, ParseError> {
    let available = stream.remaining(position);
    let wanted = match unpack {
        Unpack::UInt { width, .. } | Unpack::Int { width, .. } => usize::from(*width),
        Unpack::Bytes { .. } => match length {
            Some(length) => length,
            None => panic!("bytes unpack without an evaluated length"),
        },
        Unpack::BytesToEod => {
            if !stream.is_frozen() {
                return Ok(Unpacked::Insufficient);
            }
            available.len()
        }
    };

    if available.len() < wanted {
        if stream.is_frozen() {
            return Err(ParseError::new(
                position,
                format!(
                    "unexpected end of data: need {wanted} bytes, {} left",
                    available.len()
                ),
            ));
        }
        return Ok(Unpacked::Insufficient);
    }

    let bytes = &available[..wanted];
    let value = match unpack {
        Unpack::UInt { order, .. } => Value::UInt(read_uint(bytes, *order)),
        Unpack::Int { width, order } => Value::Int(sign_extend(read_uint(bytes, *order), *width)),
        Unpack::Bytes { .. } | Unpack::BytesToEod => Value::Bytes(bytes.to_vec()),
    };
    Ok(Unpacked::Value(value, position + wanted))
}

fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
    match order {
        ByteOrder::Big => bytes.iter().fold(0, fold),
        ByteOrder::Little => bytes.iter().rev().fold(0, fold),
    }
}

fn sign_extend(raw: u64, width: u8) -> i64 {
    let shift = 64 - u32::from(width) * 8;
    ((raw << shift) as i64) >> shift
}
