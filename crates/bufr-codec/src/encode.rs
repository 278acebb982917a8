//! Data section encoding.

use bufr_model::{DataSubset, Dataset, Descriptor, Value};
use bufr_tables::{Encoding, SchemaTable, ValueClass};
use tracing::trace;

use crate::bits::BitBuffer;
use crate::decode::{NBINC_WIDTH, all_ones, resolve_elements};
use crate::error::{CodecError, Result};
use crate::message::{Message, RawMessage};

/// Largest increment width the 6-bit field can express.
const MAX_NBINC: usize = (1 << NBINC_WIDTH) - 1;

/// Encode a dataset into a complete message.
///
/// `compress` is a preference: the data section is only compressed when
/// the dataset holds more than one subset.
pub fn encode_dataset(
    dataset: &Dataset,
    table: &SchemaTable,
    compress: bool,
) -> Result<RawMessage> {
    let elements = resolve_elements(table, &dataset.template.descriptors)?;
    for (index, subset) in dataset.subsets.iter().enumerate() {
        check_shape(index, subset, &elements)?;
    }

    let subset_count = u16::try_from(dataset.subsets.len())
        .map_err(|_| CodecError::invalid_section(3, "too many subsets"))?;
    let compressed = compress && dataset.subsets.len() > 1;
    trace!(subsets = subset_count, compressed, "encoding data section");

    let mut bits = BitBuffer::new();
    if compressed {
        encode_compressed(&mut bits, &dataset.subsets, &elements)?;
    } else {
        encode_uncompressed(&mut bits, &dataset.subsets, &elements)?;
    }

    let data_flag = if compressed {
        dataset.data_flag | Dataset::FLAG_COMPRESSED
    } else {
        dataset.data_flag & !Dataset::FLAG_COMPRESSED
    };
    Message {
        edition: dataset.template.edition,
        section1: dataset.section1,
        subset_count,
        data_flag,
        descriptors: dataset.template.descriptors.clone(),
        data: bits.into_bytes(),
    }
    .to_raw()
}

fn check_shape(
    index: usize,
    subset: &DataSubset,
    elements: &[(Descriptor, &Encoding)],
) -> Result<()> {
    if subset.len() != elements.len() {
        return Err(CodecError::SubsetShape {
            index,
            expected: elements.len(),
            actual: subset.len(),
        });
    }
    for (position, (field, &(expected, _))) in subset.iter().zip(elements).enumerate() {
        if field.descriptor != expected {
            return Err(CodecError::FieldMismatch {
                index,
                position,
                expected,
                actual: field.descriptor,
            });
        }
    }
    Ok(())
}

fn encode_uncompressed(
    bits: &mut BitBuffer,
    subsets: &[DataSubset],
    elements: &[(Descriptor, &Encoding)],
) -> Result<()> {
    for subset in subsets {
        for (field, &(descriptor, encoding)) in subset.iter().zip(elements) {
            if encoding.is_string() {
                bits.write_bytes(&string_bytes(descriptor, encoding, &field.value)?);
            } else {
                let raw = numeric_raw(descriptor, encoding, &field.value)?;
                bits.write_bits(
                    raw.unwrap_or_else(|| encoding.missing_raw()),
                    usize::from(encoding.width),
                );
            }
        }
    }
    Ok(())
}

fn encode_compressed(
    bits: &mut BitBuffer,
    subsets: &[DataSubset],
    elements: &[(Descriptor, &Encoding)],
) -> Result<()> {
    for (position, &(descriptor, encoding)) in elements.iter().enumerate() {
        let values = subsets.iter().filter_map(|subset| subset.get(position));
        if encoding.is_string() {
            let column = values
                .map(|field| string_bytes(descriptor, encoding, &field.value))
                .collect::<Result<Vec<_>>>()?;
            compress_strings(bits, descriptor, encoding, &column)?;
        } else {
            let column = values
                .map(|field| numeric_raw(descriptor, encoding, &field.value))
                .collect::<Result<Vec<_>>>()?;
            compress_numeric(bits, descriptor, encoding, &column)?;
        }
    }
    Ok(())
}

fn compress_numeric(
    bits: &mut BitBuffer,
    descriptor: Descriptor,
    encoding: &Encoding,
    column: &[Option<u64>],
) -> Result<()> {
    let width = usize::from(encoding.width);
    let present = column.iter().flatten().copied();
    let (Some(min), Some(max)) = (present.clone().min(), present.max()) else {
        bits.write_bits(encoding.missing_raw(), width);
        bits.write_bits(0, NBINC_WIDTH);
        return Ok(());
    };
    let any_missing = column.iter().any(Option::is_none);
    let range = max - min;

    bits.write_bits(min, width);
    if range == 0 && !any_missing {
        bits.write_bits(0, NBINC_WIDTH);
        return Ok(());
    }

    // range + 1 must fit so the all-ones increment stays free for missing
    let nbinc = (u64::BITS - (range + 1).leading_zeros()) as usize;
    if nbinc > MAX_NBINC {
        return Err(CodecError::CompressionOverflow { descriptor });
    }
    bits.write_bits(nbinc as u64, NBINC_WIDTH);
    for raw in column {
        let increment = raw.map_or_else(|| all_ones(nbinc), |raw| raw - min);
        bits.write_bits(increment, nbinc);
    }
    Ok(())
}

fn compress_strings(
    bits: &mut BitBuffer,
    descriptor: Descriptor,
    encoding: &Encoding,
    column: &[Vec<u8>],
) -> Result<()> {
    let n_bytes = usize::from(encoding.width) / 8;
    match column.first() {
        Some(first) if column.iter().all(|bytes| bytes == first) => {
            bits.write_bytes(first);
            bits.write_bits(0, NBINC_WIDTH);
        }
        _ => {
            if n_bytes > MAX_NBINC {
                return Err(CodecError::CompressionOverflow { descriptor });
            }
            bits.write_bytes(&vec![0u8; n_bytes]);
            bits.write_bits(n_bytes as u64, NBINC_WIDTH);
            for bytes in column {
                bits.write_bytes(bytes);
            }
        }
    }
    Ok(())
}

/// Raw stored integer for a numeric value; `None` for missing.
fn numeric_raw(
    descriptor: Descriptor,
    encoding: &Encoding,
    value: &Value,
) -> Result<Option<u64>> {
    let scaled: i128 = match value {
        Value::Missing => return Ok(None),
        Value::Integer(v) if encoding.scale >= 0 => 10i128
            .checked_pow(encoding.scale.unsigned_abs())
            .and_then(|factor| i128::from(*v).checked_mul(factor))
            .ok_or_else(|| CodecError::value_out_of_range(descriptor, value))?,
        Value::Integer(v) => (*v as f64 * 10f64.powi(encoding.scale)).round() as i128,
        Value::Float(v) if v.is_finite() => (v * 10f64.powi(encoding.scale)).round() as i128,
        Value::Float(v) => return Err(CodecError::value_out_of_range(descriptor, v)),
        Value::String(_) => {
            return Err(CodecError::TypeMismatch {
                descriptor,
                expected: encoding.value_type().class(),
            });
        }
    };
    let raw = scaled - i128::from(encoding.reference);
    if raw < 0 || raw >= i128::from(encoding.missing_raw()) {
        return Err(CodecError::value_out_of_range(descriptor, value));
    }
    Ok(Some(raw as u64))
}

/// Space-padded bytes for a string value; all 0xFF for missing.
///
/// Each character must lie in `U+0000..=U+00FF` and becomes one byte.
fn string_bytes(descriptor: Descriptor, encoding: &Encoding, value: &Value) -> Result<Vec<u8>> {
    let n_bytes = usize::from(encoding.width) / 8;
    match value {
        Value::Missing => Ok(vec![0xff; n_bytes]),
        Value::String(text) => {
            let mut bytes = text
                .chars()
                .map(|c| u8::try_from(c).ok())
                .collect::<Option<Vec<u8>>>()
                .filter(|bytes| bytes.len() <= n_bytes)
                .ok_or_else(|| CodecError::value_out_of_range(descriptor, text))?;
            bytes.resize(n_bytes, b' ');
            Ok(bytes)
        }
        _ => Err(CodecError::TypeMismatch {
            descriptor,
            expected: ValueClass::String,
        }),
    }
}
