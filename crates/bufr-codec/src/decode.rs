//! Data section decoding.

use bufr_model::{DataField, DataSubset, Dataset, Descriptor, Value};
use bufr_tables::{Encoding, SchemaTable};

use crate::bits::BitBuffer;
use crate::error::{CodecError, Result};
use crate::message::Message;

/// Width in bits of the compressed increment-width field.
pub(crate) const NBINC_WIDTH: usize = 6;

/// Expand a template into the element encodings of one subset.
///
/// Replication and operator descriptors are rejected.
pub(crate) fn resolve_elements<'t>(
    table: &'t SchemaTable,
    descriptors: &[Descriptor],
) -> Result<Vec<(Descriptor, &'t Encoding)>> {
    table
        .expand(descriptors)?
        .into_iter()
        .map(|descriptor| {
            if !descriptor.is_element() {
                return Err(CodecError::UnsupportedDescriptor {
                    descriptor,
                    kind: descriptor.kind(),
                });
            }
            table
                .fetch_encoding(descriptor)
                .map(|encoding| (descriptor, encoding))
                .ok_or(CodecError::UnknownDescriptor {
                    descriptor,
                    version: table.master_version(),
                })
        })
        .collect()
}

/// Decode every subset of a message with the given table.
pub fn decode_message(message: &Message, table: &SchemaTable) -> Result<Dataset> {
    let elements = resolve_elements(table, &message.descriptors)?;
    let subset_count = usize::from(message.subset_count);
    let mut bits = BitBuffer::from_bytes(&message.data);

    let subsets = if message.is_compressed() {
        decode_compressed(&mut bits, &elements, subset_count)?
    } else {
        decode_uncompressed(&mut bits, &elements, subset_count)?
    };

    let mut dataset = Dataset::new(message.section1, message.template()).with_subsets(subsets);
    dataset.data_flag = message.data_flag;
    Ok(dataset)
}

fn decode_uncompressed(
    bits: &mut BitBuffer,
    elements: &[(Descriptor, &Encoding)],
    subset_count: usize,
) -> Result<Vec<DataSubset>> {
    let mut subsets = Vec::with_capacity(subset_count);
    for _ in 0..subset_count {
        let mut fields = Vec::with_capacity(elements.len());
        for &(descriptor, encoding) in elements {
            let value = if encoding.is_string() {
                decode_string(&read_bytes(bits, usize::from(encoding.width))?)
            } else {
                let raw = read_bits(bits, usize::from(encoding.width))?;
                if raw == encoding.missing_raw() {
                    Value::Missing
                } else {
                    decode_numeric(raw, encoding)
                }
            };
            fields.push(DataField::new(descriptor, value));
        }
        subsets.push(DataSubset::new(fields));
    }
    Ok(subsets)
}

/// Compressed data is element major: each element carries a reference,
/// an increment width and one increment per subset.
fn decode_compressed(
    bits: &mut BitBuffer,
    elements: &[(Descriptor, &Encoding)],
    subset_count: usize,
) -> Result<Vec<DataSubset>> {
    let mut subsets: Vec<DataSubset> = (0..subset_count)
        .map(|_| DataSubset::new(Vec::with_capacity(elements.len())))
        .collect();

    for &(descriptor, encoding) in elements {
        let width = usize::from(encoding.width);
        if encoding.is_string() {
            let reference = read_bytes(bits, width)?;
            let nbinc = read_bits(bits, NBINC_WIDTH)? as usize;
            for subset in subsets.iter_mut() {
                let value = if nbinc == 0 {
                    decode_string(&reference)
                } else {
                    decode_string(&read_bytes(bits, nbinc * 8)?)
                };
                subset.push(descriptor, value);
            }
        } else {
            let reference = read_bits(bits, width)?;
            let nbinc = read_bits(bits, NBINC_WIDTH)? as usize;
            let increment_missing = all_ones(nbinc);
            for subset in subsets.iter_mut() {
                let value = if nbinc == 0 {
                    if reference == encoding.missing_raw() {
                        Value::Missing
                    } else {
                        decode_numeric(reference, encoding)
                    }
                } else {
                    let increment = read_bits(bits, nbinc)?;
                    if increment == increment_missing {
                        Value::Missing
                    } else {
                        let raw = reference
                            .checked_add(increment)
                            .filter(|&raw| raw < encoding.missing_raw())
                            .ok_or_else(|| {
                                CodecError::value_out_of_range(
                                    descriptor,
                                    format!("{reference}+{increment}"),
                                )
                            })?;
                        decode_numeric(raw, encoding)
                    }
                };
                subset.push(descriptor, value);
            }
        }
    }
    Ok(subsets)
}

fn decode_numeric(raw: u64, encoding: &Encoding) -> Value {
    let value = (raw as i64).wrapping_add(encoding.reference);
    match encoding.scale {
        0 => Value::Integer(value),
        scale if scale > 0 => Value::Float(value as f64 / 10f64.powi(scale)),
        scale => Value::Integer(value.saturating_mul(10i64.saturating_pow(scale.unsigned_abs()))),
    }
}

/// IA5 bytes map one to one onto `U+0000..=U+00FF`.
fn decode_string(bytes: &[u8]) -> Value {
    if !bytes.is_empty() && bytes.iter().all(|&b| b == 0xff) {
        return Value::Missing;
    }
    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    Value::String(text.trim_end_matches([' ', '\0']).to_string())
}

fn read_bits(bits: &mut BitBuffer, n: usize) -> Result<u64> {
    bits.read_bits(n)
        .ok_or_else(|| CodecError::truncated("data section"))
}

fn read_bytes(bits: &mut BitBuffer, n_bits: usize) -> Result<Vec<u8>> {
    bits.read_bytes(n_bits)
        .ok_or_else(|| CodecError::truncated("data section"))
}

pub(crate) fn all_ones(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
