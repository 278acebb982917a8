//! Message sections.
//!
//! # Layout (edition 4)
//!
//! | Section | Contents                                                    |
//! |---------|-------------------------------------------------------------|
//! | 0       | `BUFR`, total length (3 bytes), edition                     |
//! | 1       | identification, 22 bytes                                    |
//! | 2       | optional local data, skipped on read                        |
//! | 3       | length, reserved, subset count, flags, packed descriptors   |
//! | 4       | length, reserved, bit-packed data                           |
//! | 5       | `7777`                                                      |

use bufr_model::{Dataset, Descriptor, Section1, Template};

use crate::error::{CodecError, Result};

pub const MAGIC: &[u8; 4] = b"BUFR";
pub const END_MARKER: &[u8; 4] = b"7777";
pub const SUPPORTED_EDITION: u8 = 4;

const SECTION0_LEN: usize = 8;
const SECTION1_LEN: usize = 22;
const SECTION3_HEADER_LEN: usize = 7;
const SECTION4_HEADER_LEN: usize = 4;
const MAX_LENGTH: usize = 0xff_ffff;

/// Undecoded bytes of one message, `BUFR` through `7777`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    bytes: Vec<u8>,
}

impl RawMessage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parse the section structure without decoding the data section.
    pub fn parse(&self) -> Result<Message> {
        Message::parse(&self.bytes)
    }
}

/// A message split into its sections; the data section is still packed.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub edition: u8,
    pub section1: Section1,
    pub subset_count: u16,
    pub data_flag: u8,
    pub descriptors: Vec<Descriptor>,
    pub data: Vec<u8>,
}

impl Message {
    pub fn template(&self) -> Template {
        Template::new(self.edition, self.descriptors.clone())
    }

    pub fn is_compressed(&self) -> bool {
        self.data_flag & Dataset::FLAG_COMPRESSED != 0
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SECTION0_LEN {
            return Err(CodecError::truncated("section 0"));
        }
        if &bytes[0..4] != MAGIC {
            return Err(CodecError::BadMagic);
        }
        let declared = read_u24(bytes, 4);
        if declared != bytes.len() {
            return Err(CodecError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }
        let edition = bytes[7];
        if edition != SUPPORTED_EDITION {
            return Err(CodecError::UnsupportedEdition { edition });
        }

        let mut offset = SECTION0_LEN;
        let section1_bytes = section(bytes, offset, 1)?;
        if section1_bytes.len() < SECTION1_LEN {
            return Err(CodecError::invalid_section(1, "shorter than 22 bytes"));
        }
        let section1 = parse_section1(section1_bytes);
        offset += section1_bytes.len();

        if section1.has_section2() {
            offset += section(bytes, offset, 2)?.len();
        }

        let section3 = section(bytes, offset, 3)?;
        if section3.len() < SECTION3_HEADER_LEN {
            return Err(CodecError::invalid_section(3, "shorter than 7 bytes"));
        }
        let subset_count = u16::from_be_bytes([section3[4], section3[5]]);
        let data_flag = section3[6];
        let descriptors: Vec<Descriptor> = section3[SECTION3_HEADER_LEN..]
            .chunks_exact(2)
            .map(|pair| Descriptor::from_packed(u16::from_be_bytes([pair[0], pair[1]])))
            .collect();
        if descriptors.is_empty() {
            return Err(CodecError::invalid_section(3, "no descriptors"));
        }
        offset += section3.len();

        let section4 = section(bytes, offset, 4)?;
        if section4.len() < SECTION4_HEADER_LEN {
            return Err(CodecError::invalid_section(4, "shorter than 4 bytes"));
        }
        let data = section4[SECTION4_HEADER_LEN..].to_vec();
        offset += section4.len();

        if bytes.len() != offset + END_MARKER.len() || &bytes[offset..] != END_MARKER {
            return Err(CodecError::MissingEndMarker);
        }

        Ok(Self {
            edition,
            section1,
            subset_count,
            data_flag,
            descriptors,
            data,
        })
    }

    /// Assemble the message bytes. Section 2 is never written.
    pub fn to_raw(&self) -> Result<RawMessage> {
        let mut section1 = self.section1;
        section1.flags &= !Section1::SECTION2_PRESENT;

        let mut section3 = vec![0u8; SECTION3_HEADER_LEN];
        section3[4..6].copy_from_slice(&self.subset_count.to_be_bytes());
        section3[6] = self.data_flag;
        for descriptor in &self.descriptors {
            section3.extend_from_slice(&descriptor.packed().to_be_bytes());
        }
        pad_even(&mut section3);
        let section3_len = section3.len();
        write_u24(&mut section3, 0, section3_len)?;

        let mut section4 = vec![0u8; SECTION4_HEADER_LEN];
        section4.extend_from_slice(&self.data);
        pad_even(&mut section4);
        let section4_len = section4.len();
        write_u24(&mut section4, 0, section4_len)?;

        let total = SECTION0_LEN + SECTION1_LEN + section3_len + section4_len + END_MARKER.len();
        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[0, 0, 0, self.edition]);
        write_u24(&mut bytes, 4, total)?;
        bytes.extend_from_slice(&build_section1(&section1));
        bytes.extend_from_slice(&section3);
        bytes.extend_from_slice(&section4);
        bytes.extend_from_slice(END_MARKER);
        Ok(RawMessage::new(bytes))
    }
}

/// Slice of the section starting at `offset`, using its 3-byte length.
fn section(bytes: &[u8], offset: usize, number: u8) -> Result<&[u8]> {
    if offset + 3 > bytes.len() {
        return Err(CodecError::invalid_section(number, "missing"));
    }
    let len = read_u24(bytes, offset);
    if len < 3 || offset + len > bytes.len() {
        return Err(CodecError::invalid_section(
            number,
            format!("length {len} out of bounds"),
        ));
    }
    Ok(&bytes[offset..offset + len])
}

fn parse_section1(s: &[u8]) -> Section1 {
    Section1 {
        master_table: s[3],
        orig_centre: u16::from_be_bytes([s[4], s[5]]),
        orig_sub_centre: u16::from_be_bytes([s[6], s[7]]),
        upd_seq_no: s[8],
        flags: s[9],
        data_category: s[10],
        inter_subtype: s[11],
        local_subtype: s[12],
        master_table_version: s[13],
        local_table_version: s[14],
        year: u16::from_be_bytes([s[15], s[16]]),
        month: s[17],
        day: s[18],
        hour: s[19],
        minute: s[20],
        second: s[21],
    }
}

fn build_section1(s1: &Section1) -> [u8; SECTION1_LEN] {
    let mut s = [0u8; SECTION1_LEN];
    s[2] = SECTION1_LEN as u8;
    s[3] = s1.master_table;
    s[4..6].copy_from_slice(&s1.orig_centre.to_be_bytes());
    s[6..8].copy_from_slice(&s1.orig_sub_centre.to_be_bytes());
    s[8] = s1.upd_seq_no;
    s[9] = s1.flags;
    s[10] = s1.data_category;
    s[11] = s1.inter_subtype;
    s[12] = s1.local_subtype;
    s[13] = s1.master_table_version;
    s[14] = s1.local_table_version;
    s[15..17].copy_from_slice(&s1.year.to_be_bytes());
    s[17] = s1.month;
    s[18] = s1.day;
    s[19] = s1.hour;
    s[20] = s1.minute;
    s[21] = s1.second;
    s
}

pub(crate) fn read_u24(bytes: &[u8], offset: usize) -> usize {
    (usize::from(bytes[offset]) << 16)
        | (usize::from(bytes[offset + 1]) << 8)
        | usize::from(bytes[offset + 2])
}

fn write_u24(bytes: &mut [u8], offset: usize, value: usize) -> Result<()> {
    if value > MAX_LENGTH {
        return Err(CodecError::MessageTooLarge { length: value });
    }
    bytes[offset] = (value >> 16) as u8;
    bytes[offset + 1] = (value >> 8) as u8;
    bytes[offset + 2] = value as u8;
    Ok(())
}

fn pad_even(section: &mut Vec<u8>) {
    if !section.len().is_multiple_of(2) {
        section.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            edition: 4,
            section1: Section1 {
                orig_centre: 54,
                data_category: 2,
                master_table_version: 14,
                year: 2024,
                month: 3,
                day: 1,
                ..Section1::default()
            },
            subset_count: 1,
            data_flag: Dataset::FLAG_OBSERVED,
            descriptors: vec![Descriptor::from_code(1001).unwrap()],
            data: vec![0x80],
        }
    }

    #[test]
    fn builds_parseable_sections() {
        let message = sample();
        let raw = message.to_raw().unwrap();
        assert_eq!(&raw.as_bytes()[0..4], MAGIC);
        assert_eq!(read_u24(raw.as_bytes(), 4), raw.len());
        assert!(raw.as_bytes().ends_with(END_MARKER));

        let parsed = raw.parse().unwrap();
        assert_eq!(parsed.section1, message.section1);
        assert_eq!(parsed.descriptors, message.descriptors);
        // section 4 is padded to an even length
        assert_eq!(parsed.data, vec![0x80, 0x00]);
    }

    #[test]
    fn section2_is_skipped() {
        let raw = sample().to_raw().unwrap();
        let mut bytes = raw.into_bytes();
        // flag section 2 and splice a 4-byte one in after section 1
        bytes[SECTION0_LEN + 9] |= Section1::SECTION2_PRESENT;
        let insert_at = SECTION0_LEN + SECTION1_LEN;
        let tail = bytes.split_off(insert_at);
        bytes.extend_from_slice(&[0, 0, 4, 0xaa]);
        bytes.extend(tail);
        let total = bytes.len();
        write_u24(&mut bytes, 4, total).unwrap();

        let parsed = Message::parse(&bytes).unwrap();
        assert!(parsed.section1.has_section2());
        assert_eq!(parsed.descriptors.len(), 1);
    }

    #[test]
    fn rejects_wrong_edition_and_length() {
        let mut bytes = sample().to_raw().unwrap().into_bytes();
        bytes[7] = 3;
        assert!(matches!(
            Message::parse(&bytes),
            Err(CodecError::UnsupportedEdition { edition: 3 })
        ));

        let mut bytes = sample().to_raw().unwrap().into_bytes();
        bytes.pop();
        assert!(matches!(
            Message::parse(&bytes),
            Err(CodecError::LengthMismatch { .. })
        ));
    }
}
