use serde::{Deserialize, Serialize};

/// Identification section (section 1) of an edition 4 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section1 {
    pub master_table: u8,
    pub orig_centre: u16,
    pub orig_sub_centre: u16,
    pub upd_seq_no: u8,
    /// Bit 0x80 set when an optional section 2 follows.
    pub flags: u8,
    /// Data category (Table A), also called the message type.
    pub data_category: u8,
    pub inter_subtype: u8,
    pub local_subtype: u8,
    pub master_table_version: u8,
    pub local_table_version: u8,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Section1 {
    /// Flag bit marking the presence of section 2.
    pub const SECTION2_PRESENT: u8 = 0x80;

    pub fn has_section2(&self) -> bool {
        self.flags & Self::SECTION2_PRESENT != 0
    }
}
