use byteorder::{ByteOrder, LittleEndian};
use crate::common::types::{PageId, INVALID_PAGE_ID};
use crate::storage::page::layout::{DATA_SIZE, HEADER_SIZE};

#[derive(Debug, Clone, Copy)]
pub struct PageHeader {
    pub page_id: PageId,
    pub prev_page_id: Option<PageId>,
    pub next_page_id: Option<PageId>,
    /// Directory length: highest slot ever used and not yet trimmed, plus one.
    pub num_slots: u32,
    /// Offset into the data region where the next payload would be written.
    pub free_ptr: u32,
    /// Bytes available for a payload plus any new slot that must be appended.
    pub free_space: u32,
}

impl PageHeader {
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            prev_page_id: None,
            next_page_id: None,
            num_slots: 0,
            free_ptr: 0,
            free_space: DATA_SIZE as u32,
        }
    }

    // Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        LittleEndian::write_u32(&mut bytes[0..4], self.page_id);

        let prev_id = self.prev_page_id.unwrap_or(INVALID_PAGE_ID);
        LittleEndian::write_u32(&mut bytes[4..8], prev_id);

        let next_id = self.next_page_id.unwrap_or(INVALID_PAGE_ID);
        LittleEndian::write_u32(&mut bytes[8..12], next_id);

        LittleEndian::write_u32(&mut bytes[12..16], self.num_slots);
        LittleEndian::write_u32(&mut bytes[16..20], self.free_ptr);
        LittleEndian::write_u32(&mut bytes[20..24], self.free_space);

        bytes
    }

    // Deserialize header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let page_id = LittleEndian::read_u32(&bytes[0..4]);

        let prev_id = LittleEndian::read_u32(&bytes[4..8]);
        let prev_page_id = if prev_id == INVALID_PAGE_ID { None } else { Some(prev_id) };

        let next_id = LittleEndian::read_u32(&bytes[8..12]);
        let next_page_id = if next_id == INVALID_PAGE_ID { None } else { Some(next_id) };

        let num_slots = LittleEndian::read_u32(&bytes[12..16]);
        let free_ptr = LittleEndian::read_u32(&bytes[16..20]);
        let free_space = LittleEndian::read_u32(&bytes[20..24]);

        Self {
            page_id,
            prev_page_id,
            next_page_id,
            num_slots,
            free_ptr,
            free_space,
        }
    }
}
