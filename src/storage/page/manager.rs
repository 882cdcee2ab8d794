use log::debug;

use crate::common::types::{Page, PageId, RecordId};
use crate::storage::page::error::PageError;
use crate::storage::page::header::PageHeader;
use crate::storage::page::layout::{slot_position, Slot, DATA_SIZE, HEADER_SIZE, SLOT_SIZE};

pub struct PageManager {
    // Slot directory is stored from the end of the page,
    // record payloads are stored from the beginning of the data region
    // (right after the header); free space is the gap between them.
}

impl PageManager {
    pub fn new() -> Self {
        Self {}
    }

    pub fn init_page(&self, page: &mut Page) {
        let header = PageHeader::new(page.page_id);
        let header_bytes = header.to_bytes();
        page.data[0..HEADER_SIZE].copy_from_slice(&header_bytes);
        debug!("Initialized page {} with {} bytes of data space", page.page_id, DATA_SIZE);
    }

    pub fn insert_record(&self, page: &mut Page, data: &[u8]) -> Result<RecordId, PageError> {
        let mut header = self.get_header(page);
        let length = data.len();

        // Lowest-index empty slot wins; only a fresh tail slot costs
        // directory space.
        let reused = (0..header.num_slots).find(|&i| self.get_slot(page, i).is_empty());
        let slot_no = match reused {
            Some(slot_no) => {
                if (header.free_space as usize) < length {
                    return Err(PageError::InsufficientSpace {
                        needed: length,
                        available: header.free_space as usize,
                    });
                }
                slot_no
            }
            None => {
                if (header.free_space as usize) < length + SLOT_SIZE {
                    return Err(PageError::InsufficientSpace {
                        needed: length + SLOT_SIZE,
                        available: header.free_space as usize,
                    });
                }
                let slot_no = header.num_slots;
                header.num_slots += 1;
                header.free_space -= SLOT_SIZE as u32;
                slot_no
            }
        };

        // Place the payload at the high-water mark
        let offset = header.free_ptr;
        let start = HEADER_SIZE + offset as usize;
        page.data[start..start + length].copy_from_slice(data);
        self.set_slot(page, slot_no, &Slot::new(offset as i32, length as i32));

        header.free_ptr += length as u32;
        header.free_space -= length as u32;
        self.set_header(page, &header);

        debug_assert_eq!(self.get_slot(page, slot_no).offset, offset as i32);
        self.debug_check_layout(page);

        debug!("Page {}: inserted {} bytes at slot {}", header.page_id, length, slot_no);
        Ok(RecordId::new(header.page_id, slot_no))
    }

    pub fn delete_record(&self, page: &mut Page, rid: RecordId) -> Result<(), PageError> {
        let mut header = self.get_header(page);

        if rid.slot_no >= header.num_slots {
            return Err(PageError::InvalidRecordId(rid));
        }
        let slot = self.get_slot(page, rid.slot_no);
        if slot.is_empty() {
            return Err(PageError::RecordNotFound(rid));
        }

        let length = slot.length as u32;

        // Slide every payload above the hole down over it, keeping the
        // payload arena contiguous.
        let src_start = HEADER_SIZE + (slot.offset + slot.length) as usize;
        let src_end = HEADER_SIZE + header.free_ptr as usize;
        let dst = HEADER_SIZE + slot.offset as usize;
        page.data.copy_within(src_start..src_end, dst);

        // Moved payloads need their slot offsets pulled back by the same
        // amount; slots at or below the hole are untouched.
        for i in 0..header.num_slots {
            let mut other = self.get_slot(page, i);
            if !other.is_empty() && other.offset > slot.offset {
                other.offset -= slot.length;
                self.set_slot(page, i, &other);
            }
        }

        header.free_ptr -= length;
        header.free_space += length;
        self.set_slot(page, rid.slot_no, &Slot::empty());

        // Trim any run of empty slots now exposed at the directory tail,
        // crediting their space back.
        while header.num_slots > 0 && self.get_slot(page, header.num_slots - 1).is_empty() {
            header.num_slots -= 1;
            header.free_space += SLOT_SIZE as u32;
        }

        self.set_header(page, &header);
        self.debug_check_layout(page);

        debug!("Page {}: deleted slot {} ({} bytes)", header.page_id, rid.slot_no, length);
        Ok(())
    }

    pub fn update_record(&self, page: &mut Page, rid: RecordId, data: &[u8]) -> Result<(), PageError> {
        let mut header = self.get_header(page);

        if rid.slot_no >= header.num_slots {
            return Err(PageError::InvalidRecordId(rid));
        }
        let slot = self.get_slot(page, rid.slot_no);
        if slot.is_empty() {
            return Err(PageError::RecordNotFound(rid));
        }

        let old_length = slot.length as usize;
        let new_length = data.len();

        // Same size: overwrite in place
        if new_length == old_length {
            let start = HEADER_SIZE + slot.offset as usize;
            page.data[start..start + new_length].copy_from_slice(data);
            return Ok(());
        }

        // The old payload is reclaimed as part of the rewrite, so it
        // counts toward the space available for the new one.
        if header.free_space as usize + old_length < new_length {
            return Err(PageError::InsufficientSpace {
                needed: new_length - old_length,
                available: header.free_space as usize,
            });
        }

        // Compact the old payload out, then append the new payload at the
        // high-water mark. The slot index (and thus the RID) is unchanged.
        let src_start = HEADER_SIZE + (slot.offset + slot.length) as usize;
        let src_end = HEADER_SIZE + header.free_ptr as usize;
        let dst = HEADER_SIZE + slot.offset as usize;
        page.data.copy_within(src_start..src_end, dst);

        for i in 0..header.num_slots {
            let mut other = self.get_slot(page, i);
            if !other.is_empty() && other.offset > slot.offset {
                other.offset -= slot.length;
                self.set_slot(page, i, &other);
            }
        }
        header.free_ptr -= old_length as u32;

        let new_offset = header.free_ptr;
        let start = HEADER_SIZE + new_offset as usize;
        page.data[start..start + new_length].copy_from_slice(data);
        self.set_slot(page, rid.slot_no, &Slot::new(new_offset as i32, new_length as i32));

        header.free_ptr += new_length as u32;
        header.free_space = header.free_space + old_length as u32 - new_length as u32;
        self.set_header(page, &header);
        self.debug_check_layout(page);

        debug!(
            "Page {}: updated slot {} from {} to {} bytes",
            header.page_id, rid.slot_no, old_length, new_length
        );
        Ok(())
    }

    /// Returns an owned copy of the record's payload.
    pub fn get_record(&self, page: &Page, rid: RecordId) -> Result<Vec<u8>, PageError> {
        Ok(self.record_slice(page, rid)?.to_vec())
    }

    /// Returns the record's payload without copying.
    ///
    /// The slice borrows the page buffer, so the borrow checker rejects
    /// holding it across any mutating page operation.
    pub fn record_slice<'a>(&self, page: &'a Page, rid: RecordId) -> Result<&'a [u8], PageError> {
        let header = self.get_header(page);

        if rid.slot_no >= header.num_slots {
            return Err(PageError::InvalidRecordId(rid));
        }
        let slot = self.get_slot(page, rid.slot_no);
        if slot.is_empty() {
            return Err(PageError::RecordNotFound(rid));
        }

        let start = HEADER_SIZE + slot.offset as usize;
        let end = start + slot.length as usize;
        Ok(&page.data[start..end])
    }

    /// Record ID of the lowest-indexed occupied slot, or `None` on an
    /// empty page.
    pub fn first_record(&self, page: &Page) -> Option<RecordId> {
        let header = self.get_header(page);
        (0..header.num_slots)
            .find(|&i| !self.get_slot(page, i).is_empty())
            .map(|slot_no| RecordId::new(header.page_id, slot_no))
    }

    /// Record ID of the next occupied slot after `cur`, skipping holes.
    pub fn next_record(&self, page: &Page, cur: RecordId) -> Option<RecordId> {
        let header = self.get_header(page);
        (cur.slot_no + 1..header.num_slots)
            .find(|&i| !self.get_slot(page, i).is_empty())
            .map(|slot_no| RecordId::new(header.page_id, slot_no))
    }

    /// Iterates over every live record in ascending slot order.
    pub fn records<'a>(&'a self, page: &'a Page) -> impl Iterator<Item = (RecordId, &'a [u8])> + 'a {
        let header = self.get_header(page);
        (0..header.num_slots).filter_map(move |slot_no| {
            let slot = self.get_slot(page, slot_no);
            if slot.is_empty() {
                return None;
            }
            let start = HEADER_SIZE + slot.offset as usize;
            let end = start + slot.length as usize;
            Some((RecordId::new(header.page_id, slot_no), &page.data[start..end]))
        })
    }

    /// Upper bound on the payload length the page can admit: exact when
    /// an empty slot can be reused, `SLOT_SIZE` less when a fresh slot
    /// must be appended.
    pub fn free_space(&self, page: &Page) -> u32 {
        self.get_header(page).free_space
    }

    pub fn is_empty(&self, page: &Page) -> bool {
        self.first_record(page).is_none()
    }

    /// Number of occupied slots; may be less than the directory length
    /// when deletions have left holes.
    pub fn record_count(&self, page: &Page) -> u32 {
        let header = self.get_header(page);
        (0..header.num_slots)
            .filter(|&i| !self.get_slot(page, i).is_empty())
            .count() as u32
    }

    pub fn page_no(&self, page: &Page) -> PageId {
        self.get_header(page).page_id
    }

    pub fn next_page_id(&self, page: &Page) -> Option<PageId> {
        self.get_header(page).next_page_id
    }

    pub fn prev_page_id(&self, page: &Page) -> Option<PageId> {
        self.get_header(page).prev_page_id
    }

    pub fn set_next_page_id(&self, page: &mut Page, next: Option<PageId>) {
        let mut header = self.get_header(page);
        header.next_page_id = next;
        self.set_header(page, &header);
    }

    pub fn set_prev_page_id(&self, page: &mut Page, prev: Option<PageId>) {
        let mut header = self.get_header(page);
        header.prev_page_id = prev;
        self.set_header(page, &header);
    }

    pub fn get_header(&self, page: &Page) -> PageHeader {
        PageHeader::from_bytes(&page.data[0..HEADER_SIZE])
    }

    // Helper methods

    fn set_header(&self, page: &mut Page, header: &PageHeader) {
        let header_bytes = header.to_bytes();
        page.data[0..HEADER_SIZE].copy_from_slice(&header_bytes);
    }

    fn get_slot(&self, page: &Page, slot_no: u32) -> Slot {
        let pos = slot_position(slot_no);
        Slot::from_bytes(&page.data[pos..pos + SLOT_SIZE])
    }

    fn set_slot(&self, page: &mut Page, slot_no: u32, slot: &Slot) {
        let pos = slot_position(slot_no);
        page.data[pos..pos + SLOT_SIZE].copy_from_slice(&slot.to_bytes());
    }

    // Space accounting identity: free_ptr + num_slots * SLOT_SIZE + free_space == DATA_SIZE
    fn debug_check_layout(&self, page: &Page) {
        let header = self.get_header(page);
        debug_assert_eq!(
            header.free_ptr as usize + header.num_slots as usize * SLOT_SIZE + header.free_space as usize,
            DATA_SIZE,
        );
    }
}

impl Default for PageManager {
    fn default() -> Self {
        Self::new()
    }
}
