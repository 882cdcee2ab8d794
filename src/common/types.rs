use std::fmt;
use std::sync::Arc;
use parking_lot::RwLock;

/// Page size in bytes (1KB)
pub const PAGE_SIZE: usize = 1024;

/// Page ID type
pub type PageId = u32;

/// Reserved sentinel meaning "no such page" in the on-page format
pub const INVALID_PAGE_ID: PageId = PageId::MAX;

/// Identifier of a record: the page it lives on plus its slot index.
///
/// A `RecordId` stays valid until the record itself is deleted; deleting
/// or updating other records on the same page never invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_no: PageId,
    pub slot_no: u32,
}

impl RecordId {
    pub fn new(page_no: PageId, slot_no: u32) -> Self {
        Self { page_no, slot_no }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(page {}, slot {})", self.page_no, self.slot_no)
    }
}

/// Page structure
#[derive(Debug, Clone)]
pub struct Page {
    pub data: [u8; PAGE_SIZE],
    pub page_id: PageId,
}

impl Page {
    pub fn new(page_id: PageId) -> Self {
        Self {
            data: [0; PAGE_SIZE],
            page_id,
        }
    }
}

/// Smart pointer to a page.
///
/// The RwLock is the external latch the page operations assume: at most
/// one writer, or any number of readers, holds the page while calling in.
/// The page code itself never locks.
pub type PagePtr = Arc<RwLock<Page>>;
