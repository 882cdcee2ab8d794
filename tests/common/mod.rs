use heapdb::common::types::{Page, PageId};
use heapdb::storage::page::PageManager;

// Create an initialized page for testing
#[allow(dead_code)]
pub fn create_test_page(page_id: PageId) -> Page {
    let page_manager = PageManager::new();
    let mut page = Page::new(page_id);
    page_manager.init_page(&mut page);
    page
}

// Generate test data of specified size
#[allow(dead_code)]
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}
