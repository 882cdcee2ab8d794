// Export public modules
pub mod common;
pub mod storage;

// Re-export key items for convenient access
pub use common::types::{Page, PageId, RecordId};
pub use storage::page::PageManager;
pub use storage::page::PageError;
