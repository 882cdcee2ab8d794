use std::sync::Arc;
use anyhow::Result;
use parking_lot::RwLock;

use heapdb::common::types::{Page, PagePtr};
use heapdb::storage::page::PageManager;

fn main() -> Result<()> {
    // Create a page manager
    let page_manager = PageManager::new();

    // Create a page buffer; the RwLock stands in for the buffer pool's latch
    let page: PagePtr = Arc::new(RwLock::new(Page::new(1)));

    // Initialize the page
    {
        let mut page_guard = page.write();
        page_manager.init_page(&mut page_guard);
        println!(
            "Initialized page {} with {} bytes free",
            page_manager.page_no(&page_guard),
            page_manager.free_space(&page_guard)
        );
    }

    // Insert a few records
    let rids = {
        let mut page_guard = page.write();
        let mut rids = Vec::new();
        let payloads: [&[u8]; 3] = [b"first record", b"second", b"third one"];
        for data in payloads {
            let rid = page_manager.insert_record(&mut page_guard, data)?;
            println!("Inserted {} bytes at RID {}", data.len(), rid);
            rids.push(rid);
        }
        rids
    };

    // Scan the page
    {
        let page_guard = page.read();
        println!("Page now holds {} records:", page_manager.record_count(&page_guard));
        for (rid, payload) in page_manager.records(&page_guard) {
            println!("  {} -> {:?}", rid, String::from_utf8_lossy(payload));
        }
    }

    // Delete the middle record; the other RIDs stay valid
    {
        let mut page_guard = page.write();
        page_manager.delete_record(&mut page_guard, rids[1])?;
        println!("Deleted record {}", rids[1]);

        let first = page_manager.get_record(&page_guard, rids[0])?;
        let third = page_manager.get_record(&page_guard, rids[2])?;
        println!(
            "Still readable after delete: {:?}, {:?}",
            String::from_utf8_lossy(&first),
            String::from_utf8_lossy(&third)
        );
        println!(
            "Free space after compaction: {} bytes",
            page_manager.free_space(&page_guard)
        );
    }

    println!("Page operations completed successfully");

    Ok(())
}
