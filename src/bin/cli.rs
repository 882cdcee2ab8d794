use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use heapdb::common::types::{Page, PageId, RecordId};
use heapdb::storage::page::{PageError, PageManager, DATA_SIZE, HEADER_SIZE, PAGE_CONSTANTS, SLOT_SIZE};

#[derive(Parser)]
#[command(author, version, about = "heapdb CLI - A tool for exercising slotted heap pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted page scenarios and report pass/fail
    Scenarios,

    /// Fill a page with serialized rows, then scan them back
    Demo {
        /// Page ID stamped on the demo page
        #[arg(short, long, default_value_t = 1)]
        page_id: PageId,
    },

    /// Show the compile-time page layout
    Info,
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Scenarios => run_scenarios(),
        Commands::Demo { page_id } => run_demo(page_id),
        Commands::Info => run_info(),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn fresh_page(page_id: PageId) -> (PageManager, Page) {
    let page_manager = PageManager::new();
    let mut page = Page::new(page_id);
    page_manager.init_page(&mut page);
    (page_manager, page)
}

fn run_scenarios() -> Result<()> {
    let scenarios: &[(&str, fn() -> Result<()>)] = &[
        ("init and empty page", scenario_init_empty),
        ("single insert", scenario_single_insert),
        ("capacity exhaustion", scenario_capacity_exhaustion),
        ("delete with compaction", scenario_delete_compact),
        ("slot reuse", scenario_slot_reuse),
        ("tail trim", scenario_tail_trim),
        ("iteration over holes", scenario_iteration_with_hole),
    ];

    let mut failed = 0;
    for (name, scenario) in scenarios {
        match scenario() {
            Ok(()) => println!("PASS  {}", name),
            Err(e) => {
                failed += 1;
                println!("FAIL  {}: {:#}", name, e);
            }
        }
    }

    println!("{}/{} scenarios passed", scenarios.len() - failed, scenarios.len());
    ensure!(failed == 0, "{} scenario(s) failed", failed);
    Ok(())
}

fn scenario_init_empty() -> Result<()> {
    let (page_manager, page) = fresh_page(7);

    ensure!(page_manager.page_no(&page) == 7, "page number not stamped");
    ensure!(page_manager.is_empty(&page), "fresh page not empty");
    ensure!(
        page_manager.free_space(&page) as usize == DATA_SIZE,
        "fresh page free space is {}",
        page_manager.free_space(&page)
    );
    ensure!(page_manager.first_record(&page).is_none(), "fresh page has a first record");
    Ok(())
}

fn scenario_single_insert() -> Result<()> {
    let (page_manager, mut page) = fresh_page(7);

    let rid = page_manager.insert_record(&mut page, b"hello")?;
    ensure!(rid == RecordId::new(7, 0), "unexpected rid {}", rid);
    ensure!(
        page_manager.free_space(&page) as usize == DATA_SIZE - 5 - SLOT_SIZE,
        "free space {} after one insert",
        page_manager.free_space(&page)
    );
    ensure!(page_manager.record_count(&page) == 1, "record count");

    let payload = page_manager.get_record(&page, rid)?;
    ensure!(payload == b"hello", "payload mismatch: {:?}", payload);
    Ok(())
}

fn scenario_capacity_exhaustion() -> Result<()> {
    let (page_manager, mut page) = fresh_page(7);

    let big = vec![0xABu8; 990];
    page_manager.insert_record(&mut page, &big)?;
    let free_after_big = page_manager.free_space(&page);

    let result = page_manager.insert_record(&mut page, b"x");
    ensure!(
        matches!(result, Err(PageError::InsufficientSpace { .. })),
        "insert on a full page was admitted"
    );
    ensure!(
        page_manager.free_space(&page) == free_after_big,
        "failed insert changed the page"
    );
    ensure!(page_manager.record_count(&page) == 1, "failed insert changed the page");
    Ok(())
}

fn scenario_delete_compact() -> Result<()> {
    let (page_manager, mut page) = fresh_page(7);

    let rid_a = page_manager.insert_record(&mut page, b"AAA")?;
    let rid_b = page_manager.insert_record(&mut page, b"BBBB")?;
    let rid_c = page_manager.insert_record(&mut page, b"CC")?;

    page_manager.delete_record(&mut page, rid_b)?;

    ensure!(page_manager.get_record(&page, rid_a)? == b"AAA", "slot 0 corrupted");
    ensure!(page_manager.get_record(&page, rid_c)? == b"CC", "slot 2 corrupted");
    ensure!(
        matches!(page_manager.get_record(&page, rid_b), Err(PageError::RecordNotFound(_))),
        "deleted slot still readable"
    );

    // Payloads must be contiguous from the start of the data region
    ensure!(
        &page.data[HEADER_SIZE..HEADER_SIZE + 5] == b"AAACC",
        "payload arena not compacted"
    );
    ensure!(page_manager.get_header(&page).free_ptr == 5, "free pointer not pulled back");
    Ok(())
}

fn scenario_slot_reuse() -> Result<()> {
    let (page_manager, mut page) = fresh_page(7);

    page_manager.insert_record(&mut page, b"AAA")?;
    let rid_b = page_manager.insert_record(&mut page, b"BBBB")?;
    page_manager.insert_record(&mut page, b"CC")?;
    page_manager.delete_record(&mut page, rid_b)?;

    let rid_d = page_manager.insert_record(&mut page, b"DD")?;
    ensure!(rid_d == RecordId::new(7, 1), "lowest empty slot not reused: {}", rid_d);
    ensure!(page_manager.record_count(&page) == 3, "record count after reuse");
    ensure!(
        page_manager.get_header(&page).num_slots == 3,
        "directory grew although a slot was free"
    );
    Ok(())
}

fn scenario_tail_trim() -> Result<()> {
    let (page_manager, mut page) = fresh_page(7);

    page_manager.insert_record(&mut page, b"aaaa")?;
    page_manager.insert_record(&mut page, b"bbbbb")?;
    let rid_c = page_manager.insert_record(&mut page, b"cccccc")?;

    let free_before = page_manager.free_space(&page);
    page_manager.delete_record(&mut page, rid_c)?;
    ensure!(page_manager.get_header(&page).num_slots == 2, "tail slot not trimmed");
    ensure!(
        page_manager.free_space(&page) as usize == free_before as usize + 6 + SLOT_SIZE,
        "trim did not credit the slot"
    );

    page_manager.delete_record(&mut page, RecordId::new(7, 1))?;
    ensure!(page_manager.get_header(&page).num_slots == 1, "second trim missed");
    Ok(())
}

fn scenario_iteration_with_hole() -> Result<()> {
    let (page_manager, mut page) = fresh_page(7);

    page_manager.insert_record(&mut page, b"AAA")?;
    let rid_b = page_manager.insert_record(&mut page, b"BBBB")?;
    page_manager.insert_record(&mut page, b"CC")?;
    page_manager.delete_record(&mut page, rid_b)?;

    let first = page_manager.first_record(&page);
    ensure!(first == Some(RecordId::new(7, 0)), "first record {:?}", first);

    let second = page_manager.next_record(&page, first.unwrap());
    ensure!(second == Some(RecordId::new(7, 2)), "hole not skipped: {:?}", second);

    let third = page_manager.next_record(&page, second.unwrap());
    ensure!(third.is_none(), "iteration ran past the last record: {:?}", third);
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct DemoRow {
    id: u32,
    name: String,
    value: f64,
    active: bool,
}

fn run_demo(page_id: PageId) -> Result<()> {
    let (page_manager, mut page) = fresh_page(page_id);

    // Insert serialized rows until the page turns one down
    let mut inserted = 0u32;
    loop {
        let row = DemoRow {
            id: inserted,
            name: format!("row_{}", inserted),
            value: inserted as f64 * 2.5,
            active: inserted % 2 == 0,
        };
        let record_bytes = bincode::serialize(&row)?;

        match page_manager.insert_record(&mut page, &record_bytes) {
            Ok(_rid) => inserted += 1,
            Err(PageError::InsufficientSpace { needed, available }) => {
                println!(
                    "Page {} full after {} rows ({} bytes needed, {} available)",
                    page_id, inserted, needed, available
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Scan everything back and make sure it deserializes in slot order
    let mut scanned = 0u32;
    for (rid, payload) in page_manager.records(&page) {
        let row: DemoRow = bincode::deserialize(payload)?;
        ensure!(row.id == scanned, "row {} out of order at {}", row.id, rid);
        scanned += 1;
    }

    ensure!(scanned == inserted, "scanned {} of {} rows", scanned, inserted);
    println!("Scanned {} rows back from page {}", scanned, page_id);
    Ok(())
}

fn run_info() -> Result<()> {
    println!("page size:      {} bytes", PAGE_CONSTANTS.page_size);
    println!("header size:    {} bytes", PAGE_CONSTANTS.header_size);
    println!("slot size:      {} bytes", PAGE_CONSTANTS.slot_size);
    println!("data region:    {} bytes", PAGE_CONSTANTS.data_size);
    println!("max record:     {} bytes (one record, one slot)", DATA_SIZE - SLOT_SIZE);
    Ok(())
}
