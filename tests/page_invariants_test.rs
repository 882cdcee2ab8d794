use std::collections::HashMap;

use anyhow::Result;
use rand::prelude::*;
use rand::rngs::StdRng;

use heapdb::common::types::{Page, RecordId};
use heapdb::storage::page::{PageError, PageManager, DATA_SIZE, SLOT_SIZE};

mod common;

/// Byte offset of a record's payload within the data region, recovered
/// from the borrowed slice.
fn payload_offset(page: &Page, slice: &[u8]) -> usize {
    let page_base = page.data.as_ptr() as usize;
    let data_base = page_base + (page.data.len() - DATA_SIZE);
    slice.as_ptr() as usize - data_base
}

/// Checks the layout invariants the page must uphold after every operation:
/// space accounting, payload containment, pairwise non-overlap, and
/// directory/payload separation.
fn check_layout_invariants(page_manager: &PageManager, page: &Page) {
    let header = page_manager.get_header(page);
    let num_slots = header.num_slots as usize;
    let free_ptr = header.free_ptr as usize;
    let free_space = header.free_space as usize;

    assert_eq!(
        free_ptr + num_slots * SLOT_SIZE + free_space,
        DATA_SIZE,
        "space accounting identity broken"
    );
    assert!(
        free_ptr <= DATA_SIZE - num_slots * SLOT_SIZE,
        "payload arena ran into the slot directory"
    );

    let mut intervals: Vec<(usize, usize)> = page_manager
        .records(page)
        .map(|(_, payload)| (payload_offset(page, payload), payload.len()))
        .collect();

    for &(offset, length) in &intervals {
        assert!(offset + length <= free_ptr, "payload sticks out past the high-water mark");
    }

    intervals.sort();
    for pair in intervals.windows(2) {
        let (off_a, len_a) = pair[0];
        let (off_b, _) = pair[1];
        assert!(off_a + len_a <= off_b, "payloads overlap");
    }
}

/// Checks that the page contents agree with a shadow model of what should
/// be stored, and that iteration visits exactly the live records in
/// ascending slot order.
fn check_against_model(
    page_manager: &PageManager,
    page: &Page,
    model: &HashMap<u32, Vec<u8>>,
) -> Result<()> {
    assert_eq!(page_manager.record_count(page) as usize, model.len());
    assert_eq!(page_manager.is_empty(page), model.is_empty());

    for (&slot_no, expected) in model {
        let rid = RecordId::new(page.page_id, slot_no);
        assert_eq!(&page_manager.get_record(page, rid)?, expected);
        assert_eq!(page_manager.record_slice(page, rid)?, expected.as_slice());
    }

    let mut expected_slots: Vec<u32> = model.keys().copied().collect();
    expected_slots.sort_unstable();

    let mut visited = Vec::new();
    let mut cur = page_manager.first_record(page);
    while let Some(rid) = cur {
        visited.push(rid.slot_no);
        cur = page_manager.next_record(page, rid);
    }
    assert_eq!(visited, expected_slots, "cursor iteration diverged from live slots");

    let iterated: Vec<u32> = page_manager.records(page).map(|(rid, _)| rid.slot_no).collect();
    assert_eq!(iterated, expected_slots, "records() diverged from live slots");

    Ok(())
}

fn run_randomized_sequence(seed: u64, steps: usize) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let page_manager = PageManager::new();
    let mut page = common::create_test_page(42);
    let mut model: HashMap<u32, Vec<u8>> = HashMap::new();

    for _ in 0..steps {
        match rng.gen_range(0..10) {
            // Insert, weighted to keep the page busy
            0..=4 => {
                let length = rng.gen_range(0..80);
                let payload: Vec<u8> = (0..length).map(|_| rng.gen()).collect();
                match page_manager.insert_record(&mut page, &payload) {
                    Ok(rid) => {
                        assert_eq!(rid.page_no, 42);
                        assert!(
                            model.insert(rid.slot_no, payload).is_none(),
                            "insert handed out a live slot"
                        );
                    }
                    Err(PageError::InsufficientSpace { .. }) => {}
                    Err(e) => panic!("unexpected insert failure: {}", e),
                }
            }
            // Delete a live record
            5..=7 => {
                let Some(&slot_no) = model.keys().choose(&mut rng) else {
                    continue;
                };
                page_manager.delete_record(&mut page, RecordId::new(42, slot_no))?;
                model.remove(&slot_no);
            }
            // Update a live record, preserving its RID
            _ => {
                let Some(&slot_no) = model.keys().choose(&mut rng) else {
                    continue;
                };
                let length = rng.gen_range(0..100);
                let payload: Vec<u8> = (0..length).map(|_| rng.gen()).collect();
                match page_manager.update_record(&mut page, RecordId::new(42, slot_no), &payload) {
                    Ok(()) => {
                        model.insert(slot_no, payload);
                    }
                    Err(PageError::InsufficientSpace { .. }) => {}
                    Err(e) => panic!("unexpected update failure: {}", e),
                }
            }
        }

        check_layout_invariants(&page_manager, &page);
        check_against_model(&page_manager, &page, &model)?;
    }

    Ok(())
}

#[test]
fn test_randomized_operations_hold_invariants() -> Result<()> {
    for seed in [1, 7, 42, 1337] {
        run_randomized_sequence(seed, 400)?;
    }
    Ok(())
}

#[test]
fn test_fill_then_drain_holds_invariants() -> Result<()> {
    let page_manager = PageManager::new();
    let mut page = common::create_test_page(42);
    let mut model: HashMap<u32, Vec<u8>> = HashMap::new();

    // Fill with fixed-size records until the page refuses
    loop {
        let payload = common::generate_test_data(31);
        match page_manager.insert_record(&mut page, &payload) {
            Ok(rid) => {
                model.insert(rid.slot_no, payload);
            }
            Err(PageError::InsufficientSpace { .. }) => break,
            Err(e) => panic!("unexpected insert failure: {}", e),
        }
        check_layout_invariants(&page_manager, &page);
    }
    assert!(!model.is_empty());

    // Drain in insertion order; every surviving record stays intact
    let mut slots: Vec<u32> = model.keys().copied().collect();
    slots.sort_unstable();
    for slot_no in slots {
        page_manager.delete_record(&mut page, RecordId::new(42, slot_no))?;
        model.remove(&slot_no);
        check_layout_invariants(&page_manager, &page);
        check_against_model(&page_manager, &page, &model)?;
    }

    assert!(page_manager.is_empty(&page));
    assert_eq!(page_manager.free_space(&page) as usize, DATA_SIZE);
    Ok(())
}

#[test]
fn test_available_space_strictly_decreases_across_inserts() -> Result<()> {
    let page_manager = PageManager::new();
    let mut page = common::create_test_page(1);

    let mut previous = page_manager.free_space(&page);
    for size in [0, 1, 16, 64, 128] {
        page_manager.insert_record(&mut page, &common::generate_test_data(size))?;
        let current = page_manager.free_space(&page);
        assert!(
            current < previous,
            "free space did not strictly decrease: {} -> {}",
            previous,
            current
        );
        previous = current;
    }
    Ok(())
}

#[test]
fn test_delete_returns_exactly_the_reclaimed_bytes() -> Result<()> {
    let page_manager = PageManager::new();
    let mut page = common::create_test_page(1);

    page_manager.insert_record(&mut page, &common::generate_test_data(50))?;
    let rid = page_manager.insert_record(&mut page, &common::generate_test_data(70))?;
    page_manager.insert_record(&mut page, &common::generate_test_data(90))?;

    let free_before = page_manager.free_space(&page) as usize;
    page_manager.delete_record(&mut page, rid)?;

    // A mid-page delete reclaims the payload but keeps the slot
    assert_eq!(page_manager.free_space(&page) as usize, free_before + 70);
    check_layout_invariants(&page_manager, &page);
    Ok(())
}
