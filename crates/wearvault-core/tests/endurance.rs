//! Endurance and recovery tests over the mock NVM
//!
//! The mock counts erase+write, erase-only, and bit-program operations
//! per byte, so the wear-amplification claims are asserted rather than
//! assumed.

use wearvault_core::{StorageError, WearLevelUnit};
use wearvault_hal::MockNvm;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn one_rotation_costs_one_counter_erase() {
    init_logs();
    for rotations in [2u8, 5, 9, 17, 33, 65] {
        let counter_len: u16 = match rotations {
            2..=9 => 1,
            10..=17 => 2,
            18..=33 => 4,
            _ => 8,
        };
        let footprint = counter_len + rotations as u16 * 2;
        assert_eq!(WearLevelUnit::footprint(1, rotations), Some(footprint));

        let mut nvm = MockNvm::new(footprint.max(16));
        let mut unit = WearLevelUnit::open(&mut nvm, 0, 1, rotations, 9).unwrap();
        let counter_end = counter_len;

        for turn in 0..rotations {
            unit.write(&mut nvm, &[turn]).unwrap();
        }

        // R logical writes: each slot byte erase+written exactly once,
        // every counter byte erased exactly once (the single wrap
        // clears the whole region) and the region bit-programmed on
        // the R-1 other advances.
        assert_eq!(
            nvm.writes_in(counter_end..footprint),
            rotations as u32 * 2,
            "R = {rotations}"
        );
        assert_eq!(nvm.writes_in(0..counter_end), 0, "R = {rotations}");
        for address in 0..counter_end {
            assert_eq!(
                nvm.erase_count(address),
                1,
                "R = {rotations}, counter byte {address}"
            );
        }
        assert_eq!(
            nvm.programs_in(0..counter_end),
            rotations as u32 - 1,
            "R = {rotations}"
        );
    }
}

#[test]
fn wear_spreads_evenly_across_slots() {
    init_logs();
    let mut nvm = MockNvm::new(32);
    let mut unit = WearLevelUnit::open(&mut nvm, 0, 1, 5, 9).unwrap();

    let cycles = 7u32;
    for turn in 0..(5 * cycles) {
        unit.write(&mut nvm, &[turn as u8]).unwrap();
    }

    // 35 writes over 5 slots: every slot byte saw exactly 7 erase+write
    // cycles. Without the rotation a single slot would have taken all 35.
    for slot in 0..5u16 {
        let start = 1 + slot * 2;
        assert_eq!(nvm.writes_in(start..start + 2), 2 * cycles, "slot {slot}");
    }
    assert_eq!(nvm.erases_in(0..1), cycles);
}

#[test]
fn counter_garble_recovers_across_widths() {
    init_logs();
    // (data_len, rotations, counter_bytes)
    for (data_len, rotations, counter_bytes) in [(2u8, 3u8, 1u16), (8, 10, 2), (4, 20, 4), (1, 40, 8)] {
        let footprint = WearLevelUnit::footprint(data_len, rotations).unwrap();
        let mut nvm = MockNvm::new(footprint.max(128));

        let mut unit = WearLevelUnit::open(&mut nvm, 0, data_len, rotations, 7).unwrap();
        let payload: Vec<u8> = (0..data_len).collect();
        unit.write(&mut nvm, &payload).unwrap();
        drop(unit);

        // Power loss mid-advance leaves a pattern with interior ones.
        for index in 0..counter_bytes {
            nvm.poke(index, if index % 2 == 0 { 0xA5 } else { 0x5A });
        }

        let unit = WearLevelUnit::open(&mut nvm, 0, data_len, rotations, 7).unwrap();
        for index in 0..counter_bytes {
            assert_eq!(nvm.peek(index), 0xFF, "counter byte {index}");
        }

        // Repaired to slot 0, whose image was never written: the read
        // must fail rather than return the stale slot silently.
        let mut out = vec![0u8; data_len as usize];
        assert_eq!(unit.read(&mut nvm, &mut out), Err(StorageError::CrcMismatch));

        // The unit is fully usable again after repair.
        let mut unit = unit;
        unit.write(&mut nvm, &payload).unwrap();
        unit.read(&mut nvm, &mut out).unwrap();
        assert_eq!(out, payload);
    }
}

#[test]
fn changing_the_key_invalidates_stored_data() {
    init_logs();
    let mut nvm = MockNvm::new(32);
    let mut unit = WearLevelUnit::open(&mut nvm, 0, 1, 3, 1).unwrap();
    unit.write(&mut nvm, &[0x42]).unwrap();

    let reopened = WearLevelUnit::open(&mut nvm, 0, 1, 3, 2).unwrap();
    let mut out = [0u8; 1];
    assert_eq!(reopened.read(&mut nvm, &mut out), Err(StorageError::CrcMismatch));
}

#[test]
fn interleaved_units_do_not_disturb_each_other() {
    init_logs();
    // Two units side by side, exercised unevenly.
    let first_span = WearLevelUnit::footprint(2, 3).unwrap();
    let mut nvm = MockNvm::new(64);
    let mut first = WearLevelUnit::open(&mut nvm, 0, 2, 3, 7).unwrap();
    let mut second = WearLevelUnit::open(&mut nvm, first_span, 4, 5, 11).unwrap();

    for turn in 0u8..9 {
        first.write(&mut nvm, &[turn, turn]).unwrap();
        if turn % 3 == 0 {
            second.write(&mut nvm, &[turn; 4]).unwrap();
        }
    }

    let mut out2 = [0u8; 2];
    first.read(&mut nvm, &mut out2).unwrap();
    assert_eq!(out2, [8, 8]);

    let mut out4 = [0u8; 4];
    second.read(&mut nvm, &mut out4).unwrap();
    assert_eq!(out4, [6; 4]);

    // No write of the first unit ever touched the second's span.
    let second_span = WearLevelUnit::footprint(4, 5).unwrap();
    assert_eq!(
        nvm.writes_in(first_span..first_span + second_span),
        3 * 5,
        "three writes of five bytes each"
    );
}
