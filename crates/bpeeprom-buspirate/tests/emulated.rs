//! End-to-end tests against the in-memory bridge emulator

use bpeeprom_buspirate::{
    open, BridgeSession, BulkReader, BusPirateError, Config, PageWriter, Timing,
};
use bpeeprom_core::address::MemoryAddress;
use bpeeprom_core::transaction::{Primitive, Transaction};
use bpeeprom_core::transport::Transport;
use bpeeprom_core::Error as CoreError;
use bpeeprom_dummy::{CommittedWrite, EmulatedPirate, EmulatorConfig};

fn config() -> Config {
    Config {
        timing: Timing::immediate(),
        teardown_reset: true,
    }
}

/// Emulator already switched to two-wire mode with power on
fn ready_pirate(emulator: EmulatorConfig) -> EmulatedPirate {
    let mut pirate = EmulatedPirate::new(emulator);
    open(&mut pirate, config()).unwrap();
    pirate.clear_log();
    pirate
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + (i >> 8)) as u8).collect()
}

#[test]
fn test_mode_entry_after_several_resets() {
    let mut pirate = EmulatedPirate::new(EmulatorConfig {
        resets_to_bridge: 5,
        ..EmulatorConfig::default()
    });
    let session = open(&mut pirate, config()).unwrap();
    assert_eq!(session.state(), "Ready");
    drop(session);

    assert!(pirate.in_bus_mode());
    assert!(pirate.is_powered());
    assert_eq!(&pirate.received()[..5], &[0x00; 5]);
}

#[test]
fn test_mode_entry_gives_up() {
    let mut pirate = EmulatedPirate::new(EmulatorConfig {
        resets_to_bridge: 21,
        ..EmulatorConfig::default()
    });
    let err = open(&mut pirate, config()).err().unwrap();
    assert!(matches!(err, BusPirateError::ModeEntry { attempts: 20 }));

    // nothing but resets went out
    assert_eq!(pirate.received(), &[0x00; 20]);
    assert!(pirate.primitives().is_empty());
}

#[test]
fn test_full_device_round_trip() {
    let mut pirate = EmulatedPirate::new_default();
    let data = pattern(65536);

    let mut session = open(&mut pirate, config()).unwrap();
    let report = session.write_pages(&data, MemoryAddress::ZERO).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.pages, 512);
    assert_eq!(report.dropped, 0);

    let back = session.read_bytes(MemoryAddress::ZERO, data.len()).unwrap();
    assert_eq!(back, data);
    session.close().unwrap();

    assert_eq!(pirate.eeprom().memory(), &data[..]);
}

#[test]
fn test_write_across_row_uses_two_transactions() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();

    let report = PageWriter::new(&mut pirate, &timing)
        .write_pages(&[0xAA, 0xBB], MemoryAddress::new(0x00, 0xFF))
        .unwrap();
    assert_eq!(report.pages, 2);
    assert_eq!(report.committed, 2);

    let memory = pirate.eeprom().memory();
    assert_eq!(memory[0x00FF], 0xAA);
    assert_eq!(memory[0x0100], 0xBB);
    assert_eq!(memory[0x0000], 0xFF);
    assert_eq!(
        pirate.eeprom().commits(),
        &[
            CommittedWrite {
                start: 0x00FF,
                len: 1
            },
            CommittedWrite {
                start: 0x0100,
                len: 1
            },
        ]
    );
}

#[test]
fn test_page_write_primitive_order() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();

    PageWriter::new(&mut pirate, &timing)
        .write_pages(&[0x11, 0x22], MemoryAddress::new(0x12, 0x34))
        .unwrap();
    assert_eq!(
        pirate.primitives(),
        &[
            Primitive::Start,
            Primitive::Write(0xA0),
            Primitive::Write(0x12),
            Primitive::Write(0x34),
            Primitive::Write(0x11),
            Primitive::Write(0x22),
            Primitive::Stop,
        ]
    );
}

#[test]
fn test_read_framing() {
    for len in [1usize, 5] {
        let mut pirate = ready_pirate(EmulatorConfig::default());
        pirate.eeprom_mut().memory_mut()[0x0300..0x0305].copy_from_slice(&[1, 2, 3, 4, 5]);
        let timing = Timing::immediate();

        let data = BulkReader::new(&mut pirate, &timing)
            .read_bytes(MemoryAddress::new(0x03, 0x00), len)
            .unwrap();
        assert_eq!(data, &[1, 2, 3, 4, 5][..len]);

        let tx = Transaction::from_primitives(pirate.primitives().iter().copied());
        tx.validate().unwrap();
        assert_eq!(tx.ack_count(), len - 1);
        assert_eq!(tx.nack_count(), 1);
        assert_eq!(tx.read_len(), len);
    }
}

#[test]
fn test_read_with_small_batches() {
    let data = pattern(0x1000 + 1000);
    let mut pirate = EmulatedPirate::with_data(EmulatorConfig::default(), &data);
    open(&mut pirate, config()).unwrap();
    let timing = Timing {
        read_batch: 3,
        ..Timing::immediate()
    };

    let back = BulkReader::new(&mut pirate, &timing)
        .read_bytes(MemoryAddress::new(0x10, 0x00), 1000)
        .unwrap();
    assert_eq!(back, &data[0x1000..]);
}

#[test]
fn test_write_stops_at_end_of_device() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();
    let data = pattern(300);

    let report = PageWriter::new(&mut pirate, &timing)
        .write_pages(&data, MemoryAddress::new(0xFF, 0x00))
        .unwrap();
    assert_eq!(report.committed, 256);
    assert_eq!(report.dropped, 44);
    assert!(!report.is_complete());

    let memory = pirate.eeprom().memory();
    assert_eq!(&memory[0xFF00..], &data[..256]);
    assert!(memory[..44].iter().all(|&b| b == 0xFF));

    let err = report.into_result().unwrap_err();
    assert!(matches!(
        err,
        BusPirateError::AddressSpaceExhausted {
            committed: 256,
            dropped: 44
        }
    ));
}

#[test]
fn test_oversized_source_sends_nothing() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();

    let err = PageWriter::new(&mut pirate, &timing)
        .write_pages(&vec![0u8; 65537], MemoryAddress::ZERO)
        .unwrap_err();
    assert!(matches!(
        err,
        BusPirateError::SourceTooLarge {
            len: 65537,
            capacity: 65536
        }
    ));
    assert!(pirate.received().is_empty());
}

#[test]
fn test_silent_adapter_times_out_read() {
    // 10 bytes for mode entry, 10 for the two address phases, 3 of 8 reads
    let mut pirate = EmulatedPirate::new(EmulatorConfig {
        output_budget: Some(23),
        ..EmulatorConfig::default()
    });
    let mut session = open(&mut pirate, config()).unwrap();

    let err = session.read_bytes(MemoryAddress::ZERO, 4).unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        BusPirateError::Read {
            len: 4,
            source: CoreError::Timeout { expected: 8 },
            ..
        }
    ));
}

#[test]
fn test_silent_adapter_aborts_page_writes() {
    // 10 bytes for mode entry, 264 for the first full page
    let mut pirate = EmulatedPirate::new(EmulatorConfig {
        output_budget: Some(274),
        ..EmulatorConfig::default()
    });
    let mut session = open(&mut pirate, config()).unwrap();
    let data = pattern(129);

    let err = session.write_pages(&data, MemoryAddress::ZERO).unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        BusPirateError::PageWrite {
            chunk: 1,
            address: MemoryAddress { high: 0x00, low: 0x80 },
            committed: 128,
            source: CoreError::Timeout { expected: 1 },
        }
    ));
    drop(session);

    assert_eq!(
        pirate.eeprom().commits(),
        &[CommittedWrite { start: 0, len: 128 }]
    );
}

#[test]
fn test_unpowered_target_commits_nothing() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    pirate.write(&[0x40]).unwrap();
    let mut answer = [0u8; 1];
    pirate.read(&mut answer).unwrap();
    pirate.clear_log();
    let timing = Timing::immediate();

    let err = PageWriter::new(&mut pirate, &timing)
        .write_pages(&[0x5A; 16], MemoryAddress::ZERO)
        .unwrap_err();
    assert!(!err.is_timeout());
    assert!(matches!(
        err,
        BusPirateError::PageWrite {
            chunk: 0,
            committed: 0,
            source: CoreError::WriteNacked { byte: 0xA0 },
            ..
        }
    ));

    // refused at the control byte, then the bus is released
    assert_eq!(
        pirate.primitives(),
        &[Primitive::Start, Primitive::Write(0xA0), Primitive::Stop]
    );
    assert!(pirate.eeprom().commits().is_empty());
    assert_eq!(pirate.eeprom().memory()[0], 0xFF);
}

#[test]
fn test_zero_length_read_is_silent() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();

    let data = BulkReader::new(&mut pirate, &timing)
        .read_bytes(MemoryAddress::new(0x40, 0x00), 0)
        .unwrap();
    assert!(data.is_empty());
    assert!(pirate.received().is_empty());
}

#[test]
fn test_read_past_end_is_refused() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();

    let err = BulkReader::new(&mut pirate, &timing)
        .read_bytes(MemoryAddress::new(0xFF, 0xF0), 32)
        .unwrap_err();
    assert!(matches!(
        err,
        BusPirateError::Core(CoreError::AddressOutOfRange { offset: 0x1000F })
    ));
    assert!(pirate.received().is_empty());
}

#[test]
fn test_huge_read_length_is_refused() {
    let mut pirate = ready_pirate(EmulatorConfig::default());
    let timing = Timing::immediate();

    let err = BulkReader::new(&mut pirate, &timing)
        .read_bytes(MemoryAddress::new(0x00, 0x01), usize::MAX)
        .unwrap_err();
    assert!(matches!(
        err,
        BusPirateError::Core(CoreError::AddressOutOfRange { offset: u32::MAX })
    ));
    assert!(pirate.received().is_empty());
}

#[test]
fn test_close_powers_down_and_resets() {
    let mut pirate = EmulatedPirate::new_default();
    let session = open(&mut pirate, config()).unwrap();
    session.close().unwrap();

    assert!(!pirate.is_powered());
    assert!(pirate.in_terminal());
    assert!(pirate.received().ends_with(&[0x40, 0x00, 0x0F]));
}

#[test]
fn test_close_without_teardown_reset() {
    let mut pirate = EmulatedPirate::new_default();
    let config = Config {
        teardown_reset: false,
        ..config()
    };
    let session = open(&mut pirate, config).unwrap();
    let closed = session.close().unwrap();
    assert_eq!(closed.state(), "Closed");
    let pirate = closed.into_transport();

    assert!(!pirate.is_powered());
    assert!(pirate.in_bus_mode());
    assert_eq!(pirate.received().last(), Some(&0x40));
}

#[test]
fn test_self_test_reports_errors() {
    let mut pirate = EmulatedPirate::new(EmulatorConfig {
        self_test_errors: 2,
        ..EmulatorConfig::default()
    });
    let mut session = BridgeSession::new(&mut pirate, config())
        .enter_bridge_mode()
        .unwrap();
    assert_eq!(session.self_test().unwrap(), 2);

    // still usable afterwards
    let session = session.select_bus_mode().unwrap().power_on().unwrap();
    assert_eq!(session.state(), "Ready");
}

#[test]
fn test_config_from_toml_drives_session() {
    let config = Config::from_toml_str(
        r#"
        teardown_reset = false

        [timing]
        page_settle_ms = 0
        byte_delay_us = 0
        drain_timeout_ms = 0
        entry_attempts = 3
        "#,
    )
    .unwrap();

    let mut pirate = EmulatedPirate::new(EmulatorConfig {
        resets_to_bridge: 4,
        ..EmulatorConfig::default()
    });
    let err = open(&mut pirate, config).err().unwrap();
    assert!(matches!(err, BusPirateError::ModeEntry { attempts: 3 }));
}

#[test]
fn test_reset_after_self_test() {
    let mut pirate = EmulatedPirate::new_default();
    let mut session = BridgeSession::new(&mut pirate, config())
        .enter_bridge_mode()
        .unwrap();
    assert_eq!(session.self_test().unwrap(), 0);
    session.reset().unwrap();

    assert!(pirate.in_terminal());
    assert!(!pirate.is_powered());
    assert_eq!(pirate.received().last(), Some(&0x0F));
}
