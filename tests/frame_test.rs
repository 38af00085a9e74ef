mod common;

use common::{captures, parse_capture};
use truma_inetbox::frame::{
    checksum, decode_header, decode_record, encode_frame, payload, verify_checksum, FrameError,
    HEADER_LEN,
};
use truma_inetbox::records::{
    AirconManualUpdate, AirconTargets, ClockUpdate, HeaterUpdate, HeatingTargets, TimerSchedule,
    TimerUpdate,
};
use truma_inetbox::{
    AirconMode, ClockMode, EnergyMix, HeatingMode, PowerLevel, TempCode, TimeOfDay,
};

#[test]
fn captures_verify() {
    for capture in captures::ALL.iter() {
        let frame = parse_capture(capture);
        assert!(verify_checksum(&frame), "{}", capture);
        let header = decode_header(&frame).unwrap();
        assert_eq!(header.frame_len(), frame.len());
        assert_eq!(checksum(&frame[10..], 0), 0xFF);
    }
}

#[test]
fn any_single_flip_is_detected() {
    for capture in captures::ALL.iter() {
        let frame = parse_capture(capture);
        for i in HEADER_LEN..frame.len() {
            let mut broken = frame.clone();
            broken[i] ^= 0x01;
            assert_eq!(
                decode_header(&broken).map(|_| ()).map_err(|e| matches!(e, FrameError::ChecksumMismatch { .. })),
                Err(true),
                "{} byte {}",
                capture,
                i
            );
        }
    }
}

#[test]
fn update_frames_verify() {
    let targets = HeatingTargets::new(
        TempCode::room(22.0),
        TempCode::WATER_HIGH,
        HeatingMode::Eco,
        EnergyMix::Mix,
        PowerLevel::W1800,
    );
    let schedule = TimerSchedule {
        active: true,
        start: TimeOfDay::new(21, 15).unwrap(),
        stop: TimeOfDay::new(6, 45).unwrap(),
    };
    let frames = vec![
        encode_frame(0xFA, 1, &HeaterUpdate { targets }).to_vec(),
        encode_frame(0xFA, 2, &TimerUpdate { targets, schedule }).to_vec(),
        encode_frame(
            0xFA,
            3,
            &AirconManualUpdate {
                targets: AirconTargets {
                    mode: AirconMode::Cooling,
                    operation: 0x71,
                    target_temp: TempCode::aircon(18.0).unwrap(),
                    ..AirconTargets::default()
                },
            },
        )
        .to_vec(),
        encode_frame(
            0xFA,
            4,
            &ClockUpdate {
                hour: 23,
                minute: 59,
                second: 59,
                mode: ClockMode::H24,
            },
        )
        .to_vec(),
    ];
    for frame in frames {
        assert!(verify_checksum(&frame));
        for i in HEADER_LEN..frame.len() {
            let mut broken = frame.clone();
            broken[i] ^= 0x01;
            assert!(!verify_checksum(&broken));
        }
    }
}

#[test]
fn timer_update_layout() {
    let update = TimerUpdate {
        targets: HeatingTargets::default(),
        schedule: TimerSchedule {
            active: true,
            start: TimeOfDay::new(21, 15).unwrap(),
            stop: TimeOfDay::new(6, 45).unwrap(),
        },
    };
    let frame = encode_frame(0xFA, 0, &update);
    let header = decode_header(&frame).unwrap();
    assert_eq!((header.message_type, header.message_length), (0x3C, 17));
    // active, then minutes before hours
    assert_eq!(&payload(&frame, &header)[12..], &[0x01, 15, 21, 45, 6]);
    assert_eq!(decode_record::<TimerUpdate>(payload(&frame, &header)), Ok(update));
}

#[test]
fn record_length_must_match() {
    let frame = parse_capture(captures::CLOCK);
    let header = decode_header(&frame).unwrap();
    assert_eq!(
        decode_record::<HeaterUpdate>(payload(&frame, &header)),
        Err(FrameError::LengthMismatch {
            expected: 12,
            actual: 10
        })
    );
}
