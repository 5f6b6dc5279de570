use clocksyncrs::midi::{MidiError, MidiSink, RealtimeMessage, RecordingSink};
use std::sync::Arc;
use std::thread;

#[test]
fn test_realtime_message_parsing() {
    for msg in [
        RealtimeMessage::TimingClock,
        RealtimeMessage::Start,
        RealtimeMessage::Continue,
        RealtimeMessage::Stop,
        RealtimeMessage::SongPosition(0),
        RealtimeMessage::SongPosition(1234),
    ] {
        assert_eq!(RealtimeMessage::parse(&msg.to_bytes()), Some(msg));
    }

    // Channel messages are not clock traffic
    assert_eq!(RealtimeMessage::parse(&[0x90, 60, 100]), None);
    assert_eq!(RealtimeMessage::parse(&[0xF2, 0x00]), None);
}

#[test]
fn test_midi_error_display() {
    let send_error = MidiError::SendError("Failed to send".to_string());
    let conn_error = MidiError::ConnectionError("Failed to connect".to_string());
    let port_error = MidiError::PortNotFound("IAC".to_string());

    assert_eq!(send_error.to_string(), "MIDI send error: Failed to send");
    assert_eq!(
        conn_error.to_string(),
        "MIDI connection error: Failed to connect"
    );
    assert_eq!(port_error.to_string(), "MIDI output port not found: IAC");
}

#[test]
fn test_send_message_uses_single_byte_for_realtime() {
    let sink = RecordingSink::new();
    sink.send_message(&RealtimeMessage::TimingClock).unwrap();
    sink.send_message(&RealtimeMessage::Stop).unwrap();
    assert_eq!(sink.bytes(), vec![0xF8, 0xFC]);
}

#[test]
fn test_send_bytes_is_not_interleaved() {
    let sink = Arc::new(RecordingSink::new());
    let mut handles = vec![];

    for _ in 0..4 {
        let sink = Arc::clone(&sink);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                sink.send_message(&RealtimeMessage::SongPosition(0x1FF))
                    .unwrap();
                sink.send_byte(0xF8).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every Song Position Pointer is immediately followed by its two data bytes
    let bytes = sink.bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == 0xF2 {
            assert_eq!(&bytes[i + 1..i + 3], &[0x7F, 0x03]);
        }
    }
    assert_eq!(sink.clock_count(), 400);
}

#[test]
fn test_recorded_times_are_ordered() {
    let sink = RecordingSink::new();
    for _ in 0..10 {
        sink.send_byte(0xF8).unwrap();
    }
    let times = sink.clock_times();
    assert_eq!(times.len(), 10);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}
