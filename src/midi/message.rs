//! MIDI real-time and system-common messages produced by the clock.

pub const TIMING_CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;
pub const CONTINUE: u8 = 0xFB;
pub const STOP: u8 = 0xFC;
pub const SONG_POSITION_POINTER: u8 = 0xF2;

/// Largest position a Song Position Pointer can carry (14 bits).
pub const MAX_SONG_POSITION: u16 = 0x3FFF;

/// Represents a message the clock engine sends to its sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeMessage {
    /// Timing Clock pulse, 24 per quarter note
    TimingClock,
    /// Start playback from the current song position
    Start,
    /// Continue playback without resetting position
    Continue,
    /// Stop playback
    Stop,
    /// Song Position Pointer in 16th notes
    SongPosition(u16),
}

impl RealtimeMessage {
    /// Encodes the message as raw MIDI bytes.
    ///
    /// Song positions above [`MAX_SONG_POSITION`] are masked to 14 bits.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RealtimeMessage::TimingClock => vec![TIMING_CLOCK],
            RealtimeMessage::Start => vec![START],
            RealtimeMessage::Continue => vec![CONTINUE],
            RealtimeMessage::Stop => vec![STOP],
            RealtimeMessage::SongPosition(position) => {
                let position = position & MAX_SONG_POSITION;
                vec![
                    SONG_POSITION_POINTER,
                    (position & 0x7F) as u8,
                    ((position >> 7) & 0x7F) as u8,
                ]
            }
        }
    }

    pub fn parse(data: &[u8]) -> Option<RealtimeMessage> {
        match data {
            [TIMING_CLOCK] => Some(RealtimeMessage::TimingClock),
            [START] => Some(RealtimeMessage::Start),
            [CONTINUE] => Some(RealtimeMessage::Continue),
            [STOP] => Some(RealtimeMessage::Stop),
            [SONG_POSITION_POINTER, lsb, msb] if lsb & 0x80 == 0 && msb & 0x80 == 0 => Some(
                RealtimeMessage::SongPosition(u16::from(*lsb) | (u16::from(*msb) << 7)),
            ),
            _ => None,
        }
    }

    /// Returns true for single-byte real-time messages.
    pub fn is_realtime(&self) -> bool {
        !matches!(self, RealtimeMessage::SongPosition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_bytes() {
        assert_eq!(RealtimeMessage::TimingClock.to_bytes(), vec![0xF8]);
        assert_eq!(RealtimeMessage::Start.to_bytes(), vec![0xFA]);
        assert_eq!(RealtimeMessage::Continue.to_bytes(), vec![0xFB]);
        assert_eq!(RealtimeMessage::Stop.to_bytes(), vec![0xFC]);
    }

    #[test]
    fn test_song_position_zero() {
        assert_eq!(
            RealtimeMessage::SongPosition(0).to_bytes(),
            vec![0xF2, 0x00, 0x00]
        );
    }

    #[test]
    fn test_song_position_splits_into_seven_bit_halves() {
        // 200 = 0b1_1001000 -> LSB 0x48, MSB 0x01
        assert_eq!(
            RealtimeMessage::SongPosition(200).to_bytes(),
            vec![0xF2, 0x48, 0x01]
        );
        assert_eq!(
            RealtimeMessage::SongPosition(MAX_SONG_POSITION).to_bytes(),
            vec![0xF2, 0x7F, 0x7F]
        );
    }

    #[test]
    fn test_song_position_is_masked() {
        assert_eq!(
            RealtimeMessage::SongPosition(0x4000).to_bytes(),
            vec![0xF2, 0x00, 0x00]
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            RealtimeMessage::parse(&[0xF8]),
            Some(RealtimeMessage::TimingClock)
        );
        assert_eq!(
            RealtimeMessage::parse(&[0xF2, 0x48, 0x01]),
            Some(RealtimeMessage::SongPosition(200))
        );
        assert_eq!(RealtimeMessage::parse(&[0xF2, 0x80, 0x00]), None);
        assert_eq!(RealtimeMessage::parse(&[0x90, 60, 100]), None);
        assert_eq!(RealtimeMessage::parse(&[]), None);
    }

    #[test]
    fn test_is_realtime() {
        assert!(RealtimeMessage::TimingClock.is_realtime());
        assert!(!RealtimeMessage::SongPosition(0).is_realtime());
    }
}
