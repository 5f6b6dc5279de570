use dialoguer::console::Key;

pub const BPM_STEP: f64 = 1.0;

/// Actions the keyboard can trigger on the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockCommand {
    Toggle,
    NudgeBpm(f64),
    ResetBpm,
    Quit,
}

pub fn map_key(key: &Key) -> Option<ClockCommand> {
    match key {
        Key::Char(' ') => Some(ClockCommand::Toggle),
        Key::Char('+') | Key::Char('=') => Some(ClockCommand::NudgeBpm(BPM_STEP)),
        Key::Char('-') | Key::Char('_') => Some(ClockCommand::NudgeBpm(-BPM_STEP)),
        Key::Backspace => Some(ClockCommand::ResetBpm),
        Key::Char('q') | Key::Char('Q') | Key::Escape => Some(ClockCommand::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_maps_to_toggle() {
        assert_eq!(map_key(&Key::Char(' ')), Some(ClockCommand::Toggle));
    }

    #[test]
    fn test_plus_and_minus_nudge_bpm() {
        assert_eq!(map_key(&Key::Char('+')), Some(ClockCommand::NudgeBpm(1.0)));
        assert_eq!(map_key(&Key::Char('-')), Some(ClockCommand::NudgeBpm(-1.0)));
    }

    #[test]
    fn test_backspace_resets_bpm() {
        assert_eq!(map_key(&Key::Backspace), Some(ClockCommand::ResetBpm));
    }

    #[test]
    fn test_other_key_returns_none() {
        assert!(map_key(&Key::Char('x')).is_none());
        assert!(map_key(&Key::Enter).is_none());
    }
}
