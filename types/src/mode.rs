/// Policy mode selector.
///
/// Every reconciliation pass runs under exactly one mode, chosen from the
/// charging and screen state at the start of the pass. Each mode carries its
/// own seen-timeout and pickup-dismissal policy (see `ModeConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    ScreenOffBattery,
    ScreenOffCharging,
    ScreenOnBattery,
    ScreenOnCharging,
}

impl Mode {
    /// Select the mode for the given charging/screen state.
    pub fn select(charging: bool, screen_on: bool) -> Self {
        match (screen_on, charging) {
            (false, false) => Mode::ScreenOffBattery,
            (false, true) => Mode::ScreenOffCharging,
            (true, false) => Mode::ScreenOnBattery,
            (true, true) => Mode::ScreenOnCharging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_covers_all_combinations() {
        assert_eq!(Mode::select(false, false), Mode::ScreenOffBattery);
        assert_eq!(Mode::select(true, false), Mode::ScreenOffCharging);
        assert_eq!(Mode::select(false, true), Mode::ScreenOnBattery);
        assert_eq!(Mode::select(true, true), Mode::ScreenOnCharging);
    }
}
