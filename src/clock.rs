//! Wall clock collaborator used for writing the time to the panel.

/// Local time of day, as shown on the panel.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash, Default)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Source of the current local time.
///
/// `now` is called while building a bus response and must not block.
/// Returns `None` while the time isn't known yet, e.g. before the first sync.
pub trait TimeSource {
    fn now(&self) -> Option<LocalTime>;
}

impl<F> TimeSource for F
where
    F: Fn() -> Option<LocalTime>,
{
    fn now(&self) -> Option<LocalTime> {
        self()
    }
}
