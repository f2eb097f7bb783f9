//! Pipelined activation windows

/// Passes (relative to the order start) during which a module runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivationWindow {
    /// First active pass
    pub start: u32,
    /// Number of active passes
    pub len: u32,
}

impl ActivationWindow {
    /// Create a window
    pub const fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// First pass after the window
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.len)
    }

    /// Check if `pass` is inside the window
    pub fn contains(&self, pass: u32) -> bool {
        pass >= self.start && pass < self.end()
    }

    /// Unit index within the window for `pass`
    pub fn unit(&self, pass: u32) -> Option<u32> {
        self.contains(pass).then(|| pass - self.start)
    }

    /// Check if the window has nothing left at or after `pass`
    pub fn is_exhausted(&self, pass: u32) -> bool {
        self.len == 0 || pass >= self.end()
    }
}
