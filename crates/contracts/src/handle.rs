//! SensorHandle - Opaque, generation-checked sensor reference

use std::fmt;

/// Opaque reference to a registered sensor instance.
///
/// A handle pairs a slot index with the generation the slot had when the
/// handle was issued. Slots are reused after a sensor is destroyed, but each
/// reuse bumps the generation, so a stale handle never aliases the new
/// occupant of its slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorHandle {
    index: u32,
    generation: u32,
}

impl SensorHandle {
    /// Assemble a handle from its parts.
    ///
    /// Only registries should call this; anyone else gets a handle that
    /// simply fails to resolve.
    #[inline]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at issue time.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

impl fmt::Debug for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorHandle({}v{})", self.index, self.generation)
    }
}
