//=========================================================================
// Mask
//=========================================================================
//
// Bit set used both as a command's dispatch mask and an entity's type mask.
//
// Bit meanings are defined entirely by the application, so every bit is
// declared as an external flag.
//
//=========================================================================

//=== External Dependencies ===============================================

use bitflags::bitflags;

//=== Mask ================================================================

bitflags! {
    /// Category bit set.
    ///
    /// A command reaches an entity when the command's dispatch mask and the
    /// entity's type mask share at least one bit.
    ///
    /// ```
    /// # use tantech_core::prelude::*;
    /// const DOOR: Mask = Mask::bit(0);
    /// const PLAYER: Mask = Mask::bit(1);
    ///
    /// assert!((DOOR | PLAYER).intersects(DOOR));
    /// assert!(!DOOR.intersects(PLAYER));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    pub struct Mask: u32 {
        const _ = !0;
    }
}

impl Mask {
    /// Mask with no bits set. Never intersects anything.
    pub const NONE: Mask = Mask::empty();

    /// Mask with every bit set.
    pub const ALL: Mask = Mask::from_bits_retain(u32::MAX);

    /// Creates a mask with only bit `index` set.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 32`.
    #[inline]
    pub const fn bit(index: u32) -> Self {
        assert!(index < u32::BITS, "Mask bit index out of range");
        Self::from_bits_retain(1 << index)
    }
}

impl From<u32> for Mask {
    fn from(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
