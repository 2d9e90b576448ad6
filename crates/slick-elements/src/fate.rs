//! Fate flags
//!
//! An element may be eligible for several weathering processes at once.
//! Weatherers select their subset with `contains` tests on these bits.

bitflags::bitflags! {
    /// Weathering processes an element is eligible for
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Fate: u8 {
        const NON_WEATHERING = 1 << 0;
        const SURFACE_WEATHERING = 1 << 1;
        const SUBSURFACE_WEATHERING = 1 << 2;
        const SKIM = 1 << 3;
        const BURN = 1 << 4;
        const DISPERSE = 1 << 5;
    }
}

impl Fate {
    /// Bits claimed by cleanup operations; an element belongs to at most one of them
    pub const CLEANUP: Fate = Fate::SKIM.union(Fate::BURN).union(Fate::DISPERSE);
}
