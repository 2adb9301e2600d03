//! Bitmask selecting which [`super::ray::Ray`] fields a tracer records.
//!
//! Bit layout matches `original_source/.../Trace/RayAttrMask.h`'s
//! X-macro exactly, including the three aggregate groups it defines
//! for convenience (`Position`, `Direction`, `ElectricField`).

// `bitflags`'s `serde` feature implements `Serialize`/`Deserialize`
// generically for every flags type via the `Flags` trait, so this
// doesn't derive them itself (doing so would conflict).
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RayAttrMask: u32 {
        const PATH_ID = 1 << 0;
        const PATH_EVENT_ID = 1 << 1;
        const POSITION_X = 1 << 2;
        const POSITION_Y = 1 << 3;
        const POSITION_Z = 1 << 4;
        const DIRECTION_X = 1 << 5;
        const DIRECTION_Y = 1 << 6;
        const DIRECTION_Z = 1 << 7;
        const ELECTRIC_FIELD_X = 1 << 8;
        const ELECTRIC_FIELD_Y = 1 << 9;
        const ELECTRIC_FIELD_Z = 1 << 10;
        const OPTICAL_PATH_LENGTH = 1 << 11;
        const ENERGY = 1 << 12;
        const ORDER = 1 << 13;
        const OBJECT_ID = 1 << 14;
        const SOURCE_ID = 1 << 15;
        const EVENT_TYPE = 1 << 16;
        const RAND_COUNTER = 1 << 17;

        const POSITION = Self::POSITION_X.bits() | Self::POSITION_Y.bits() | Self::POSITION_Z.bits();
        const DIRECTION = Self::DIRECTION_X.bits() | Self::DIRECTION_Y.bits() | Self::DIRECTION_Z.bits();
        const ELECTRIC_FIELD =
            Self::ELECTRIC_FIELD_X.bits() | Self::ELECTRIC_FIELD_Y.bits() | Self::ELECTRIC_FIELD_Z.bits();
    }
}

impl RayAttrMask {
    pub const NONE: RayAttrMask = RayAttrMask::empty();
    pub const ALL: RayAttrMask = RayAttrMask::all();
}

impl Default for RayAttrMask {
    fn default() -> Self {
        RayAttrMask::ALL
    }
}
