//! Assertions grouped by how expensive they are to check.
//!
//! Only `simple` assertions run in release builds; tests and the `debug-checks` feature also run
//! the `moderate` and `advanced` ones. `extreme` assertions re-derive whole data structures and
//! are only enabled by editing [`PUMPKIN_ASSERT_LEVEL_DEFINITION`].
#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const PUMPKIN_ASSERT_LEVEL_DEFINITION: u8 = PUMPKIN_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const PUMPKIN_ASSERT_LEVEL_DEFINITION: u8 = PUMPKIN_ASSERT_ADVANCED;

pub const PUMPKIN_ASSERT_SIMPLE: u8 = 1;
pub const PUMPKIN_ASSERT_MODERATE: u8 = 2;
pub const PUMPKIN_ASSERT_ADVANCED: u8 = 3;
pub const PUMPKIN_ASSERT_EXTREME: u8 = 4;

/// Whether assertions of the given level are checked.
pub const fn is_checked(level: u8) -> bool {
    PUMPKIN_ASSERT_LEVEL_DEFINITION >= level
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_simple {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_SIMPLE) {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_SIMPLE) {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_ne_simple {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_SIMPLE) {
            assert_ne!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_MODERATE) {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_eq_moderate {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_MODERATE) {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_ADVANCED) {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! pumpkin_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::pumpkin_asserts::is_checked($crate::pumpkin_asserts::PUMPKIN_ASSERT_EXTREME) {
            assert!($($arg)*);
        }
    };
}
