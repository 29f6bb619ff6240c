//! Logging macros that forward to `defmt` on hardware.
//!
//! On `host` builds the arguments are still type-checked (and count as used) but nothing is
//! emitted, so the receiver core links without a `defmt` global logger.

macro_rules! door_info {
    ($($arg:tt)*) => {{
        #[cfg(not(feature = "host"))]
        defmt::info!($($arg)*);
        #[cfg(feature = "host")]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! door_debug {
    ($($arg:tt)*) => {{
        #[cfg(not(feature = "host"))]
        defmt::debug!($($arg)*);
        #[cfg(feature = "host")]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! door_warn {
    ($($arg:tt)*) => {{
        #[cfg(not(feature = "host"))]
        defmt::warn!($($arg)*);
        #[cfg(feature = "host")]
        let _ = ::core::format_args!($($arg)*);
    }};
}

pub(crate) use {door_debug, door_info, door_warn};
