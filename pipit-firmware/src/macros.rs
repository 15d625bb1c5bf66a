#[allow(unused)]
#[cfg(all(not(test), not(feature = "defmt")))]
mod no_defmt {
    #[macro_export]
    macro_rules! info {
    ($($arg:expr),*) => {{let _ = ($($arg),*);}};
}

    #[macro_export]
    macro_rules! debug {
    ($($arg:expr),*) => {{let _ = ($($arg),*);}};
}

    #[macro_export]
    macro_rules! warn {
    ($($arg:expr),*) => {{let _ = ($($arg),*);}};
}

    #[macro_export]
    macro_rules! error {
    ($($arg:expr),*) => {{let _ = ($($arg),*);}};
}
}

#[cfg(all(not(test), feature = "defmt"))]
mod defmt {
    /// Log debug messages. It will call the [defmt::debug] macro.
    ///
    /// This macro works with either defmt or nothing. When testing on the host Operating system
    /// `eprintln!` will be called. In order to work with both `defmt` and `eprintln` only the debug
    /// syntax can be used; not the [defmt::Formatter] syntax.
    #[macro_export]
    macro_rules! debug {
        ($($arg:expr),*) => {
            defmt::debug!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:expr),*) => {
            defmt::info!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:expr),*) => {
            defmt::warn!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! error {
        ($($arg:expr),*) => {
            defmt::error!($($arg,)*)
        };
    }
}
