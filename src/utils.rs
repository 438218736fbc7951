//! # Library-Internal Utilities

/// Computes `ceil(sqrt(number))` on integers
#[cfg_attr(feature = "internals", visibility::make(pub))]
#[cfg_attr(docsrs, doc(cfg(feature = "internals")))]
#[must_use]
pub(crate) fn ceil_sqrt(number: usize) -> usize {
    if number <= 1 {
        return number;
    }
    // Newton iteration for floor(sqrt), starting above the root
    let mut x = number;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + number / x) / 2;
    }
    if x * x == number {
        x
    } else {
        x + 1
    }
}

/// Pattern matches an option that is known to be `Some`
macro_rules! unreachable_none {
    ($opt:expr) => {{
        if let Some(val) = $opt {
            val
        } else {
            unreachable!()
        }
    }};
}
pub(crate) use unreachable_none;
