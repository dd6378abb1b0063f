/// Stable stand-in for `std::assert_matches::assert_matches`.
#[cfg(test)]
macro_rules! assert_matches {
    ($expression:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {
        match $expression {
            $pattern $(if $guard)? => {}
            ref other => panic!(
                "assertion failed: `{:?}` does not match `{}`",
                other,
                stringify!($pattern $(if $guard)?)
            ),
        }
    };
}

#[cfg(test)]
pub(crate) use assert_matches;
