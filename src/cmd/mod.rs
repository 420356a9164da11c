//! Client commands evaluated against a [`Store`](crate::store::Store).
//!
//! Arguments exclude the command name itself: `xadd(&store, &["mystream",
//! "*", "field", "value"])`.

mod xadd;
mod xrange;

pub use xadd::{xadd, TrimStrategy, XaddOptions};
pub use xrange::{xrange, StreamEntry};

/// ASCII case-insensitive keyword match.
fn is_keyword(arg: &str, keyword: &str) -> bool {
    arg.eq_ignore_ascii_case(keyword)
}
