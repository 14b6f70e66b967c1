//! Positional bind-parameter tokens

use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::sync::OnceLock;

/// Number of `$n` tokens built up front; larger positions are formatted on demand.
pub const PRECOMPUTED_PLACEHOLDERS: usize = 65_536;

static DOLLAR_TOKENS: OnceLock<Vec<String>> = OnceLock::new();

/// `$n` token for a 1-based position
pub fn dollar_placeholder(position: NonZeroUsize) -> Cow<'static, str> {
    let tokens = DOLLAR_TOKENS.get_or_init(|| {
        (1..=PRECOMPUTED_PLACEHOLDERS)
            .map(|i| format!("${}", i))
            .collect()
    });

    match tokens.get(position.get() - 1) {
        Some(token) => Cow::Borrowed(token.as_str()),
        None => Cow::Owned(format!("${}", position)),
    }
}
