//! View identity hashing
//!
//! The hash is the cache key of a view. It depends only on the view's
//! ordinal within its table and on the sorted signature of its columns, so
//! column order and cache lifetime never change it.

use super::catalog::ViewColumn;

/// Compute the identity hash of a view.
///
/// `ordinal` is the 1-based position of the view among its table's views.
pub fn view_identity_hash(ordinal: usize, columns: &[ViewColumn]) -> String {
    let mut signature: Vec<String> = columns.iter().map(ViewColumn::signature).collect();
    signature.sort();

    let input = format!("{}:{}", ordinal, signature.join(":"));
    format!("{:x}", md5::compute(input.as_bytes()))
}
