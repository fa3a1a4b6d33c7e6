//! Read-back verification

use crate::error::{Error, Result};

/// Compare `expected` against `actual`
///
/// Fails fast with [`Error::LengthMismatch`] when the lengths differ,
/// otherwise reports the first differing index as [`Error::DataMismatch`].
pub fn compare(expected: &[u8], actual: &[u8]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(Error::LengthMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    match expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a)
    {
        Some(index) => Err(Error::DataMismatch {
            index,
            expected: expected[index],
            actual: actual[index],
        }),
        None => Ok(()),
    }
}

/// Count every differing byte of two equally long buffers
pub fn count_mismatches(expected: &[u8], actual: &[u8]) -> usize {
    expected
        .iter()
        .zip(actual)
        .filter(|(e, a)| e != a)
        .count()
}
