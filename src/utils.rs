use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::error::{IndexError, Result};

/// Suffix appended to a source path to derive its index path
pub const INDEX_SUFFIX: &str = ".idx";

/// Derives the index path for a source file by appending [`INDEX_SUFFIX`]
///
/// `calls.vcf` becomes `calls.vcf.idx`.
pub fn index_path<P: AsRef<Path>>(source: P) -> PathBuf {
    let mut path = OsString::from(source.as_ref().as_os_str());
    path.push(INDEX_SUFFIX);
    PathBuf::from(path)
}

/// Takes the next `n` bytes of `buffer` starting at `pos`, advancing `pos`
///
/// Fails with [`IndexError::Truncated`] instead of panicking when the buffer is too short.
pub(crate) fn take<'a>(buffer: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8]> {
    let needed = pos.saturating_add(n);
    if needed > buffer.len() {
        return Err(IndexError::Truncated {
            needed,
            available: buffer.len(),
        }
        .into());
    }
    let slice = &buffer[*pos..needed];
    *pos = needed;
    Ok(slice)
}
