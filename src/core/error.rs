use std::fmt;

use thiserror::Error;

/// Dikembalikan oleh `try_push_back` saat buffer penuh.
///
/// Membawa kembali value yang ditolak, sehingga tipe move-only
/// tidak hilang ketika push gagal.
#[derive(Error, PartialEq, Eq)]
#[error("ring buffer is full")]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Ambil kembali value yang gagal di-push
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl: tidak butuh `T: Debug`
impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Full").finish_non_exhaustive()
    }
}
