//! lockring - Fixed-Capacity Thread-Safe Ring Buffer
//!
//! Arsitektur:
//! - Pre-allocated: Storage dialokasikan sekali saat konstruksi
//! - Mutex-guarded: Semua state dilindungi satu lock
//! - O(1): Tidak ada shift atau scan elemen

pub mod core;
