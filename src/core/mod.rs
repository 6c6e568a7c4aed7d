//! Core module: Bounded FIFO Ring Buffer
//!
//! Prinsip desain:
//! - Fixed capacity: Tidak ada resize setelah init
//! - Single lock: Cursor, count dan storage berubah sebagai satu unit
//! - Non-blocking: Full/empty langsung dilaporkan ke caller, tidak menunggu

mod error;
mod ring_buffer;

pub use error::Full;
pub use ring_buffer::{Peek, RingBuffer};
