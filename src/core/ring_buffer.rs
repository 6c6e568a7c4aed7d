//! Bounded FIFO Ring Buffer dengan Mutex
//!
//! Semua state (storage, write cursor, read cursor, count) dilindungi
//! oleh satu `parking_lot::Mutex`, sehingga setiap operasi atomic terhadap
//! operasi lain pada instance yang sama. Tidak ada alokasi setelah init.
//!
//! Full dan empty bukan error fatal: `push_back` mengembalikan `false`,
//! `pop_front`/`peek` mengembalikan `None`, dan state tidak berubah.

use std::fmt;
use std::iter;
use std::ops::Deref;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use super::error::Full;

/// State yang harus selalu berubah bersamaan
struct State<T> {
    // Pre-allocated slots - panjang == capacity, tidak pernah resize
    slots: Box<[Option<T>]>,
    write_pos: usize,
    read_pos: usize,
    count: usize,
}

impl<T> State<T> {
    #[inline(always)]
    fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    /// Simpan value di tail. Caller sudah memastikan buffer tidak penuh.
    #[inline(always)]
    fn store(&mut self, value: T) {
        let capacity = self.slots.len();
        // Assignment men-drop isi stale (sisa clear) kalau ada
        self.slots[self.write_pos] = Some(value);
        self.write_pos = (self.write_pos + 1) % capacity;
        self.count += 1;
    }
}

/// Fixed-capacity, thread-safe ring buffer
///
/// Share antar thread dengan `Arc<RingBuffer<T>>`. Tidak ada operasi yang
/// menunggu space atau data: buffer penuh/kosong langsung dilaporkan.
///
/// ```
/// use lockring::core::RingBuffer;
///
/// let rb = RingBuffer::new(2);
/// assert!(rb.push_back(1));
/// assert!(rb.push_back(2));
/// assert!(!rb.push_back(3)); // penuh
///
/// assert_eq!(*rb.peek(1).unwrap(), 2);
/// assert_eq!(rb.pop_front(), Some(1));
/// assert_eq!(rb.space(), 1);
/// ```
pub struct RingBuffer<T> {
    state: Mutex<State<T>>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Membuat ring buffer dengan `capacity` slot.
    ///
    /// Capacity 0 diterima: setiap push gagal dan buffer selalu kosong.
    pub fn new(capacity: usize) -> Self {
        let slots: Box<[Option<T>]> = iter::repeat_with(|| None).take(capacity).collect();

        log::trace!("ring buffer created: capacity={}", capacity);

        Self {
            state: Mutex::new(State {
                slots,
                write_pos: 0,
                read_pos: 0,
                count: 0,
            }),
            capacity,
        }
    }

    /// Reset cursor dan count ke 0.
    ///
    /// Isi storage tidak di-drop di sini; value lama tidak bisa dijangkau
    /// lagi dan akan di-drop saat slot-nya ditimpa atau buffer di-drop.
    pub fn clear(&self) {
        let mut state = self.state.lock();

        log::debug!(
            "ring buffer cleared: discarded={} capacity={}",
            state.count,
            self.capacity
        );

        state.write_pos = 0;
        state.read_pos = 0;
        state.count = 0;
    }

    /// Push value ke tail.
    ///
    /// Returns `true` jika berhasil, `false` jika buffer penuh (state tidak berubah).
    #[inline]
    pub fn push_back(&self, value: T) -> bool {
        self.try_push_back(value).is_ok()
    }

    /// Seperti `push_back`, tapi value yang ditolak dikembalikan di dalam error.
    #[inline]
    pub fn try_push_back(&self, value: T) -> Result<(), Full<T>> {
        let mut state = self.state.lock();

        if state.is_full() {
            return Err(Full(value));
        }

        state.store(value);
        Ok(())
    }

    /// Konstruksi elemen langsung di dalam lock.
    ///
    /// `make` hanya dipanggil jika ada slot kosong, jadi tidak ada
    /// konstruksi yang terbuang saat buffer penuh.
    #[inline]
    pub fn emplace_back<F>(&self, make: F) -> bool
    where
        F: FnOnce() -> T,
    {
        let mut state = self.state.lock();

        if state.is_full() {
            return false;
        }

        state.store(make());
        true
    }

    /// Pop elemen terlama dari head.
    ///
    /// Returns `Some(T)` (ownership pindah ke caller), atau `None` jika kosong.
    #[inline]
    pub fn pop_front(&self) -> Option<T> {
        let mut state = self.state.lock();

        if state.count == 0 {
            return None;
        }

        let read_pos = state.read_pos;
        let value = state.slots[read_pos].take();
        debug_assert!(value.is_some(), "live slot {} is empty", read_pos);

        state.read_pos = (read_pos + 1) % self.capacity;
        state.count -= 1;

        value
    }

    /// Lihat elemen ke-`index` dari head tanpa menghapusnya.
    ///
    /// `index == 0` adalah elemen yang akan dikembalikan `pop_front` berikutnya.
    /// Returns `None` jika buffer kosong atau `index >= count()`.
    ///
    /// `Peek` yang dikembalikan MEMEGANG lock buffer: push/pop/clear dari
    /// thread lain menunggu sampai guard di-drop. Jangan panggil method lain
    /// pada buffer yang sama dari thread yang sama selama guard masih hidup
    /// (lock tidak re-entrant, akan deadlock).
    pub fn peek(&self, index: usize) -> Option<Peek<'_, T>> {
        let state = self.state.lock();

        if state.count == 0 || index >= state.count {
            return None;
        }

        let slot = (state.read_pos + index) % self.capacity;

        MutexGuard::try_map(state, |state| state.slots[slot].as_mut())
            .ok()
            .map(|guard| Peek { guard })
    }

    /// Copy elemen ke-`index` dan langsung lepas lock
    pub fn peek_cloned(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.peek(index).map(|elem| (*elem).clone())
    }

    /// Jumlah elemen dalam buffer
    #[inline]
    pub fn count(&self) -> usize {
        self.state.lock().count
    }

    /// Jumlah slot kosong (`capacity - count`)
    #[inline]
    pub fn space(&self) -> usize {
        self.capacity - self.state.lock().count
    }

    /// Cek apakah buffer kosong
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.lock().count == 0
    }

    /// Cek apakah buffer penuh
    #[inline]
    pub fn is_full(&self) -> bool {
        self.state.lock().is_full()
    }

    /// Kapasitas buffer (tetap sejak konstruksi)
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.state.lock().count;
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("count", &count)
            .finish()
    }
}

/// Read-only view ke satu elemen, hasil dari `RingBuffer::peek`.
///
/// Selama guard ini hidup, lock buffer tetap dipegang.
pub struct Peek<'a, T> {
    guard: MappedMutexGuard<'a, T>,
}

impl<T> Deref for Peek<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T: fmt::Debug> fmt::Debug for Peek<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
