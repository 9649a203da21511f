/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Fixed-size vertex bitmap with word-granular scan primitives.
//!
//! Plain `set`/`clear`/`get` are for single-threaded (or externally
//! synchronized) use. [`Bitmap::set_atomic`] is the one operation safe to
//! call concurrently from within a `process` closure, via compare-and-swap
//! on the containing word — the engine itself never writes to a caller's
//! bitmap, so this is purely for application code (e.g. BFS marking
//! `active_out`).

use std::sync::atomic::{AtomicU64, Ordering};

const BITS_PER_WORD: u64 = 64;

#[inline(always)]
fn word_offset(v: u64) -> usize {
    (v / BITS_PER_WORD) as usize
}

#[inline(always)]
fn bit_offset(v: u64) -> u32 {
    (v % BITS_PER_WORD) as u32
}

/// A dense bit vector of `len` bits, stored as 64-bit words.
pub struct Bitmap {
    words: Vec<AtomicU64>,
    len: u64,
}

impl Bitmap {
    /// Allocate a bitmap covering `[0, len)`, all bits clear.
    pub fn new(len: u64) -> Self {
        let num_words = (len as usize).div_ceil(BITS_PER_WORD as usize).max(1);
        Self {
            words: (0..num_words).map(|_| AtomicU64::new(0)).collect(),
            len,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, v: u64) -> bool {
        debug_assert!(v < self.len);
        let word = self.words[word_offset(v)].load(Ordering::Relaxed);
        (word >> bit_offset(v)) & 1 != 0
    }

    #[inline]
    pub fn set(&self, v: u64) {
        debug_assert!(v < self.len);
        let idx = word_offset(v);
        let mask = 1u64 << bit_offset(v);
        self.words[idx].fetch_or(mask, Ordering::Relaxed);
    }

    #[inline]
    pub fn clear(&self, v: u64) {
        debug_assert!(v < self.len);
        let idx = word_offset(v);
        let mask = !(1u64 << bit_offset(v));
        self.words[idx].fetch_and(mask, Ordering::Relaxed);
    }

    pub fn clear_all(&self) {
        for w in &self.words {
            w.store(0, Ordering::Relaxed);
        }
    }

    /// Set a bit using compare-and-swap on the containing word. Safe to
    /// call from multiple threads concurrently on the same bitmap.
    #[inline]
    pub fn set_atomic(&self, v: u64) {
        debug_assert!(v < self.len);
        let idx = word_offset(v);
        let mask = 1u64 << bit_offset(v);
        let mut current = self.words[idx].load(Ordering::Relaxed);
        loop {
            if current & mask != 0 {
                return;
            }
            match self.words[idx].compare_exchange_weak(
                current,
                current | mask,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    /// Raw word at the given word index, for fast shard-skip scanning.
    #[inline]
    pub fn word(&self, word_idx: usize) -> u64 {
        self.words[word_idx].load(Ordering::Relaxed)
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Number of set bits. Not used on the hot path; handy for tests and diagnostics.
    pub fn popcount(&self) -> u64 {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as u64)
            .sum()
    }

    /// `true` iff any word covering `[begin, end)` is nonzero.
    pub fn any_set_in_range(&self, begin: u64, end: u64) -> bool {
        if begin >= end {
            return false;
        }
        let mut v = begin;
        while v < end {
            let w = word_offset(v);
            if self.word(w) != 0 {
                return true;
            }
            v = ((w as u64) + 1) * BITS_PER_WORD;
        }
        false
    }

    /// Iterate `v ∈ [begin, end)` calling `f(v)` for every set bit, skipping
    /// whole zero words in one step.
    pub fn for_each_set_in_range(&self, begin: u64, end: u64, mut f: impl FnMut(u64)) {
        let mut i = begin;
        while i < end {
            let w = word_offset(i);
            let mut word = self.word(w) >> bit_offset(i);
            if word == 0 {
                i = ((w as u64) + 1) * BITS_PER_WORD;
                continue;
            }
            let mut j = bit_offset(i);
            while word != 0 {
                if word & 1 != 0 {
                    f(i);
                }
                i += 1;
                j += 1;
                word >>= 1;
                if i == end {
                    return;
                }
            }
            i += BITS_PER_WORD - j as u64;
        }
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("len", &self.len)
            .field("popcount", &self.popcount())
            .finish()
    }
}
