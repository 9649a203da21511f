/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Lock-free `*target += delta`, integer types via a plain atomic
//! `fetch_add`, `f64` via a compare-and-swap retry loop.
//!
//! Generalizes the per-label `AtomicUsize::fetch_add`/`fetch_sub` volume
//! bookkeeping in `algo/src/llp/label_store.rs` from one hardcoded integer
//! counter into a trait over `u64`/`i64`/`f64`; `f64` has no native atomic
//! add, so it CAS-retries on `to_bits`/`from_bits` instead.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A value that can be folded into a shared location without locking.
///
/// `Add` drives purely local, single-threaded folding inside one worker;
/// `atomic_add_into` is reserved for the one merge into shared state each
/// worker performs when it exits.
pub trait Accumulate: Copy + Default + std::ops::Add<Output = Self> {
    type Atomic: Default;

    fn atomic_add_into(target: &Self::Atomic, delta: Self);
    fn load(target: &Self::Atomic) -> Self;
}

impl Accumulate for u64 {
    type Atomic = AtomicU64;

    fn atomic_add_into(target: &Self::Atomic, delta: Self) {
        target.fetch_add(delta, Ordering::Relaxed);
    }

    fn load(target: &Self::Atomic) -> Self {
        target.load(Ordering::Relaxed)
    }
}

impl Accumulate for i64 {
    type Atomic = AtomicI64;

    fn atomic_add_into(target: &Self::Atomic, delta: Self) {
        target.fetch_add(delta, Ordering::Relaxed);
    }

    fn load(target: &Self::Atomic) -> Self {
        target.load(Ordering::Relaxed)
    }
}

/// Atomic `f64` accumulator, CAS-on-bit-pattern since there is no
/// hardware atomic float.
#[derive(Default)]
pub struct AtomicF64(AtomicU64);

impl Accumulate for f64 {
    type Atomic = AtomicF64;

    fn atomic_add_into(target: &Self::Atomic, delta: Self) {
        let mut current = target.0.load(Ordering::Relaxed);
        loop {
            let new = f64::from_bits(current) + delta;
            match target.0.compare_exchange_weak(
                current,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    fn load(target: &Self::Atomic) -> Self {
        f64::from_bits(target.0.load(Ordering::Relaxed))
    }
}
