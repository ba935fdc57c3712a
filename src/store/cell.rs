//! Lock-free accumulators backing each metric series.
//!
//! Floating-point values are stored as `f64` bit patterns in an
//! `AtomicU64` and updated with compare-and-swap loops, so concurrent
//! increments on one series combine without lost updates.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{CounterFn, GaugeFn, HistogramFn};

/// Atomically apply `f` to an `f64` stored as bits, returning the new value.
fn update_f64(bits: &AtomicU64, f: impl Fn(f64) -> f64) -> f64 {
    let mut current = bits.load(Ordering::Acquire);
    loop {
        let next = f(f64::from_bits(current));
        match bits.compare_exchange_weak(
            current,
            next.to_bits(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

/// Monotonic float counter.
#[derive(Debug, Default)]
pub struct CounterCell {
    bits: AtomicU64,
}

impl CounterCell {
    /// Add a non-negative delta. Callers validate the delta.
    pub fn add(&self, delta: f64) -> f64 {
        update_f64(&self.bits, |v| v + delta)
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl CounterFn for CounterCell {
    fn increment(&self, value: u64) {
        self.add(value as f64);
    }

    fn absolute(&self, value: u64) {
        // Counters never go backwards, even through `absolute`.
        update_f64(&self.bits, |v| v.max(value as f64));
    }
}

/// Last-write-wins float gauge.
#[derive(Debug, Default)]
pub struct GaugeCell {
    bits: AtomicU64,
}

impl GaugeCell {
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    pub fn add(&self, delta: f64) -> f64 {
        update_f64(&self.bits, |v| v + delta)
    }

    /// Raise the gauge to `value` if it is larger; returns the resulting value.
    pub fn raise_to(&self, value: f64) -> f64 {
        update_f64(&self.bits, |v| v.max(value))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl GaugeFn for GaugeCell {
    fn increment(&self, value: f64) {
        self.add(value);
    }

    fn decrement(&self, value: f64) {
        self.add(-value);
    }

    fn set(&self, value: f64) {
        GaugeCell::set(self, value);
    }
}

/// Fixed-bucket histogram with running sum and count.
///
/// `buckets[i]` counts samples `v` with `bounds[i-1] < v <= bounds[i]`;
/// the final slot is the implicit `+Inf` bucket.
#[derive(Debug)]
pub struct HistogramCell {
    bounds: Vec<f64>,
    buckets: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl HistogramCell {
    pub fn new(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            buckets: (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect(),
            sum: AtomicU64::new(0f64.to_bits()),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: f64) {
        let idx = self.bounds.partition_point(|bound| *bound < value);
        self.buckets[idx].fetch_add(1, Ordering::AcqRel);
        update_f64(&self.sum, |s| s + value);
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Cumulative counts per finite bound (`le` semantics).
    pub fn cumulative_counts(&self) -> Vec<u64> {
        let mut running = 0;
        self.bounds
            .iter()
            .enumerate()
            .map(|(i, _)| {
                running += self.buckets[i].load(Ordering::Acquire);
                running
            })
            .collect()
    }

    pub fn sum(&self) -> f64 {
        f64::from_bits(self.sum.load(Ordering::Acquire))
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

impl HistogramFn for HistogramCell {
    fn record(&self, value: f64) {
        if value.is_finite() {
            self.observe(value);
        }
    }
}
