//! Ring buffer of recent a posteriori SNR snapshots.

use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix1};
use num::Float;


/// Fixed-capacity history of per-bin SNR vectors.
///
/// Snapshots are written at `cursor`, which wraps around once `capacity`
/// snapshots have been stored. Averages only ever include snapshots that
/// have actually been written.
#[derive(Debug, Clone)]
pub struct SnrHistory<T> {
    data: Array2<T>,        // (capacity, bins)
    cursor: usize,
    len: usize,
}

impl<T: Float> SnrHistory<T> {
    pub fn new(capacity: usize, bins: usize) -> Self {
        assert!(capacity > 0, "history must hold at least one snapshot");

        SnrHistory {
            data: Array2::zeros((capacity, bins)),
            cursor: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_bins(&self) -> usize {
        self.data.ncols()
    }

    /// Slot the next snapshot is written to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of valid snapshots, saturating at the capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push<D>(&mut self, snapshot: &ArrayBase<D, Ix1>)
    where
        D: Data<Elem = T>,
    {
        self.data.row_mut(self.cursor).assign(snapshot);

        self.cursor = (self.cursor + 1) % self.capacity();
        self.len = (self.len + 1).min(self.capacity());
    }

    /// Per-bin mean over all valid snapshots, zero if the history is empty.
    pub fn mean(&self) -> Array1<T> {
        let mut out = Array1::zeros(self.num_bins());
        self.mean_into(&mut out);
        out
    }

    /// Per-bin mean over all valid snapshots.
    ///
    /// Leaves `out` untouched if nothing has been pushed yet.
    pub fn mean_into<D>(&self, out: &mut ArrayBase<D, Ix1>)
    where
        D: DataMut<Elem = T>,
    {
        if self.len == 0 {
            return;
        }

        // until the first wrap-around, snapshots occupy slots 0..len
        let norm = T::one() / T::from(self.len).unwrap();
        out.assign(&self.data.slice(s![..self.len, ..]).sum_axis(Axis(0)));
        out.mapv_inplace(|v| v * norm);
    }
}
