//! Analysis window functions.

use ndarray::Array1;
use num::{traits::FloatConst, Float};
use serde::{Deserialize, Serialize};


#[allow(clippy::len_without_is_empty)]
pub trait WindowFunction<T> {
    fn len(&self) -> usize;
    fn coef(&self, index: usize) -> T;

    fn to_array(&self) -> Array1<T> {
        Array1::from_shape_fn(self.len(), |i| self.coef(i))
    }

    fn with_len(self, len: usize) -> Self
    where
        Self: Sized;
}

#[derive(Debug, Clone)]
pub struct Rectangular<T> {
    len: usize,
    _p: std::marker::PhantomData<*const T>,
}

impl<T> Rectangular<T> {
    pub fn new(len: usize) -> Self {
        Rectangular { len, _p: std::marker::PhantomData }
    }
}

impl<T: Float> WindowFunction<T> for Rectangular<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn coef(&self, _index: usize) -> T {
        T::one()
    }

    fn with_len(self, len: usize) -> Self {
        Rectangular::new(len)
    }
}


#[derive(Debug, Clone)]
pub struct GenericHann<T> {
    len: usize,
    a0: T,
    a1: T,
}

impl<T> GenericHann<T> {
    pub fn new(len: usize, a0: T, a1: T) -> Self {
        GenericHann { len, a0, a1 }
    }
}

impl<T: Float + FloatConst> WindowFunction<T> for GenericHann<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn coef(&self, index: usize) -> T {
        if self.len < 2 {
            return T::one();
        }

        let two_pi = T::from(2.0).unwrap() * T::PI();
        let n = T::from(self.len - 1).unwrap();
        let i = T::from(index).unwrap();

        self.a0 - self.a1 * T::cos(two_pi * i / n)
    }

    fn with_len(self, len: usize) -> Self {
        GenericHann { len, a0: self.a0, a1: self.a1 }
    }
}


pub fn rectangular<T: Float>(len: usize) -> Rectangular<T> {
    Rectangular::new(len)
}

pub fn hann<T: Float>(len: usize) -> GenericHann<T> {
    let a0 = T::from(0.5).unwrap();
    let a1 = T::one() - a0;

    GenericHann::new(len, a0, a1)
}

pub fn hamming<T: Float>(len: usize) -> GenericHann<T> {
    let a0 = T::from(25.0 / 46.0).unwrap();
    let a1 = T::one() - a0;

    GenericHann::new(len, a0, a1)
}


/// Periodic (DFT-even) variant of a symmetric window: the symmetric window
/// of length `len + 1` with its last sample dropped.
#[derive(Debug, Clone)]
pub struct Periodic<W> {
    base: W,
}

impl<W> Periodic<W> {
    pub fn new(base: W) -> Self {
        Periodic { base }
    }

    pub fn into_base(self) -> W {
        self.base
    }
}

impl<W, T> WindowFunction<T> for Periodic<W>
where
    W: WindowFunction<T>,
{
    fn len(&self) -> usize {
        self.base.len() - 1
    }

    fn coef(&self, index: usize) -> T {
        self.base.coef(index)
    }

    fn with_len(self, len: usize) -> Self {
        Periodic::new(self.base.with_len(len + 1))
    }
}

pub fn periodic<W, T>(base: W) -> Periodic<W>
where
    W: WindowFunction<T>,
{
    let len = base.len() + 1;
    Periodic::new(base.with_len(len))
}


#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum WindowType {
    Rectangular,
    Hann,
    Hamming,
}

impl Default for WindowType {
    fn default() -> Self {
        WindowType::Hann
    }
}

impl WindowType {
    pub fn build<'a, T>(self, len: usize, periodic: bool) -> Box<dyn WindowFunction<T> + 'a>
    where
        T: Float + FloatConst + 'a,
    {
        match (self, periodic) {
            (WindowType::Rectangular, _)  => Box::new(rectangular::<T>(len)),
            (WindowType::Hann, false)     => Box::new(hann::<T>(len)),
            (WindowType::Hann, true)      => Box::new(self::periodic::<_, T>(hann::<T>(len))),
            (WindowType::Hamming, false)  => Box::new(hamming::<T>(len)),
            (WindowType::Hamming, true)   => Box::new(self::periodic::<_, T>(hamming::<T>(len))),
        }
    }
}
