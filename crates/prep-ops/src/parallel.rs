//! Row-parallel helpers using Rayon.
//!
//! The resize passes are written against [`for_each_row`]; with the
//! `parallel` feature the rows are distributed over the Rayon pool.
//!
//! # Example
//!
//! ```rust
//! use prep_ops::parallel::for_each_row;
//!
//! let mut buf = vec![0.0f32; 4 * 3];
//! for_each_row(&mut buf, 4, |y, row| row.fill(y as f32));
//! assert_eq!(&buf[8..12], &[2.0; 4]);
//! ```

use rayon::prelude::*;

/// Calls `f(y, row)` for every `row_len`-sized row of `dst`, in parallel.
pub fn for_each_row<F>(dst: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }
    dst.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Calls `f(pixel)` for every `channels`-sized pixel of `data`, in parallel.
pub fn for_each_pixel<F>(data: &mut [f32], channels: usize, f: F)
where
    F: Fn(&mut [f32]) + Send + Sync,
{
    if channels == 0 {
        return;
    }
    data.par_chunks_exact_mut(channels).for_each(f);
}
