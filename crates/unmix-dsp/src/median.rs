//! Median filtering of magnitude spectrograms
//!
//! Windows extend past the edges by half-sample symmetric reflection
//! (`d c b a | a b c d | d c b a`). For even kernels the element of rank
//! `kernel / 2` is taken.

use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis, Zip};

/// Median over frames (axis 1) for every frequency bin
pub fn median_filter_time(input: &Array2<f64>, kernel: usize) -> Array2<f64> {
    filter_along(input, Axis(1), kernel)
}

/// Median over bins (axis 0) for every frame
pub fn median_filter_freq(input: &Array2<f64>, kernel: usize) -> Array2<f64> {
    filter_along(input, Axis(0), kernel)
}

fn filter_along(input: &Array2<f64>, axis: Axis, kernel: usize) -> Array2<f64> {
    let mut output = Array2::zeros(input.raw_dim());
    if kernel <= 1 || input.is_empty() {
        output.assign(input);
        return output;
    }

    let mut window = vec![0.0; kernel];
    Zip::from(input.lanes(axis))
        .and(output.lanes_mut(axis))
        .for_each(|lane, out| median_lane(lane, out, kernel, &mut window));
    output
}

fn median_lane(lane: ArrayView1<f64>, mut out: ArrayViewMut1<f64>, kernel: usize, window: &mut [f64]) {
    let n = lane.len();
    let before = (kernel / 2) as isize;
    let rank = kernel / 2;

    for (i, dst) in out.iter_mut().enumerate() {
        let start = i as isize - before;
        for (k, slot) in window.iter_mut().enumerate() {
            *slot = lane[reflect(start + k as isize, n)];
        }
        let (_, median, _) = window.select_nth_unstable_by(rank, f64::total_cmp);
        *dst = *median;
    }
}

/// Half-sample symmetric index into `0..n`
#[inline]
fn reflect(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = index.rem_euclid(period) as usize;
    if m < n { m } else { 2 * n - 1 - m }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reflect() {
        let idx: Vec<usize> = (-3..7).map(|i| reflect(i, 4)).collect();
        assert_eq!(idx, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);
        // Kernel wider than the lane still stays in range
        assert_eq!(reflect(-5, 1), 0);
        assert_eq!(reflect(9, 2), 1);
    }

    #[test]
    fn test_time_median_removes_clicks() {
        let input = array![[1.0, 1.0, 9.0, 1.0, 1.0], [0.0, 5.0, 5.0, 5.0, 0.0]];
        let out = median_filter_time(&input, 3);
        assert_eq!(out.row(0).to_vec(), vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out.row(1).to_vec(), vec![0.0, 5.0, 5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_freq_median_acts_on_columns() {
        let input = array![[1.0, 0.0], [9.0, 0.0], [1.0, 4.0]];
        let out = median_filter_freq(&input, 3);
        assert_eq!(out.column(0).to_vec(), vec![1.0, 1.0, 1.0]);
        // Edge reflection duplicates the boundary sample
        assert_eq!(out.column(1).to_vec(), vec![0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_trivial_kernel() {
        let input = array![[3.0, 1.0, 2.0]];
        assert_eq!(median_filter_time(&input, 1), input);
    }
}
