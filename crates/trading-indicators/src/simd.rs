//! SIMD kernels shared by the indicator library and the model.
//!
//! These use the `wide` crate for portable 4-lane f64 operations and fall
//! back to scalar code for the remainder.

use wide::f64x4;

#[inline]
fn lanes(chunk: &[f64]) -> f64x4 {
    f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]])
}

/// Sum of a slice.
pub fn sum_simd(data: &[f64]) -> f64 {
    let chunks = data.chunks_exact(4);
    let tail: f64 = chunks.remainder().iter().sum();
    let acc = chunks.fold(f64x4::splat(0.0), |acc, c| acc + lanes(c));
    acc.reduce_add() + tail
}

/// Dot product over the common prefix of `a` and `b`.
pub fn dot_product_simd(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);

    let mut acc = f64x4::splat(0.0);
    for (ca, cb) in a.chunks_exact(4).zip(b.chunks_exact(4)) {
        acc += lanes(ca) * lanes(cb);
    }

    let done = len - len % 4;
    let tail: f64 = a[done..].iter().zip(&b[done..]).map(|(x, y)| x * y).sum();
    acc.reduce_add() + tail
}

/// `y += alpha * x` over the common prefix.
pub fn axpy_simd(alpha: f64, x: &[f64], y: &mut [f64]) {
    let len = x.len().min(y.len());
    let scale = f64x4::splat(alpha);
    let done = len - len % 4;

    for (cx, cy) in x[..done].chunks_exact(4).zip(y[..done].chunks_exact_mut(4)) {
        let out = (lanes(cy) + scale * lanes(cx)).to_array();
        cy.copy_from_slice(&out);
    }
    for (xi, yi) in x[done..len].iter().zip(&mut y[done..len]) {
        *yi += alpha * xi;
    }
}

/// Minimum and maximum of a slice; `None` when empty.
pub fn minmax_simd(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }

    let chunks = data.chunks_exact(4);
    let rest = chunks.remainder();
    let (lo, hi) = chunks.fold(
        (f64x4::splat(f64::INFINITY), f64x4::splat(f64::NEG_INFINITY)),
        |(lo, hi), c| {
            let v = lanes(c);
            (lo.min(v), hi.max(v))
        },
    );

    let min = lo
        .to_array()
        .into_iter()
        .chain(rest.iter().copied())
        .fold(f64::INFINITY, f64::min);
    let max = hi
        .to_array()
        .into_iter()
        .chain(rest.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);

    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_simd() {
        let data: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        assert!((sum_simd(&data) - 5050.0).abs() < 1e-10);
        assert_eq!(sum_simd(&[]), 0.0);
        assert!((sum_simd(&[1.5, 2.5, 3.0]) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_dot_product_simd() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![5.0, 6.0, 7.0, 8.0, 2.0];
        // 5 + 12 + 21 + 32 + 10
        assert!((dot_product_simd(&a, &b) - 80.0).abs() < 1e-10);
    }

    #[test]
    fn test_axpy_simd() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut y = vec![1.0; 6];
        axpy_simd(0.5, &x, &mut y);
        assert_eq!(y, vec![1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
    }

    #[test]
    fn test_minmax_simd() {
        let data = vec![5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, -2.0];
        let (min, max) = minmax_simd(&data).unwrap();

        assert!((min + 2.0).abs() < 1e-10);
        assert!((max - 9.0).abs() < 1e-10);
        assert!(minmax_simd(&[]).is_none());
    }
}
