#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _mm256_add_epi64, _mm256_add_pd, _mm256_loadu_pd, _mm256_loadu_si256,
    _mm256_mul_pd, _mm256_set_pd, _mm256_setzero_pd, _mm256_setzero_si256, _mm256_storeu_pd,
    _mm256_storeu_si256,
};

/// Sum of an i64 column using AVX2 or scalar fallback
pub fn sum_i64(values: &[i64]) -> i64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_i64_avx2(values) };
        }
    }
    values.iter().copied().sum()
}

/// Sum of an f64 column using AVX2 or scalar fallback
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2(values) };
        }
    }
    values.iter().copied().sum()
}

/// `Σ values[i] * weights[i]` over the common prefix of both columns
pub fn dot_f64_i64(values: &[f64], weights: &[i64]) -> f64 {
    let n = values.len().min(weights.len());
    let (values, weights) = (&values[..n], &weights[..n]);

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { dot_f64_i64_avx2(values, weights) };
        }
    }
    values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| v * w as f64)
        .sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_i64_avx2(values: &[i64]) -> i64 {
    const LANES: usize = 4; // __m256i holds 4 i64s
    let mut sum = _mm256_setzero_si256();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_si256(chunk.as_ptr() as *const __m256i) };
        sum = _mm256_add_epi64(sum, v);
    }

    // horizontal reduction
    let mut sum_arr = [0i64; LANES];
    unsafe { _mm256_storeu_si256(sum_arr.as_mut_ptr() as *mut __m256i, sum) };

    sum_arr.iter().sum::<i64>() + remainder.iter().sum::<i64>()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };

    sum_arr.iter().sum::<f64>() + remainder.iter().sum::<f64>()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dot_f64_i64_avx2(values: &[f64], weights: &[i64]) -> f64 {
    const LANES: usize = 4;
    let mut acc = _mm256_setzero_pd();

    let value_chunks = values.chunks_exact(LANES);
    let weight_chunks = weights.chunks_exact(LANES);
    let value_rem = value_chunks.remainder();
    let weight_rem = weight_chunks.remainder();

    for (v, w) in value_chunks.zip(weight_chunks) {
        let v = unsafe { _mm256_loadu_pd(v.as_ptr()) };
        // no AVX2 i64 -> f64 conversion, widen per lane
        let w = _mm256_set_pd(w[3] as f64, w[2] as f64, w[1] as f64, w[0] as f64);
        acc = _mm256_add_pd(acc, _mm256_mul_pd(v, w));
    }

    let mut acc_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(acc_arr.as_mut_ptr(), acc) };

    let tail: f64 = value_rem
        .iter()
        .zip(weight_rem)
        .map(|(&v, &w)| v * w as f64)
        .sum();
    acc_arr.iter().sum::<f64>() + tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_i64_all_lengths() {
        for n in 0..11 {
            let values: Vec<i64> = (1..=n).collect();
            assert_eq!(sum_i64(&values), n * (n + 1) / 2);
        }
    }

    #[test]
    fn test_sum_f64_matches_scalar() {
        for n in 0..11 {
            let values: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
            let scalar: f64 = values.iter().sum();
            assert!((sum_f64(&values) - scalar).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dot_matches_scalar() {
        let prices = [10.0, 30.0, 2.5, 4.0, 1.25, 8.0, 99.99];
        let sold = [5, 0, 4, 1, 8, 2, 3];
        let expected: f64 = prices.iter().zip(sold).map(|(p, s)| p * s as f64).sum();
        assert!((dot_f64_i64(&prices, &sold) - expected).abs() < 1e-6);
        assert_eq!(dot_f64_i64(&[], &[]), 0.0);
    }
}
