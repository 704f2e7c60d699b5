//! Distribution statistics over exact decimals
//!
//! Quartiles and fences stay in `Decimal`; dispersion ratios (σ, CV) are
//! inherently real-valued and use `f64`.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// First and third quartiles, linear interpolation between closest ranks.
///
/// Samples smaller than four cannot be characterized and yield `None`.
pub fn quartiles(values: &[Decimal]) -> Option<(Decimal, Decimal)> {
    if values.len() < 4 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    Some((percentile(&sorted, 0.25), percentile(&sorted, 0.75)))
}

fn percentile(sorted: &[Decimal], q: f64) -> Decimal {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = Decimal::from_f64(pos - lower as f64).unwrap_or_default();
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Upper outlier fence `Q3 + multiplier × IQR`
pub fn iqr_upper_fence(values: &[Decimal], multiplier: f64) -> Option<Decimal> {
    let (q1, q3) = quartiles(values)?;
    let multiplier = Decimal::from_f64(multiplier)?;
    Some(q3 + (q3 - q1) * multiplier)
}

/// Mean and population standard deviation
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Coefficient of variation in percent; `None` when the mean is zero
pub fn coefficient_of_variation_pct(values: &[f64]) -> Option<f64> {
    let (mean, std) = mean_std(values)?;
    if mean == 0.0 {
        return None;
    }
    Some(std / mean * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimals(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    #[test]
    fn test_quartiles_interpolate() {
        let values = decimals(&[1, 2, 3, 4]);
        let (q1, q3) = quartiles(&values).unwrap();
        assert_eq!(q1, Decimal::new(175, 2)); // 1.75
        assert_eq!(q3, Decimal::new(325, 2)); // 3.25
    }

    #[test]
    fn test_small_samples_not_characterized() {
        assert!(quartiles(&decimals(&[1, 2, 3])).is_none());
        assert!(iqr_upper_fence(&decimals(&[]), 1.5).is_none());
    }

    #[test]
    fn test_iqr_fence() {
        // Q1 = 2, Q3 = 4, IQR = 2 → fence = 4 + 1.5 × 2 = 7
        let values = decimals(&[1, 2, 2, 3, 4, 4, 5]);
        let fence = iqr_upper_fence(&values, 1.5).unwrap();
        assert_eq!(fence, Decimal::from(7));
    }

    #[test]
    fn test_cv_percent() {
        // Constant sample has zero variation
        assert_eq!(coefficient_of_variation_pct(&[5.0, 5.0, 5.0]), Some(0.0));

        let cv = coefficient_of_variation_pct(&[10.0, 20.0]).unwrap();
        assert!((cv - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_zero_mean_has_no_cv() {
        assert!(coefficient_of_variation_pct(&[-1.0, 1.0]).is_none());
        assert!(coefficient_of_variation_pct(&[]).is_none());
    }
}
