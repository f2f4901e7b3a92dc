//! Automatic bimodal thresholding.

/// Compute the Otsu threshold of a set of intensities.
///
/// Pixels `<= t` form the dark class. Returns `None` when the samples are
/// empty or flat: there is no bimodal split to find.
pub fn otsu_threshold(samples: &[u8]) -> Option<u8> {
    let (&first, rest) = samples.split_first()?;
    let mut min_v = first;
    let mut max_v = first;
    for &v in rest {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return None;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return Some(((min_v as u16 + max_v as u16) / 2) as u8);
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = min_v;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    Some(best_t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_samples_have_no_threshold() {
        assert_eq!(otsu_threshold(&[]), None);
        assert_eq!(otsu_threshold(&[90; 16]), None);
    }

    #[test]
    fn two_levels_split_at_midpoint() {
        let mut samples = vec![20u8; 10];
        samples.extend([200u8; 30]);
        assert_eq!(otsu_threshold(&samples), Some(110));
    }

    #[test]
    fn separates_two_clusters() {
        let mut samples = Vec::new();
        for v in [30u8, 32, 35, 38, 40] {
            samples.extend(std::iter::repeat(v).take(20));
        }
        for v in [180u8, 185, 190, 200] {
            samples.extend(std::iter::repeat(v).take(20));
        }
        let t = otsu_threshold(&samples).expect("threshold");
        assert!((40..180).contains(&t), "threshold {t} should split clusters");
    }
}
