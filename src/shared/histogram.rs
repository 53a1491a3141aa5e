use colored::Colorize;
use std::fmt;

const WIDTH: u64 = 50;

/// Equal-width histogram over floating point samples.
#[derive(Debug, Clone)]
pub struct Histogram {
    min: f64,
    max: f64,
    counts: Vec<u64>,
}

impl Histogram {
    /// Bucket the finite values. Returns `None` if there are none or `num_buckets` is zero.
    pub fn from_values(values: impl IntoIterator<Item = f64>, num_buckets: usize) -> Option<Self> {
        if num_buckets == 0 {
            return None;
        }
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;

        let mut histogram = Histogram {
            min,
            max,
            counts: vec![0; num_buckets],
        };
        for v in values {
            let i = histogram.bucket_of(v);
            histogram.counts[i] += 1;
        }
        Some(histogram)
    }

    fn bucket_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    fn bucket_of(&self, value: f64) -> usize {
        let width = self.bucket_width();
        if width <= 0.0 {
            return 0;
        }
        let i = ((value - self.min) / width).floor() as usize;
        i.min(self.counts.len() - 1)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Half-open range `[start, end)` of bucket `i`; the last bucket includes `max`.
    pub fn bucket_range(&self, i: usize) -> (f64, f64) {
        let width = self.bucket_width();
        (
            self.min + i as f64 * width,
            self.min + (i + 1) as f64 * width,
        )
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let max_count = self.counts.iter().copied().max().unwrap_or(0);
        let count_per_char = (max_count / WIDTH).max(1);
        let count_width = max_count.to_string().len();

        writeln!(f, "{}", "Histogram:".bold())?;
        writeln!(f, "  Each ∎ is a count of {}", count_per_char)?;

        for (i, count) in self.counts.iter().enumerate() {
            let (start, end) = self.bucket_range(i);
            writeln!(
                f,
                "  {:>12.4} .. {:>12.4} [ {:>count_width$} ]: {}",
                start,
                end,
                count,
                "∎".repeat((count / count_per_char) as usize),
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_land_in_their_buckets() {
        let h = Histogram::from_values([0.0, 0.5, 0.9, 2.5, 3.9, 4.0], 4).unwrap();
        assert_eq!(h.counts(), &[3, 0, 1, 2]);
        assert_eq!(h.bucket_range(1), (1.0, 2.0));
    }

    #[test]
    fn constant_values_use_first_bucket() {
        let h = Histogram::from_values([2.0, 2.0, 2.0], 3).unwrap();
        assert_eq!(h.counts(), &[3, 0, 0]);
    }

    #[test]
    fn nothing_to_plot() {
        assert!(Histogram::from_values([], 10).is_none());
        assert!(Histogram::from_values([f64::NAN], 10).is_none());
        assert!(Histogram::from_values([1.0], 0).is_none());
    }

    #[test]
    fn renders_one_row_per_bucket() {
        let h = Histogram::from_values([0.0, 1.0], 2).unwrap();
        let text = h.to_string();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("∎"));
    }
}
