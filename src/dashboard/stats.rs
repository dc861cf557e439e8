//! Local Numerics
//!
//! The only statistics computed client-side: group-cap clamping and the
//! min/mean/max line shown under a boxplot.

use serde_json::Value;

/// Group cap used when the control holds no usable number
pub const DEFAULT_GROUP_CAP: u32 = 12;
pub const MIN_GROUP_CAP: u32 = 1;
pub const MAX_GROUP_CAP: u32 = 50;

/// Parse the group-cap control text and clamp it to `1..=50`.
///
/// Accepts integers and decimals (truncated toward zero). Empty or
/// unparseable text yields [`DEFAULT_GROUP_CAP`].
pub fn clamp_group_cap(input: &str) -> u32 {
    let trimmed = input.trim();

    let parsed = trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    });

    match parsed {
        Some(n) => n.clamp(MIN_GROUP_CAP as i64, MAX_GROUP_CAP as i64) as u32,
        None => DEFAULT_GROUP_CAP,
    }
}

/// Coerce a JSON value to a finite number; numeric strings count
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// All numeric entries across groups, in order
pub fn flatten_numeric(values: &[Vec<Value>]) -> Vec<f64> {
    values.iter().flatten().filter_map(numeric_value).collect()
}

/// Min, mean and max of a flattened value set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl SummaryStats {
    /// `None` for an empty set
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Some(Self {
            count: values.len(),
            min,
            mean,
            max,
        })
    }

    /// Display line, two decimals
    pub fn describe(&self) -> String {
        format!(
            "Min: {:.2} · Mean: {:.2} · Max: {:.2}",
            self.min, self.mean, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_group_cap() {
        assert_eq!(clamp_group_cap("100"), 50);
        assert_eq!(clamp_group_cap("0"), 1);
        assert_eq!(clamp_group_cap("-3"), 1);
        assert_eq!(clamp_group_cap(" 20 "), 20);
        assert_eq!(clamp_group_cap("12.9"), 12);
    }

    #[test]
    fn test_clamp_group_cap_defaults() {
        assert_eq!(clamp_group_cap(""), DEFAULT_GROUP_CAP);
        assert_eq!(clamp_group_cap("lots"), DEFAULT_GROUP_CAP);
        assert_eq!(clamp_group_cap("NaN"), DEFAULT_GROUP_CAP);
    }

    #[test]
    fn test_flatten_discards_non_numeric() {
        let values = vec![
            vec![json!(1), json!("2.5"), json!(null)],
            vec![json!("n/a"), json!(true), json!(4)],
        ];
        assert_eq!(flatten_numeric(&values), vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_summary_of_two_groups() {
        let values = vec![
            vec![json!(1), json!(2), json!(3)],
            vec![json!(4), json!(5)],
        ];
        let stats = SummaryStats::from_values(&flatten_numeric(&values)).unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(format!("{:.2}", stats.mean), "3.00");
        assert_eq!(stats.describe(), "Min: 1.00 · Mean: 3.00 · Max: 5.00");
    }

    #[test]
    fn test_summary_empty() {
        assert!(SummaryStats::from_values(&[]).is_none());
    }
}
