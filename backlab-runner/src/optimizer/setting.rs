//! Optimization parameter space.
//!
//! Parameters keep insertion order, so the Cartesian grid and every
//! search built on it enumerate candidates in a reproducible order.

use thiserror::Error;

/// One concrete assignment of every parameter, in declaration order.
/// This canonical form is also the cache key for memoized evaluations.
pub type ParamSet = Vec<(String, f64)>;

/// Errors from parameter-space construction and search setup.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("parameter space is empty")]
    EmptyGrid,

    #[error("no optimization target set")]
    MissingTarget,

    #[error("unknown target metric {0:?}")]
    UnknownMetric(String),

    #[error("invalid range for {name:?}: start {start} must be below end {end}")]
    InvalidRange { name: String, start: f64, end: f64 },

    #[error("invalid step for {name:?}: {step} must be positive")]
    InvalidStep { name: String, step: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct OptimizationSetting {
    params: Vec<(String, Vec<f64>)>,
    target: Option<String>,
}

impl OptimizationSetting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix a parameter to a single value.
    pub fn add_parameter(&mut self, name: &str, value: f64) {
        self.params.push((name.to_owned(), vec![value]));
    }

    /// Sweep a parameter from `start` to `end` inclusive in `step`
    /// increments.
    pub fn add_range(
        &mut self,
        name: &str,
        start: f64,
        end: f64,
        step: f64,
    ) -> Result<(), OptimizeError> {
        if start >= end {
            return Err(OptimizeError::InvalidRange {
                name: name.to_owned(),
                start,
                end,
            });
        }
        if step <= 0.0 {
            return Err(OptimizeError::InvalidStep {
                name: name.to_owned(),
                step,
            });
        }

        let mut values = Vec::new();
        let mut value = start;
        // small tolerance so accumulated float error cannot drop the endpoint
        while value <= end + step * 1e-9 {
            values.push(value);
            value += step;
        }
        self.params.push((name.to_owned(), values));
        Ok(())
    }

    pub fn set_target(&mut self, name: &str) {
        self.target = Some(name.to_owned());
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Per-parameter value grids in declaration order.
    pub fn grids(&self) -> &[(String, Vec<f64>)] {
        &self.params
    }

    /// Cartesian product of all parameter grids, in odometer order with
    /// the last-declared parameter varying fastest.
    pub fn generate_settings(&self) -> Result<Vec<ParamSet>, OptimizeError> {
        if self.params.is_empty() || self.params.iter().any(|(_, v)| v.is_empty()) {
            return Err(OptimizeError::EmptyGrid);
        }

        let mut settings: Vec<ParamSet> = vec![Vec::new()];
        for (name, values) in &self.params {
            let mut next = Vec::with_capacity(settings.len() * values.len());
            for partial in &settings {
                for &value in values {
                    let mut extended = partial.clone();
                    extended.push((name.clone(), value));
                    next.push(extended);
                }
            }
            settings = next;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_includes_both_endpoints() {
        let mut setting = OptimizationSetting::new();
        setting.add_range("window", 10.0, 20.0, 5.0).unwrap();
        let settings = setting.generate_settings().unwrap();
        let values: Vec<f64> = settings.iter().map(|s| s[0].1).collect();
        assert_eq!(values, vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn fractional_step_does_not_drop_endpoint() {
        let mut setting = OptimizationSetting::new();
        setting.add_range("x", 0.0, 0.3, 0.1).unwrap();
        let settings = setting.generate_settings().unwrap();
        assert_eq!(settings.len(), 4);
    }

    #[test]
    fn cartesian_product_in_declaration_order() {
        let mut setting = OptimizationSetting::new();
        setting.add_range("a", 1.0, 2.0, 1.0).unwrap();
        setting.add_parameter("b", 9.0);
        setting.add_range("c", 5.0, 6.0, 1.0).unwrap();

        let settings = setting.generate_settings().unwrap();
        assert_eq!(settings.len(), 4);
        for s in &settings {
            let names: Vec<&str> = s.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["a", "b", "c"]);
        }
        // last parameter varies fastest
        assert_eq!(settings[0][2].1, 5.0);
        assert_eq!(settings[1][2].1, 6.0);
        assert_eq!(settings[2][0].1, 2.0);
    }

    #[test]
    fn invalid_range_and_step_rejected() {
        let mut setting = OptimizationSetting::new();
        assert!(matches!(
            setting.add_range("x", 5.0, 5.0, 1.0),
            Err(OptimizeError::InvalidRange { .. })
        ));
        assert!(matches!(
            setting.add_range("x", 1.0, 5.0, 0.0),
            Err(OptimizeError::InvalidStep { .. })
        ));
        assert!(matches!(
            setting.add_range("x", 1.0, 5.0, -1.0),
            Err(OptimizeError::InvalidStep { .. })
        ));
    }

    #[test]
    fn empty_space_rejected() {
        let setting = OptimizationSetting::new();
        assert!(matches!(
            setting.generate_settings(),
            Err(OptimizeError::EmptyGrid)
        ));
    }
}
