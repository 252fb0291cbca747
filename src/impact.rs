//! Impact projection: per-run latency delta extrapolated to yearly savings
//!
//! The default constants are part of the report contract; downstream
//! consumers compare reports assuming these values unless a report's
//! `impact.inputs` says otherwise.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Economic and physical constants for the projection
///
/// # Example
/// ```
/// use chainbench::impact::ImpactConfig;
///
/// let config = ImpactConfig::default();
/// assert_eq!(config.executions_per_day, 100);
/// assert_eq!(config.co2_kg_per_kwh, 0.475);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub executions_per_day: u64,
    pub days_per_year: u64,
    /// Label of the cost model the hourly rate refers to
    pub cost_model: String,
    pub cost_per_hour_eur: f64,
    pub electricity_kwh_per_hour: f64,
    pub co2_kg_per_kwh: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            executions_per_day: 100,
            days_per_year: 250,
            cost_model: "infra".to_string(),
            cost_per_hour_eur: 0.50,
            electricity_kwh_per_hour: 0.15,
            co2_kg_per_kwh: 0.475,
        }
    }
}

impl ImpactConfig {
    /// Float options must be finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cost_per_hour_eur", self.cost_per_hour_eur),
            ("electricity_kwh_per_hour", self.electricity_kwh_per_hour),
            ("co2_kg_per_kwh", self.co2_kg_per_kwh),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BenchError::InvalidParameters(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Parse overrides from TOML; keys left out keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ImpactConfig = toml::from_str(content)
            .map_err(|e| BenchError::MalformedInput(format!("impact config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load overrides from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BenchError::from_io(e, path))?;
        Self::from_toml_str(&content)
    }
}

/// Yearly savings implied by a per-execution latency delta
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactProjection {
    pub time_saved_hours_per_year: f64,
    pub cost_saved_eur_per_year: f64,
    pub electricity_saved_kwh_per_year: f64,
    pub co2_avoided_kg_per_year: f64,
}

/// Project a latency delta onto a year of executions
///
/// A negative delta (optimized slower than baseline) is legal and yields
/// negative figures.
pub fn project(delta_ms: f64, config: &ImpactConfig) -> ImpactProjection {
    let time_saved_hours_per_year = delta_ms
        * config.executions_per_day as f64
        * config.days_per_year as f64
        / MS_PER_HOUR;
    let electricity_saved_kwh_per_year =
        time_saved_hours_per_year * config.electricity_kwh_per_hour;

    ImpactProjection {
        time_saved_hours_per_year,
        cost_saved_eur_per_year: time_saved_hours_per_year * config.cost_per_hour_eur,
        electricity_saved_kwh_per_year,
        co2_avoided_kg_per_year: electricity_saved_kwh_per_year * config.co2_kg_per_kwh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImpactConfig::default();
        assert_eq!(config.executions_per_day, 100);
        assert_eq!(config.days_per_year, 250);
        assert_eq!(config.cost_model, "infra");
        assert_eq!(config.cost_per_hour_eur, 0.50);
        assert_eq!(config.electricity_kwh_per_hour, 0.15);
        assert_eq!(config.co2_kg_per_kwh, 0.475);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_project_default_constants() {
        let p = project(308.0, &ImpactConfig::default());
        let hours = 308.0 * 100.0 * 250.0 / 3_600_000.0;
        assert_eq!(p.time_saved_hours_per_year, hours);
        assert_eq!(p.cost_saved_eur_per_year, hours * 0.50);
        assert_eq!(p.electricity_saved_kwh_per_year, hours * 0.15);
        assert_eq!(p.co2_avoided_kg_per_year, hours * 0.15 * 0.475);
    }

    #[test]
    fn test_negative_delta_propagates_sign() {
        let p = project(-50.0, &ImpactConfig::default());
        assert!(p.time_saved_hours_per_year < 0.0);
        assert!(p.cost_saved_eur_per_year < 0.0);
        assert!(p.co2_avoided_kg_per_year < 0.0);
    }

    #[test]
    fn test_zero_executions_projects_nothing() {
        let config = ImpactConfig {
            executions_per_day: 0,
            ..ImpactConfig::default()
        };
        assert_eq!(project(1000.0, &config).cost_saved_eur_per_year, 0.0);
    }

    #[test]
    fn test_toml_overrides_keep_defaults() {
        let config = ImpactConfig::from_toml_str("executions_per_day = 1000\n").unwrap();
        assert_eq!(config.executions_per_day, 1000);
        assert_eq!(config.days_per_year, 250);
        assert_eq!(config.cost_per_hour_eur, 0.50);
    }

    #[test]
    fn test_toml_rejects_negative_rate() {
        let err = ImpactConfig::from_toml_str("cost_per_hour_eur = -1.0\n").unwrap_err();
        assert!(matches!(err, BenchError::InvalidParameters(_)));
    }

    #[test]
    fn test_toml_rejects_garbage() {
        let err = ImpactConfig::from_toml_str("executions_per_day = \"lots\"").unwrap_err();
        assert!(matches!(err, BenchError::MalformedInput(_)));
    }
}
