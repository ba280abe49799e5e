//! Session configuration
//!
//! Every knob of a concolic session: time budget, iteration cap, per-call
//! execution caps, solver timeout, and the ranges random arguments are
//! drawn from.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides};
use super::preset::Preset;
use crate::features::interpreter::ExecutionLimits;
use crate::features::naming::RandomRanges;

const SUPPORTED_VERSIONS: [u32; 1] = [1];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub preset: Preset,
    pub time_budget_secs: u64,
    /// Stop after this many iterations even with budget left
    pub max_iterations: Option<usize>,
    /// Stop when the worklist runs dry instead of reseeding
    pub stop_when_exhausted: bool,
    /// RNG seed; entropy when absent
    pub seed: Option<u64>,
    pub max_steps_per_call: usize,
    pub max_call_depth: usize,
    pub solver_timeout_ms: u64,
    /// Inclusive
    pub int_range: [i64; 2],
    /// Half-open
    pub real_range: [f64; 2],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

impl SessionConfig {
    /// Complete configuration for `preset`
    pub fn preset(preset: Preset) -> Self {
        let (time_budget_secs, max_steps_per_call, max_call_depth, solver_timeout_ms) =
            match preset {
                Preset::Fast => (5, 20_000, 32, 1_000),
                Preset::Balanced => (10, 100_000, 64, 5_000),
                Preset::Thorough => (60, 1_000_000, 128, 30_000),
            };
        Self {
            preset,
            time_budget_secs,
            max_iterations: None,
            stop_when_exhausted: false,
            seed: None,
            max_steps_per_call,
            max_call_depth,
            solver_timeout_ms,
            int_range: [5, 10],
            real_range: [5.0, 10.0],
        }
    }

    /// Load and validate a v1 YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;
        let mut config = Self::preset(preset);
        if let Some(overrides) = &export.overrides {
            config.apply(overrides);
        }
        config.validate()?;
        Ok(config)
    }

    /// Export as v1 YAML (every field spelled out as an override)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                time_budget_secs: Some(self.time_budget_secs),
                max_iterations: self.max_iterations,
                stop_when_exhausted: Some(self.stop_when_exhausted),
                seed: self.seed,
                max_steps_per_call: Some(self.max_steps_per_call),
                max_call_depth: Some(self.max_call_depth),
                solver_timeout_ms: Some(self.solver_timeout_ms),
                int_range: Some(self.int_range),
                real_range: Some(self.real_range),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.time_budget_secs {
            self.time_budget_secs = v;
        }
        if let Some(v) = overrides.max_iterations {
            self.max_iterations = Some(v);
        }
        if let Some(v) = overrides.stop_when_exhausted {
            self.stop_when_exhausted = v;
        }
        if let Some(v) = overrides.seed {
            self.seed = Some(v);
        }
        if let Some(v) = overrides.max_steps_per_call {
            self.max_steps_per_call = v;
        }
        if let Some(v) = overrides.max_call_depth {
            self.max_call_depth = v;
        }
        if let Some(v) = overrides.solver_timeout_ms {
            self.solver_timeout_ms = v;
        }
        if let Some(v) = overrides.int_range {
            self.int_range = v;
        }
        if let Some(v) = overrides.real_range {
            self.real_range = v;
        }
    }

    /// Range checks
    pub fn validate(&self) -> ConfigResult<()> {
        check_range("max_steps_per_call", self.max_steps_per_call, 1, 100_000_000)?;
        check_range("max_call_depth", self.max_call_depth, 1, 10_000)?;
        check_range("solver_timeout_ms", self.solver_timeout_ms, 1, 3_600_000)?;
        if let Some(max) = self.max_iterations {
            check_range("max_iterations", max, 1, usize::MAX)?;
        }

        let [lo, hi] = self.int_range;
        if lo > hi {
            return Err(ConfigError::range_with_hint(
                "int_range",
                format!("[{}, {}]", lo, hi),
                "[lo",
                "hi]",
                "Lower bound must not exceed upper bound",
            ));
        }

        let [lo, hi] = self.real_range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(ConfigError::range_with_hint(
                "real_range",
                format!("[{}, {}]", lo, hi),
                "[lo",
                "hi]",
                "Bounds must be finite with lower <= upper",
            ));
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn execution_limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_steps: self.max_steps_per_call,
            max_depth: self.max_call_depth,
        }
    }

    pub fn random_ranges(&self) -> RandomRanges {
        RandomRanges {
            int: (self.int_range[0], self.int_range[1]),
            real: (self.real_range[0], self.real_range[1]),
        }
    }
}

fn check_range<T>(field: &str, value: T, min: T, max: T) -> ConfigResult<()>
where
    T: PartialOrd + ToString,
{
    if value < min || value > max {
        return Err(ConfigError::range_with_hint(
            field,
            value,
            min,
            max,
            format!("Set '{}' inside the allowed range", field),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_balanced() {
        let config = SessionConfig::default();
        assert_eq!(config.preset, Preset::Balanced);
        assert_eq!(config.time_budget_secs, 10);
        assert_eq!(config.max_steps_per_call, 100_000);
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.solver_timeout_ms, 5_000);
        assert_eq!(config.int_range, [5, 10]);
        assert_eq!(config.real_range, [5.0, 10.0]);
        assert!(config.max_iterations.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_scale_limits() {
        let fast = SessionConfig::preset(Preset::Fast);
        let thorough = SessionConfig::preset(Preset::Thorough);
        assert!(fast.max_steps_per_call < thorough.max_steps_per_call);
        assert!(fast.solver_timeout_ms < thorough.solver_timeout_ms);
        assert_eq!(fast.execution_limits().max_depth, 32);
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
version: 1
preset: fast
overrides:
  seed: 42
  max_iterations: 100
  int_range: [-3, 3]
"#;
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.preset, Preset::Fast);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_iterations, Some(100));
        assert_eq!(config.random_ranges().int, (-3, 3));
        // Untouched fields keep the preset value
        assert_eq!(config.solver_timeout_ms, 1_000);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let mut config = SessionConfig::preset(Preset::Thorough);
        config.seed = Some(9);
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: thorough"));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        assert_eq!(SessionConfig::from_yaml(file.path()).unwrap(), config);
    }

    #[test]
    fn test_yaml_rejects_bad_input() {
        let err = SessionConfig::from_yaml_str("version: 2\npreset: fast\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, .. }));

        let err = SessionConfig::from_yaml_str("version: 1\npreset: turbo\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(_)));

        let err = SessionConfig::from_yaml_str("version: 1\npreset: fast\noverrides:\n  speed: 3\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));

        let err = SessionConfig::from_yaml_str("preset: fast\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_validation_ranges() {
        let mut config = SessionConfig::default();
        config.max_call_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Range { field, .. }) if field == "max_call_depth"
        ));

        let mut config = SessionConfig::default();
        config.real_range = [10.0, f64::INFINITY];
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.int_range = [9, 1];
        assert!(config.validate().is_err());
    }
}
