use crate::EvalError;
use crate::record::DistanceWeights;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct EvalConfig {
    #[serde(default)]
    pub distance: DistanceConfig,
    #[serde(default)]
    pub markov: MarkovConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub evaluate: EvaluateConfig,
}

#[derive(Debug, Deserialize)]
pub struct DistanceConfig {
    /// How many of the most recent records the distance strategies look at.
    /// 0 means the whole history.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub weights: DistanceWeights,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            weights: DistanceWeights::default(),
        }
    }
}

fn default_max_depth() -> usize {
    3000
}

#[derive(Debug, Deserialize)]
pub struct MarkovConfig {
    #[serde(default = "default_markov_orders")]
    pub orders: Vec<usize>,
}

impl Default for MarkovConfig {
    fn default() -> Self {
        Self {
            orders: default_markov_orders(),
        }
    }
}

fn default_markov_orders() -> Vec<usize> {
    vec![1, 2]
}

#[derive(Debug, Deserialize)]
pub struct DebugConfig {
    /// Seed for the debug-record sampler. Unseeded runs sample from entropy.
    pub seed: Option<u64>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            seed: None,
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    11
}

#[derive(Debug, Deserialize, Default)]
pub struct EvaluateConfig {
    pub max_candidates: Option<usize>,
}

/// Load config from an explicit path, RESH_EVALUATE_CONFIG,
/// ~/.config/resh-evaluate.toml, or defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<EvalConfig, EvalError> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(EvalError::Config(format!("{}: no such file", p.display())));
            }
            Some(p.to_path_buf())
        }
        None => config_path(),
    };
    match path {
        Some(p) if p.exists() => {
            let content = std::fs::read_to_string(&p)?;
            let config: EvalConfig = toml::from_str(&content)
                .map_err(|e| EvalError::Config(format!("{}: {e}", p.display())))?;
            validate_config(&config)?;
            log::debug!("loaded config from {}", p.display());
            Ok(config)
        }
        _ => Ok(EvalConfig::default()),
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("RESH_EVALUATE_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".config").join("resh-evaluate.toml"))
}

fn validate_config(config: &EvalConfig) -> Result<(), EvalError> {
    if !config.distance.weights.is_valid() {
        return Err(EvalError::Config(
            "distance weights must be finite and non-negative".into(),
        ));
    }
    for (i, order) in config.markov.orders.iter().enumerate() {
        if !(1..=4).contains(order) {
            return Err(EvalError::Config(format!(
                "markov.orders[{i}] = {order}, expected 1..=4"
            )));
        }
    }
    if config.debug.top_n == 0 {
        return Err(EvalError::Config("debug.top_n must be positive".into()));
    }
    if config.evaluate.max_candidates == Some(0) {
        return Err(EvalError::Config(
            "evaluate.max_candidates must be positive".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_no_file() {
        let config = EvalConfig::default();
        assert_eq!(config.distance.max_depth, 3000);
        assert_eq!(config.distance.weights, DistanceWeights::default());
        assert_eq!(config.markov.orders, vec![1, 2]);
        assert_eq!(config.debug.seed, None);
        assert_eq!(config.debug.top_n, 11);
        assert_eq!(config.evaluate.max_candidates, None);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[distance]
max_depth = 500

[distance.weights]
pwd = 4.0
real_pwd = 2.0
session = 1.5
time = 0.5
git = 8.0

[markov]
orders = [1, 3]

[debug]
seed = 1234
top_n = 5

[evaluate]
max_candidates = 50
"#;
        let config: EvalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.distance.max_depth, 500);
        assert_eq!(config.distance.weights.pwd, 4.0);
        assert_eq!(config.distance.weights.git, 8.0);
        assert_eq!(config.markov.orders, vec![1, 3]);
        assert_eq!(config.debug.seed, Some(1234));
        assert_eq!(config.debug.top_n, 5);
        assert_eq!(config.evaluate.max_candidates, Some(50));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_weights_keep_defaults() {
        let config: EvalConfig = toml::from_str(
            r#"
[distance.weights]
git = 0.0
"#,
        )
        .unwrap();
        assert_eq!(config.distance.weights.git, 0.0);
        assert_eq!(config.distance.weights.pwd, 10.0);
        assert_eq!(config.distance.max_depth, 3000);
    }

    #[test]
    fn negative_weight_rejected() {
        let config: EvalConfig = toml::from_str(
            r#"
[distance.weights]
session = -1.0
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn markov_order_out_of_range_rejected() {
        let config: EvalConfig = toml::from_str("[markov]\norders = [0]\n").unwrap();
        assert!(validate_config(&config).is_err());
        let config: EvalConfig = toml::from_str("[markov]\norders = [5]\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("eval.toml");
        std::fs::write(&path, "[debug]\nseed = 9\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.debug.seed, Some(9));
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(err, Err(EvalError::Config(_))));
    }

    #[test]
    fn load_invalid_toml_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("eval.toml");
        std::fs::write(&path, "[distance\nmax_depth = ").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(EvalError::Config(_))));
    }
}
