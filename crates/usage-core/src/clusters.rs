use crate::error::{Result, UsageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Clusters whose accounting data can be reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    /// The original JADE DGX-1 service.
    Jade,
    /// JADE 2.
    Jade2,
}

impl FromStr for Cluster {
    type Err = UsageError;

    /// Case-insensitive construction from a string slice.
    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "jade" => Ok(Cluster::Jade),
            "jade2" => Ok(Cluster::Jade2),
            other => Err(UsageError::InvalidCluster(other.to_string())),
        }
    }
}

impl Cluster {
    /// The canonical lowercase identifier for this cluster.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Jade => "jade",
            Cluster::Jade2 => "jade2",
        }
    }

    pub fn all() -> [Cluster; 2] {
        [Cluster::Jade, Cluster::Jade2]
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed facts about one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Host that `sacct` is run on.
    pub address: String,
    /// Total GPU-hours the cluster can deliver per day.
    pub daily_capacity: f64,
}

fn default_configs() -> HashMap<Cluster, ClusterConfig> {
    let mut map = HashMap::new();
    map.insert(
        Cluster::Jade,
        ClusterConfig {
            address: "jade.hartree.stfc.ac.uk".to_string(),
            daily_capacity: 4224.0,
        },
    );
    map.insert(
        Cluster::Jade2,
        ClusterConfig {
            address: "jade2.hartree.stfc.ac.uk".to_string(),
            daily_capacity: 10584.0,
        },
    );
    map
}

/// Partial override of a [`ClusterConfig`], as read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
struct ClusterOverride {
    address: Option<String>,
    daily_capacity: Option<f64>,
}

// ── ClusterRegistry ───────────────────────────────────────────────────────────

/// Configuration for every known cluster.
///
/// Built from compiled-in defaults, optionally overridden from a JSON file
/// of the form `{"jade2": {"daily_capacity": 10000}}`.
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    configs: HashMap<Cluster, ClusterConfig>,
}

impl Default for ClusterRegistry {
    fn default() -> Self {
        Self {
            configs: default_configs(),
        }
    }
}

impl ClusterRegistry {
    /// Default override path: `~/.jade-usage/clusters.json`.
    pub fn default_path() -> PathBuf {
        Self::default_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// The override path rooted at `base_dir` (used for testing).
    pub fn default_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".jade-usage").join("clusters.json")
    }

    /// Load the registry.
    ///
    /// An explicit `path` must exist and parse.  Without one, the default path
    /// is tried and silently ignored when absent or invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => {
                let default = Self::default_path();
                Ok(Self::load_from(&default).unwrap_or_else(|e| {
                    if default.exists() {
                        tracing::warn!("Ignoring cluster config {}: {}", default.display(), e);
                    }
                    Self::default()
                }))
            }
        }
    }

    /// Load defaults and apply the overrides stored at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| UsageError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Apply overrides from a JSON document to the defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        let overrides: HashMap<String, ClusterOverride> = serde_json::from_str(content)?;
        let mut registry = Self::default();

        for (name, over) in overrides {
            let cluster: Cluster = name.parse()?;
            let config = registry.configs.entry(cluster).or_insert_with(|| ClusterConfig {
                address: String::new(),
                daily_capacity: 0.0,
            });
            if let Some(address) = over.address {
                config.address = address;
            }
            if let Some(capacity) = over.daily_capacity {
                if !(capacity.is_finite() && capacity > 0.0) {
                    return Err(UsageError::Config(format!(
                        "daily_capacity for {} must be positive, got {}",
                        cluster, capacity
                    )));
                }
                config.daily_capacity = capacity;
            }
        }

        Ok(registry)
    }

    /// The configuration for `cluster`.
    pub fn get(&self, cluster: Cluster) -> &ClusterConfig {
        self.configs
            .get(&cluster)
            .expect("all Cluster variants are present in the registry")
    }
}
