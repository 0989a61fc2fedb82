//! Versioned JSON weight files.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use trading_core::error::ModelError;

use crate::network::BranchNetwork;
use crate::PredictiveModel;

/// Bumped whenever the serialized network layout changes.
pub const WEIGHTS_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub format_version: u32,
    pub input_len: usize,
    pub trained_at: Option<DateTime<Utc>>,
    pub network: BranchNetwork,
}

impl ModelSnapshot {
    pub fn new(network: BranchNetwork, trained_at: Option<DateTime<Utc>>) -> Self {
        Self {
            format_version: WEIGHTS_FORMAT_VERSION,
            input_len: network.input_len(),
            trained_at,
            network,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), params = self.network.parameter_count(), "Saved model weights");
        Ok(())
    }

    /// Load and check a snapshot. A file from another format version or with
    /// inconsistent shapes is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let snapshot: ModelSnapshot = serde_json::from_str(&raw)?;

        if snapshot.format_version != WEIGHTS_FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion {
                found: snapshot.format_version,
                expected: WEIGHTS_FORMAT_VERSION,
            });
        }
        snapshot.network.validate()?;
        if snapshot.input_len != snapshot.network.input_len() {
            return Err(ModelError::ShapeMismatch {
                expected: snapshot.network.input_len(),
                actual: snapshot.input_len,
            });
        }
        info!(path = %path.display(), input_len = snapshot.input_len, "Loaded model weights");
        Ok(snapshot)
    }

    pub fn into_network(self) -> BranchNetwork {
        self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Dense;
    use crate::network::BranchLayout;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("weights.json");
        let net = BranchNetwork::new(BranchLayout::default(), 11);
        let x = [0.1; 11];
        let before = net.predict(&x).unwrap();

        ModelSnapshot::new(net, Some(Utc::now())).save(&path).unwrap();
        let loaded = ModelSnapshot::load(&path).unwrap().into_network();

        assert_eq!(loaded.predict(&x).unwrap(), before);
    }

    #[test]
    fn test_weights_reload_bit_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weights.json");
        let net = BranchNetwork::new(BranchLayout::default(), 7);
        ModelSnapshot::new(net.clone(), None).save(&path).unwrap();

        let loaded = ModelSnapshot::load(&path).unwrap().into_network();
        for (a, b) in net.layers().zip(loaded.layers()) {
            let bits = |d: &Dense| d.weights.iter().chain(&d.bias).map(|w| w.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(a), bits(b));
        }
        assert_eq!(loaded.price_scale().to_bits(), net.price_scale().to_bits());
    }

    #[test]
    fn test_rejects_other_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weights.json");
        let mut snapshot = ModelSnapshot::new(BranchNetwork::new(BranchLayout::default(), 1), None);
        snapshot.format_version = 99;
        snapshot.save(&path).unwrap();

        let err = ModelSnapshot::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedVersion { found: 99, expected: 1 }));
    }

    #[test]
    fn test_rejects_inconsistent_input_len() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weights.json");
        let mut snapshot = ModelSnapshot::new(BranchNetwork::new(BranchLayout::default(), 1), None);
        snapshot.input_len = 12;
        snapshot.save(&path).unwrap();

        assert!(matches!(
            ModelSnapshot::load(&path),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ModelSnapshot::load("/nonexistent/weights.json"),
            Err(ModelError::Io(_))
        ));
    }
}
