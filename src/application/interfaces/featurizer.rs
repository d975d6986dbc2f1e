use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Response from the featurizer collaborator: one map of `feature_id -> present` per sample.
#[derive(Debug, Clone, Default)]
pub struct FeaturizerResponse {
    pub samples: Vec<HashMap<String, bool>>,
}

impl FeaturizerResponse {
    /// `coefficient(feature) = mean(samples[feature])` over samples containing that feature.
    pub fn coefficients(&self) -> HashMap<String, f32> {
        let mut sums: HashMap<String, (f32, u32)> = HashMap::new();
        for sample in &self.samples {
            for (feature, present) in sample {
                let entry = sums.entry(feature.clone()).or_insert((0.0, 0));
                entry.0 += if *present { 1.0 } else { 0.0 };
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(feature, (sum, count))| (feature, sum / count as f32))
            .collect()
    }
}

/// External LLM tool-calling collaborator that emits boolean features for a search query. The
/// search service merges its per-feature coefficients into each semantic hit; the core only
/// specifies this contract, never a concrete implementation.
#[async_trait]
pub trait Featurizer: Send + Sync {
    async fn embed(
        &self,
        query: &str,
        samples: u32,
        temperature: f32,
    ) -> Result<FeaturizerResponse, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_is_mean_presence() {
        let response = FeaturizerResponse {
            samples: vec![
                HashMap::from([("is_async".to_string(), true)]),
                HashMap::from([("is_async".to_string(), false)]),
                HashMap::from([("is_async".to_string(), true)]),
            ],
        };
        let coeffs = response.coefficients();
        assert!((coeffs["is_async"] - (2.0 / 3.0)).abs() < 1e-6);
    }
}
