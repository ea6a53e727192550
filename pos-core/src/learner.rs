//! # Contrato do Aprendiz Estruturado
//!
//! O tagger não conhece a regra de atualização nem a busca em beam: ele apenas
//! entrega features estáticas, tags e comprimentos a um [`StructuredLearner`].
//! As features latentes (que dependem do histórico de tags candidato) chegam ao
//! decodificador por um [`LatentFeatureSource`] passado explicitamente a cada
//! chamada, nunca guardado no aprendiz.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::features::FeatureSet;

/// Tabela esparsa: nome da feature → um peso por tag.
///
/// Features ausentes equivalem a um vetor de zeros.
pub type Weights = HashMap<String, Vec<f64>>;

/// Fonte de features latentes consultada pelo decodificador.
///
/// `beam` é o histórico de tags candidato da sentença atual (sem as sentinelas),
/// `start` o deslocamento global da sentença e `i` a posição local sendo pontuada.
pub trait LatentFeatureSource: Sync {
    fn latent_features(&self, start: usize, beam: &[&str], i: usize) -> Result<FeatureSet>;
}

/// Aprendiz estruturado externo ao tagger.
pub trait StructuredLearner {
    /// Treina no lugar (pode fazer várias passadas internamente).
    fn fit(
        &mut self,
        features: &[FeatureSet],
        labels: &[String],
        lengths: &[usize],
        latent: &dyn LatentFeatureSource,
    ) -> Result<()>;

    /// Uma sequência de tags por sentença. Não altera os pesos.
    fn predict(
        &self,
        features: &[FeatureSet],
        lengths: &[usize],
        latent: &dyn LatentFeatureSource,
    ) -> Result<Vec<Vec<String>>>;

    /// Acurácia por token em `[0, 1]`.
    fn score(
        &self,
        features: &[FeatureSet],
        labels: &[String],
        lengths: &[usize],
        latent: &dyn LatentFeatureSource,
    ) -> Result<f64> {
        let predicted = self.predict(features, lengths, latent)?;
        let correct = predicted
            .iter()
            .flatten()
            .zip(labels)
            .filter(|(p, g)| p == g)
            .count();
        Ok(if labels.is_empty() {
            0.0
        } else {
            correct as f64 / labels.len() as f64
        })
    }

    fn weights(&self) -> &Weights;

    fn target_mapping(&self) -> &TargetMapping;

    fn target_size(&self) -> usize {
        self.target_mapping().len()
    }
}

/// Bijeção tag ↔ índice.
///
/// Persistida como objeto JSON `{tag: índice}`; a leitura exige índices contíguos
/// `0..n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetMapping {
    tags: Vec<String>,
    index: HashMap<String, usize>,
}

impl TargetMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Índice da tag, registrando-a se for nova.
    pub fn insert(&mut self, tag: &str) -> usize {
        if let Some(&i) = self.index.get(tag) {
            return i;
        }
        let i = self.tags.len();
        self.tags.push(tag.to_string());
        self.index.insert(tag.to_string(), i);
        i
    }

    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    pub fn tag(&self, index: usize) -> Option<&str> {
        self.tags.get(index).map(String::as_str)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Reconstrói a bijeção a partir de `{tag: índice}`.
    pub fn from_index(index: HashMap<String, usize>) -> std::result::Result<Self, String> {
        let mut tags = vec![None; index.len()];
        for (tag, &i) in &index {
            match tags.get_mut(i) {
                Some(slot @ None) => *slot = Some(tag.clone()),
                Some(Some(other)) => {
                    return Err(format!("tags {other:?} and {tag:?} share index {i}"))
                }
                None => return Err(format!("tag {tag:?} has out-of-range index {i}")),
            }
        }
        let tags = tags.into_iter().flatten().collect();
        Ok(Self { tags, index })
    }
}

impl Serialize for TargetMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.index.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TargetMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let index = HashMap::<String, usize>::deserialize(deserializer)?;
        Self::from_index(index).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut mapping = TargetMapping::new();
        assert_eq!(mapping.insert("NN"), 0);
        assert_eq!(mapping.insert("DT"), 1);
        assert_eq!(mapping.insert("NN"), 0);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.tag(1), Some("DT"));
        assert_eq!(mapping.index_of("VB"), None);
    }

    #[test]
    fn test_json_round_trip() {
        let mut mapping = TargetMapping::new();
        for tag in ["NN", "DT", "VBD"] {
            mapping.insert(tag);
        }
        let json = serde_json::to_string(&mapping).unwrap();
        let back: TargetMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
        assert_eq!(back.tags(), mapping.tags());
    }

    #[test]
    fn test_rejects_gaps_and_duplicates() {
        assert!(serde_json::from_str::<TargetMapping>(r#"{"NN": 0, "DT": 2}"#).is_err());
        assert!(serde_json::from_str::<TargetMapping>(r#"{"NN": 0, "DT": 0}"#).is_err());
    }
}
