//! # Configuração do Tagger e Recursos Auxiliares
//!
//! [`TaggerConfig`] reúne os hiperparâmetros (beam, iterações, tamanho de cache,
//! nível de compressão). [`Resources`] agrupa os recursos lexicais opcionais que
//! alimentam as features estáticas e latentes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Número fixo de folds da validação cruzada.
pub const FOLDS: usize = 10;

/// Tags sentinela que precedem toda sentença no histórico do beam.
pub const START_2: &str = "<START-2>";
pub const START_1: &str = "<START-1>";
/// Classe grossa para a qual as duas sentinelas de início são mapeadas.
pub const START: &str = "<START>";

/// Sentinelas de fim de sentença (apenas na visão estática).
pub const END_1: &str = "<END+1>";
pub const END_2: &str = "<END+2>";

/// Léxico: palavra → lista de tags lexicais.
pub type Lexicon = HashMap<String, Vec<String>>;
/// Mapeamento de tag fina → classe grossa.
pub type Mapping = HashMap<String, String>;
/// Clusters de Brown: palavra → (id do cluster, log-frequência).
pub type BrownClusters = HashMap<String, (String, i64)>;
/// Representação pré-calculada por palavra (tratada como valor opaco).
pub type WordToVec = HashMap<String, String>;

/// Hiperparâmetros do tagger.
///
/// Campos ausentes no JSON assumem os valores de [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Largura do beam usado pelo decodificador.
    pub beam_size: usize,
    /// Número de passadas de treino sobre o corpus.
    pub iterations: usize,
    /// Capacidade dos caches LRU de flags e de forma.
    pub cache_capacity: usize,
    /// Nível zstd usado ao salvar o modelo.
    pub compression_level: i32,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            beam_size: 5,
            iterations: 10,
            cache_capacity: 10_240,
            compression_level: 19,
        }
    }
}

impl TaggerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Recursos lexicais opcionais, todos pertencentes ao modelo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub lexicon: Option<Lexicon>,
    pub mapping: Option<Mapping>,
    pub brown_clusters: Option<BrownClusters>,
    pub word_to_vec: Option<WordToVec>,
}

impl Resources {
    /// Garante que as sentinelas de início estejam registradas no mapeamento.
    ///
    /// Sem isso, as features latentes das duas primeiras posições falhariam.
    pub fn with_start_sentinels(mut self) -> Self {
        if let Some(mapping) = self.mapping.as_mut() {
            mapping.insert(START_2.to_string(), START.to_string());
            mapping.insert(START_1.to_string(), START.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TaggerConfig::from_json(r#"{"beam_size": 3}"#).unwrap();
        assert_eq!(config.beam_size, 3);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.cache_capacity, 10_240);
    }

    #[test]
    fn test_mapping_gets_start_sentinels() {
        let mut mapping = Mapping::new();
        mapping.insert("NN".to_string(), "NOUN".to_string());
        let resources = Resources {
            mapping: Some(mapping),
            ..Default::default()
        }
        .with_start_sentinels();

        let mapping = resources.mapping.unwrap();
        assert_eq!(mapping[START_2], START);
        assert_eq!(mapping[START_1], START);
        assert_eq!(mapping["NN"], "NOUN");
    }

    #[test]
    fn test_no_mapping_stays_none() {
        let resources = Resources::default().with_start_sentinels();
        assert!(resources.mapping.is_none());
    }
}
