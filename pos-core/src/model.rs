//! # Modelo Treinado e Formato Persistido
//!
//! O modelo agrega tudo o que é preciso para voltar a etiquetar:
//! - **Vocabulário** de treino (para separar IV de OOV na avaliação)
//! - **Recursos** lexicais (léxico, mapeamento grosso, clusters, vetores)
//! - **Tags** (`target_mapping`) e a **tabela de pesos** esparsa
//!
//! ## Formato em disco
//!
//! Um array JSON com exatamente 9 elementos posicionais, comprimido com zstd:
//!
//! ```text
//! [vocabulary, lexicon, mapping, brown_clusters, word_to_vec,
//!  target_mapping, target_size, sorted_feature_names, encoded_weight_vectors]
//! ```
//!
//! Cada vetor de pesos são `target_size` `f64` little-endian codificados em
//! Base85, alinhados com a lista ordenada de nomes de features.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::base85;
use crate::config::{BrownClusters, Lexicon, Mapping, Resources, WordToVec};
use crate::error::{Result, TaggerError};
use crate::learner::{TargetMapping, Weights};

/// Modelo completo, dono de todas as suas tabelas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub vocabulary: HashSet<String>,
    pub resources: Resources,
    pub target_mapping: TargetMapping,
    pub weights: Weights,
}

impl Model {
    pub fn target_size(&self) -> usize {
        self.target_mapping.len()
    }

    pub fn as_parts(&self) -> ModelParts<'_> {
        ModelParts {
            vocabulary: &self.vocabulary,
            resources: &self.resources,
            target_mapping: &self.target_mapping,
            weights: &self.weights,
        }
    }
}

/// Visão emprestada de um modelo, usada para salvar sem copiar os pesos.
#[derive(Debug, Clone, Copy)]
pub struct ModelParts<'a> {
    pub vocabulary: &'a HashSet<String>,
    pub resources: &'a Resources,
    pub target_mapping: &'a TargetMapping,
    pub weights: &'a Weights,
}

type Encoded<'a> = (
    Vec<&'a str>,
    &'a Option<Lexicon>,
    &'a Option<Mapping>,
    &'a Option<BrownClusters>,
    &'a Option<WordToVec>,
    &'a TargetMapping,
    usize,
    Vec<&'a str>,
    Vec<String>,
);

type Decoded = (
    Vec<String>,
    Option<Lexicon>,
    Option<Mapping>,
    Option<BrownClusters>,
    Option<WordToVec>,
    TargetMapping,
    usize,
    Vec<String>,
    Vec<String>,
);

/// Escreve o modelo comprimido em `writer`.
pub fn write_model<W: Write>(parts: ModelParts<'_>, writer: W, level: i32) -> Result<()> {
    let target_size = parts.target_mapping.len();

    let mut vocabulary: Vec<&str> = parts.vocabulary.iter().map(String::as_str).collect();
    vocabulary.sort_unstable();

    let mut features: Vec<&str> = parts.weights.keys().map(String::as_str).collect();
    features.sort_unstable();

    let mut encoded_weights = Vec::with_capacity(features.len());
    for feature in &features {
        let vector = &parts.weights[*feature];
        if vector.len() != target_size {
            return Err(TaggerError::invalid_model(format!(
                "feature {feature:?} has {} weights, expected {target_size}",
                vector.len()
            )));
        }
        let bytes: Vec<u8> = vector.iter().flat_map(|w| w.to_le_bytes()).collect();
        encoded_weights.push(base85::encode(&bytes));
    }

    let encoded: Encoded<'_> = (
        vocabulary,
        &parts.resources.lexicon,
        &parts.resources.mapping,
        &parts.resources.brown_clusters,
        &parts.resources.word_to_vec,
        parts.target_mapping,
        target_size,
        features,
        encoded_weights,
    );

    let mut encoder = zstd::Encoder::new(writer, level)?;
    serde_json::to_writer(&mut encoder, &encoded)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Lê um modelo escrito por [`write_model`]; qualquer inconsistência é erro.
pub fn read_model<R: Read>(reader: R) -> Result<Model> {
    let decoder = zstd::Decoder::new(reader)?;
    let (
        vocabulary,
        lexicon,
        mapping,
        brown_clusters,
        word_to_vec,
        target_mapping,
        target_size,
        features,
        encoded_weights,
    ): Decoded = serde_json::from_reader(decoder)?;

    if target_size != target_mapping.len() {
        return Err(TaggerError::invalid_model(format!(
            "target size {target_size} does not match {} mapped tags",
            target_mapping.len()
        )));
    }
    if features.len() != encoded_weights.len() {
        return Err(TaggerError::invalid_model(format!(
            "{} feature names but {} weight vectors",
            features.len(),
            encoded_weights.len()
        )));
    }

    let mut weights = Weights::with_capacity(features.len());
    for (feature, text) in features.into_iter().zip(encoded_weights) {
        let bytes = base85::decode(&text)
            .map_err(|e| TaggerError::invalid_model(format!("feature {feature:?}: {e}")))?;
        if bytes.len() != target_size * 8 {
            return Err(TaggerError::invalid_model(format!(
                "feature {feature:?} has {} bytes of weights, expected {}",
                bytes.len(),
                target_size * 8
            )));
        }
        let vector = bytes
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect();
        weights.insert(feature, vector);
    }

    Ok(Model {
        vocabulary: vocabulary.into_iter().collect(),
        resources: Resources {
            lexicon,
            mapping,
            brown_clusters,
            word_to_vec,
        },
        target_mapping,
        weights,
    })
}

pub fn save(parts: ModelParts<'_>, path: impl AsRef<Path>, level: i32) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    write_model(parts, file, level)?;
    debug!(
        path = %path.display(),
        features = parts.weights.len(),
        tags = parts.target_mapping.len(),
        "model saved"
    );
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    let model = read_model(File::open(path)?)?;
    debug!(
        path = %path.display(),
        features = model.weights.len(),
        tags = model.target_size(),
        "model loaded"
    );
    Ok(model)
}
