//! # Features Latentes (dependentes do histórico de tags)
//!
//! Chamadas pelo decodificador uma vez por extensão de hipótese no beam. O
//! histórico candidato é prefixado com `<START-2>` e `<START-1>`:
//!
//! ```text
//! tags:  <START-2> <START-1> DT  NN  [?]
//! words:                     the cat sat
//!                                P2  P1  W
//! ```
//!
//! A palavra atual vem sempre do índice global de palavras (a sequência de
//! superfície fixa), nunca de uma reconstrução a partir do beam.

use crate::config::{Mapping, START_1, START_2};
use crate::error::{Result, TaggerError};
use crate::features::FeatureSet;
use crate::learner::LatentFeatureSource;

/// Extrator de features latentes de uma operação (treino, tagging, avaliação ou fold).
///
/// É dono do índice de palavras minúsculas; um novo extrator é criado para cada
/// operação, em vez de reatribuir um callback dentro do tagger.
pub struct LatentFeatureExtractor<'a> {
    words: Vec<String>,
    mapping: Option<&'a Mapping>,
}

impl<'a> LatentFeatureExtractor<'a> {
    /// `words_lower` deve estar alinhado com as features estáticas da operação.
    pub fn new(words_lower: Vec<String>, mapping: Option<&'a Mapping>) -> Self {
        Self {
            words: words_lower,
            mapping,
        }
    }

    fn coarse(&self, mapping: &Mapping, tag: &str) -> Result<String> {
        mapping
            .get(tag)
            .cloned()
            .ok_or_else(|| TaggerError::UnknownTag {
                tag: tag.to_string(),
            })
    }
}

impl LatentFeatureSource for LatentFeatureExtractor<'_> {
    fn latent_features(&self, start: usize, beam: &[&str], i: usize) -> Result<FeatureSet> {
        let global_i = start + i;
        let p1_pos = if i >= 1 { beam[i - 1] } else { START_1 };
        let p2_pos = match i {
            0 => START_2,
            1 => START_1,
            _ => beam[i - 2],
        };
        let word = &self.words[global_i];

        let mut fs = FeatureSet::new();

        if i >= 1 {
            let p1_word = &self.words[global_i - 1];
            fs.push(format!("P1_word, P1_pos: {p1_word}, {p1_pos}"));
            if let Some(mapping) = self.mapping {
                let p1_wc = self.coarse(mapping, p1_pos)?;
                fs.push(format!("P1_word, P1_wc: {p1_word}, {p1_wc}"));
            }
        }
        if i >= 2 {
            let p2_word = &self.words[global_i - 2];
            fs.push(format!("P2_word, P2_pos: {p2_word}, {p2_pos}"));
            if let Some(mapping) = self.mapping {
                let p2_wc = self.coarse(mapping, p2_pos)?;
                fs.push(format!("P2_word, P2_wc: {p2_word}, {p2_wc}"));
            }
        }

        fs.push(format!("P1_pos: {p1_pos}"));
        fs.push(format!("P2_pos: {p2_pos}"));
        fs.push(format!("P2_pos, P1_pos: {p2_pos}, {p1_pos}"));
        fs.push(format!("P1_pos, W_word: {p1_pos}, {word}"));

        if let Some(mapping) = self.mapping {
            let p1_wc = self.coarse(mapping, p1_pos)?;
            let p2_wc = self.coarse(mapping, p2_pos)?;
            fs.push(format!("P1_wc: {p1_wc}"));
            fs.push(format!("P2_wc: {p2_wc}"));
            fs.push(format!("P2_wc, P1_wc: {p2_wc}, {p1_wc}"));
            fs.push(format!("P1_wc, W_word: {p1_wc}, {word}"));
        }

        Ok(fs)
    }
}
