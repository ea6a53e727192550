//! # Tagger: Orquestração de Treino, Etiquetagem e Avaliação
//!
//! Liga as peças do sistema:
//!
//! ```text
//! (palavras, comprimentos) → features estáticas ─┐
//!                                                ├→ aprendiz → tags por sentença
//! índice minúsculo → extrator latente (callback) ┘
//! ```
//!
//! O extrator latente é construído a cada operação, com o índice de palavras da
//! própria operação, e passado explicitamente ao aprendiz. Nenhuma operação
//! deixa um callback "pendurado" no tagger.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::classifier::WordClassifier;
use crate::config::{Resources, TaggerConfig};
use crate::corpus::{lowercase_index, sentence_ranges, validate_tagged};
use crate::crossval::{fold_bounds, run_folds, split, CrossValidation};
use crate::error::Result;
use crate::evaluation::{evaluate, Accuracy};
use crate::features::{extract_features, FeatureSet};
use crate::latent::LatentFeatureExtractor;
use crate::learner::StructuredLearner;
use crate::model::{self, Model, ModelParts};
use crate::perceptron::StructuredPerceptron;

/// Palavras de uma sentença pareadas com as tags previstas.
pub type TaggedSentence = Vec<(String, String)>;

/// Tagger morfossintático baseado no perceptron estruturado médio.
pub struct Tagger {
    config: TaggerConfig,
    vocabulary: HashSet<String>,
    resources: Resources,
    classifier: WordClassifier,
    learner: StructuredPerceptron,
}

impl Tagger {
    /// Tagger vazio: sem vocabulário nem pesos.
    pub fn new(config: TaggerConfig, resources: Resources) -> Self {
        Self::from_model(
            config,
            Model {
                resources,
                ..Default::default()
            },
        )
    }

    /// Parte de um modelo existente (pesos e vocabulário prévios).
    pub fn from_model(config: TaggerConfig, model: Model) -> Self {
        let learner = StructuredPerceptron::with_prior(
            config.beam_size,
            config.iterations,
            model.target_mapping,
            model.weights,
        );
        Self {
            classifier: WordClassifier::new(config.cache_capacity),
            vocabulary: model.vocabulary,
            resources: model.resources.with_start_sentinels(),
            learner,
            config,
        }
    }

    pub fn load(config: TaggerConfig, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_model(config, model::load(path)?))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        model::save(self.parts(), path, self.config.compression_level)
    }

    pub fn parts(&self) -> ModelParts<'_> {
        ModelParts {
            vocabulary: &self.vocabulary,
            resources: &self.resources,
            target_mapping: self.learner.target_mapping(),
            weights: self.learner.weights(),
        }
    }

    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn learner(&self) -> &StructuredPerceptron {
        &self.learner
    }

    fn static_features(&self, words: &[String], lengths: &[usize]) -> Result<Vec<FeatureSet>> {
        extract_features(words, lengths, &self.classifier, &self.resources)
    }

    fn latent_features(&self, words: &[String]) -> LatentFeatureExtractor<'_> {
        LatentFeatureExtractor::new(lowercase_index(words), self.resources.mapping.as_ref())
    }

    /// Treina no lugar e adiciona as palavras ao vocabulário.
    ///
    /// Se o treino falhar, vocabulário e pesos ficam como estavam.
    pub fn train(&mut self, words: &[String], tags: &[String], lengths: &[usize]) -> Result<()> {
        validate_tagged(words.len(), tags.len(), lengths)?;

        let features = self.static_features(words, lengths)?;
        let latent = LatentFeatureExtractor::new(
            lowercase_index(words),
            self.resources.mapping.as_ref(),
        );
        self.learner.fit(&features, tags, lengths, &latent)?;
        self.vocabulary.extend(words.iter().cloned());
        info!(
            sentences = lengths.len(),
            tokens = words.len(),
            features = self.learner.weights().len(),
            "training finished"
        );
        Ok(())
    }

    /// Etiqueta cada sentença, devolvendo pares (palavra, tag).
    pub fn tag(&self, words: &[String], lengths: &[usize]) -> Result<Vec<TaggedSentence>> {
        let features = self.static_features(words, lengths)?;
        let predicted = self
            .learner
            .predict(&features, lengths, &self.latent_features(words))?;

        Ok(sentence_ranges(lengths)
            .into_iter()
            .zip(predicted)
            .map(|(range, tags)| words[range].iter().cloned().zip(tags).collect())
            .collect())
    }

    /// Acurácia geral, IV e OOV em relação ao vocabulário de treino.
    pub fn evaluate(
        &self,
        words: &[String],
        tags: &[String],
        lengths: &[usize],
    ) -> Result<Accuracy> {
        validate_tagged(words.len(), tags.len(), lengths)?;
        let features = self.static_features(words, lengths)?;
        let predicted: Vec<String> = self
            .learner
            .predict(&features, lengths, &self.latent_features(words))?
            .into_iter()
            .flatten()
            .collect();
        Ok(evaluate(&predicted, tags, words, &self.vocabulary))
    }

    /// Validação cruzada em 10 folds, cada um com um aprendiz novo.
    ///
    /// Não altera o tagger: pesos e vocabulário atuais não participam.
    pub fn crossvalidate(
        &self,
        words: &[String],
        tags: &[String],
        lengths: &[usize],
    ) -> Result<CrossValidation> {
        validate_tagged(words.len(), tags.len(), lengths)?;
        let features = self.static_features(words, lengths)?;
        let bounds = fold_bounds(lengths.len(), crate::config::FOLDS);
        let mapping = self.resources.mapping.as_ref();
        let (beam_size, iterations) = (self.config.beam_size, self.config.iterations);

        let cv = run_folds(lengths.len(), |fold| {
            let (train, test) = split(fold, &bounds, words, &features, tags, lengths);

            let mut learner = StructuredPerceptron::new(beam_size, iterations);
            let train_latent = LatentFeatureExtractor::new(lowercase_index(&train.words), mapping);
            learner.fit(&train.features, &train.tags, &train.lengths, &train_latent)?;

            let test_latent = LatentFeatureExtractor::new(lowercase_index(&test.words), mapping);
            let accuracy = learner.score(&test.features, &test.tags, &test.lengths, &test_latent)?;
            info!(fold, "Accuracy: {:.2}%", accuracy * 100.0);
            Ok(accuracy)
        })?;

        info!(
            "Cross-validation: {:.2}% (±{:.2})",
            cv.mean * 100.0,
            cv.two_stdev * 100.0
        );
        Ok(cv)
    }
}
