//! # Perceptron Estruturado Médio com Busca em Beam
//!
//! Implementação de referência do [`StructuredLearner`]. Para cada sentença:
//!
//! 1. Decodifica com busca em beam, pedindo ao [`LatentFeatureSource`] as
//!    features latentes de cada hipótese.
//! 2. **Early update**: se a sequência correta cai fora do beam na posição `i`,
//!    atualiza com os prefixos `0..=i` e passa para a próxima sentença.
//! 3. Caso contrário, se a melhor sequência final estiver errada, atualiza com
//!    a sentença inteira.
//!
//! Usa "Lazy Averaging": o acumulado de um peso só é atualizado quando ele
//! muda, e a média final é calculada uma única vez em `finalize_weights`.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::corpus::{sentence_ranges, validate_tagged};
use crate::error::{Result, TaggerError};
use crate::features::FeatureSet;
use crate::learner::{LatentFeatureSource, StructuredLearner, TargetMapping, Weights};

/// Uma hipótese parcial no beam.
#[derive(Debug, Clone)]
struct Hypothesis {
    tags: Vec<usize>,
    score: f64,
}

/// Perceptron estruturado com média dos pesos.
#[derive(Debug, Clone)]
pub struct StructuredPerceptron {
    beam_size: usize,
    iterations: usize,
    target_mapping: TargetMapping,
    /// Pesos atuais: feature → um peso por tag.
    weights: Weights,
    /// Soma acumulada dos pesos (apenas durante o treino).
    totals: Weights,
    /// Passo da última atualização de cada peso (apenas durante o treino).
    last_update: HashMap<String, Vec<usize>>,
    /// Sentenças processadas no treino atual.
    steps: usize,
}

impl StructuredPerceptron {
    pub fn new(beam_size: usize, iterations: usize) -> Self {
        Self::with_prior(beam_size, iterations, TargetMapping::new(), Weights::new())
    }

    /// Parte de pesos já treinados (ex.: carregados de um modelo salvo).
    pub fn with_prior(
        beam_size: usize,
        iterations: usize,
        target_mapping: TargetMapping,
        weights: Weights,
    ) -> Self {
        Self {
            beam_size: beam_size.max(1),
            iterations,
            target_mapping,
            weights,
            totals: Weights::new(),
            last_update: HashMap::new(),
            steps: 0,
        }
    }

    /// Soma dos pesos das features ativas, por tag.
    fn tag_scores(&self, features: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.target_mapping.len()];
        for feature in features {
            if let Some(weights) = self.weights.get(feature) {
                for (score, w) in scores.iter_mut().zip(weights) {
                    *score += w;
                }
            }
        }
        scores
    }

    fn history(&self, tags: &[usize]) -> Vec<&str> {
        tags.iter()
            .map(|&k| self.target_mapping.tags()[k].as_str())
            .collect()
    }

    /// Busca em beam sobre uma sentença.
    ///
    /// Com `gold`, para assim que a sequência correta sai do beam e devolve o
    /// melhor prefixo até ali (early update).
    fn decode(
        &self,
        features: &[FeatureSet],
        start: usize,
        latent: &dyn LatentFeatureSource,
        gold: Option<&[usize]>,
    ) -> Result<Vec<usize>> {
        let n_tags = self.target_mapping.len();
        let mut beam = vec![Hypothesis {
            tags: Vec::new(),
            score: 0.0,
        }];

        for (i, static_features) in features.iter().enumerate() {
            let static_scores = self.tag_scores(static_features);
            let mut candidates = Vec::with_capacity(beam.len() * n_tags);
            for hypothesis in &beam {
                let latent_features =
                    latent.latent_features(start, &self.history(&hypothesis.tags), i)?;
                let latent_scores = self.tag_scores(&latent_features);
                for k in 0..n_tags {
                    let mut tags = Vec::with_capacity(i + 1);
                    tags.extend_from_slice(&hypothesis.tags);
                    tags.push(k);
                    candidates.push(Hypothesis {
                        tags,
                        score: hypothesis.score + static_scores[k] + latent_scores[k],
                    });
                }
            }
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            candidates.truncate(self.beam_size);
            beam = candidates;

            if let Some(gold) = gold {
                let prefix = &gold[..=i];
                if !beam.iter().any(|h| h.tags == prefix) {
                    return Ok(beam.swap_remove(0).tags);
                }
            }
        }

        Ok(beam.swap_remove(0).tags)
    }

    /// Promove a sequência correta e penaliza a predita, posição a posição.
    fn update(
        &mut self,
        features: &[FeatureSet],
        start: usize,
        latent: &dyn LatentFeatureSource,
        gold: &[usize],
        predicted: &[usize],
    ) -> Result<()> {
        for (i, static_features) in features.iter().enumerate().take(predicted.len()) {
            let gold_latent = latent.latent_features(start, &self.history(&gold[..i]), i)?;
            let predicted_latent =
                latent.latent_features(start, &self.history(&predicted[..i]), i)?;
            for feature in static_features.iter().chain(&gold_latent) {
                self.update_feature(feature, gold[i], 1.0);
            }
            for feature in static_features.iter().chain(&predicted_latent) {
                self.update_feature(feature, predicted[i], -1.0);
            }
        }
        Ok(())
    }

    /// Atualiza um peso aplicando Lazy Averaging.
    fn update_feature(&mut self, feature: &str, tag: usize, delta: f64) {
        let n_tags = self.target_mapping.len();
        let weights = self
            .weights
            .entry(feature.to_string())
            .or_insert_with(|| vec![0.0; n_tags]);
        let totals = self
            .totals
            .entry(feature.to_string())
            .or_insert_with(|| vec![0.0; n_tags]);
        let last_update = self
            .last_update
            .entry(feature.to_string())
            .or_insert_with(|| vec![0; n_tags]);

        // o peso antigo vigorou desde a última atualização até agora
        totals[tag] += (self.steps - last_update[tag]) as f64 * weights[tag];
        last_update[tag] = self.steps;
        weights[tag] += delta;
    }

    fn reset_averaging(&mut self) {
        self.totals.clear();
        self.last_update.clear();
        self.steps = 0;
    }

    /// Passadas de treino sem a média final.
    fn train_passes(
        &mut self,
        features: &[FeatureSet],
        labels: &[String],
        lengths: &[usize],
        latent: &dyn LatentFeatureSource,
    ) -> Result<()> {
        self.reset_averaging();
        let gold: Vec<usize> = labels
            .iter()
            .map(|label| self.target_mapping.insert(label))
            .collect();
        let n_tags = self.target_mapping.len();
        for weights in self.weights.values_mut() {
            weights.resize(n_tags, 0.0);
        }

        let ranges = sentence_ranges(lengths);
        for iteration in 0..self.iterations {
            let mut updates = 0;
            for range in &ranges {
                let sentence_features = &features[range.clone()];
                let sentence_gold = &gold[range.clone()];
                let predicted =
                    self.decode(sentence_features, range.start, latent, Some(sentence_gold))?;
                let gold_prefix = &sentence_gold[..predicted.len()];
                if predicted != gold_prefix {
                    self.update(sentence_features, range.start, latent, gold_prefix, &predicted)?;
                    updates += 1;
                }
                self.steps += 1;
            }
            info!(
                iteration = iteration + 1,
                updates,
                sentences = ranges.len(),
                "perceptron iteration finished"
            );
        }
        Ok(())
    }

    /// Substitui os pesos pelas médias ($\sum w_t / T$).
    fn finalize_weights(&mut self) {
        let steps = self.steps;
        if steps > 0 {
            for (feature, weights) in self.weights.iter_mut() {
                let totals = self.totals.remove(feature);
                let last_update = self.last_update.remove(feature);
                for (k, w) in weights.iter_mut().enumerate() {
                    let total = totals.as_ref().map_or(0.0, |t| t[k]);
                    let last = last_update.as_ref().map_or(0, |l| l[k]);
                    *w = (total + (steps - last) as f64 * *w) / steps as f64;
                }
            }
        }
        self.totals.clear();
        self.last_update.clear();
    }
}

impl StructuredLearner for StructuredPerceptron {
    /// Em caso de erro, pesos e tags voltam ao estado anterior à chamada.
    fn fit(
        &mut self,
        features: &[FeatureSet],
        labels: &[String],
        lengths: &[usize],
        latent: &dyn LatentFeatureSource,
    ) -> Result<()> {
        validate_tagged(features.len(), labels.len(), lengths)?;

        let prior = (self.target_mapping.clone(), self.weights.clone());
        if let Err(e) = self.train_passes(features, labels, lengths, latent) {
            (self.target_mapping, self.weights) = prior;
            self.reset_averaging();
            return Err(e);
        }

        self.finalize_weights();
        debug!(
            features = self.weights.len(),
            tags = self.target_mapping.len(),
            "weights averaged"
        );
        Ok(())
    }

    fn predict(
        &self,
        features: &[FeatureSet],
        lengths: &[usize],
        latent: &dyn LatentFeatureSource,
    ) -> Result<Vec<Vec<String>>> {
        if self.target_mapping.is_empty() {
            return Err(TaggerError::invalid_model("the learner has no tags"));
        }
        let total: usize = lengths.iter().sum();
        if total != features.len() {
            return Err(TaggerError::invalid_corpus(format!(
                "sentence lengths sum to {total} but there are {} feature sets",
                features.len()
            )));
        }

        sentence_ranges(lengths)
            .into_iter()
            .map(|range| -> Result<Vec<String>> {
                let best = self.decode(&features[range.clone()], range.start, latent, None)?;
                Ok(self.history(&best).into_iter().map(String::from).collect())
            })
            .collect()
    }

    fn weights(&self) -> &Weights {
        &self.weights
    }

    fn target_mapping(&self) -> &TargetMapping {
        &self.target_mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::WordClassifier;
    use crate::config::Resources;
    use crate::corpus::{lowercase_index, sample_corpus};
    use crate::features::extract_features;
    use crate::latent::LatentFeatureExtractor;

    /// Falha a partir de uma posição global, como um mapeamento incompleto faria.
    struct FailingFrom<'a> {
        inner: LatentFeatureExtractor<'a>,
        first_failing: usize,
    }

    impl LatentFeatureSource for FailingFrom<'_> {
        fn latent_features(&self, start: usize, beam: &[&str], i: usize) -> Result<FeatureSet> {
            if start + i >= self.first_failing {
                return Err(TaggerError::UnknownTag {
                    tag: "X".to_string(),
                });
            }
            self.inner.latent_features(start, beam, i)
        }
    }

    #[test]
    fn test_perceptron_fits_training_data() {
        let (words, tags, lengths) = sample_corpus();
        let classifier = WordClassifier::default();
        let features =
            extract_features(&words, &lengths, &classifier, &Resources::default()).unwrap();
        let latent = LatentFeatureExtractor::new(lowercase_index(&words), None);

        let mut model = StructuredPerceptron::new(3, 10);
        model.fit(&features, &tags, &lengths, &latent).unwrap();

        assert_eq!(model.target_size(), 4);
        assert!(model.weights().values().all(|w| w.len() == 4));
        let accuracy = model.score(&features, &tags, &lengths, &latent).unwrap();
        assert!(accuracy >= 0.95, "training accuracy {accuracy}");
    }

    #[test]
    fn test_predict_returns_one_tag_per_token() {
        let (words, tags, lengths) = sample_corpus();
        let classifier = WordClassifier::default();
        let features =
            extract_features(&words, &lengths, &classifier, &Resources::default()).unwrap();
        let latent = LatentFeatureExtractor::new(lowercase_index(&words), None);
        let mut model = StructuredPerceptron::new(3, 10);
        model.fit(&features, &tags, &lengths, &latent).unwrap();

        let test_words: Vec<String> = ["A", "bird", "sat", "."]
            .iter()
            .map(|w| w.to_string())
            .collect();
        let test_features =
            extract_features(&test_words, &[4], &classifier, &Resources::default()).unwrap();
        let test_latent = LatentFeatureExtractor::new(lowercase_index(&test_words), None);
        let predicted = model.predict(&test_features, &[4], &test_latent).unwrap();

        assert_eq!(predicted, vec![vec!["DT", "NN", "VBD", "."]]);
    }

    #[test]
    fn test_untrained_model_cannot_predict() {
        let model = StructuredPerceptron::new(3, 1);
        let latent = LatentFeatureExtractor::new(vec!["a".to_string()], None);
        let features = vec![vec!["bias".to_string()]];
        assert!(matches!(
            model.predict(&features, &[1], &latent),
            Err(TaggerError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_lazy_averaging_matches_explicit_average() {
        let mut model = StructuredPerceptron::new(1, 1);
        model.target_mapping.insert("A");
        model.target_mapping.insert("B");
        // passo 0: +1; passos 1 e 2 sem mudança; passo 3: +1
        model.update_feature("f", 0, 1.0);
        model.steps = 3;
        model.update_feature("f", 0, 1.0);
        model.steps = 4;
        model.finalize_weights();
        // pesos por passo: 1, 1, 1, 2 → média 1.25
        assert_eq!(model.weights()["f"], vec![1.25, 0.0]);
    }

    #[test]
    fn test_failed_fit_restores_previous_state() {
        let (words, tags, lengths) = sample_corpus();
        let classifier = WordClassifier::default();
        let features =
            extract_features(&words, &lengths, &classifier, &Resources::default()).unwrap();
        let latent = LatentFeatureExtractor::new(lowercase_index(&words), None);

        let mut model = StructuredPerceptron::new(3, 5);
        model.fit(&features, &tags, &lengths, &latent).unwrap();
        let weights = model.weights().clone();
        let target_mapping = model.target_mapping().clone();

        // tag nova e falha na terceira sentença
        let mut new_tags = tags.clone();
        new_tags[1] = "NNS".to_string();
        let failing = FailingFrom {
            inner: LatentFeatureExtractor::new(lowercase_index(&words), None),
            first_failing: 8,
        };
        assert!(matches!(
            model.fit(&features, &new_tags, &lengths, &failing),
            Err(TaggerError::UnknownTag { .. })
        ));
        assert_eq!(model.weights(), &weights);
        assert_eq!(model.target_mapping(), &target_mapping);
        assert!(model.totals.is_empty());
        assert!(model.last_update.is_empty());
        assert_eq!(model.steps, 0);

        model.fit(&features, &tags, &lengths, &latent).unwrap();
        assert_eq!(model.target_size(), 4);
        assert!(model.weights().values().all(|w| w.len() == 4));
        let accuracy = model.score(&features, &tags, &lengths, &latent).unwrap();
        assert!(accuracy >= 0.95, "training accuracy {accuracy}");
    }
}
