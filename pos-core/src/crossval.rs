//! # Validação Cruzada em 10 Folds
//!
//! As sentenças são divididas em folds contíguos de tamanho quase igual:
//!
//! ```text
//! N = 23 → divmod(23, 10) = (2, 3)
//! folds 0..3  → 3 sentenças cada
//! folds 3..10 → 2 sentenças cada
//! ```
//!
//! Cada fold é um job independente no pool do Rayon: treina um modelo novo nos
//! outros nove folds e mede a acurácia no fold separado. Nenhum estado mutável
//! é compartilhado entre jobs; o erro de qualquer fold aborta a execução toda.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::FOLDS;
use crate::corpus::sentence_ranges;
use crate::error::{Result, TaggerError};
use crate::features::FeatureSet;

/// Intervalo de sentenças (não de palavras) de cada fold.
pub fn fold_bounds(n_sentences: usize, folds: usize) -> Vec<Range<usize>> {
    let (div, rem) = (n_sentences / folds, n_sentences % folds);
    (0..folds)
        .map(|k| k * div + k.min(rem)..(k + 1) * div + (k + 1).min(rem))
        .collect()
}

/// Dados de um lado (treino ou teste) de um fold.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub words: Vec<String>,
    pub features: Vec<FeatureSet>,
    pub tags: Vec<String>,
    pub lengths: Vec<usize>,
}

impl Partition {
    fn extend_from(
        &mut self,
        words: &[String],
        features: &[FeatureSet],
        tags: &[String],
        word_range: Range<usize>,
        lengths: &[usize],
    ) {
        self.words.extend_from_slice(&words[word_range.clone()]);
        self.features.extend_from_slice(&features[word_range.clone()]);
        self.tags.extend_from_slice(&tags[word_range]);
        self.lengths.extend_from_slice(lengths);
    }
}

/// Separa o fold `fold` (teste) do restante (treino).
pub fn split(
    fold: usize,
    bounds: &[Range<usize>],
    words: &[String],
    features: &[FeatureSet],
    tags: &[String],
    lengths: &[usize],
) -> (Partition, Partition) {
    let ranges = sentence_ranges(lengths);
    let held_out = bounds[fold].clone();
    let test_start = ranges.get(held_out.start).map_or(words.len(), |r| r.start);
    let test_end = if held_out.is_empty() {
        test_start
    } else {
        ranges[held_out.end - 1].end
    };

    let mut train = Partition::default();
    let mut test = Partition::default();
    train.extend_from(words, features, tags, 0..test_start, &lengths[..held_out.start]);
    test.extend_from(words, features, tags, test_start..test_end, &lengths[held_out.clone()]);
    train.extend_from(
        words,
        features,
        tags,
        test_end..words.len(),
        &lengths[held_out.end..],
    );
    (train, test)
}

/// Média e duas vezes o desvio-padrão amostral das acurácias.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub mean: f64,
    pub two_stdev: f64,
}

impl CrossValidation {
    pub fn from_accuracies(accuracies: &[f64]) -> Self {
        let n = accuracies.len() as f64;
        let mean = accuracies.iter().sum::<f64>() / n;
        let variance = if accuracies.len() > 1 {
            accuracies.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        Self {
            mean,
            two_stdev: 2.0 * variance.sqrt(),
        }
    }
}

/// Executa os [`FOLDS`] jobs em paralelo e espera todos terminarem.
///
/// `job` recebe o índice do fold e devolve a acurácia no fold separado.
pub fn run_folds<F>(n_sentences: usize, job: F) -> Result<CrossValidation>
where
    F: Fn(usize) -> Result<f64> + Sync,
{
    if n_sentences < FOLDS {
        return Err(TaggerError::TooFewSentences {
            found: n_sentences,
            folds: FOLDS,
        });
    }
    let accuracies = (0..FOLDS)
        .into_par_iter()
        .map(|fold| {
            job(fold).map_err(|e| TaggerError::FoldFailed {
                fold,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(CrossValidation::from_accuracies(&accuracies))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_sizes_for_23_sentences() {
        let sizes: Vec<usize> = fold_bounds(23, 10).iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 2, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_folds_partition_every_n() {
        for n in 0..200 {
            let bounds = fold_bounds(n, 10);
            let sizes: Vec<usize> = bounds.iter().map(|r| r.len()).collect();
            assert_eq!(sizes.iter().sum::<usize>(), n);
            let max = sizes.iter().max().unwrap();
            let min = sizes.iter().min().unwrap();
            assert!(max - min <= 1);
            assert_eq!(bounds[0].start, 0);
            assert_eq!(bounds[9].end, n);
            assert!(bounds.windows(2).all(|w| w[0].end == w[1].start));
        }
    }

    #[test]
    fn test_split_keeps_sentences_contiguous() {
        let words: Vec<String> = "a b c d e f".split(' ').map(String::from).collect();
        let tags: Vec<String> = "A B C D E F".split(' ').map(String::from).collect();
        let features: Vec<FeatureSet> = words.iter().map(|w| vec![w.clone()]).collect();
        // sentenças: [a b] [c] [d e f]
        let lengths = [2, 1, 3];
        let bounds = vec![0..1, 1..2, 2..3];

        let (train, test) = split(1, &bounds, &words, &features, &tags, &lengths);
        assert_eq!(test.words, vec!["c"]);
        assert_eq!(test.lengths, vec![1]);
        assert_eq!(train.words, vec!["a", "b", "d", "e", "f"]);
        assert_eq!(train.tags, vec!["A", "B", "D", "E", "F"]);
        assert_eq!(train.lengths, vec![2, 3]);
        assert_eq!(train.features.len(), 5);
    }

    #[test]
    fn test_summary_statistics() {
        let cv = CrossValidation::from_accuracies(&[0.8, 0.9, 1.0]);
        assert!((cv.mean - 0.9).abs() < 1e-12);
        assert!((cv.two_stdev - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_run_folds_collects_every_fold() {
        let cv = run_folds(10, |fold| Ok(if fold % 2 == 0 { 1.0 } else { 0.5 })).unwrap();
        assert!((cv.mean - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_failing_fold_aborts_the_run() {
        let result = run_folds(10, |fold| {
            if fold == 7 {
                Err(TaggerError::invalid_corpus("broken fold"))
            } else {
                Ok(1.0)
            }
        });
        assert!(matches!(result, Err(TaggerError::FoldFailed { fold: 7, .. })));
    }

    #[test]
    fn test_too_few_sentences() {
        assert!(matches!(
            run_folds(9, |_| Ok(1.0)),
            Err(TaggerError::TooFewSentences { found: 9, folds: 10 })
        ));
    }
}
