//! # Avaliação: Acurácia Geral, IV e OOV
//!
//! Cada token conta para o total geral e para exatamente uma das categorias:
//! dentro do vocabulário de treino (IV) ou fora dele (OOV).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Acurácias por token. Categorias sem nenhum token valem 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub overall: f64,
    pub in_vocabulary: f64,
    pub out_of_vocabulary: f64,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}% (IV: {:.2}%, OOV: {:.2}%)",
            self.overall * 100.0,
            self.in_vocabulary * 100.0,
            self.out_of_vocabulary * 100.0
        )
    }
}

#[derive(Debug, Default)]
struct Counts {
    correct: usize,
    total: usize,
}

impl Counts {
    fn add(&mut self, is_correct: bool) {
        self.total += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Compara predição e referência token a token.
///
/// `predicted`, `gold` e `words` são sequências planas alinhadas; se tiverem
/// tamanhos diferentes, apenas o prefixo comum é avaliado.
pub fn evaluate<P, G>(
    predicted: &[P],
    gold: &[G],
    words: &[String],
    vocabulary: &HashSet<String>,
) -> Accuracy
where
    P: AsRef<str>,
    G: AsRef<str>,
{
    let mut overall = Counts::default();
    let mut iv = Counts::default();
    let mut oov = Counts::default();

    for ((p, g), word) in predicted.iter().zip(gold).zip(words) {
        let is_correct = p.as_ref() == g.as_ref();
        overall.add(is_correct);
        if vocabulary.contains(word) {
            iv.add(is_correct);
        } else {
            oov.add(is_correct);
        }
    }

    Accuracy {
        overall: overall.ratio(),
        in_vocabulary: iv.ratio(),
        out_of_vocabulary: oov.ratio(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_iv_and_oov_split() {
        let vocabulary: HashSet<String> = strings(&["the", "cat"]).into_iter().collect();
        let words = strings(&["the", "cat", "meowed", "loudly"]);
        let gold = ["DT", "NN", "VBD", "RB"];
        let predicted = ["DT", "VB", "VBD", "JJ"];

        let accuracy = evaluate(&predicted, &gold, &words, &vocabulary);
        assert_eq!(accuracy.overall, 0.5);
        assert_eq!(accuracy.in_vocabulary, 0.5);
        assert_eq!(accuracy.out_of_vocabulary, 0.5);
    }

    #[test]
    fn test_no_oov_tokens_gives_zero() {
        let vocabulary: HashSet<String> = strings(&["the", "cat"]).into_iter().collect();
        let words = strings(&["the", "cat"]);
        let accuracy = evaluate(&["DT", "NN"], &["DT", "NN"], &words, &vocabulary);
        assert_eq!(accuracy.overall, 1.0);
        assert_eq!(accuracy.in_vocabulary, 1.0);
        assert_eq!(accuracy.out_of_vocabulary, 0.0);
    }

    #[test]
    fn test_vocabulary_lookup_is_case_sensitive() {
        let vocabulary: HashSet<String> = strings(&["The"]).into_iter().collect();
        let words = strings(&["the"]);
        let accuracy = evaluate(&["DT"], &["DT"], &words, &vocabulary);
        assert_eq!(accuracy.in_vocabulary, 0.0);
        assert_eq!(accuracy.out_of_vocabulary, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let accuracy = evaluate::<&str, &str>(&[], &[], &[], &HashSet::new());
        assert_eq!(accuracy.overall, 0.0);
    }
}
