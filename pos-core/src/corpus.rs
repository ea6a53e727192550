//! # Corpus Plano: Palavras Concatenadas + Comprimentos
//!
//! As sentenças são armazenadas concatenadas em uma única sequência de palavras,
//! acompanhada da lista de comprimentos. A sentença `i` ocupa a fatia que começa
//! na soma dos comprimentos anteriores.
//!
//! ```text
//! words   = [The, cat, sat, It, purred]
//! lengths = [3, 2]
//! ranges  = [0..3, 3..5]
//! ```

use std::ops::Range;

use crate::error::{Result, TaggerError};

/// Intervalos globais `[início, fim)` de cada sentença.
pub fn sentence_ranges(lengths: &[usize]) -> Vec<Range<usize>> {
    let mut start = 0;
    lengths
        .iter()
        .map(|&length| {
            let range = start..start + length;
            start += length;
            range
        })
        .collect()
}

/// Valida o invariante `sum(lengths) == words.len()` e `lengths[i] >= 1`.
pub fn validate(n_words: usize, lengths: &[usize]) -> Result<()> {
    if let Some(i) = lengths.iter().position(|&l| l == 0) {
        return Err(TaggerError::invalid_corpus(format!("sentence {i} is empty")));
    }
    let total: usize = lengths.iter().sum();
    if total != n_words {
        return Err(TaggerError::invalid_corpus(format!(
            "sentence lengths sum to {total} but there are {n_words} words"
        )));
    }
    Ok(())
}

/// Como [`validate`], exigindo também uma tag por palavra.
pub fn validate_tagged(n_words: usize, n_tags: usize, lengths: &[usize]) -> Result<()> {
    if n_words != n_tags {
        return Err(TaggerError::invalid_corpus(format!(
            "{n_words} words but {n_tags} tags"
        )));
    }
    validate(n_words, lengths)
}

/// Índice de palavras em minúsculas, reconstruído a cada operação.
pub fn lowercase_index(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Pequeno corpus anotado (tags do Penn Treebank) usado nos testes.
#[cfg(test)]
pub(crate) fn sample_corpus() -> (Vec<String>, Vec<String>, Vec<usize>) {
    const SENTENCES: &[&[(&str, &str)]] = &[
        &[("The", "DT"), ("cat", "NN"), ("sat", "VBD"), (".", ".")],
        &[("A", "DT"), ("dog", "NN"), ("barked", "VBD"), (".", ".")],
        &[("The", "DT"), ("dog", "NN"), ("sat", "VBD"), (".", ".")],
        &[("A", "DT"), ("cat", "NN"), ("purred", "VBD"), (".", ".")],
        &[("The", "DT"), ("bird", "NN"), ("sang", "VBD"), (".", ".")],
        &[("A", "DT"), ("bird", "NN"), ("flew", "VBD"), (".", ".")],
        &[("The", "DT"), ("cat", "NN"), ("slept", "VBD"), (".", ".")],
        &[("A", "DT"), ("dog", "NN"), ("ran", "VBD"), (".", ".")],
        &[("The", "DT"), ("bird", "NN"), ("sat", "VBD"), (".", ".")],
        &[("A", "DT"), ("cat", "NN"), ("ran", "VBD"), (".", ".")],
        &[("The", "DT"), ("dog", "NN"), ("slept", "VBD"), (".", ".")],
        &[("A", "DT"), ("bird", "NN"), ("sang", "VBD"), (".", ".")],
    ];

    let mut words = Vec::new();
    let mut tags = Vec::new();
    let mut lengths = Vec::new();
    for sentence in SENTENCES {
        for (word, tag) in sentence.iter() {
            words.push(word.to_string());
            tags.push(tag.to_string());
        }
        lengths.push(sentence.len());
    }
    (words, tags, lengths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_ranges_are_prefix_sums() {
        assert_eq!(sentence_ranges(&[3, 2, 1]), vec![0..3, 3..5, 5..6]);
        assert!(sentence_ranges(&[]).is_empty());
    }

    #[test]
    fn test_validate_rejects_mismatch() {
        assert!(validate(5, &[3, 2]).is_ok());
        assert!(matches!(validate(4, &[3, 2]), Err(TaggerError::InvalidCorpus(_))));
        assert!(matches!(validate(3, &[3, 0]), Err(TaggerError::InvalidCorpus(_))));
        assert!(validate_tagged(5, 4, &[3, 2]).is_err());
    }

    #[test]
    fn test_sample_corpus_is_consistent() {
        let (words, tags, lengths) = sample_corpus();
        assert!(validate_tagged(words.len(), tags.len(), &lengths).is_ok());
        assert_eq!(lengths.len(), 12);
    }
}
