//! # Features Estáticas por Token
//!
//! Para cada token, gera a lista de features de superfície que não dependem de
//! nenhuma tag: identidade da palavra, afixos, forma, flags lexicais e, se
//! fornecidos, clusters de Brown, vetores e léxico.
//!
//! ## Janela
//!
//! Cada sentença é vista com duas sentinelas de cada lado:
//!
//! ```text
//! <START-2> <START-1> the cat sat <END+1> <END+2>
//!                     P2  P1  W   N1      N2
//! ```
//!
//! Assim nenhum acesso a vizinho sai dos limites. Features de vizinhos que
//! cairiam numa sentinela (sufixo, flags, cluster) simplesmente não são emitidas.
//!
//! Buscas (palavra, léxico, clusters, vetores) usam a forma minúscula;
//! afixos, forma e flags usam a grafia original.

use crate::classifier::WordClassifier;
use crate::config::{Resources, END_1, END_2, START_1, START_2};
use crate::corpus::{sentence_ranges, validate};
use crate::error::Result;

/// Features de um token: apenas nomes, a presença é o sinal.
pub type FeatureSet = Vec<String>;

const AFFIX_LENGTH: usize = 3;
const NOT_AVAILABLE: &str = "N/A";

/// Gera as features estáticas de todas as palavras, sentença a sentença.
///
/// O resultado é alinhado com `words`: o índice `i` corresponde à palavra `i`.
/// Comprimentos inconsistentes com `words` são rejeitados antes de qualquer extração.
pub fn extract_features(
    words: &[String],
    lengths: &[usize],
    classifier: &WordClassifier,
    resources: &Resources,
) -> Result<Vec<FeatureSet>> {
    validate(words.len(), lengths)?;
    let mut features = Vec::with_capacity(words.len());
    for range in sentence_ranges(lengths) {
        let sentence = &words[range];
        let padded = padded_lowercase(sentence);
        for i in 0..sentence.len() {
            features.push(extract_for_token(sentence, &padded, i, classifier, resources));
        }
    }
    Ok(features)
}

/// Visão minúscula da sentença com duas sentinelas de cada lado.
fn padded_lowercase(sentence: &[String]) -> Vec<String> {
    let mut padded = Vec::with_capacity(sentence.len() + 4);
    padded.push(START_2.to_string());
    padded.push(START_1.to_string());
    padded.extend(sentence.iter().map(|w| w.to_lowercase()));
    padded.push(END_1.to_string());
    padded.push(END_2.to_string());
    padded
}

/// Extrai as features do token `i` (índice local na sentença).
fn extract_for_token(
    sentence: &[String],
    padded: &[String],
    i: usize,
    classifier: &WordClassifier,
    resources: &Resources,
) -> FeatureSet {
    let length = sentence.len();
    let j = i + 2;
    let word = &sentence[i];
    let (p2, p1, w, n1, n2) = (
        &padded[j - 2],
        &padded[j - 1],
        &padded[j],
        &padded[j + 1],
        &padded[j + 2],
    );
    let has_p1 = i >= 1;
    let has_p2 = i >= 2;
    let has_n1 = length - i > 1;
    let has_n2 = length - i > 2;

    let mut fs = FeatureSet::new();

    // Viés constante, funciona como prior
    fs.push("bias".to_string());
    fs.push(format!("W_loglength: {}", log_length(word)));

    fs.push(format!("W_word: {w}"));
    fs.push(format!("N1_word: {n1}"));
    fs.push(format!("N2_word: {n2}"));

    fs.push(format!("W_prefix: {}", prefix(word, AFFIX_LENGTH)));
    fs.push(format!("W_suffix: {}", suffix(word, AFFIX_LENGTH)));
    if has_p1 {
        fs.push(format!("P1_suffix: {}", suffix(&sentence[i - 1], AFFIX_LENGTH)));
    }
    if has_n1 {
        fs.push(format!("N1_suffix: {}", suffix(&sentence[i + 1], AFFIX_LENGTH)));
    }

    fs.push(format!("W_shape: {}", classifier.shape(word)));

    // Flags lexicais da janela
    if has_p2 {
        fs.extend(classifier.flag_features(&sentence[i - 2], "P2"));
    }
    if has_p1 {
        fs.extend(classifier.flag_features(&sentence[i - 1], "P1"));
    }
    fs.extend(classifier.flag_features(word, "W"));
    if has_n1 {
        fs.extend(classifier.flag_features(&sentence[i + 1], "N1"));
    }
    if has_n2 {
        fs.extend(classifier.flag_features(&sentence[i + 2], "N2"));
    }

    if let Some(clusters) = &resources.brown_clusters {
        let lookup = |key: &str| {
            clusters
                .get(key)
                .map(|(cluster, freq)| (cluster.as_str(), *freq))
                .unwrap_or((NOT_AVAILABLE, 0))
        };
        if has_p2 {
            fs.push(format!("P2_brown: {}", lookup(p2.as_str()).0));
        }
        if has_p1 {
            fs.push(format!("P1_brown: {}", lookup(p1.as_str()).0));
        }
        let (cluster, freq) = lookup(w.as_str());
        fs.push(format!("W_brown: {cluster}"));
        fs.push(format!("W_logfreq: {freq}"));
        if has_n1 {
            fs.push(format!("N1_brown: {}", lookup(n1.as_str()).0));
        }
        if has_n2 {
            fs.push(format!("N2_brown: {}", lookup(n2.as_str()).0));
        }
    }

    if let Some(vector) = resources.word_to_vec.as_ref().and_then(|table| table.get(w)) {
        fs.push(format!("W_w2v: {vector}"));
    }

    if let Some(lexicon) = &resources.lexicon {
        match lexicon.get(w) {
            Some(entries) => fs.extend(entries.iter().map(|e| format!("W_lex: {e}"))),
            None => fs.push(format!("W_lex: {NOT_AVAILABLE}")),
        }
    }

    fs
}

/// `round(ln(len))`, com o comprimento em caracteres (palavra vazia conta como 1).
fn log_length(word: &str) -> i64 {
    let length = word.chars().count().max(1) as f64;
    length.ln().round() as i64
}

fn prefix(word: &str, n: usize) -> String {
    word.chars().take(n).collect()
}

fn suffix(word: &str, n: usize) -> String {
    let count = word.chars().count();
    word.chars().skip(count.saturating_sub(n)).collect()
}
