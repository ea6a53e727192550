//! # Classificador Lexical: Flags por Regex e Forma da Palavra
//!
//! Cada token é testado contra um conjunto fixo de predicados independentes
//! (e-mail, URL, menção, hashtag, emoticon, número...). Os predicados não são
//! mutuamente exclusivos: `":-)"` é ao mesmo tempo emoticon e pontuação.
//!
//! ## Forma da palavra
//!
//! ```text
//! "Rio-2016"  → "Xxx-dddd"
//! "!!!!!!"    → "!!!"        (runs com mais de 3 repetições são cortados)
//! 100+ chars  → "LONG"
//! ```
//!
//! Os padrões são compilados uma única vez; os resultados de `classify` e
//! `shape` ficam em caches LRU limitados, um por instância.

use std::num::NonZeroUsize;
use std::sync::{LazyLock, Mutex, PoisonError};

use bitflags::bitflags;
use lru::LruCache;
use regex::Regex;

/// Palavras com esse número de caracteres (ou mais) viram `LONG`.
const LONG_WORD: usize = 100;
/// Máximo de repetições consecutivas de um mesmo caractere de forma.
const MAX_RUN: usize = 3;

bitflags! {
    /// Flags lexicais de um token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WordFlags: u16 {
        const ALPHA = 1 << 0;
        const NUMERIC = 1 << 1;
        const LOWER = 1 << 2;
        const UPPER = 1 << 3;
        const TITLE = 1 << 4;
        const EMAIL = 1 << 5;
        const TAG = 1 << 6;
        const URL = 1 << 7;
        const MENTION = 1 << 8;
        const HASHTAG = 1 << 9;
        const ACTION_WORD = 1 << 10;
        const EMOTICON = 1 << 11;
        const EMOJI = 1 << 12;
        const PUNCT = 1 << 13;
        const ORDINAL = 1 << 14;
        const NUMBER = 1 << 15;
    }
}

/// Nome de cada flag na ordem em que as features são emitidas.
const FLAG_NAMES: [(WordFlags, &str); 16] = [
    (WordFlags::ALPHA, "isalpha"),
    (WordFlags::NUMERIC, "isnumeric"),
    (WordFlags::LOWER, "islower"),
    (WordFlags::UPPER, "isupper"),
    (WordFlags::TITLE, "istitle"),
    (WordFlags::EMAIL, "isemail"),
    (WordFlags::TAG, "istag"),
    (WordFlags::URL, "isurl"),
    (WordFlags::MENTION, "ismention"),
    (WordFlags::HASHTAG, "ishashtag"),
    (WordFlags::ACTION_WORD, "isactword"),
    (WordFlags::EMOTICON, "isemoticon"),
    (WordFlags::EMOJI, "isemoji"),
    (WordFlags::PUNCT, "ispunct"),
    (WordFlags::ORDINAL, "isordinal"),
    (WordFlags::NUMBER, "isnumber"),
];

impl WordFlags {
    /// Nomes das flags ativas (`isalpha`, `islower`, ...).
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        FLAG_NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

/// Emoticons fixos que não seguem o padrão olhos-nariz-boca.
const EMOTICONS: &[&str] = &[
    "(-.-)", "(T_T)", "(♥_♥)", ")':", ")-:", "(-:", ")=", ")o:", ")x", ":'C", ":/", ":<", ":C",
    ":[", "=(", "=)", "=D", "=P", ">:", "D':", "D:", r"\:", "]:", "x(", "^^", "o.O", "oO",
    r"\O/", r"\m/", ":;))", "_))", "*_*", "._.", ":wink:", ">_<", "*<:-)", ":!:", ":;-))",
];

/// Padrões compilados, compartilhados (somente leitura) por todos os classificadores.
struct Patterns {
    rules: Vec<(WordFlags, Regex)>,
    number: Regex,
    digit_ahead: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| {
    let mut emoticons: Vec<&str> = EMOTICONS.to_vec();
    emoticons.sort_by_key(|e| std::cmp::Reverse(e.chars().count()));
    let emoticon_list = emoticons
        .iter()
        .map(|e| regex::escape(e))
        .collect::<Vec<_>>()
        .join("|");

    let rules = [
        // só letras (L*): numerais romanos e marcas combinantes ficam de fora
        (WordFlags::ALPHA, r"^\p{L}+$".to_string()),
        (
            WordFlags::EMAIL,
            r"(?i)^[\w.%+-]+(?:@| \[?at\]? )[\w.-]+(?:\.| \[?dot\]? )\p{Alphabetic}{2,}$".to_string(),
        ),
        (WordFlags::TAG, r"^</?[^>]+>$".to_string()),
        (
            WordFlags::URL,
            r"(?i)^(?:(?:(?:https?|ftp|svn)://|(?:https?://)?www\.).+|[\w./-]+\.(?:de|com|org|net|edu|info|jpg|png|gif|log|txt)(?:-\w+)?)$"
                .to_string(),
        ),
        (WordFlags::MENTION, r"^@\w+$".to_string()),
        (WordFlags::HASHTAG, r"^#\w+$".to_string()),
        (WordFlags::ACTION_WORD, r"^[*+][^*]+[*]$".to_string()),
        (
            WordFlags::EMOTICON,
            format!(
                r"^(?:[:;8][-'oO]?(?:\)+|\(+|\*|D+|P+|p+)|xD+|XD+|[:;] +[()]|\^3|{emoticon_list})$"
            ),
        ),
        (
            WordFlags::EMOJI,
            r"^[\x{2600}-\x{27BF}\x{1F300}-\x{1F64F}\x{1F680}-\x{1F6FF}\x{1F900}-\x{1F9FF}]$"
                .to_string(),
        ),
        (
            WordFlags::PUNCT,
            r#"^[\](){}.!?…<>%‰€$£₤¥°@~*„“”‚‘"'`´»«›‹,;:/+=&§#\^−–\-]+$"#.to_string(),
        ),
        (WordFlags::ORDINAL, r"^(?:\d+\.)+$".to_string()),
    ];

    Patterns {
        rules: rules
            .into_iter()
            .map(|(flag, pattern)| (flag, Regex::new(&pattern).expect("static lexical pattern")))
            .collect(),
        number: Regex::new(r"^(?:[−+-]?\d*[.,]?\d+(?:[eE][−+-]?\d+)?|\d+[\d.,]*\d+)")
            .expect("static number pattern"),
        digit_ahead: Regex::new(r"^[.,]?\d").expect("static number pattern"),
    }
});

/// Classificador lexical com caches LRU limitados.
///
/// Seguro para uso compartilhado (`&self`): os caches ficam atrás de um `Mutex`.
pub struct WordClassifier {
    flags: Mutex<LruCache<String, WordFlags>>,
    shapes: Mutex<LruCache<String, String>>,
}

impl WordClassifier {
    pub fn new(cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            flags: Mutex::new(LruCache::new(capacity)),
            shapes: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Avalia todas as flags de `word` (memoizado).
    pub fn classify(&self, word: &str) -> WordFlags {
        let mut cache = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flags) = cache.get(word) {
            return *flags;
        }
        let flags = classify_uncached(word);
        cache.put(word.to_string(), flags);
        flags
    }

    /// Forma canônica de `word` (memoizada).
    pub fn shape(&self, word: &str) -> String {
        let mut cache = self.shapes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(shape) = cache.get(word) {
            return shape.clone();
        }
        let shape = word_shape(word);
        cache.put(word.to_string(), shape.clone());
        shape
    }

    /// Features de flag prefixadas pela posição, ex.: `P1_isnumber`.
    pub fn flag_features(&self, word: &str, position: &str) -> Vec<String> {
        self.classify(word)
            .names()
            .map(|name| format!("{position}_{name}"))
            .collect()
    }
}

impl Default for WordClassifier {
    fn default() -> Self {
        Self::new(10_240)
    }
}

fn classify_uncached(word: &str) -> WordFlags {
    let mut flags = WordFlags::empty();
    flags.set(WordFlags::NUMERIC, !word.is_empty() && word.chars().all(char::is_numeric));
    flags.set(WordFlags::LOWER, is_lower(word));
    flags.set(WordFlags::UPPER, is_upper(word));
    flags.set(WordFlags::TITLE, is_title(word));
    for (flag, pattern) in &PATTERNS.rules {
        if pattern.is_match(word) {
            flags.insert(*flag);
        }
    }
    flags.set(WordFlags::NUMBER, contains_number(word));
    flags
}

fn is_cased(c: char) -> bool {
    c.is_uppercase() || c.is_lowercase()
}

fn is_lower(word: &str) -> bool {
    word.chars().any(is_cased) && !word.chars().any(char::is_uppercase)
}

fn is_upper(word: &str) -> bool {
    word.chars().any(is_cased) && !word.chars().any(char::is_lowercase)
}

/// Maiúsculas só após caracteres sem caixa, minúsculas só após caracteres com caixa.
fn is_title(word: &str) -> bool {
    let mut previous_cased = false;
    let mut seen_cased = false;
    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            seen_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            seen_cased = true;
        } else {
            previous_cased = false;
        }
    }
    seen_cased
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Procura um número em qualquer ponto da palavra, desde que não esteja colado
/// a um caractere de palavra à esquerda nem seguido de outro dígito à direita.
fn contains_number(word: &str) -> bool {
    let mut previous: Option<char> = None;
    for (start, c) in word.char_indices() {
        if !previous.is_some_and(is_word_char) {
            if let Some(m) = PATTERNS.number.find(&word[start..]) {
                let rest = &word[start + m.end()..];
                if !PATTERNS.digit_ahead.is_match(rest) {
                    return true;
                }
            }
        }
        previous = Some(c);
    }
    false
}

/// Forma canônica: `X` maiúscula, `x` minúscula, `d` dígito, demais caracteres literais.
pub fn word_shape(word: &str) -> String {
    if word.chars().count() >= LONG_WORD {
        return "LONG".to_string();
    }
    let mut shape = String::with_capacity(word.len());
    let mut last = None;
    let mut run = 0;
    for c in word.chars() {
        let shape_char = if c.is_alphabetic() {
            if c.is_uppercase() {
                'X'
            } else {
                'x'
            }
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };
        if last == Some(shape_char) {
            run += 1;
        } else {
            run = 0;
            last = Some(shape_char);
        }
        if run < MAX_RUN {
            shape.push(shape_char);
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(word: &str) -> WordFlags {
        WordClassifier::new(16).classify(word)
    }

    #[test]
    fn test_email_is_not_url() {
        let f = flags("don@mail.com");
        assert!(f.contains(WordFlags::EMAIL));
        assert!(!f.contains(WordFlags::URL));
    }

    #[test]
    fn test_social_media_tokens() {
        assert!(flags(":-)").contains(WordFlags::EMOTICON));
        assert!(flags(":-)").contains(WordFlags::PUNCT));
        assert!(flags("#nlp").contains(WordFlags::HASHTAG));
        assert!(flags("@user_1").contains(WordFlags::MENTION));
        assert!(flags("*lacht*").contains(WordFlags::ACTION_WORD));
        assert!(flags("xDDD").contains(WordFlags::EMOTICON));
        assert!(flags(r"\O/").contains(WordFlags::EMOTICON));
        assert!(flags("☺").contains(WordFlags::EMOJI));
        assert!(flags("</p>").contains(WordFlags::TAG));
        assert!(flags("http://example.org/x").contains(WordFlags::URL));
        assert!(flags("www.uni-potsdam.de").contains(WordFlags::URL));
    }

    #[test]
    fn test_numbers_and_ordinals() {
        let pi = flags("3.14");
        assert!(pi.contains(WordFlags::NUMBER));
        assert!(!pi.contains(WordFlags::ORDINAL));

        assert!(flags("12.").contains(WordFlags::ORDINAL));
        assert!(flags("1,000").contains(WordFlags::NUMBER));
        assert!(flags("-2e10").contains(WordFlags::NUMBER));
        assert!(!flags("abc3").contains(WordFlags::NUMBER));
        assert!(!flags("cat").contains(WordFlags::NUMBER));
    }

    #[test]
    fn test_string_predicates() {
        let title = flags("Potsdam");
        assert!(title.contains(WordFlags::ALPHA | WordFlags::TITLE));
        assert!(!title.contains(WordFlags::LOWER));

        let upper = flags("NASA");
        assert!(upper.contains(WordFlags::UPPER));
        assert!(!upper.contains(WordFlags::TITLE));

        assert!(flags("cat").contains(WordFlags::LOWER));
        assert!(flags("42").contains(WordFlags::NUMERIC));
        assert!(!flags("").contains(WordFlags::ALPHA));
    }

    #[test]
    fn test_alpha_means_letters_only() {
        assert!(flags("ação").contains(WordFlags::ALPHA));
        assert!(flags("Straße").contains(WordFlags::ALPHA));
        assert!(flags("ʰ").contains(WordFlags::ALPHA));

        let roman = flags("Ⅻ");
        assert!(!roman.contains(WordFlags::ALPHA));
        assert!(roman.contains(WordFlags::NUMERIC));
        // sinais vocálicos e virama são marcas, não letras
        assert!(!flags("नमस्ते").contains(WordFlags::ALPHA));
        assert!(!flags("cat3").contains(WordFlags::ALPHA));
    }

    #[test]
    fn test_flag_features_are_prefixed_in_order() {
        let classifier = WordClassifier::new(16);
        let features = classifier.flag_features("cat", "N1");
        assert_eq!(features, vec!["N1_isalpha", "N1_islower"]);
    }

    #[test]
    fn test_shape() {
        assert_eq!(word_shape("Rio-2016"), "Xxx-dddd");
        assert_eq!(word_shape("!!!!!!"), "!!!");
        assert_eq!(word_shape("aaaaBBBB"), "xxxXXX");
        assert_eq!(word_shape(&"a".repeat(100)), "LONG");
        assert_eq!(word_shape(&"ab".repeat(49)), "xxx");
    }

    #[test]
    fn test_shape_never_repeats_more_than_three() {
        for word in ["Heeeeeeey", "1000000", "?!?!????", "ÄÄÄÄÄ", "ok......."] {
            let shape = word_shape(word);
            let chars: Vec<char> = shape.chars().collect();
            assert!(
                chars.windows(4).all(|w| !(w[0] == w[1] && w[1] == w[2] && w[2] == w[3])),
                "{word} -> {shape}"
            );
        }
    }

    #[test]
    fn test_cache_is_bounded() {
        let classifier = WordClassifier::new(2);
        for word in ["a", "b", "c", "d"] {
            classifier.classify(word);
            classifier.shape(word);
        }
        assert_eq!(classifier.flags.lock().unwrap().len(), 2);
        assert_eq!(classifier.shapes.lock().unwrap().len(), 2);
        assert_eq!(classifier.shape("Ab"), "Xx");
    }
}
