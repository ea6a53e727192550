//! # pos-core — Etiquetador Morfossintático com Perceptron Estruturado
//!
//! Este crate implementa um tagger de classes gramaticais (POS) para texto já
//! tokenizado, treinado com um perceptron estruturado médio e decodificado
//! por busca em feixe (beam search).
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: palavras de um corpus plano e o comprimento de cada sentença.
//! 2.  **Classificação de palavras** ([`classifier`]): flags (`isalpha`,
//!     `isurl`, `isemoji`...) e forma ortográfica, com cache LRU.
//! 3.  **Features estáticas** ([`features`]): janela de ±2 palavras, afixos,
//!     forma, flags, clusters Brown, vetores e léxico.
//! 4.  **Features latentes** ([`latent`]): dependem das tags já previstas no
//!     feixe; fornecidas ao aprendiz por [`learner::LatentFeatureSource`].
//! 5.  **Aprendizado/Decodificação** ([`perceptron`]): perceptron médio com
//!     atualização antecipada (early update).
//! 6.  **Saída**: pares (palavra, tag) por sentença, acurácia IV/OOV
//!     ([`evaluation`]) ou validação cruzada em 10 folds ([`crossval`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::{Resources, Tagger, TaggerConfig};
//!
//! let words: Vec<String> = ["The", "cat", "sat", ".", "A", "dog", "ran", "."]
//!     .iter()
//!     .map(|w| w.to_string())
//!     .collect();
//! let tags: Vec<String> = ["DT", "NN", "VBD", ".", "DT", "NN", "VBD", "."]
//!     .iter()
//!     .map(|t| t.to_string())
//!     .collect();
//!
//! let mut tagger = Tagger::new(TaggerConfig::default(), Resources::default());
//! tagger.train(&words, &tags, &[4, 4]).unwrap();
//!
//! let sentence: Vec<String> = ["A", "cat", "sat", "."].iter().map(|w| w.to_string()).collect();
//! for (word, tag) in &tagger.tag(&sentence, &[4]).unwrap()[0] {
//!     println!("{word}/{tag}");
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`tagger`]: orquestrador de treino, etiquetagem, avaliação e persistência.
//! - [`model`]: formato persistido (JSON posicional + zstd + Base85).
//! - [`config`]: parâmetros do tagger e recursos lexicais opcionais.

pub mod base85;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod crossval;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod latent;
pub mod learner;
pub mod model;
pub mod perceptron;
pub mod tagger;

pub use classifier::{WordClassifier, WordFlags};
pub use config::{Resources, TaggerConfig};
pub use crossval::CrossValidation;
pub use error::{Result, TaggerError};
pub use evaluation::Accuracy;
pub use learner::{LatentFeatureSource, StructuredLearner, TargetMapping, Weights};
pub use model::Model;
pub use perceptron::StructuredPerceptron;
pub use tagger::{TaggedSentence, Tagger};
