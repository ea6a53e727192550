//! # Erros do Tagger
//!
//! Todas as operações públicas retornam [`Result`], parametrizado por [`TaggerError`].
//! Recursos ausentes (léxico, clusters, vetores) nunca são erro: viram sentinelas
//! (`N/A`, frequência 0) diretamente na extração de features.

use thiserror::Error;

pub type Result<T, E = TaggerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TaggerError {
    /// Mapeamento grosso configurado, mas uma tag do histórico não está nele.
    #[error("tag {tag:?} is missing from the coarse tag mapping")]
    UnknownTag { tag: String },

    /// Entrada inconsistente: soma dos comprimentos, sentença vazia, tags desalinhadas.
    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),

    /// Arquivo de modelo sintaticamente válido mas que viola os invariantes do formato.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("cross-validation needs at least {folds} sentences, found {found}")]
    TooFewSentences { found: usize, folds: usize },

    /// Falha em um fold derruba a validação cruzada inteira.
    #[error("cross-validation fold {fold} failed: {source}")]
    FoldFailed {
        fold: usize,
        #[source]
        source: Box<TaggerError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TaggerError {
    pub(crate) fn invalid_model(msg: impl Into<String>) -> Self {
        Self::InvalidModel(msg.into())
    }

    pub(crate) fn invalid_corpus(msg: impl Into<String>) -> Self {
        Self::InvalidCorpus(msg.into())
    }
}
