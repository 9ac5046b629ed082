//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas do pgboost
//! e do alocador de referência.

/// Erros do pgboost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgboostError {
    /// Plataforma não reporta exatamente dois ranks
    UnsupportedRanks,
    /// Mais de uma zona populada
    MultiZone,
    /// Tamanho de lote ou contagem de tentativas inválidos
    InvalidBatch,
    /// Parâmetro inválido
    InvalidParameter,
    /// Nome de parâmetro desconhecido
    UnknownParam,
    /// Classe de migração não suportada pela operação
    InvalidMigrateType,
    /// Sem memória para estruturas de controle
    OutOfMemory,
    /// Motor desabilitado ou desligado
    NotReady,
    /// Bloco fora da zona ou desalinhado
    InvalidAddress,
}

impl PgboostError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedRanks => "plataforma não reporta exatamente 2 ranks",
            Self::MultiZone => "configuração com múltiplas zonas não suportada",
            Self::InvalidBatch => "lote ou tentativas inválidos",
            Self::InvalidParameter => "Parâmetro inválido",
            Self::UnknownParam => "Parâmetro desconhecido",
            Self::InvalidMigrateType => "migrate type não suportado",
            Self::OutOfMemory => "OOM: sem memória para estruturas de controle",
            Self::NotReady => "pgboost não inicializado",
            Self::InvalidAddress => "Endereço inválido",
        }
    }
}

impl core::fmt::Display for PgboostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico do pgboost
pub type PgboostResult<T> = Result<T, PgboostError>;
