use thiserror::Error;

use crate::core::types::ActorId;

#[derive(Error, Debug)]
pub enum DelveError {
    #[error("Actor not found: {0}")]
    UnknownActor(ActorId),

    #[error("Loot seed was already assigned")]
    SeedAlreadyAssigned,

    #[error("Loot table id was already assigned")]
    LootTableAlreadyAssigned,

    #[error("Loot seed context is sealed; the corpse is already visible")]
    SeedContextSealed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DelveError>;
