//! Error types for configuration, engine and pipeline failures
//!
//! Every error is fatal for a run. The binary reports them through `anyhow`.

use std::fmt;
use std::path::PathBuf;

use super::states::Tag;

/// Problems with the run description, always raised before anything is generated
#[derive(Debug)]
pub enum ConfigError {
    MissingInput(PathBuf),
    UnsupportedPackingType(String),
    UnsupportedCrossSection(String),
    InvalidParameter { name: &'static str, reason: String },
    Parse { line: usize, reason: String },
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingInput(path) => write!(f, "input file <{}> not found", path.display()),
            ConfigError::UnsupportedPackingType(name) => {
                write!(f, "packing for particle type <{name}> is not implemented")
            }
            ConfigError::UnsupportedCrossSection(name) => {
                write!(f, "cross-section <{name}> is not implemented")
            }
            ConfigError::InvalidParameter { name, reason } => write!(f, "invalid parameter `{name}`: {reason}"),
            ConfigError::Parse { line, reason } => write!(f, "input line {line}: {reason}"),
            ConfigError::Io(e) => write!(f, "failed to read input: {e}"),
            ConfigError::Yaml(e) => write!(f, "malformed scenario file: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

/// Failures surfaced by a `Domain` implementation
#[derive(Debug)]
pub enum EngineError {
    NoFreeParticles,
    UnknownTag(Tag),
    EmptyDomain,
    InvalidRequest(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoFreeParticles => write!(f, "no free particle with positive stiffness"),
            EngineError::UnknownTag(tag) => write!(f, "no particle carries tag {tag}"),
            EngineError::EmptyDomain => write!(f, "domain holds no particles"),
            EngineError::InvalidRequest(reason) => write!(f, "invalid engine request: {reason}"),
            EngineError::Io(e) => write!(f, "engine i/o failure: {e}"),
            EngineError::Json(e) => write!(f, "engine serialization failure: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            EngineError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Json(e)
    }
}

/// Anything that can stop the column pipeline
#[derive(Debug)]
pub enum ColumnError {
    Config(ConfigError),
    Engine(EngineError),
    BoundaryTagInUse(Tag),
}

impl fmt::Display for ColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnError::Config(e) => write!(f, "configuration error: {e}"),
            ColumnError::Engine(e) => write!(f, "engine error: {e}"),
            ColumnError::BoundaryTagInUse(tag) => write!(f, "boundary tag {tag} is already in use"),
        }
    }
}

impl std::error::Error for ColumnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ColumnError::Config(e) => Some(e),
            ColumnError::Engine(e) => Some(e),
            ColumnError::BoundaryTagInUse(_) => None,
        }
    }
}

impl From<ConfigError> for ColumnError {
    fn from(e: ConfigError) -> Self {
        ColumnError::Config(e)
    }
}

impl From<EngineError> for ColumnError {
    fn from(e: EngineError) -> Self {
        ColumnError::Engine(e)
    }
}
