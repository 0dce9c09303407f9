use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssetError>;

/// Returned geometry or material text that cannot be turned into a scene
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("empty {kind} payload")]
    Empty { kind: AssetKind },

    #[error("{kind} line {line}: {message}")]
    Malformed {
        kind: AssetKind,
        line: usize,
        message: String,
    },

    #[error("geometry contains no faces")]
    NoFaces,
}

impl AssetError {
    pub fn malformed(kind: AssetKind, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Geometry,
    Material,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometry => f.write_str("geometry"),
            Self::Material => f.write_str("material"),
        }
    }
}
