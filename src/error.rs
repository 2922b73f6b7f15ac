use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,

    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("Unexpected end of input after position {0}")]
    UnexpectedEnd(usize),

    #[error("Invalid bracket atom at position {position}: {message}")]
    InvalidBracketAtom { position: usize, message: String },

    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("Unmatched ')' at position {0}")]
    UnmatchedBranchClose(usize),

    #[error("Unclosed branch opened at position {0}")]
    UnclosedBranch(usize),

    #[error("Bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("Unclosed ring bond {0}")]
    UnclosedRing(u32),

    #[error("Ring bond {ring} at position {position} joins an atom to itself")]
    SelfBond { ring: u32, position: usize },

    #[error("Duplicate bond between atoms {0} and {1}")]
    DuplicateBond(usize, usize),

    #[error("Conflicting bond symbols for ring bond {0}")]
    ConflictingRingBond(u32),

    #[error("Explicit valence for atom # {index} {symbol}, {valence}, is greater than permitted")]
    Valence {
        index: usize,
        symbol: String,
        valence: u32,
    },

    #[error("non-ring atom {0} marked aromatic")]
    NonRingAromatic(usize),

    #[error("Can't kekulize mol. Unkekulized atoms: {}", join_indices(.0))]
    Kekulize(Vec<usize>),
}

fn join_indices(atoms: &[usize]) -> String {
    atoms
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid SMILES: {0}")]
    InvalidSmiles(#[from] SmilesError),

    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Failed to write SVG: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Fatal pipeline errors. Everything else a pipeline meets is a [`StageError`]
/// and is recorded, not returned.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to open PDF {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write PDF {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

/// Error raised inside a best-effort compression stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Failed(String),
}

impl StageError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        StageError::Unsupported(what.into())
    }

    pub fn failed(what: impl Into<String>) -> Self {
        StageError::Failed(what.into())
    }
}

impl From<lopdf::Error> for StageError {
    fn from(e: lopdf::Error) -> Self {
        StageError::Failed(e.to_string())
    }
}
