//! # Selection Module
//!
//! Immutable atom-index sets and the expression languages that produce them.
//!
//! A [`Selection`] is an ordered, deduplicated set of atom indices with explicit set
//! algebra (`union`, `intersect`, `difference`, `overlaps`) and exporters for the index
//! notations of external tools. Selections are normally obtained through
//! [`Structure::select`](crate::core::models::structure::Structure::select), which parses
//! an expression in one of the supported [`SelectionSyntax`] languages.

mod mask;
mod set;
mod vmd;

pub use set::Selection;

use crate::core::models::structure::Structure;
use thiserror::Error;

/// The expression language of a selection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionSyntax {
    /// Keyword expressions such as `chain A and not resname HOH`.
    #[default]
    Vmd,
    /// Amber-style masks such as `:1-10` or `@5,7-9`.
    Mask,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selection expression is empty")]
    Empty,
    #[error("Unexpected end of selection expression")]
    UnexpectedEnd,
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("Keyword '{0}' requires at least one value")]
    MissingValue(String),
    #[error("Invalid number '{0}' in selection expression")]
    InvalidNumber(String),
    #[error("Unbalanced parentheses in selection expression")]
    UnbalancedParentheses,
}

pub(crate) fn evaluate(
    structure: &Structure,
    expression: &str,
    syntax: SelectionSyntax,
) -> Result<Selection, SelectionError> {
    match syntax {
        SelectionSyntax::Vmd => vmd::evaluate(structure, expression),
        SelectionSyntax::Mask => mask::evaluate(structure, expression),
    }
}
