use crate::document::{Document, PathError};
use crate::ops::{Transaction, apply_op_to};
use crate::schema::{Schema, StructuralFault};
use crate::selection::{Selection, normalize_selection};

#[derive(Debug)]
pub struct EngineConfig {
    pub max_normalize_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_normalize_iterations: 100,
        }
    }
}

#[derive(Debug)]
pub enum ApplyError {
    InvalidPath(String),
    NormalizeDidNotConverge,
    Structural(StructuralFault),
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

impl From<StructuralFault> for ApplyError {
    fn from(value: StructuralFault) -> Self {
        ApplyError::Structural(value)
    }
}

/// Applies a transaction to a clone of `(document, selection)` and returns
/// the new pair; the inputs are never mutated. After the ops run, the
/// schema's normalize passes repair the tree to a fixed point, the selection
/// is clamped to an existing text leaf, and well-formedness is checked.
pub fn apply(
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
    tx: Transaction,
) -> Result<(Document, Selection), ApplyError> {
    apply_with(&EngineConfig::default(), schema, doc, selection, tx)
}

pub fn apply_with(
    config: &EngineConfig,
    schema: &Schema,
    doc: &Document,
    selection: &Selection,
    tx: Transaction,
) -> Result<(Document, Selection), ApplyError> {
    let mut doc = doc.clone();
    let mut selection = selection.clone();

    for op in tx.ops {
        apply_op_to(&mut doc, &mut selection, op)?;
    }

    if let Some(after) = tx.selection_after {
        selection = after;
    }

    let mut converged = false;
    for _ in 0..config.max_normalize_iterations {
        let ops = schema.normalize(&doc);
        if ops.is_empty() {
            converged = true;
            break;
        }
        for op in ops {
            apply_op_to(&mut doc, &mut selection, op)?;
        }
    }
    if !converged {
        return Err(ApplyError::NormalizeDidNotConverge);
    }

    selection = normalize_selection(&doc, &selection);
    schema.validate(&doc)?;

    Ok((doc, selection))
}
