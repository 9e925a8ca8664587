//! Types d'erreurs pour le crate geogdb

use thiserror::Error;

/// Erreurs pouvant survenir lors des opérations géodatabase
#[derive(Debug, Error)]
pub enum GdbError {
    /// Erreur d'I/O lors de la lecture ou l'écriture d'un workspace
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Workspace JSON invalide
    #[error("Invalid workspace JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Workspace inexistant
    #[error("Workspace not found: {0}")]
    MissingWorkspace(String),

    /// Workspace déjà présent (création sans overwrite)
    #[error("Workspace already exists: {0}")]
    WorkspaceExists(String),

    /// Dataset inexistant dans le workspace
    #[error("Dataset not found: {workspace}/{dataset}")]
    MissingDataset { workspace: String, dataset: String },

    /// Champ absent du schéma d'une table
    #[error("Field {field} does not exist on {dataset}")]
    FieldMissing { dataset: String, field: String },

    /// Schémas divergents lors d'un append validant
    #[error("Schema mismatch appending {origin} into {target}: {reason}")]
    SchemaMismatch {
        origin: String,
        target: String,
        reason: String,
    },

    /// Système de coordonnées non supporté
    #[error("Unsupported coordinate system: EPSG:{0}")]
    UnsupportedCrs(u32),

    /// Type de géométrie non supporté par une opération
    #[error("Unsupported geometry type in {dataset}: {reason}")]
    UnsupportedGeometry { dataset: String, reason: String },
}

impl GdbError {
    /// Crée une erreur de dataset manquant
    pub fn missing_dataset(workspace: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self::MissingDataset {
            workspace: workspace.into(),
            dataset: dataset.into(),
        }
    }

    /// Crée une erreur de champ manquant
    pub fn field_missing(dataset: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldMissing {
            dataset: dataset.into(),
            field: field.into(),
        }
    }

    /// Crée une erreur de schémas divergents
    ///
    /// La divergence nomme les deux datasets; elle ne porte aucune erreur
    /// sous-jacente à chaîner.
    pub fn schema_mismatch(
        origin: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            origin: origin.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_schema_mismatch_message_names_both_datasets() {
        let err = GdbError::schema_mismatch("/gdb/mapunit", "/out/mapunit", "field count differs");
        assert_eq!(
            err.to_string(),
            "Schema mismatch appending /gdb/mapunit into /out/mapunit: field count differs"
        );
        // Divergence de schéma: pas de cause sous-jacente
        assert!(err.source().is_none());
    }
}
