//! Conteneurs géodatabase: workspaces, tables, classes d'entités, rasters

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use geo::Geometry;
use serde::{Deserialize, Serialize};

use crate::crs::SpatialRef;
use crate::types::{Row, Schema};

/// Référence à un dataset nommé au sein d'un workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRef {
    /// Chemin du workspace conteneur
    pub workspace: PathBuf,
    /// Nom du dataset dans le workspace
    pub name: String,
}

impl DatasetRef {
    pub fn new(workspace: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            name: name.into(),
        }
    }

    /// Même dataset dans un autre workspace (sortie sous le même nom)
    pub fn in_workspace(&self, workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace.display(), self.name)
    }
}

/// Entité vectorielle: géométrie + ligne attributaire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub attrs: Row,
}

/// Classe d'entités: schéma, système de coordonnées, entités
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureClass {
    pub spatial_ref: SpatialRef,
    pub schema: Schema,
    pub features: Vec<Feature>,
}

impl FeatureClass {
    pub fn empty(spatial_ref: SpatialRef, schema: Schema) -> Self {
        Self {
            spatial_ref,
            schema,
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Table attributaire sans géométrie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeTable {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl AttributeTable {
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Raster: grille régulière de valeurs, origine au coin supérieur gauche
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raster {
    pub spatial_ref: SpatialRef,
    /// X du coin supérieur gauche
    pub origin_x: f64,
    /// Y du coin supérieur gauche
    pub origin_y: f64,
    /// Taille de cellule (carrée)
    pub cell_size: f64,
    pub rows: usize,
    pub cols: usize,
    /// Valeur nodata
    pub nodata: f64,
    /// Valeurs en ordre ligne par ligne depuis le coin supérieur gauche
    pub values: Vec<f64>,
}

impl Raster {
    /// Grille remplie d'une valeur constante
    pub fn filled(
        spatial_ref: SpatialRef,
        origin_x: f64,
        origin_y: f64,
        cell_size: f64,
        rows: usize,
        cols: usize,
        nodata: f64,
        value: f64,
    ) -> Self {
        Self {
            spatial_ref,
            origin_x,
            origin_y,
            cell_size,
            rows,
            cols,
            nodata,
            values: vec![value; rows * cols],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value;
    }

    /// Centre de la cellule (row, col) en coordonnées du raster
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.cell_size,
            self.origin_y - (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Emprise (min_x, min_y, max_x, max_y)
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        (
            self.origin_x,
            self.origin_y - self.rows as f64 * self.cell_size,
            self.origin_x + self.cols as f64 * self.cell_size,
            self.origin_y,
        )
    }

    /// Valeur de la cellule contenant (x, y), None hors emprise ou nodata
    pub fn sample(&self, x: f64, y: f64) -> Option<f64> {
        let col = ((x - self.origin_x) / self.cell_size).floor();
        let row = ((self.origin_y - y) / self.cell_size).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let v = self.get(row, col);
        if v == self.nodata {
            None
        } else {
            Some(v)
        }
    }
}

/// Workspace: conteneur nommé de tables, classes d'entités et rasters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub tables: BTreeMap<String, AttributeTable>,
    #[serde(default)]
    pub feature_classes: BTreeMap<String, FeatureClass>,
    #[serde(default)]
    pub rasters: BTreeMap<String, Raster>,
}

impl Workspace {
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
            || self.feature_classes.contains_key(name)
            || self.rasters.contains_key(name)
    }

    /// Charge un workspace depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self, crate::GdbError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Sauvegarde le workspace en JSON
    pub fn save(&self, path: &Path) -> Result<(), crate::GdbError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType, Value};
    use geo::point;

    #[test]
    fn test_raster_sampling() {
        let mut r = Raster::filled(SpatialRef::WGS84, 0.0, 10.0, 1.0, 10, 10, -9999.0, 5.0);
        r.set(0, 0, 42.0);
        // Centre de la cellule (0, 0): (0.5, 9.5)
        assert_eq!(r.sample(0.5, 9.5), Some(42.0));
        assert_eq!(r.sample(5.5, 5.5), Some(5.0));
        assert_eq!(r.sample(-1.0, 5.0), None);
        assert_eq!(r.sample(11.0, 5.0), None);
    }

    #[test]
    fn test_raster_extent() {
        let r = Raster::filled(SpatialRef::WGS84, 100.0, 200.0, 10.0, 5, 8, -9999.0, 0.0);
        assert_eq!(r.extent(), (100.0, 150.0, 180.0, 200.0));
    }

    #[test]
    fn test_workspace_json_roundtrip() {
        let mut ws = Workspace::default();
        let schema = Schema::new(vec![Field::new("mukey", FieldType::Text)]);
        let mut fc = FeatureClass::empty(SpatialRef::WGS84, schema.clone());
        fc.features.push(Feature {
            geometry: Geometry::Point(point! { x: -89.4, y: 43.07 }),
            attrs: vec![Value::from("100125")],
        });
        ws.feature_classes.insert("MUPOLYGON".to_string(), fc);
        ws.tables
            .insert("mapunit".to_string(), AttributeTable::empty(schema));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.json");
        ws.save(&path).unwrap();
        let loaded = Workspace::load(&path).unwrap();
        assert_eq!(loaded.feature_classes["MUPOLYGON"].len(), 1);
        assert!(loaded.tables["mapunit"].is_empty());
        assert!(loaded.contains("MUPOLYGON"));
        assert!(!loaded.contains("component"));
    }
}
