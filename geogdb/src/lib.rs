//! # geogdb
//!
//! Moteur géodatabase en mémoire pour pipelines ETL géospatiaux.
//!
//! ## Features
//!
//! - Workspaces persistés en JSON (tables, classes d'entités, rasters)
//! - Primitives clip / reprojection / append / mosaïque
//! - Prédicats de sélection typés (quoting sûr des valeurs texte)
//! - Reprojection Rust pur (WGS84, Web Mercator, CONUS Albers)
//! - Contexte de traitement explicite par opération (pas d'état global)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geogdb::{GeoEngine, MemoryEngine, OpContext, DatasetRef, SpatialRef};
//!
//! let mut engine = MemoryEngine::new();
//! engine.load_workspace(Path::new("survey.json"))?;
//! let ctx = OpContext::with_output_sr(SpatialRef::CONUS_ALBERS);
//! engine.clip(&ctx, &fc, &boundary, &out)?;
//! ```

pub mod crs;
pub mod engine;
pub mod error;
pub mod memory;
pub mod predicate;
pub mod types;
pub mod workspace;

pub use crs::{CrsTransform, SpatialRef};
pub use engine::{FilteredView, GeoEngine, MosaicPolicy, OpContext, SchemaPolicy};
pub use error::GdbError;
pub use memory::MemoryEngine;
pub use predicate::Predicate;
pub use types::{Field, FieldType, Row, Schema, Value};
pub use workspace::{AttributeTable, DatasetRef, Feature, FeatureClass, Raster, Workspace};
