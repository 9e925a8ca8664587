//! # soil-mosaic
//!
//! Assemblage de géodatabases SSURGO en une mosaïque unique: clip par la
//! frontière, résolution relationnelle descendante, reprojection vers le
//! système cible, fusion par append et mosaïque dans une sortie instanciée
//! depuis un template.
//!
//! ## Features
//!
//! - Clip des classes d'entités et extraction raster par masque
//! - Copie sélective des tables liées dans l'ordre topologique SSURGO
//! - Reprojection vecteur et raster (Albers CONUS, Web Mercator, WGS84)
//! - Fusion accumulée: append permissif et mosaïque en union d'emprises
//! - Rapport d'exécution JSON
//!
//! ## Usage CLI
//!
//! ```bash
//! soil-mosaic ./WI025.json "./WI027.json;./WI055.json" ./boundary.json:aoi \
//!     EPSG:5070 ./template.json ./scratch ./out soilmu_mosaic --delete-scratch
//! ```

pub mod cli;
pub mod driver;
pub mod graph;
pub mod report;
pub mod resolve;
pub mod stages;

pub use driver::{Pipeline, PipelineConfig};
pub use graph::{ActiveOrder, TableGraph, TABLE_ORDER};
pub use report::{RunReport, SkipReason, Stage};
