//! Étapes du pipeline: clip, reprojection, fusion

pub mod clip;
pub mod merge;
pub mod project;

pub use clip::clip_workspace;
pub use merge::{append_feature_classes, append_tables, merge_into, mosaic_rasters};
pub use project::{project_feature_classes, project_rasters};

use anyhow::Result;
use geogdb::{DatasetRef, GeoEngine, OpContext};

/// Réconcilie le système de coordonnées de sortie avec celui de la frontière
///
/// Si l'entrée et la frontière diffèrent, le contexte impose le système de
/// la frontière en sortie; sinon la sortie conserve celui de l'entrée.
pub(crate) fn reconcile_output_sr<E: GeoEngine>(
    engine: &E,
    input: &DatasetRef,
    boundary: &DatasetRef,
) -> Result<OpContext> {
    let input_sr = engine.spatial_ref(input)?;
    let boundary_sr = engine.spatial_ref(boundary)?;
    let mut ctx = OpContext::overwriting();
    if input_sr != boundary_sr {
        ctx.output_sr = Some(boundary_sr);
    }
    Ok(ctx)
}
