//! Étape de fusion dans le workspace de sortie
//!
//! Append permissif des classes d'entités et des tables vers les objets
//! homonymes de la sortie (issus du template), et mosaïque des rasters.
//! Un objet absent de la sortie est hors schéma du template: skip tracé,
//! jamais une erreur.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use geogdb::{DatasetRef, FilteredView, GeoEngine, MosaicPolicy, OpContext, SchemaPolicy};

use crate::report::{RunReport, SkipReason, Stage};

/// Appende les classes d'entités d'un workspace dans la sortie
pub fn append_feature_classes<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    output_ws: &Path,
) -> Result<()> {
    let names = engine.list_feature_classes(source_ws)?;
    append_objects(engine, report, &names, source_ws, output_ws)
}

/// Appende les tables attributaires d'un workspace dans la sortie
pub fn append_tables<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    output_ws: &Path,
) -> Result<()> {
    let names = engine.list_tables(source_ws)?;
    append_objects(engine, report, &names, source_ws, output_ws)
}

fn append_objects<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    names: &[String],
    source_ws: &Path,
    output_ws: &Path,
) -> Result<()> {
    for name in names {
        let src = DatasetRef::new(source_ws, name);
        let dst = src.in_workspace(output_ws);
        if !engine.dataset_exists(&dst) {
            debug!(dataset = %src, "{} not in output, skipping", name);
            report.record_skip(Stage::Merge, name, SkipReason::NotInTemplate);
            continue;
        }
        if engine.row_count(&src)? == 0 {
            info!(dataset = %src, "{} is empty! Skipping...", name);
            report.record_skip(Stage::Merge, name, SkipReason::EmptySource);
            continue;
        }
        info!(dataset = %src, "Appending {}", name);
        engine.append(&FilteredView::all(src), &dst, SchemaPolicy::Permissive)?;
        report.record_append();
    }
    Ok(())
}

/// Mosaïque les rasters d'un workspace dans la sortie
///
/// Premier passage: la destination n'existe pas, copie directe. Passages
/// suivants: mosaïque en union d'emprises, la source gagne.
pub fn mosaic_rasters<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    output_ws: &Path,
) -> Result<()> {
    let ctx = OpContext::overwriting();
    for name in engine.list_rasters(source_ws)? {
        let src = DatasetRef::new(source_ws, &name);
        let dst = src.in_workspace(output_ws);
        if engine.dataset_exists(&dst) {
            info!(dataset = %src, "Mosaicking {}", name);
            engine.mosaic(&ctx, &src, &dst, MosaicPolicy::Last)?;
        } else {
            info!(dataset = %src, "{} not found in output, copying", name);
            engine.copy_raster(&src, &dst)?;
        }
        report.record_mosaic();
    }
    Ok(())
}

/// Fusion complète d'un workspace dans la sortie
pub fn merge_into<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    output_ws: &Path,
) -> Result<()> {
    append_feature_classes(engine, report, source_ws, output_ws)?;
    append_tables(engine, report, source_ws, output_ws)?;
    mosaic_rasters(engine, report, source_ws, output_ws)
}
