//! Étape de reprojection vers le système cible
//!
//! Les classes d'entités non vides sont reprojetées vers le scratch de
//! projection. Les rasters sont routés vers la mosaïque en accumulation:
//! premier passage en projection directe, passages suivants via un nom
//! transitoire mosaïqué puis supprimé.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use geogdb::{DatasetRef, GeoEngine, MosaicPolicy, OpContext, SpatialRef};

use crate::report::{RunReport, SkipReason, Stage};

/// Reprojette toutes les classes d'entités d'un workspace
///
/// Les classes vides sont abandonnées avec un diagnostic, comme au clip:
/// reprojeter zéro géométrie ne produit rien d'exploitable.
pub fn project_feature_classes<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    target: SpatialRef,
    dest_ws: &Path,
) -> Result<()> {
    let ctx = OpContext::with_output_sr(target);
    for name in engine.list_feature_classes(source_ws)? {
        let src = DatasetRef::new(source_ws, &name);
        if engine.row_count(&src)? == 0 {
            info!(dataset = %src, "{} is empty! Skipping...", name);
            report.record_skip(Stage::Project, &name, SkipReason::EmptySource);
            continue;
        }
        info!(dataset = %src, target = %target, "Projecting {}", name);
        engine.project_feature_class(&ctx, &src, target, &src.in_workspace(dest_ws))?;
        report.record_projection();
    }
    Ok(())
}

/// Reprojette tous les rasters d'un workspace vers la mosaïque de sortie
///
/// La destination accumule au fil des sources: si le raster de sortie
/// n'existe pas encore, projection directe; sinon projection sous un nom
/// transitoire, mosaïque (la source gagne) puis suppression du transitoire.
pub fn project_rasters<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    target: SpatialRef,
    dest_ws: &Path,
) -> Result<()> {
    let ctx = OpContext::with_output_sr(target);
    for name in engine.list_rasters(source_ws)? {
        let src = DatasetRef::new(source_ws, &name);
        let dst = src.in_workspace(dest_ws);
        if !engine.dataset_exists(&dst) {
            info!(dataset = %src, target = %target, "Projecting {}", name);
            engine.project_raster(&ctx, &src, target, &dst)?;
            report.record_projection();
        } else {
            let transient = DatasetRef::new(dest_ws, format!("{}__prj", name));
            info!(dataset = %src, target = %target, "Projecting {} into mosaic", name);
            engine.project_raster(&ctx, &src, target, &transient)?;
            engine.mosaic(&ctx, &transient, &dst, MosaicPolicy::Last)?;
            engine.delete_dataset(&transient)?;
            report.record_projection();
            report.record_mosaic();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Geometry};
    use geogdb::{
        Feature, FeatureClass, Field, FieldType, MemoryEngine, Raster, Schema, Value, Workspace,
    };

    fn point_fc(x: f64, y: f64) -> FeatureClass {
        FeatureClass {
            spatial_ref: SpatialRef::WGS84,
            schema: Schema::new(vec![Field::new("mukey", FieldType::Text)]),
            features: vec![Feature {
                geometry: Geometry::Point(point!(x: x, y: y)),
                attrs: vec![Value::from("100125")],
            }],
        }
    }

    fn unit_raster(origin_x: f64, origin_y: f64, value: f64) -> Raster {
        Raster::filled(
            SpatialRef::CONUS_ALBERS,
            origin_x,
            origin_y,
            100.0,
            4,
            4,
            -9999.0,
            value,
        )
    }

    #[test]
    fn test_project_feature_classes_skips_empty() {
        let mut engine = MemoryEngine::new();
        let mut ws = Workspace::default();
        ws.feature_classes
            .insert("MUPOLYGON".to_string(), point_fc(-89.4, 43.07));
        ws.feature_classes.insert(
            "FEATPOINT".to_string(),
            FeatureClass::empty(
                SpatialRef::WGS84,
                Schema::new(vec![Field::new("featkey", FieldType::Text)]),
            ),
        );
        engine.insert_workspace("/src", ws);
        engine.create_workspace(Path::new("/prj"), true).unwrap();

        let mut report = RunReport::new();
        report.start_source("src");
        project_feature_classes(
            &mut engine,
            &mut report,
            Path::new("/src"),
            SpatialRef::CONUS_ALBERS,
            Path::new("/prj"),
        )
        .unwrap();

        let out = DatasetRef::new("/prj", "MUPOLYGON");
        assert_eq!(
            engine.spatial_ref(&out).unwrap(),
            SpatialRef::CONUS_ALBERS
        );
        assert!(!engine.dataset_exists(&DatasetRef::new("/prj", "FEATPOINT")));
        assert_eq!(report.skips_for("FEATPOINT"), 1);
        assert_eq!(report.by_source[0].1.projected, 1);
    }

    #[test]
    fn test_project_rasters_accumulates_into_mosaic() {
        let mut engine = MemoryEngine::new();
        let mut first = Workspace::default();
        first
            .rasters
            .insert("SoilRaster_10m".to_string(), unit_raster(0.0, 400.0, 1.0));
        engine.insert_workspace("/a", first);
        let mut second = Workspace::default();
        second
            .rasters
            .insert("SoilRaster_10m".to_string(), unit_raster(400.0, 400.0, 2.0));
        engine.insert_workspace("/b", second);
        engine.create_workspace(Path::new("/out"), true).unwrap();

        let mut report = RunReport::new();
        report.start_source("a");
        project_rasters(
            &mut engine,
            &mut report,
            Path::new("/a"),
            SpatialRef::CONUS_ALBERS,
            Path::new("/out"),
        )
        .unwrap();
        report.start_source("b");
        project_rasters(
            &mut engine,
            &mut report,
            Path::new("/b"),
            SpatialRef::CONUS_ALBERS,
            Path::new("/out"),
        )
        .unwrap();

        // Emprise union, nom transitoire supprimé
        let out = DatasetRef::new("/out", "SoilRaster_10m");
        assert!(engine.dataset_exists(&out));
        assert!(!engine.dataset_exists(&DatasetRef::new("/out", "SoilRaster_10m__prj")));
        assert_eq!(report.by_source[0].1.projected, 1);
        assert_eq!(report.by_source[1].1.mosaicked, 1);

        let raster = &engine.workspace(Path::new("/out")).unwrap().rasters["SoilRaster_10m"];
        assert_eq!(raster.cols, 8);
        assert_eq!(raster.sample(50.0, 350.0), Some(1.0));
        assert_eq!(raster.sample(450.0, 350.0), Some(2.0));
    }
}
