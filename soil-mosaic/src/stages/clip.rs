//! Étape de clip: découpe d'un workspace source par la frontière
//!
//! Chaque classe d'entités non vide est découpée vers le scratch; les
//! classes vides sont abandonnées avec un diagnostic unique et retirées
//! de l'ordre de travail. Les rasters sont extraits par masque.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use tracing::info;

use geogdb::{DatasetRef, GeoEngine};

use crate::graph::ActiveOrder;
use crate::report::{RunReport, SkipReason, Stage};
use crate::stages::reconcile_output_sr;

/// Découpe toutes les classes d'entités et tous les rasters d'un workspace
///
/// Le système de coordonnées de sortie est réconcilié par opération avec
/// celui de la frontière. Retourne l'ordre de travail effectif, dérivé une
/// fois des classes abandonnées.
pub fn clip_workspace<E: GeoEngine>(
    engine: &mut E,
    report: &mut RunReport,
    source_ws: &Path,
    boundary: &DatasetRef,
    dest_ws: &Path,
) -> Result<ActiveOrder> {
    let mut removed: BTreeSet<String> = BTreeSet::new();

    for name in engine.list_feature_classes(source_ws)? {
        let src = DatasetRef::new(source_ws, &name);
        if engine.row_count(&src)? == 0 {
            info!(dataset = %src, "{} is empty! Skipping...", name);
            report.record_skip(Stage::Clip, &name, SkipReason::EmptySource);
            removed.insert(name);
            continue;
        }
        let ctx = reconcile_output_sr(engine, &src, boundary)?;
        info!(dataset = %src, "Clipping {}", name);
        engine.clip(&ctx, &src, boundary, &src.in_workspace(dest_ws))?;
        report.record_clip();
    }

    for name in engine.list_rasters(source_ws)? {
        let src = DatasetRef::new(source_ws, &name);
        let ctx = reconcile_output_sr(engine, &src, boundary)?;
        info!(dataset = %src, "Extracting {} by mask", name);
        engine.extract_by_mask(&ctx, &src, boundary, &src.in_workspace(dest_ws))?;
        report.record_clip();
    }

    Ok(ActiveOrder::derive(&removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};
    use geogdb::{
        Feature, FeatureClass, Field, FieldType, MemoryEngine, Schema, SpatialRef, Value,
        Workspace,
    };

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ])
    }

    fn fc(sr: SpatialRef, features: Vec<Feature>) -> FeatureClass {
        FeatureClass {
            spatial_ref: sr,
            schema: Schema::new(vec![Field::new("mukey", FieldType::Text)]),
            features,
        }
    }

    fn feat(geom: Geometry<f64>, key: &str) -> Feature {
        Feature {
            geometry: geom,
            attrs: vec![Value::from(key)],
        }
    }

    fn fixture() -> MemoryEngine {
        let mut engine = MemoryEngine::new();

        let mut boundary_ws = Workspace::default();
        boundary_ws.feature_classes.insert(
            "aoi".to_string(),
            fc(SpatialRef::WGS84, vec![feat(square(0.0, 0.0, 1.0, 1.0), "b")]),
        );
        engine.insert_workspace("/boundary", boundary_ws);

        let mut src = Workspace::default();
        src.feature_classes.insert(
            "MUPOLYGON".to_string(),
            fc(
                SpatialRef::WGS84,
                vec![
                    feat(square(0.2, 0.2, 0.8, 0.8), "100125"),
                    feat(square(5.0, 5.0, 6.0, 6.0), "100126"),
                ],
            ),
        );
        src.feature_classes
            .insert("FEATLINE".to_string(), fc(SpatialRef::WGS84, vec![]));
        engine.insert_workspace("/src", src);

        engine.create_workspace(Path::new("/scratch"), true).unwrap();
        engine
    }

    #[test]
    fn test_empty_feature_class_is_dropped_from_order() {
        let mut engine = fixture();
        let mut report = RunReport::new();
        report.start_source("src");

        let order = clip_workspace(
            &mut engine,
            &mut report,
            Path::new("/src"),
            &DatasetRef::new("/boundary", "aoi"),
            Path::new("/scratch"),
        )
        .unwrap();

        assert!(!order.contains("FEATLINE"));
        assert!(order.contains("MUPOLYGON"));
        assert_eq!(report.skips_for("FEATLINE"), 1);
        assert!(!engine.dataset_exists(&DatasetRef::new("/scratch", "FEATLINE")));
    }

    #[test]
    fn test_clip_keeps_only_intersecting_features() {
        let mut engine = fixture();
        let mut report = RunReport::new();
        report.start_source("src");

        clip_workspace(
            &mut engine,
            &mut report,
            Path::new("/src"),
            &DatasetRef::new("/boundary", "aoi"),
            Path::new("/scratch"),
        )
        .unwrap();

        let clipped = DatasetRef::new("/scratch", "MUPOLYGON");
        assert_eq!(engine.row_count(&clipped).unwrap(), 1);
        assert_eq!(report.by_source[0].1.clipped, 1);
    }
}
