//! Implémentation en mémoire du moteur géospatial
//!
//! Les workspaces sont indexés par chemin et persistés en JSON. Le clip
//! vectoriel s'appuie sur les opérations booléennes du crate `geo`; les
//! opérations raster travaillent sur les centres de cellules.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use geo::{BooleanOps, BoundingRect, Geometry, Intersects, MultiLineString, MultiPolygon, Point};
use tracing::trace;

use crate::crs::{CrsTransform, SpatialRef};
use crate::engine::{FilteredView, GeoEngine, MosaicPolicy, OpContext, SchemaPolicy};
use crate::error::GdbError;
use crate::predicate::Predicate;
use crate::types::{FieldType, Row, Schema, Value};
use crate::workspace::{AttributeTable, DatasetRef, Feature, FeatureClass, Raster, Workspace};

/// Moteur géodatabase en mémoire
#[derive(Debug, Default)]
pub struct MemoryEngine {
    workspaces: HashMap<PathBuf, Workspace>,
}

/// Vue interne sur un dataset tabulaire (table ou classe d'entités)
enum Tabular<'a> {
    Table(&'a AttributeTable),
    FeatureClass(&'a FeatureClass),
}

impl<'a> Tabular<'a> {
    fn schema(&self) -> &Schema {
        match self {
            Tabular::Table(t) => &t.schema,
            Tabular::FeatureClass(fc) => &fc.schema,
        }
    }

    fn len(&self) -> usize {
        match self {
            Tabular::Table(t) => t.len(),
            Tabular::FeatureClass(fc) => fc.len(),
        }
    }

    fn row(&self, i: usize) -> &Row {
        match self {
            Tabular::Table(t) => &t.rows[i],
            Tabular::FeatureClass(fc) => &fc.features[i].attrs,
        }
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge un workspace JSON et l'enregistre sous son chemin
    pub fn load_workspace(&mut self, path: &Path) -> Result<(), GdbError> {
        let ws = Workspace::load(path)?;
        self.workspaces.insert(path.to_path_buf(), ws);
        Ok(())
    }

    /// Sauvegarde un workspace enregistré vers un fichier JSON
    pub fn save_workspace(&self, ws: &Path, file: &Path) -> Result<(), GdbError> {
        self.ws(ws)?.save(file)
    }

    /// Enregistre un workspace construit en mémoire (fixtures, tests)
    pub fn insert_workspace(&mut self, path: impl Into<PathBuf>, ws: Workspace) {
        self.workspaces.insert(path.into(), ws);
    }

    /// Accès en lecture à un workspace enregistré
    pub fn workspace(&self, path: &Path) -> Result<&Workspace, GdbError> {
        self.ws(path)
    }

    fn ws(&self, path: &Path) -> Result<&Workspace, GdbError> {
        self.workspaces
            .get(path)
            .ok_or_else(|| GdbError::MissingWorkspace(path.display().to_string()))
    }

    fn ws_mut(&mut self, path: &Path) -> Result<&mut Workspace, GdbError> {
        self.workspaces
            .get_mut(path)
            .ok_or_else(|| GdbError::MissingWorkspace(path.display().to_string()))
    }

    fn tabular(&self, ds: &DatasetRef) -> Result<Tabular<'_>, GdbError> {
        let ws = self.ws(&ds.workspace)?;
        if let Some(t) = ws.tables.get(&ds.name) {
            return Ok(Tabular::Table(t));
        }
        if let Some(fc) = ws.feature_classes.get(&ds.name) {
            return Ok(Tabular::FeatureClass(fc));
        }
        Err(GdbError::missing_dataset(
            ds.workspace.display().to_string(),
            &ds.name,
        ))
    }

    fn feature_class(&self, ds: &DatasetRef) -> Result<&FeatureClass, GdbError> {
        self.ws(&ds.workspace)?
            .feature_classes
            .get(&ds.name)
            .ok_or_else(|| GdbError::missing_dataset(ds.workspace.display().to_string(), &ds.name))
    }

    fn raster(&self, ds: &DatasetRef) -> Result<&Raster, GdbError> {
        self.ws(&ds.workspace)?
            .rasters
            .get(&ds.name)
            .ok_or_else(|| GdbError::missing_dataset(ds.workspace.display().to_string(), &ds.name))
    }

    /// Polygones de frontière d'une classe d'entités, dans son propre système
    fn boundary_polygons(&self, boundary: &DatasetRef) -> Result<(MultiPolygon, SpatialRef), GdbError> {
        let fc = self.feature_class(boundary)?;
        let mut polys = Vec::new();
        for f in &fc.features {
            match &f.geometry {
                Geometry::Polygon(p) => polys.push(p.clone()),
                Geometry::MultiPolygon(mp) => polys.extend(mp.iter().cloned()),
                _ => {}
            }
        }
        if polys.is_empty() {
            return Err(GdbError::UnsupportedGeometry {
                dataset: boundary.to_string(),
                reason: "boundary contains no polygon feature".to_string(),
            });
        }
        Ok((MultiPolygon::new(polys), fc.spatial_ref))
    }

    /// Indices des lignes retenues par un prédicat optionnel
    fn selected_rows(&self, view: &FilteredView) -> Result<Vec<usize>, GdbError> {
        let data = self.tabular(&view.dataset)?;
        match &view.predicate {
            None => Ok((0..data.len()).collect()),
            Some(pred) => {
                let idx = data.schema().field_index(&pred.field).ok_or_else(|| {
                    GdbError::field_missing(view.dataset.to_string(), &pred.field)
                })?;
                Ok((0..data.len())
                    .filter(|&i| pred.matches(&data.row(i)[idx]))
                    .collect())
            }
        }
    }

    /// Mappe une ligne source vers le schéma destination par nom de colonne
    fn map_row(src_schema: &Schema, dst_schema: &Schema, row: &Row) -> Row {
        dst_schema
            .fields
            .iter()
            .map(|f| match src_schema.field_index(&f.name) {
                Some(i) => row[i].clone(),
                None => Value::Null,
            })
            .collect()
    }
}

/// Reprojette un raster par rééchantillonnage au plus proche voisin
fn project_raster_grid(src: &Raster, target: SpatialRef) -> Result<Raster, GdbError> {
    if src.spatial_ref == target {
        let mut out = src.clone();
        out.spatial_ref = target;
        return Ok(out);
    }
    let forward = CrsTransform::new(src.spatial_ref, target)?;
    let inverse = CrsTransform::new(target, src.spatial_ref)?;

    // Emprise cible: coins et milieux d'arêtes projetés
    let (x0, y0, x1, y1) = src.extent();
    let xm = (x0 + x1) / 2.0;
    let ym = (y0 + y1) / 2.0;
    let edge_points = [
        (x0, y0),
        (x0, y1),
        (x1, y0),
        (x1, y1),
        (xm, y0),
        (xm, y1),
        (x0, ym),
        (x1, ym),
    ];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (x, y) in edge_points {
        let (px, py) = forward.transform_point(x, y);
        min_x = min_x.min(px);
        min_y = min_y.min(py);
        max_x = max_x.max(px);
        max_y = max_y.max(py);
    }

    // Même nombre de cellules, taille recalculée sur l'emprise projetée
    let cell = ((max_x - min_x) / src.cols as f64).max((max_y - min_y) / src.rows as f64);
    let mut out = Raster::filled(
        target,
        min_x,
        max_y,
        cell,
        src.rows,
        src.cols,
        src.nodata,
        src.nodata,
    );
    for row in 0..out.rows {
        for col in 0..out.cols {
            let (cx, cy) = out.cell_center(row, col);
            let (sx, sy) = inverse.transform_point(cx, cy);
            if let Some(v) = src.sample(sx, sy) {
                out.set(row, col, v);
            }
        }
    }
    Ok(out)
}

/// Découpe une géométrie par la frontière (dans le même système)
fn clip_geometry(geom: &Geometry, boundary: &MultiPolygon) -> Result<Option<Geometry>, GdbError> {
    match geom {
        Geometry::Polygon(p) => {
            let clipped = boundary.intersection(&MultiPolygon::new(vec![p.clone()]));
            if clipped.0.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Geometry::MultiPolygon(clipped)))
            }
        }
        Geometry::MultiPolygon(mp) => {
            let clipped = boundary.intersection(mp);
            if clipped.0.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Geometry::MultiPolygon(clipped)))
            }
        }
        Geometry::Point(p) => {
            if boundary.intersects(p) {
                Ok(Some(geom.clone()))
            } else {
                Ok(None)
            }
        }
        Geometry::MultiPoint(mp) => {
            let kept: Vec<Point> = mp.iter().filter(|p| boundary.intersects(*p)).cloned().collect();
            if kept.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Geometry::MultiPoint(kept.into())))
            }
        }
        Geometry::LineString(ls) => {
            let clipped = boundary.clip(&MultiLineString::new(vec![ls.clone()]), false);
            if clipped.0.iter().all(|l| l.0.is_empty()) {
                Ok(None)
            } else {
                Ok(Some(Geometry::MultiLineString(clipped)))
            }
        }
        Geometry::MultiLineString(mls) => {
            let clipped = boundary.clip(mls, false);
            if clipped.0.iter().all(|l| l.0.is_empty()) {
                Ok(None)
            } else {
                Ok(Some(Geometry::MultiLineString(clipped)))
            }
        }
        _ => Err(GdbError::UnsupportedGeometry {
            dataset: String::new(),
            reason: "geometry collections cannot be clipped".to_string(),
        }),
    }
}

impl GeoEngine for MemoryEngine {
    fn workspace_exists(&self, ws: &Path) -> bool {
        self.workspaces.contains_key(ws)
    }

    fn create_workspace(&mut self, ws: &Path, overwrite: bool) -> Result<(), GdbError> {
        if self.workspaces.contains_key(ws) && !overwrite {
            return Err(GdbError::WorkspaceExists(ws.display().to_string()));
        }
        self.workspaces.insert(ws.to_path_buf(), Workspace::default());
        Ok(())
    }

    fn delete_workspace(&mut self, ws: &Path) -> Result<(), GdbError> {
        self.workspaces
            .remove(ws)
            .map(|_| ())
            .ok_or_else(|| GdbError::MissingWorkspace(ws.display().to_string()))
    }

    fn copy_workspace(&mut self, src: &Path, dst: &Path) -> Result<(), GdbError> {
        if self.workspaces.contains_key(dst) {
            return Err(GdbError::WorkspaceExists(dst.display().to_string()));
        }
        let copy = self.ws(src)?.clone();
        self.workspaces.insert(dst.to_path_buf(), copy);
        Ok(())
    }

    fn list_feature_classes(&self, ws: &Path) -> Result<Vec<String>, GdbError> {
        Ok(self.ws(ws)?.feature_classes.keys().cloned().collect())
    }

    fn list_tables(&self, ws: &Path) -> Result<Vec<String>, GdbError> {
        Ok(self.ws(ws)?.tables.keys().cloned().collect())
    }

    fn list_rasters(&self, ws: &Path) -> Result<Vec<String>, GdbError> {
        Ok(self.ws(ws)?.rasters.keys().cloned().collect())
    }

    fn dataset_exists(&self, ds: &DatasetRef) -> bool {
        self.ws(&ds.workspace)
            .map(|ws| ws.contains(&ds.name))
            .unwrap_or(false)
    }

    fn delete_dataset(&mut self, ds: &DatasetRef) -> Result<(), GdbError> {
        let ws = self.ws_mut(&ds.workspace)?;
        let removed = ws.tables.remove(&ds.name).is_some()
            || ws.feature_classes.remove(&ds.name).is_some()
            || ws.rasters.remove(&ds.name).is_some();
        if removed {
            Ok(())
        } else {
            Err(GdbError::missing_dataset(
                ds.workspace.display().to_string(),
                &ds.name,
            ))
        }
    }

    fn row_count(&self, ds: &DatasetRef) -> Result<usize, GdbError> {
        Ok(self.tabular(ds)?.len())
    }

    fn field_type(&self, ds: &DatasetRef, field: &str) -> Result<FieldType, GdbError> {
        let data = self.tabular(ds)?;
        data.schema()
            .field(field)
            .map(|f| f.field_type)
            .ok_or_else(|| GdbError::field_missing(ds.to_string(), field))
    }

    fn field_values(&self, ds: &DatasetRef, field: &str) -> Result<Vec<Value>, GdbError> {
        let data = self.tabular(ds)?;
        let idx = data
            .schema()
            .field_index(field)
            .ok_or_else(|| GdbError::field_missing(ds.to_string(), field))?;
        Ok((0..data.len()).map(|i| data.row(i)[idx].clone()).collect())
    }

    fn view_row_count(&self, view: &FilteredView) -> Result<usize, GdbError> {
        Ok(self.selected_rows(view)?.len())
    }

    fn spatial_ref(&self, ds: &DatasetRef) -> Result<SpatialRef, GdbError> {
        let ws = self.ws(&ds.workspace)?;
        if let Some(fc) = ws.feature_classes.get(&ds.name) {
            return Ok(fc.spatial_ref);
        }
        if let Some(r) = ws.rasters.get(&ds.name) {
            return Ok(r.spatial_ref);
        }
        Err(GdbError::missing_dataset(
            ds.workspace.display().to_string(),
            &ds.name,
        ))
    }

    fn define_projection(&mut self, ds: &DatasetRef, sr: SpatialRef) -> Result<(), GdbError> {
        let ws = self.ws_mut(&ds.workspace)?;
        if let Some(fc) = ws.feature_classes.get_mut(&ds.name) {
            fc.spatial_ref = sr;
            return Ok(());
        }
        if let Some(r) = ws.rasters.get_mut(&ds.name) {
            r.spatial_ref = sr;
            return Ok(());
        }
        Err(GdbError::missing_dataset(
            ds.workspace.display().to_string(),
            &ds.name,
        ))
    }

    fn clip(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        boundary: &DatasetRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError> {
        let fc = self.feature_class(src)?;
        let src_sr = fc.spatial_ref;
        let schema = fc.schema.clone();

        let (bnd, bnd_sr) = self.boundary_polygons(boundary)?;
        let to_src = CrsTransform::new(bnd_sr, src_sr)?;
        let bnd = match to_src.transform_geometry(&Geometry::MultiPolygon(bnd))? {
            Geometry::MultiPolygon(mp) => mp,
            _ => unreachable!("multipolygon transforms to multipolygon"),
        };

        let out_sr = ctx.output_sr.unwrap_or(src_sr);
        let to_out = CrsTransform::new(src_sr, out_sr)?;

        let fc = self.feature_class(src)?;
        let mut features = Vec::new();
        for f in &fc.features {
            if let Some(geom) = clip_geometry(&f.geometry, &bnd)? {
                features.push(Feature {
                    geometry: to_out.transform_geometry(&geom)?,
                    attrs: f.attrs.clone(),
                });
            }
        }
        trace!(dataset = %src, kept = features.len(), "clip done");

        self.ws_mut(&dst.workspace)?.feature_classes.insert(
            dst.name.clone(),
            FeatureClass {
                spatial_ref: out_sr,
                schema,
                features,
            },
        );
        Ok(())
    }

    fn extract_by_mask(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        boundary: &DatasetRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError> {
        let r = self.raster(src)?.clone();
        let (bnd, bnd_sr) = self.boundary_polygons(boundary)?;
        let to_raster = CrsTransform::new(bnd_sr, r.spatial_ref)?;
        let bnd = match to_raster.transform_geometry(&Geometry::MultiPolygon(bnd))? {
            Geometry::MultiPolygon(mp) => mp,
            _ => unreachable!(),
        };

        // Fenêtre de découpe: intersection emprise masque / emprise raster,
        // alignée sur la grille source
        let rect = bnd.bounding_rect().ok_or_else(|| GdbError::UnsupportedGeometry {
            dataset: boundary.to_string(),
            reason: "boundary has no extent".to_string(),
        })?;
        let (bx0, by0, bx1, by1) = (rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        let col0 = (((bx0 - r.origin_x) / r.cell_size).floor()).max(0.0) as usize;
        let row0 = (((r.origin_y - by1) / r.cell_size).floor()).max(0.0) as usize;
        let col1 = ((((bx1 - r.origin_x) / r.cell_size).ceil()).max(0.0) as usize).min(r.cols);
        let row1 = ((((r.origin_y - by0) / r.cell_size).ceil()).max(0.0) as usize).min(r.rows);
        let (rows, cols) = (row1.saturating_sub(row0), col1.saturating_sub(col0));

        let mut out = Raster::filled(
            r.spatial_ref,
            r.origin_x + col0 as f64 * r.cell_size,
            r.origin_y - row0 as f64 * r.cell_size,
            r.cell_size,
            rows,
            cols,
            r.nodata,
            r.nodata,
        );
        for row in 0..rows {
            for col in 0..cols {
                let (cx, cy) = out.cell_center(row, col);
                if bnd.intersects(&Point::new(cx, cy)) {
                    out.set(row, col, r.get(row0 + row, col0 + col));
                }
            }
        }

        let out = match ctx.output_sr {
            Some(sr) if sr != out.spatial_ref => project_raster_grid(&out, sr)?,
            _ => out,
        };
        self.ws_mut(&dst.workspace)?.rasters.insert(dst.name.clone(), out);
        Ok(())
    }

    fn project_feature_class(
        &mut self,
        _ctx: &OpContext,
        src: &DatasetRef,
        target: SpatialRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError> {
        let fc = self.feature_class(src)?;
        let transform = CrsTransform::new(fc.spatial_ref, target)?;
        let mut out = FeatureClass::empty(target, fc.schema.clone());
        for f in &fc.features {
            out.features.push(Feature {
                geometry: transform.transform_geometry(&f.geometry)?,
                attrs: f.attrs.clone(),
            });
        }
        self.ws_mut(&dst.workspace)?
            .feature_classes
            .insert(dst.name.clone(), out);
        Ok(())
    }

    fn project_raster(
        &mut self,
        _ctx: &OpContext,
        src: &DatasetRef,
        target: SpatialRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError> {
        let out = project_raster_grid(self.raster(src)?, target)?;
        self.ws_mut(&dst.workspace)?.rasters.insert(dst.name.clone(), out);
        Ok(())
    }

    fn copy_raster(&mut self, src: &DatasetRef, dst: &DatasetRef) -> Result<(), GdbError> {
        let r = self.raster(src)?.clone();
        self.ws_mut(&dst.workspace)?.rasters.insert(dst.name.clone(), r);
        Ok(())
    }

    fn select(&self, ds: &DatasetRef, predicate: &Predicate) -> Result<FilteredView, GdbError> {
        let data = self.tabular(ds)?;
        if data.schema().field_index(&predicate.field).is_none() {
            return Err(GdbError::field_missing(ds.to_string(), &predicate.field));
        }
        Ok(FilteredView::filtered(ds.clone(), predicate.clone()))
    }

    fn append(
        &mut self,
        view: &FilteredView,
        dst: &DatasetRef,
        policy: SchemaPolicy,
    ) -> Result<usize, GdbError> {
        let indices = self.selected_rows(view)?;
        let src = self.tabular(&view.dataset)?;
        let src_schema = src.schema().clone();

        // Matérialiser la sélection avant d'emprunter la destination
        let rows: Vec<Row> = indices.iter().map(|&i| src.row(i).clone()).collect();
        let geometries: Option<Vec<Geometry>> = match src {
            Tabular::FeatureClass(fc) => Some(
                indices.iter().map(|&i| fc.features[i].geometry.clone()).collect(),
            ),
            Tabular::Table(_) => None,
        };

        let ws = self.ws_mut(&dst.workspace)?;
        if let Some(table) = ws.tables.get_mut(&dst.name) {
            let mapped = match policy {
                SchemaPolicy::Validating => {
                    if let Some(reason) = src_schema.divergence(&table.schema) {
                        return Err(GdbError::schema_mismatch(
                            view.dataset.to_string(),
                            dst.to_string(),
                            reason,
                        ));
                    }
                    rows
                }
                SchemaPolicy::Permissive => rows
                    .iter()
                    .map(|r| MemoryEngine::map_row(&src_schema, &table.schema, r))
                    .collect(),
            };
            let count = mapped.len();
            table.rows.extend(mapped);
            return Ok(count);
        }
        if let Some(fc) = ws.feature_classes.get_mut(&dst.name) {
            let geometries = geometries.ok_or_else(|| {
                GdbError::schema_mismatch(
                    view.dataset.to_string(),
                    dst.to_string(),
                    "source has no geometry".to_string(),
                )
            })?;
            if policy == SchemaPolicy::Validating {
                if let Some(reason) = src_schema.divergence(&fc.schema) {
                    return Err(GdbError::schema_mismatch(
                        view.dataset.to_string(),
                        dst.to_string(),
                        reason,
                    ));
                }
            }
            let count = rows.len();
            for (geometry, row) in geometries.into_iter().zip(rows) {
                let attrs = match policy {
                    SchemaPolicy::Validating => row,
                    SchemaPolicy::Permissive => {
                        MemoryEngine::map_row(&src_schema, &fc.schema, &row)
                    }
                };
                fc.features.push(Feature { geometry, attrs });
            }
            return Ok(count);
        }
        Err(GdbError::missing_dataset(
            dst.workspace.display().to_string(),
            &dst.name,
        ))
    }

    fn copy_rows(&mut self, view: &FilteredView, dst: &DatasetRef) -> Result<usize, GdbError> {
        let indices = self.selected_rows(view)?;
        let src = self.tabular(&view.dataset)?;
        let schema = src.schema().clone();
        match src {
            Tabular::Table(t) => {
                let rows: Vec<Row> = indices.iter().map(|&i| t.rows[i].clone()).collect();
                let count = rows.len();
                self.ws_mut(&dst.workspace)?
                    .tables
                    .insert(dst.name.clone(), AttributeTable { schema, rows });
                Ok(count)
            }
            Tabular::FeatureClass(fc) => {
                let spatial_ref = fc.spatial_ref;
                let features: Vec<Feature> =
                    indices.iter().map(|&i| fc.features[i].clone()).collect();
                let count = features.len();
                self.ws_mut(&dst.workspace)?.feature_classes.insert(
                    dst.name.clone(),
                    FeatureClass {
                        spatial_ref,
                        schema,
                        features,
                    },
                );
                Ok(count)
            }
        }
    }

    fn mosaic(
        &mut self,
        _ctx: &OpContext,
        src: &DatasetRef,
        dst: &DatasetRef,
        policy: MosaicPolicy,
    ) -> Result<(), GdbError> {
        let target = self.raster(dst)?.clone();
        let source = project_raster_grid(self.raster(src)?, target.spatial_ref)?;

        // Grille résultat: union des emprises, alignée sur la destination
        let cell = target.cell_size;
        let (sx0, sy0, sx1, sy1) = source.extent();
        let (dx0, dy0, dx1, dy1) = target.extent();
        let (min_x, min_y) = (sx0.min(dx0), sy0.min(dy0));
        let (max_x, max_y) = (sx1.max(dx1), sy1.max(dy1));
        let origin_x = target.origin_x - ((target.origin_x - min_x) / cell).ceil().max(0.0) * cell;
        let origin_y = target.origin_y + ((max_y - target.origin_y) / cell).ceil().max(0.0) * cell;
        let cols = ((max_x - origin_x) / cell).ceil() as usize;
        let rows = ((origin_y - min_y) / cell).ceil() as usize;

        let mut out = Raster::filled(
            target.spatial_ref,
            origin_x,
            origin_y,
            cell,
            rows,
            cols,
            target.nodata,
            target.nodata,
        );
        for row in 0..rows {
            for col in 0..cols {
                let (cx, cy) = out.cell_center(row, col);
                let d = target.sample(cx, cy);
                let s = source.sample(cx, cy);
                let v = match policy {
                    MosaicPolicy::Last => s.or(d),
                    MosaicPolicy::First => d.or(s),
                };
                if let Some(v) = v {
                    out.set(row, col, v);
                }
            }
        }
        self.ws_mut(&dst.workspace)?.rasters.insert(dst.name.clone(), out);
        Ok(())
    }
}
