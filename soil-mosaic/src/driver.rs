//! Orchestration du pipeline clip → résolution → projection → fusion
//!
//! Le traitement est strictement séquentiel: la sortie accumule par append
//! et mosaïque, donc une source à la fois. La source home est reprojetée
//! puis fusionnée sans clip; chaque source adjacente passe par le cycle
//! complet avec ses deux workspaces scratch.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use geogdb::{DatasetRef, GeoEngine, SpatialRef};

use crate::graph::{ActiveOrder, TableGraph, TABLE_ORDER};
use crate::report::{RunReport, SkipReason, Stage};
use crate::resolve::{copy_selected, resolve_children, Resolution};
use crate::stages;

/// Configuration d'une exécution du pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Workspace de la zone d'intérêt, intégré sans clip
    pub home: PathBuf,
    /// Workspaces adjacents, clippés par la frontière
    pub adjacent: Vec<PathBuf>,
    /// Polygone de frontière
    pub boundary: DatasetRef,
    /// Système de coordonnées cible de la sortie
    pub target_sr: SpatialRef,
    /// Workspace template (schéma complet, objets vides)
    pub template: PathBuf,
    /// Répertoire des workspaces scratch
    pub scratch_dir: PathBuf,
    /// Répertoire de sortie
    pub output_dir: PathBuf,
    /// Nom du workspace de sortie
    pub output_name: String,
    /// Supprimer les scratchs en fin d'exécution
    pub delete_scratch: bool,
}

impl PipelineConfig {
    /// Chemin complet du workspace de sortie
    pub fn output_workspace(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }
}

fn source_stem(path: &Path) -> &str {
    path.file_stem().and_then(OsStr::to_str).unwrap_or("source")
}

/// Pipeline d'assemblage d'une mosaïque de sortie
pub struct Pipeline<'a, E: GeoEngine> {
    engine: &'a mut E,
    config: PipelineConfig,
    graph: TableGraph,
    report: RunReport,
    scratch: Vec<PathBuf>,
}

impl<'a, E: GeoEngine> Pipeline<'a, E> {
    pub fn new(engine: &'a mut E, config: PipelineConfig) -> Self {
        Self {
            engine,
            config,
            graph: TableGraph::ssurgo(),
            report: RunReport::new(),
            scratch: Vec::new(),
        }
    }

    /// Exécute le pipeline complet et retourne le rapport
    pub fn run(mut self) -> Result<RunReport> {
        let started = Instant::now();
        self.graph
            .validate(&TABLE_ORDER)
            .context("invalid relation graph")?;

        let output = self.prepare_output()?;
        let home = self.config.home.clone();
        self.process_home(&home, &output)
            .with_context(|| format!("processing home source {}", home.display()))?;

        for source in self.config.adjacent.clone() {
            self.process_adjacent(&source, &output)
                .with_context(|| format!("processing adjacent source {}", source.display()))?;
        }

        self.cleanup();
        self.report.set_duration(started.elapsed());
        info!(summary = %self.report.summary(), "Run complete");
        Ok(self.report)
    }

    /// Instancie la sortie depuis le template et aligne sa projection
    fn prepare_output(&mut self) -> Result<PathBuf> {
        let output = self.config.output_workspace();
        info!(output = %output.display(), "Preparing output workspace");
        if self.engine.workspace_exists(&output) {
            info!("{} already exists. Deleting.", output.display());
            self.engine.delete_workspace(&output)?;
        }
        self.engine.copy_workspace(&self.config.template, &output)?;

        info!("Redefining output projection");
        for name in self.engine.list_feature_classes(&output)? {
            self.engine
                .define_projection(&DatasetRef::new(&output, name), self.config.target_sr)?;
        }
        for name in self.engine.list_rasters(&output)? {
            self.engine
                .define_projection(&DatasetRef::new(&output, name), self.config.target_sr)?;
        }
        Ok(output)
    }

    /// Source home: reprojection directe puis fusion, sans clip
    fn process_home(&mut self, source: &Path, output: &Path) -> Result<()> {
        info!(source = %source.display(), "Processing home source {}", source_stem(source));
        self.report.start_source(source_stem(source));

        let scratch = self.make_scratch(source, "scratch")?;
        stages::project_feature_classes(
            self.engine,
            &mut self.report,
            source,
            self.config.target_sr,
            &scratch,
        )?;
        stages::project_rasters(
            self.engine,
            &mut self.report,
            source,
            self.config.target_sr,
            output,
        )?;
        stages::merge_into(self.engine, &mut self.report, &scratch, output)?;
        stages::append_tables(self.engine, &mut self.report, source, output)?;
        Ok(())
    }

    /// Source adjacente: clip, résolution relationnelle, projection, fusion
    fn process_adjacent(&mut self, source: &Path, output: &Path) -> Result<()> {
        info!(source = %source.display(), "Starting {}", source_stem(source));
        self.report.start_source(source_stem(source));

        let clip_scratch = self.make_scratch(source, "scratch")?;
        let order = stages::clip_workspace(
            self.engine,
            &mut self.report,
            source,
            &self.config.boundary,
            &clip_scratch,
        )?;

        self.copy_related_rows(&clip_scratch, source, &order)?;

        let prj_scratch = self.make_scratch(source, "scratch_prj")?;
        stages::project_feature_classes(
            self.engine,
            &mut self.report,
            &clip_scratch,
            self.config.target_sr,
            &prj_scratch,
        )?;
        stages::project_rasters(
            self.engine,
            &mut self.report,
            &clip_scratch,
            self.config.target_sr,
            output,
        )?;
        stages::merge_into(self.engine, &mut self.report, &prj_scratch, output)?;
        stages::append_tables(self.engine, &mut self.report, &clip_scratch, output)?;
        Ok(())
    }

    /// Descend la hiérarchie dans l'ordre topologique effectif
    ///
    /// Les clés parents sont lues dans le scratch clippé, les lignes enfants
    /// dans la source non clippée, et la copie alimente le scratch: une table
    /// copiée devient parent à son tour au passage suivant de l'ordre.
    fn copy_related_rows(
        &mut self,
        scratch: &Path,
        source: &Path,
        order: &ActiveOrder,
    ) -> Result<()> {
        for table in order.iter() {
            let parent = DatasetRef::new(scratch, table);
            if !self.engine.dataset_exists(&parent) {
                debug!(table, "Parent never copied, descendants unreachable");
                continue;
            }
            for relation in self.graph.children(table) {
                let child_src = DatasetRef::new(source, relation.child);
                if !self.engine.dataset_exists(&child_src) {
                    debug!(child = relation.child, "Child table absent from source");
                    continue;
                }
                match resolve_children(
                    self.engine,
                    &parent,
                    relation.key,
                    &child_src,
                    relation.key,
                )? {
                    Resolution::Selected(view) => {
                        let dst = DatasetRef::new(scratch, relation.child);
                        let rows = copy_selected(self.engine, &view, &dst)?;
                        self.report.record_related_rows(rows);
                    }
                    Resolution::SkipEmptyParent => {
                        self.report
                            .record_skip(Stage::Resolve, table, SkipReason::EmptySource);
                        break;
                    }
                    Resolution::SkipEmptyChild => {
                        self.report.record_skip(
                            Stage::Resolve,
                            relation.child,
                            SkipReason::EmptyChild,
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Crée un workspace scratch nommé d'après la source
    fn make_scratch(&mut self, source: &Path, suffix: &str) -> Result<PathBuf> {
        let path = self
            .config
            .scratch_dir
            .join(format!("{}_{}", source_stem(source), suffix));
        debug!(scratch = %path.display(), "Creating scratch workspace");
        self.engine.create_workspace(&path, true)?;
        self.scratch.push(path.clone());
        Ok(path)
    }

    /// Supprime les scratchs; un échec est loggé, jamais fatal
    fn cleanup(&mut self) {
        if !self.config.delete_scratch {
            return;
        }
        info!("Deleting temporary data");
        for ws in self.scratch.clone() {
            match self.engine.delete_workspace(&ws) {
                Ok(()) => {
                    info!(scratch = %ws.display(), "Deleted");
                    self.report.record_scratch_deleted();
                }
                Err(err) => {
                    warn!(scratch = %ws.display(), error = %err, "Failed to delete scratch workspace");
                    self.report.record_scratch_delete_failure();
                }
            }
        }
    }
}
