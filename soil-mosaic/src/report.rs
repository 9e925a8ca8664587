//! Rapport d'exécution du pipeline
//!
//! Collecte les compteurs par étape et les décisions de skip, pour
//! l'affichage console et l'export JSON (journal de progression visible
//! par l'hôte).

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

/// Étape du pipeline ayant produit un événement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Clip,
    Resolve,
    Project,
    Merge,
    Cleanup,
}

/// Motif d'un skip (jamais une erreur: signal de contrôle local)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Dataset source sans ligne
    EmptySource,
    /// Table enfant sans ligne
    EmptyChild,
    /// Objet absent du workspace de sortie (hors schéma du template)
    NotInTemplate,
}

/// Décision de skip enregistrée
#[derive(Debug, Clone, Serialize)]
pub struct SkipRecord {
    /// Étape concernée
    pub stage: Stage,
    /// Nom du dataset skippé
    pub dataset: String,
    /// Motif
    pub reason: SkipReason,
}

/// Compteurs d'une source traitée
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    /// Classes d'entités clippées
    pub clipped: usize,
    /// Datasets reprojetés
    pub projected: usize,
    /// Objets appendés dans la sortie
    pub appended: usize,
    /// Rasters mosaïqués ou copiés au premier passage
    pub mosaicked: usize,
    /// Lignes copiées par le resolver relationnel
    pub related_rows: usize,
}

/// Rapport complet d'une exécution du pipeline
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Durée de l'exécution
    pub duration_secs: f64,
    /// Sources traitées (home comprise)
    pub sources_processed: usize,
    /// Compteurs par source, dans l'ordre de traitement
    pub by_source: Vec<(String, SourceStats)>,
    /// Décisions de skip, dans l'ordre d'émission
    pub skips: Vec<SkipRecord>,
    /// Workspaces scratch supprimés au cleanup
    pub scratch_deleted: usize,
    /// Échecs de suppression (loggés, non fatals)
    pub scratch_delete_failures: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ouvre les compteurs d'une nouvelle source
    pub fn start_source(&mut self, name: &str) {
        self.sources_processed += 1;
        self.by_source.push((name.to_string(), SourceStats::default()));
    }

    fn current(&mut self) -> &mut SourceStats {
        if self.by_source.is_empty() {
            self.by_source.push(("<none>".to_string(), SourceStats::default()));
        }
        &mut self.by_source.last_mut().expect("just pushed").1
    }

    pub fn record_clip(&mut self) {
        self.current().clipped += 1;
    }

    pub fn record_projection(&mut self) {
        self.current().projected += 1;
    }

    pub fn record_append(&mut self) {
        self.current().appended += 1;
    }

    pub fn record_mosaic(&mut self) {
        self.current().mosaicked += 1;
    }

    pub fn record_related_rows(&mut self, rows: usize) {
        self.current().related_rows += rows;
    }

    /// Enregistre une décision de skip
    pub fn record_skip(&mut self, stage: Stage, dataset: &str, reason: SkipReason) {
        self.skips.push(SkipRecord {
            stage,
            dataset: dataset.to_string(),
            reason,
        });
    }

    pub fn record_scratch_deleted(&mut self) {
        self.scratch_deleted += 1;
    }

    pub fn record_scratch_delete_failure(&mut self) {
        self.scratch_delete_failures += 1;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Skips enregistrés pour un dataset donné
    pub fn skips_for(&self, dataset: &str) -> usize {
        self.skips.iter().filter(|s| s.dataset == dataset).count()
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("MOSAIC RUN REPORT");
        println!("{}", "=".repeat(60));
        println!("\nDuration: {:.2}s", self.duration_secs);
        println!("Sources processed: {}", self.sources_processed);

        for (name, stats) in &self.by_source {
            println!(
                "  {}: {} clipped, {} projected, {} appended, {} mosaicked, {} related rows",
                name,
                stats.clipped,
                stats.projected,
                stats.appended,
                stats.mosaicked,
                stats.related_rows
            );
        }

        if !self.skips.is_empty() {
            println!("\n--- SKIPS ({}) ---", self.skips.len());
            for s in self.skips.iter().take(20) {
                println!("  {:?} {} ({:?})", s.stage, s.dataset, s.reason);
            }
            if self.skips.len() > 20 {
                println!("  ... and {} more", self.skips.len() - 20);
            }
        }

        if self.scratch_deleted > 0 || self.scratch_delete_failures > 0 {
            println!(
                "\nScratch cleanup: {} deleted, {} failures",
                self.scratch_deleted, self.scratch_delete_failures
            );
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Résumé compact
    pub fn summary(&self) -> String {
        let appended: usize = self.by_source.iter().map(|(_, s)| s.appended).sum();
        let related: usize = self.by_source.iter().map(|(_, s)| s.related_rows).sum();
        format!(
            "{} sources, {} objects appended, {} related rows, {} skips",
            self.sources_processed,
            appended,
            related,
            self.skips.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_follow_current_source() {
        let mut report = RunReport::new();
        report.start_source("WI025");
        report.record_clip();
        report.record_clip();
        report.start_source("WI027");
        report.record_clip();
        report.record_related_rows(12);

        assert_eq!(report.sources_processed, 2);
        assert_eq!(report.by_source[0].1.clipped, 2);
        assert_eq!(report.by_source[1].1.clipped, 1);
        assert_eq!(report.by_source[1].1.related_rows, 12);
    }

    #[test]
    fn test_skip_records_are_ordered() {
        let mut report = RunReport::new();
        report.record_skip(Stage::Clip, "FEATLINE", SkipReason::EmptySource);
        report.record_skip(Stage::Resolve, "component", SkipReason::EmptyChild);

        assert_eq!(report.skips.len(), 2);
        assert_eq!(report.skips_for("component"), 1);
        assert_eq!(report.skips[0].dataset, "FEATLINE");
    }

    #[test]
    fn test_summary() {
        let mut report = RunReport::new();
        report.start_source("home");
        report.record_append();
        report.record_related_rows(3);
        let s = report.summary();
        assert!(s.contains("1 sources"));
        assert!(s.contains("1 objects appended"));
    }
}
