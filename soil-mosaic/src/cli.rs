//! Implémentation de la commande run
//!
//! Fait le pont entre les entrées texte de l'hôte (listes de chemins
//! séparées par `;`, frontière `workspace:NOM`, code EPSG) et la
//! configuration typée du pipeline.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use geogdb::{DatasetRef, GeoEngine, MemoryEngine, SpatialRef};

use crate::driver::{Pipeline, PipelineConfig};

/// Sépare une liste de chemins `a;b;c` (guillemets simples tolérés)
pub fn split_source_list(raw: &str) -> Vec<PathBuf> {
    raw.split(';')
        .map(|s| s.trim().trim_matches('\''))
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Interprète une spécification de frontière `workspace:NOM`
///
/// Sans suffixe `:NOM`, le workspace doit contenir exactement une classe
/// d'entités, qui devient la frontière. Le workspace est chargé dans le
/// moteur au passage.
pub fn parse_boundary(engine: &mut MemoryEngine, raw: &str) -> Result<DatasetRef> {
    // Un suffixe `:NOM` ne contient ni séparateur de chemin ni extension
    let (path_part, name) = match raw.rsplit_once(':') {
        Some((p, n))
            if p.len() > 1 && !n.is_empty() && !n.contains(['/', '\\', '.']) =>
        {
            (p, Some(n))
        }
        _ => (raw, None),
    };

    let ws = PathBuf::from(path_part);
    engine
        .load_workspace(&ws)
        .with_context(|| format!("loading boundary workspace {}", ws.display()))?;

    let classes = engine.list_feature_classes(&ws)?;
    let name = match name {
        Some(n) => {
            if !classes.iter().any(|c| c == n) {
                bail!("boundary {} not found in {}", n, ws.display());
            }
            n.to_string()
        }
        None => match classes.as_slice() {
            [single] => single.clone(),
            [] => bail!("boundary workspace {} has no feature class", ws.display()),
            _ => bail!(
                "boundary workspace {} holds several feature classes, use {}:NAME",
                ws.display(),
                ws.display()
            ),
        },
    };
    Ok(DatasetRef::new(ws, name))
}

/// Exécute le pipeline de bout en bout
#[allow(clippy::too_many_arguments)]
pub fn cmd_run(
    home: &Path,
    adjacent: &str,
    boundary_spec: &str,
    target: &str,
    template: &Path,
    scratch_dir: &Path,
    output_dir: &Path,
    output_name: &str,
    delete_scratch: bool,
) -> Result<()> {
    let mut engine = MemoryEngine::new();

    engine
        .load_workspace(home)
        .with_context(|| format!("loading home workspace {}", home.display()))?;
    let adjacent_list = split_source_list(adjacent);
    for source in &adjacent_list {
        engine
            .load_workspace(source)
            .with_context(|| format!("loading adjacent workspace {}", source.display()))?;
    }
    engine
        .load_workspace(template)
        .with_context(|| format!("loading template workspace {}", template.display()))?;
    let boundary = parse_boundary(&mut engine, boundary_spec)?;

    let target_sr: SpatialRef = target
        .parse()
        .with_context(|| format!("parsing target coordinate system {:?}", target))?;
    if !target_sr.is_supported() {
        bail!("unsupported target coordinate system {}", target_sr);
    }

    let config = PipelineConfig {
        home: home.to_path_buf(),
        adjacent: adjacent_list,
        boundary,
        target_sr,
        template: template.to_path_buf(),
        scratch_dir: scratch_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        output_name: output_name.to_string(),
        delete_scratch,
    };
    let output = config.output_workspace();

    let report = Pipeline::new(&mut engine, config).run()?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    engine
        .save_workspace(&output, &output)
        .with_context(|| format!("saving output workspace {}", output.display()))?;
    info!(output = %output.display(), "Output workspace saved");

    report.display();
    let report_path = output_dir.join(format!("{}.report.json", output_name));
    report.save_to_file(&report_path)?;
    info!(report = %report_path.display(), "Run report saved");

    Ok(())
}
