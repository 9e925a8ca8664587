//! Point d'entrée CLI pour soil-mosaic

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use soil_mosaic::cli;

/// Assembler une mosaïque SSURGO clippée, reprojetée et fusionnée
#[derive(Parser)]
#[command(name = "soil-mosaic")]
#[command(author, version)]
#[command(about = "Assembler plusieurs géodatabases SSURGO en une sortie unique")]
#[command(
    long_about = "Clippe les géodatabases adjacentes par la frontière, reprojette vers le \
système cible, puis fusionne le tout (avec la géodatabase home) dans une sortie instanciée \
depuis le template."
)]
struct Cli {
    /// Géodatabase home (zone d'intérêt, intégrée sans clip)
    home: PathBuf,

    /// Géodatabases adjacentes, séparées par `;`
    adjacent: String,

    /// Frontière: workspace ou `workspace:NOM`
    boundary: String,

    /// Système de coordonnées cible (ex: EPSG:5070)
    target_crs: String,

    /// Géodatabase template (schéma complet, objets vides)
    template: PathBuf,

    /// Répertoire des workspaces scratch
    scratch_dir: PathBuf,

    /// Répertoire de sortie
    output_dir: PathBuf,

    /// Nom du workspace de sortie
    output_name: String,

    /// Supprimer les workspaces scratch en fin d'exécution
    #[arg(long)]
    delete_scratch: bool,

    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!(
        home = %cli.home.display(),
        boundary = %cli.boundary,
        target = %cli.target_crs,
        "Starting mosaic run"
    );
    cli::cmd_run(
        &cli.home,
        &cli.adjacent,
        &cli.boundary,
        &cli.target_crs,
        &cli.template,
        &cli.scratch_dir,
        &cli.output_dir,
        &cli.output_name,
        cli.delete_scratch,
    )?;

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
