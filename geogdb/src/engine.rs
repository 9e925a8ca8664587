//! Interface du moteur géospatial
//!
//! Le trait `GeoEngine` expose les primitives consommées par le pipeline:
//! gestion des workspaces, énumération, clip, reprojection, sélection,
//! append, mosaïque. L'environnement de traitement n'est pas un état global
//! mutable: chaque opération reçoit un `OpContext` explicite, construit
//! immuablement par l'appelant.

use std::path::Path;

use crate::crs::SpatialRef;
use crate::error::GdbError;
use crate::predicate::Predicate;
use crate::types::{FieldType, Value};
use crate::workspace::DatasetRef;

/// Contexte de traitement d'une opération spatiale
///
/// Remplace l'environnement processus (système de coordonnées de sortie
/// actif, overwrite) par une valeur passée à chaque appel; le masque des
/// opérations raster est l'argument `boundary` explicite.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    /// Système de coordonnées de sortie; None = conserver celui de l'entrée
    pub output_sr: Option<SpatialRef>,
    /// Écraser les datasets de sortie existants
    pub overwrite: bool,
}

impl OpContext {
    /// Contexte avec système de coordonnées de sortie imposé
    pub fn with_output_sr(sr: SpatialRef) -> Self {
        Self {
            output_sr: Some(sr),
            overwrite: true,
            ..Default::default()
        }
    }

    /// Contexte par défaut avec overwrite autorisé
    pub fn overwriting() -> Self {
        Self {
            overwrite: true,
            ..Default::default()
        }
    }
}

/// Politique de validation de schéma lors d'un append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Schémas strictement identiques, sinon `SchemaMismatch`
    Validating,
    /// Mapping par nom de colonne, colonnes absentes remplies à NULL
    Permissive,
}

/// Politique de résolution des cellules recouvrantes lors d'une mosaïque
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosaicPolicy {
    /// La destination gagne où elle porte déjà une valeur
    First,
    /// La source gagne où elle porte une valeur
    Last,
}

/// Vue filtrée sur un dataset: sous-ensemble logique, pas une copie
///
/// L'artefact de sélection est une simple valeur; il disparaît quand
/// la vue sort de la portée de l'appelant.
#[derive(Debug, Clone)]
pub struct FilteredView {
    /// Dataset source de la vue
    pub dataset: DatasetRef,
    /// Prédicat de sélection; None = toutes les lignes
    pub predicate: Option<Predicate>,
}

impl FilteredView {
    /// Vue couvrant l'intégralité d'un dataset
    pub fn all(dataset: DatasetRef) -> Self {
        Self {
            dataset,
            predicate: None,
        }
    }

    /// Vue restreinte par un prédicat
    pub fn filtered(dataset: DatasetRef, predicate: Predicate) -> Self {
        Self {
            dataset,
            predicate: Some(predicate),
        }
    }
}

/// Moteur géospatial: primitives workspace, vecteur et raster
pub trait GeoEngine {
    // --- Workspaces ---

    /// Le workspace existe-t-il?
    fn workspace_exists(&self, ws: &Path) -> bool;

    /// Crée un workspace vide (échoue s'il existe déjà, sauf overwrite)
    fn create_workspace(&mut self, ws: &Path, overwrite: bool) -> Result<(), GdbError>;

    /// Supprime un workspace et tout son contenu
    fn delete_workspace(&mut self, ws: &Path) -> Result<(), GdbError>;

    /// Copie intégrale d'un workspace (schémas et données)
    fn copy_workspace(&mut self, src: &Path, dst: &Path) -> Result<(), GdbError>;

    // --- Énumération ---

    fn list_feature_classes(&self, ws: &Path) -> Result<Vec<String>, GdbError>;
    fn list_tables(&self, ws: &Path) -> Result<Vec<String>, GdbError>;
    fn list_rasters(&self, ws: &Path) -> Result<Vec<String>, GdbError>;

    /// Le dataset existe-t-il (table, classe d'entités ou raster)?
    fn dataset_exists(&self, ds: &DatasetRef) -> bool;

    /// Supprime un dataset
    fn delete_dataset(&mut self, ds: &DatasetRef) -> Result<(), GdbError>;

    // --- Lecture attributaire ---

    /// Nombre de lignes d'une table ou classe d'entités
    fn row_count(&self, ds: &DatasetRef) -> Result<usize, GdbError>;

    /// Type déclaré d'un champ (`FieldMissing` si absent du schéma)
    fn field_type(&self, ds: &DatasetRef, field: &str) -> Result<FieldType, GdbError>;

    /// Curseur sur une colonne: valeurs du champ, ligne par ligne
    fn field_values(&self, ds: &DatasetRef, field: &str) -> Result<Vec<Value>, GdbError>;

    /// Nombre de lignes retenues par une vue filtrée
    fn view_row_count(&self, view: &FilteredView) -> Result<usize, GdbError>;

    // --- Systèmes de coordonnées ---

    /// Système de coordonnées d'un dataset spatial
    fn spatial_ref(&self, ds: &DatasetRef) -> Result<SpatialRef, GdbError>;

    /// Redéfinit la projection déclarée (sans transformer les données)
    fn define_projection(&mut self, ds: &DatasetRef, sr: SpatialRef) -> Result<(), GdbError>;

    // --- Opérations spatiales ---

    /// Découpe une classe d'entités par un polygone de frontière
    fn clip(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        boundary: &DatasetRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError>;

    /// Extrait les valeurs raster tombant dans le masque de la frontière
    fn extract_by_mask(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        boundary: &DatasetRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError>;

    /// Reprojette une classe d'entités vers un système cible
    fn project_feature_class(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        target: SpatialRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError>;

    /// Reprojette un raster vers un système cible (rééchantillonnage)
    fn project_raster(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        target: SpatialRef,
        dst: &DatasetRef,
    ) -> Result<(), GdbError>;

    /// Copie un raster tel quel
    fn copy_raster(&mut self, src: &DatasetRef, dst: &DatasetRef) -> Result<(), GdbError>;

    // --- Sélection et copie ---

    /// Sélection par prédicat: retourne une vue logique, pas une copie
    fn select(&self, ds: &DatasetRef, predicate: &Predicate) -> Result<FilteredView, GdbError>;

    /// Ajoute les lignes d'une vue dans un dataset existant
    fn append(
        &mut self,
        view: &FilteredView,
        dst: &DatasetRef,
        policy: SchemaPolicy,
    ) -> Result<usize, GdbError>;

    /// Copie les lignes d'une vue vers un dataset neuf (schéma inféré)
    fn copy_rows(&mut self, view: &FilteredView, dst: &DatasetRef) -> Result<usize, GdbError>;

    /// Mosaïque un raster source dans un raster destination existant
    ///
    /// L'emprise résultat est l'union des emprises; `MissingDataset` si la
    /// destination n'existe pas encore (l'appelant copie au premier passage).
    fn mosaic(
        &mut self,
        ctx: &OpContext,
        src: &DatasetRef,
        dst: &DatasetRef,
        policy: MosaicPolicy,
    ) -> Result<(), GdbError>;
}
