//! Résolution relationnelle et copie sélective
//!
//! Détermine quels enregistrements enfants sont atteignables depuis un
//! ensemble de parents survivants au clip, puis les copie en sémantique
//! create-or-append. Les entrées vides court-circuitent la sélection:
//! un skip est une décision locale, jamais une erreur.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, info};

use geogdb::{DatasetRef, FilteredView, GeoEngine, Predicate, SchemaPolicy, Value};

/// Issue d'une résolution parent → enfant
#[derive(Debug)]
pub enum Resolution {
    /// Sélection prête à copier
    Selected(FilteredView),
    /// Parent sans clé survivante: rien à résoudre
    SkipEmptyParent,
    /// Table enfant vide: inutile de sélectionner
    SkipEmptyChild,
}

/// Ensemble des valeurs distinctes d'un champ de jointure
///
/// Recalculé par parent et par source, jamais mis en cache: le contenu
/// survivant change à chaque clip.
pub fn key_set<E: GeoEngine>(
    engine: &E,
    layer: &DatasetRef,
    field: &str,
) -> Result<BTreeSet<Value>> {
    let values = engine.field_values(layer, field)?;
    Ok(values.into_iter().filter(|v| !v.is_null()).collect())
}

/// Résout les enregistrements enfants liés à un parent survivant
///
/// Double contrôle d'emptiness: clé parent vide, ou table enfant vide,
/// chacun court-circuite la sélection avec un diagnostic unique.
pub fn resolve_children<E: GeoEngine>(
    engine: &E,
    parent: &DatasetRef,
    parent_field: &str,
    child: &DatasetRef,
    child_field: &str,
) -> Result<Resolution> {
    let keys = key_set(engine, parent, parent_field)?;
    if keys.is_empty() {
        info!(dataset = %parent, "{} is empty, skipping", parent.name);
        return Ok(Resolution::SkipEmptyParent);
    }
    if engine.row_count(child)? == 0 {
        info!(dataset = %child, "{} is empty, skipping", child.name);
        return Ok(Resolution::SkipEmptyChild);
    }

    let field_type = engine.field_type(child, child_field)?;
    let predicate = Predicate::membership(child_field, field_type, keys);
    debug!(predicate = %predicate, "Selecting related records");
    Ok(Resolution::Selected(engine.select(child, &predicate)?))
}

/// Copie une vue filtrée vers la destination en create-or-append
///
/// Destination existante: append validant (une divergence de schéma est
/// fatale, elle signale un mélange de versions). Absente: copie neuve,
/// schéma inféré de la source. Retourne le nombre de lignes copiées.
pub fn copy_selected<E: GeoEngine>(
    engine: &mut E,
    view: &FilteredView,
    dst: &DatasetRef,
) -> Result<usize> {
    let count = engine.view_row_count(view)?;
    if engine.dataset_exists(dst) {
        info!(target = %dst, rows = count, "{} found, appending", dst.name);
        engine.append(view, dst, SchemaPolicy::Validating)?;
    } else {
        info!(target = %dst, rows = count, "{} not found, copying", dst.name);
        engine.copy_rows(view, dst)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogdb::{
        AttributeTable, Field, FieldType, MemoryEngine, Schema, Workspace,
    };
    use std::path::Path;

    fn table(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> AttributeTable {
        AttributeTable {
            schema: Schema::new(fields),
            rows,
        }
    }

    fn fixture() -> MemoryEngine {
        let mut engine = MemoryEngine::new();
        let mut ws = Workspace::default();
        ws.tables.insert(
            "mapunit".to_string(),
            table(
                vec![Field::new("mukey", FieldType::Text)],
                vec![
                    vec![Value::from("100125")],
                    vec![Value::from("100126")],
                    // Doublon volontaire: le key set doit dédupliquer
                    vec![Value::from("100125")],
                    vec![Value::Null],
                ],
            ),
        );
        ws.tables.insert(
            "component".to_string(),
            table(
                vec![
                    Field::new("mukey", FieldType::Text),
                    Field::new("compname", FieldType::Text),
                ],
                vec![
                    vec![Value::from("100125"), Value::from("Plano")],
                    vec![Value::from("100126"), Value::from("Ringwood")],
                    vec![Value::from("999999"), Value::from("Elsewhere")],
                ],
            ),
        );
        ws.tables.insert(
            "muaggatt".to_string(),
            table(vec![Field::new("mukey", FieldType::Text)], vec![]),
        );
        ws.tables.insert(
            "empty_parent".to_string(),
            table(vec![Field::new("mukey", FieldType::Text)], vec![]),
        );
        engine.insert_workspace("/gdb", ws);
        engine
    }

    #[test]
    fn test_key_set_dedups_and_drops_null() {
        let engine = fixture();
        let keys = key_set(&engine, &DatasetRef::new("/gdb", "mapunit"), "mukey").unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_resolve_selects_exact_membership() {
        let mut engine = fixture();
        let res = resolve_children(
            &engine,
            &DatasetRef::new("/gdb", "mapunit"),
            "mukey",
            &DatasetRef::new("/gdb", "component"),
            "mukey",
        )
        .unwrap();
        let view = match res {
            Resolution::Selected(v) => v,
            other => panic!("expected selection, got {:?}", other),
        };
        assert_eq!(engine.view_row_count(&view).unwrap(), 2);

        let copied = copy_selected(&mut engine, &view, &DatasetRef::new("/gdb", "component_out"))
            .unwrap();
        assert_eq!(copied, 2);
        let out = &engine.workspace(Path::new("/gdb")).unwrap().tables["component_out"];
        let names: Vec<String> = out.rows.iter().map(|r| r[1].to_string()).collect();
        assert!(names.contains(&"Plano".to_string()));
        assert!(names.contains(&"Ringwood".to_string()));
        assert!(!names.contains(&"Elsewhere".to_string()));
    }

    #[test]
    fn test_resolve_skips_empty_parent() {
        let engine = fixture();
        let res = resolve_children(
            &engine,
            &DatasetRef::new("/gdb", "empty_parent"),
            "mukey",
            &DatasetRef::new("/gdb", "component"),
            "mukey",
        )
        .unwrap();
        assert!(matches!(res, Resolution::SkipEmptyParent));
    }

    #[test]
    fn test_resolve_skips_empty_child() {
        let engine = fixture();
        let res = resolve_children(
            &engine,
            &DatasetRef::new("/gdb", "mapunit"),
            "mukey",
            &DatasetRef::new("/gdb", "muaggatt"),
            "mukey",
        )
        .unwrap();
        assert!(matches!(res, Resolution::SkipEmptyChild));
    }

    #[test]
    fn test_resolve_missing_join_field_is_fatal() {
        let engine = fixture();
        let err = resolve_children(
            &engine,
            &DatasetRef::new("/gdb", "mapunit"),
            "mukey",
            &DatasetRef::new("/gdb", "component"),
            "nosuchkey",
        )
        .unwrap_err();
        assert!(err.to_string().contains("nosuchkey"));
    }

    #[test]
    fn test_resolve_value_with_embedded_quote() {
        let mut engine = fixture();
        let mut ws = Workspace::default();
        ws.tables.insert(
            "parent".to_string(),
            table(
                vec![Field::new("muname", FieldType::Text)],
                vec![vec![Value::from("O'Brien silt loam")]],
            ),
        );
        ws.tables.insert(
            "child".to_string(),
            table(
                vec![Field::new("muname", FieldType::Text)],
                vec![
                    vec![Value::from("O'Brien silt loam")],
                    vec![Value::from("Plano silt loam")],
                ],
            ),
        );
        engine.insert_workspace("/q", ws);

        let res = resolve_children(
            &engine,
            &DatasetRef::new("/q", "parent"),
            "muname",
            &DatasetRef::new("/q", "child"),
            "muname",
        )
        .unwrap();
        let view = match res {
            Resolution::Selected(v) => v,
            other => panic!("expected selection, got {:?}", other),
        };
        // Le quoting est doublé au rendu, l'évaluation reste exacte
        assert!(view
            .predicate
            .as_ref()
            .unwrap()
            .to_string()
            .contains("O''Brien"));
        assert_eq!(engine.view_row_count(&view).unwrap(), 1);
    }

    #[test]
    fn test_copy_selected_create_then_append_doubles_rows() {
        let mut engine = fixture();
        let view = FilteredView::all(DatasetRef::new("/gdb", "component"));
        let dst = DatasetRef::new("/gdb", "component_copy");

        let first = copy_selected(&mut engine, &view, &dst).unwrap();
        let second = copy_selected(&mut engine, &view, &dst).unwrap();
        assert_eq!(first, 3);
        assert_eq!(second, 3);
        let out = &engine.workspace(Path::new("/gdb")).unwrap().tables["component_copy"];
        assert_eq!(out.len(), 6);
    }
}
