//! Hiérarchie relationnelle des tables SSURGO
//!
//! Le graphe parent → enfants est figé (c'est le modèle de données SSURGO),
//! mais il est validé au démarrage au lieu d'être un littéral de confiance:
//! acyclicité, et présence de chaque parent dans l'ordre topologique fixe.
//! L'ordre de travail effectif d'une exécution (`ActiveOrder`) est dérivé
//! une fois après le clip, jamais muté en cours d'itération.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Ordre topologique fixe de traversée: chaque parent avant ses descendants
pub const TABLE_ORDER: [&str; 17] = [
    "MUPOLYGON",
    "mapunit",
    "component",
    "chorizon",
    "chstructgrp",
    "chtexturegrp",
    "chtexture",
    "coforprod",
    "cogeomordesc",
    "comonth",
    "copmgrp",
    "muaoverlap",
    "legend",
    "SAPOLYGON",
    "sacatalog",
    "FEATLINE",
    "FEATPOINT",
];

/// Relation parent → enfant: table enfant et champ de jointure
///
/// Le champ de jointure porte le même nom des deux côtés de la relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub child: &'static str,
    pub key: &'static str,
}

const fn rel(child: &'static str, key: &'static str) -> Relation {
    Relation { child, key }
}

/// Erreurs de validation du graphe relationnel
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Relation graph contains a cycle through {0}")]
    Cycle(String),

    #[error("Traversal parent {0} is missing from the table order")]
    ParentNotOrdered(String),
}

/// Graphe relationnel parent → enfants
#[derive(Debug, Clone)]
pub struct TableGraph {
    children: BTreeMap<&'static str, Vec<Relation>>,
}

impl TableGraph {
    /// Hiérarchie SSURGO complète (jusqu'à 4 niveaux de jointure)
    pub fn ssurgo() -> Self {
        let mut children: BTreeMap<&'static str, Vec<Relation>> = BTreeMap::new();
        children.insert("MUPOLYGON", vec![rel("mapunit", "mukey")]);
        children.insert(
            "mapunit",
            vec![
                rel("legend", "lkey"),
                rel("component", "mukey"),
                rel("muaggatt", "mukey"),
                rel("muaoverlap", "mukey"),
                rel("mucropyld", "mukey"),
                rel("mutext", "mukey"),
                rel("Lookup_Mukey", "mukey"),
            ],
        );
        children.insert(
            "component",
            vec![
                rel("chorizon", "cokey"),
                rel("cocanopycover", "cokey"),
                rel("cocropyld", "cokey"),
                rel("codiagfeatures", "cokey"),
                rel("coecoclass", "cokey"),
                rel("coeplants", "cokey"),
                rel("coerosionacc", "cokey"),
                rel("coforprod", "cokey"),
                rel("cogeomordesc", "cokey"),
                rel("cohydriccriteria", "cokey"),
                rel("cointerp", "cokey"),
                rel("comonth", "cokey"),
                rel("copmgrp", "cokey"),
                rel("copwindbreak", "cokey"),
                rel("corestrictions", "cokey"),
                rel("cosurffrags", "cokey"),
                rel("cotaxfmmin", "cokey"),
                rel("cotaxmoistcl", "cokey"),
                rel("cotext", "cokey"),
                rel("cotreestomng", "cokey"),
                rel("cotxfmother", "cokey"),
            ],
        );
        children.insert(
            "chorizon",
            vec![
                rel("chaashto", "chkey"),
                rel("chconsistence", "chkey"),
                rel("chdesgnsuffix", "chkey"),
                rel("chfrags", "chkey"),
                rel("chpores", "chkey"),
                rel("chstructgrp", "chkey"),
                rel("chtext", "chkey"),
                rel("chtexturegrp", "chkey"),
                rel("chunified", "chkey"),
            ],
        );
        children.insert("chstructgrp", vec![rel("chstruct", "chstructgrpkey")]);
        children.insert("chtexturegrp", vec![rel("chtexture", "chtgkey")]);
        children.insert("chtexture", vec![rel("chtexturemod", "chtkey")]);
        children.insert("coforprod", vec![rel("coforprodo", "cofprodkey")]);
        children.insert(
            "cogeomordesc",
            vec![
                rel("cosurfmorphgc", "cogeomdkey"),
                rel("cosurfmorphhpp", "cogeomdkey"),
                rel("cosurfmorphmr", "cogeomdkey"),
                rel("cosurfmorphss", "cogeomdkey"),
            ],
        );
        children.insert(
            "comonth",
            vec![rel("cosoilmoist", "comonthkey"), rel("cosoiltemp", "comonthkey")],
        );
        children.insert("copmgrp", vec![rel("copm", "copmgrpkey")]);
        children.insert("muaoverlap", vec![rel("laoverlap", "lareaovkey")]);
        children.insert(
            "legend",
            vec![rel("laoverlap", "lkey"), rel("legendtext", "lkey")],
        );
        children.insert("SAPOLYGON", vec![rel("sacatalog", "areasymbol")]);
        children.insert("sacatalog", vec![rel("sainterp", "sacatalogkey")]);
        children.insert("FEATLINE", vec![rel("featdesc", "featkey")]);
        children.insert("FEATPOINT", vec![rel("featdesc", "featkey")]);
        Self { children }
    }

    /// Relations sortantes d'une table (vide si feuille)
    pub fn children(&self, table: &str) -> &[Relation] {
        self.children
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Valide le graphe: acyclique, et chaque parent présent dans l'ordre
    pub fn validate(&self, order: &[&str]) -> Result<(), GraphError> {
        for parent in self.children.keys() {
            if !order.contains(parent) {
                return Err(GraphError::ParentNotOrdered(parent.to_string()));
            }
        }

        // Détection de cycle par DFS colorié
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }
        let mut colors: BTreeMap<&str, Color> = BTreeMap::new();

        fn visit(
            graph: &TableGraph,
            node: &'static str,
            colors: &mut BTreeMap<&str, Color>,
        ) -> Result<(), GraphError> {
            match colors.get(node).copied().unwrap_or(Color::White) {
                Color::Gray => return Err(GraphError::Cycle(node.to_string())),
                Color::Black => return Ok(()),
                Color::White => {}
            }
            colors.insert(node, Color::Gray);
            for r in graph.children(node) {
                visit(graph, r.child, colors)?;
            }
            colors.insert(node, Color::Black);
            Ok(())
        }

        for parent in self.children.keys() {
            visit(self, parent, &mut colors)?;
        }
        Ok(())
    }
}

/// Ordre de travail effectif d'une exécution
///
/// Dérivé une fois après le clip: l'ordre fixe moins les classes d'entités
/// vides abandonnées. Immuable ensuite.
#[derive(Debug, Clone)]
pub struct ActiveOrder(Vec<String>);

impl ActiveOrder {
    /// Dérive l'ordre effectif en retirant les datasets abandonnés
    pub fn derive(removed: &BTreeSet<String>) -> Self {
        Self(
            TABLE_ORDER
                .iter()
                .filter(|t| !removed.contains(**t))
                .map(|s| s.to_string())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.0.iter().any(|t| t == table)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssurgo_graph_is_valid() {
        TableGraph::ssurgo().validate(&TABLE_ORDER).unwrap();
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = TableGraph::ssurgo();
        // Boucle artificielle: chtexture remonte vers component
        graph
            .children
            .get_mut("chtexture")
            .unwrap()
            .push(rel("component", "cokey"));
        let err = graph.validate(&TABLE_ORDER).unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn test_parent_missing_from_order() {
        let graph = TableGraph::ssurgo();
        let truncated: Vec<&str> = TABLE_ORDER
            .iter()
            .copied()
            .filter(|t| *t != "sacatalog")
            .collect();
        let err = graph.validate(&truncated).unwrap_err();
        assert!(matches!(err, GraphError::ParentNotOrdered(_)));
    }

    #[test]
    fn test_active_order_derive() {
        let mut removed = BTreeSet::new();
        removed.insert("MUPOLYGON".to_string());
        removed.insert("FEATLINE".to_string());
        let order = ActiveOrder::derive(&removed);
        assert_eq!(order.len(), TABLE_ORDER.len() - 2);
        assert!(!order.contains("MUPOLYGON"));
        assert!(order.contains("mapunit"));
    }

    #[test]
    fn test_parent_before_child_in_order() {
        // Chaque parent de l'ordre précède ses enfants qui y figurent aussi
        let graph = TableGraph::ssurgo();
        let pos = |t: &str| TABLE_ORDER.iter().position(|x| *x == t);
        for parent in TABLE_ORDER {
            for r in graph.children(parent) {
                if let (Some(p), Some(c)) = (pos(parent), pos(r.child)) {
                    assert!(p < c, "{} should precede {}", parent, r.child);
                }
            }
        }
    }
}
