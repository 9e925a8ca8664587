//! Construction typée de prédicats de sélection
//!
//! Remplace la concaténation de chaînes par un petit builder typé
//! (champ, type déclaré, liste de valeurs) rendu vers le dialecte SQL
//! du moteur. Évite les bugs de quoting sur les valeurs texte.

use std::fmt;

use crate::types::{FieldType, Value};

/// Prédicat d'appartenance `field IN(...)` sur un champ et un ensemble de valeurs
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Nom du champ filtré
    pub field: String,
    /// Type déclaré du champ (pilote le quoting)
    pub field_type: FieldType,
    /// Valeurs acceptées
    pub values: Vec<Value>,
}

impl Predicate {
    /// Construit un prédicat d'appartenance
    ///
    /// L'appelant doit court-circuiter avant d'arriver ici quand l'ensemble
    /// de valeurs est vide (voir le resolver): un IN() vide n'a pas de sens.
    pub fn membership(
        field: impl Into<String>,
        field_type: FieldType,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().collect();
        debug_assert!(!values.is_empty(), "membership predicate over empty set");
        Self {
            field: field.into(),
            field_type,
            values,
        }
    }

    /// Évalue l'appartenance d'une valeur au prédicat
    ///
    /// NULL n'appartient à aucun ensemble, comme en SQL.
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        self.values.iter().any(|v| v == value)
    }

    /// Rend une valeur selon le type du champ (quoting des textes)
    fn render_value(&self, value: &Value, out: &mut String) {
        if self.field_type.is_textual() {
            // Quote simple, apostrophes internes doublées (SQL)
            out.push('\'');
            for ch in value.to_string().chars() {
                if ch == '\'' {
                    out.push('\'');
                }
                out.push(ch);
            }
            out.push('\'');
        } else {
            out.push_str(&value.to_string());
        }
    }
}

impl fmt::Display for Predicate {
    /// Rendu vers le dialecte de requête: `field IN('a', 'b')`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                rendered.push_str(", ");
            }
            self.render_value(v, &mut rendered);
        }
        write!(f, "{} IN({})", self.field, rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_values_quoted() {
        let p = Predicate::membership(
            "mukey",
            FieldType::Text,
            vec![Value::from("100125"), Value::from("100126")],
        );
        assert_eq!(p.to_string(), "mukey IN('100125', '100126')");
    }

    #[test]
    fn test_render_numeric_values_bare() {
        let p = Predicate::membership(
            "cokey",
            FieldType::Integer,
            vec![Value::Int(7), Value::Int(12)],
        );
        assert_eq!(p.to_string(), "cokey IN(7, 12)");
    }

    #[test]
    fn test_embedded_quote_doubled() {
        let p = Predicate::membership(
            "muname",
            FieldType::Text,
            vec![Value::from("O'Brien silt loam")],
        );
        assert_eq!(p.to_string(), "muname IN('O''Brien silt loam')");
    }

    #[test]
    fn test_matches_membership() {
        let p = Predicate::membership(
            "mukey",
            FieldType::Text,
            vec![Value::from("100125"), Value::from("100126")],
        );
        assert!(p.matches(&Value::from("100125")));
        assert!(!p.matches(&Value::from("100127")));
        assert!(!p.matches(&Value::Null));
    }

    #[test]
    fn test_matches_numeric() {
        let p = Predicate::membership("cokey", FieldType::Integer, vec![Value::Int(7)]);
        assert!(p.matches(&Value::Int(7)));
        assert!(!p.matches(&Value::Int(8)));
    }
}
