//! Types attributaires partagés: valeurs, champs, schémas

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Valeur attributaire scalaire
///
/// L'ordre total (via `f64::total_cmp` pour les réels) permet de stocker
/// les valeurs de clés de jointure dans un `BTreeSet` dédupliqué.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Valeur absente
    Null,
    /// Entier signé
    Int(i64),
    /// Réel double précision
    Real(f64),
    /// Chaîne de caractères
    Text(String),
}

impl Value {
    /// Rang de discrimination entre variantes pour l'ordre total
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Real(_) => 2,
            Value::Text(_) => 3,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

/// Type déclaré d'un champ attributaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Texte (les valeurs sont quotées dans les prédicats)
    Text,
    /// Entier
    Integer,
    /// Réel
    Real,
}

impl FieldType {
    /// Les valeurs de ce type doivent-elles être quotées dans un prédicat?
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::Text)
    }
}

/// Champ attributaire d'un schéma
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Nom du champ
    pub name: String,
    /// Type déclaré
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ligne attributaire (valeurs dans l'ordre du schéma)
pub type Row = Vec<Value>;

/// Schéma ordonné d'une table ou d'une classe d'entités
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Index d'un champ par nom, insensible à la casse (convention geodatabase)
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Champ par nom
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_index(name).map(|i| &self.fields[i])
    }

    /// Vérifie l'équivalence stricte avec un autre schéma (append validant)
    ///
    /// Retourne la première divergence sous forme lisible, ou None si identiques.
    pub fn divergence(&self, other: &Schema) -> Option<String> {
        if self.fields.len() != other.fields.len() {
            return Some(format!(
                "field count differs ({} vs {})",
                self.fields.len(),
                other.fields.len()
            ));
        }
        for (a, b) in self.fields.iter().zip(&other.fields) {
            if !a.name.eq_ignore_ascii_case(&b.name) {
                return Some(format!("field name differs ({} vs {})", a.name, b.name));
            }
            if a.field_type != b.field_type {
                return Some(format!(
                    "type of {} differs ({:?} vs {:?})",
                    a.name, a.field_type, b.field_type
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_value_ordering_dedups_keys() {
        let mut set = BTreeSet::new();
        set.insert(Value::from("WI025"));
        set.insert(Value::from("WI025"));
        set.insert(Value::from("WI027"));
        set.insert(Value::Int(3));
        set.insert(Value::Int(3));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_schema_field_lookup_case_insensitive() {
        let schema = Schema::new(vec![
            Field::new("mukey", FieldType::Text),
            Field::new("muname", FieldType::Text),
        ]);
        assert_eq!(schema.field_index("MUKEY"), Some(0));
        assert!(schema.field("cokey").is_none());
    }

    #[test]
    fn test_schema_divergence() {
        let a = Schema::new(vec![Field::new("mukey", FieldType::Text)]);
        let b = Schema::new(vec![Field::new("mukey", FieldType::Integer)]);
        let c = a.clone();
        assert!(a.divergence(&b).is_some());
        assert!(a.divergence(&c).is_none());
    }

    #[test]
    fn test_value_untagged_serde() {
        let v: Value = serde_json::from_str("\"123456\"").unwrap();
        assert_eq!(v, Value::from("123456"));
        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::Int(42));
        let v: Value = serde_json::from_str("1.5").unwrap();
        assert_eq!(v, Value::Real(1.5));
        let v: Value = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
    }
}
