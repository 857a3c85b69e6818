//! Relational schema metadata.
//!
//! [`SchemaProvider`] is the only view the join resolver has of the storage layer.
//! [`EntityCatalog`] is a provider loaded from YAML:
//!
//! ```yaml
//! entities:
//!   - name: Author
//!     table: author
//!     fields: [name, pseudonym]
//!     associations:
//!       - { name: birth, target: Birth }
//!       - { name: books, target: Book, to_many: true }
//!   - name: Birth
//!     table: birth
//!     fields: [year]
//!   - name: Book
//!     table: book
//!     fields: [title]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::errors::CatalogError;

/// What a property of an entity is, relationally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Column,
    Association { target_entity: String, to_many: bool },
}

#[cfg_attr(test, mockall::automock)]
pub trait SchemaProvider {
    /// Table (and alias base) of an entity, `None` if the entity is unknown.
    fn table_name(&self, entity: &str) -> Option<String>;

    /// Kind of `field` on `entity`, `None` if the entity has no such property.
    fn field(&self, entity: &str, field: &str) -> Option<FieldKind>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCatalogConfig {
    pub entities: Vec<EntityDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub associations: Vec<AssociationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationDefinition {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub to_many: bool,
}

#[derive(Debug, Clone, Default)]
struct EntitySchema {
    table: String,
    fields: HashMap<String, FieldKind>,
}

/// In-memory schema built from an [`EntityCatalogConfig`].
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: HashMap<String, EntitySchema>,
}

impl EntityCatalog {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::ConfigReadError {
            error: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let config: EntityCatalogConfig =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::ConfigParseError {
                error: e.to_string(),
            })?;
        Self::from_config(config)
    }

    /// Validate and index a catalog definition.
    pub fn from_config(config: EntityCatalogConfig) -> Result<Self, CatalogError> {
        let known: HashSet<&str> = config.entities.iter().map(|e| e.name.as_str()).collect();
        if known.len() != config.entities.len() {
            return Err(CatalogError::InvalidConfig {
                message: "Duplicate entity name in catalog".to_string(),
            });
        }

        let mut entities = HashMap::new();
        for definition in &config.entities {
            if definition.table.is_empty() {
                return Err(CatalogError::InvalidConfig {
                    message: format!("Entity '{}' has an empty table name", definition.name),
                });
            }

            let mut fields = HashMap::new();
            for field in &definition.fields {
                if fields.insert(field.clone(), FieldKind::Column).is_some() {
                    return Err(duplicate_property(&definition.name, field));
                }
            }
            for association in &definition.associations {
                if !known.contains(association.target.as_str()) {
                    return Err(CatalogError::InvalidConfig {
                        message: format!(
                            "Association '{}.{}' targets unknown entity '{}'",
                            definition.name, association.name, association.target
                        ),
                    });
                }
                let kind = FieldKind::Association {
                    target_entity: association.target.clone(),
                    to_many: association.to_many,
                };
                if fields.insert(association.name.clone(), kind).is_some() {
                    return Err(duplicate_property(&definition.name, &association.name));
                }
            }

            entities.insert(
                definition.name.clone(),
                EntitySchema {
                    table: definition.table.clone(),
                    fields,
                },
            );
        }

        log::debug!("Loaded entity catalog with {} entities", entities.len());
        Ok(EntityCatalog { entities })
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

fn duplicate_property(entity: &str, property: &str) -> CatalogError {
    CatalogError::InvalidConfig {
        message: format!("Property '{}' is declared twice on '{}'", property, entity),
    }
}

impl SchemaProvider for EntityCatalog {
    fn table_name(&self, entity: &str) -> Option<String> {
        self.entities.get(entity).map(|e| e.table.clone())
    }

    fn field(&self, entity: &str, field: &str) -> Option<FieldKind> {
        self.entities.get(entity)?.fields.get(field).cloned()
    }
}

impl<S: SchemaProvider + ?Sized> SchemaProvider for &S {
    fn table_name(&self, entity: &str) -> Option<String> {
        (**self).table_name(entity)
    }

    fn field(&self, entity: &str, field: &str) -> Option<FieldKind> {
        (**self).field(entity, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
entities:
  - name: Author
    table: author
    fields: [name, pseudonym]
    associations:
      - { name: books, target: Book, to_many: true }
  - name: Book
    table: book
    fields: [title]
    associations:
      - { name: author, target: Author }
"#;

    #[test]
    fn test_load_catalog() {
        let catalog = EntityCatalog::from_yaml_str(CATALOG).unwrap();
        assert_eq!(catalog.table_name("Author").as_deref(), Some("author"));
        assert_eq!(catalog.field("Author", "name"), Some(FieldKind::Column));
        assert_eq!(
            catalog.field("Author", "books"),
            Some(FieldKind::Association {
                target_entity: "Book".to_string(),
                to_many: true
            })
        );
        assert_eq!(catalog.field("Author", "missing"), None);
        assert_eq!(catalog.field("Missing", "name"), None);
    }

    #[test]
    fn test_unknown_association_target() {
        let yaml = r#"
entities:
  - name: Author
    table: author
    associations:
      - { name: books, target: Book, to_many: true }
"#;
        let err = EntityCatalog::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidConfig { .. }));
    }

    #[test]
    fn test_duplicate_property() {
        let yaml = r#"
entities:
  - name: Author
    table: author
    fields: [name]
    associations:
      - { name: name, target: Author }
"#;
        assert!(EntityCatalog::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            EntityCatalog::from_yaml_str("entities: 3"),
            Err(CatalogError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_read_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = EntityCatalog::from_yaml_file(file.path()).unwrap();
        assert_eq!(catalog.entity_names().count(), 2);
    }
}
