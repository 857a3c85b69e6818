//! Catalogs, configuration and query documents loaded from disk.

use pathquery::config::EngineConfig;
use pathquery::relational::{EntityCatalog, ParameterStyle, QueryPreparer, QueryRequest, ToDql};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_compile_query_document_with_file_config() -> anyhow::Result<()> {
    let catalog = write_temp(
        r#"
entities:
  - name: Author
    table: author
    fields: [name]
    associations:
      - { name: books, target: Book, to_many: true }
  - name: Book
    table: book
    fields: [title]
"#,
    );
    let config = write_temp("parameter_style: named\nalias_hash_length: 4\n");

    let catalog = EntityCatalog::from_yaml_file(catalog.path())?;
    let config = EngineConfig::from_yaml_file(config.path())?;
    assert_eq!(config.parameter_style, ParameterStyle::Named);

    let request: QueryRequest = serde_json::from_str(
        r#"{
            "entity": "Author",
            "conditions": [{
                "type": "one_of",
                "target": {"type": "property", "path": "books.title"},
                "values": [{"type": "constant", "value": "It"},
                           {"type": "constant", "value": "Carrie"}]
            }],
            "sort": [{"path": "name"}],
            "limit": 10
        }"#,
    )?;

    let query = QueryPreparer::with_config(&catalog, config).prepare(&request)?;
    let alias = &query.joins[0].table_alias;
    assert_eq!(alias.len(), "t_".len() + 4 + "_book".len());
    assert_eq!(
        query.to_dql(),
        format!(
            "SELECT t FROM Author t LEFT JOIN t.books {0} WHERE {0}.title IN (:p0, :p1) ORDER BY t.name ASC",
            alias
        )
    );
    assert_eq!(query.slice.limit, Some(10));
    Ok(())
}

#[test]
fn test_invalid_catalog_file() {
    let catalog = write_temp("entities:\n  - name: Author\n    table: \"\"\n");
    assert!(EntityCatalog::from_yaml_file(catalog.path()).is_err());
    assert!(EntityCatalog::from_yaml_file("/nonexistent/catalog.yaml").is_err());
}
