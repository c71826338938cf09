use std::fs;

use rankdb_core::catalog::load_tsv;
use rankdb_core::config::Config;
use rankdb_core::types::{missing_fields, Document};
use rankdb_core::Error;
use tempfile::TempDir;

#[test]
fn load_tsv_keeps_rows_in_order_and_empty_cells() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("products.tsv");
    fs::write(
        &path,
        "product_id\tproduct_name\tproduct_description\n7\tarmchair\tsoft chair\n3\tdesk\t\n",
    )
    .unwrap();

    let docs = load_tsv(&path, "product_id").expect("load");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "7");
    assert_eq!(docs[0].field("product_name"), Some("armchair"));
    assert_eq!(docs[1].field("product_description"), Some(""), "empty cell is an empty field");
    assert!(docs[0].field("product_id").is_none(), "id column is not a field");
}

#[test]
fn load_tsv_without_id_column_is_missing_columns() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("products.tsv");
    fs::write(&path, "name\tdescription\nchair\tsoft\n").unwrap();

    let err = load_tsv(&path, "product_id").unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::MissingColumns(cols)) => assert_eq!(cols, &vec!["product_id".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn joined_text_uses_configured_order_and_blanks_missing_fields() {
    let doc = Document::new("1").with_field("title", "hello").with_field("description", "foo");
    assert_eq!(doc.joined_text(&["title", "description"]), "hello foo");
    assert_eq!(doc.joined_text(&["description", "title"]), "foo hello");
    assert_eq!(doc.joined_text(&["title", "brand"]), "hello ");
}

#[test]
fn missing_fields_reports_each_absent_name_once() {
    let docs = vec![
        Document::new("a").with_field("title", "A").with_field("description", "x"),
        Document::new("b").with_field("title", "B"),
        Document::new("c").with_field("title", "C"),
    ];
    assert_eq!(
        missing_fields(&docs, &["title", "description", "brand"]),
        vec!["description", "brand"]
    );
    assert!(missing_fields(&docs, &["title"]).is_empty());
}

#[test]
fn settings_defaults_and_overrides() {
    let config = Config::from_toml_str(
        r#"
        [scorer]
        lexical_alpha = 0.25

        [fields]
        embed = ["title", "description"]

        [resilience.rerank]
        retries = 4
        delay_ms = 0
        "#,
    );
    let settings = config.settings().expect("settings");
    assert!((settings.scorer.lexical_alpha - 0.25).abs() < f32::EPSILON);
    assert_eq!(settings.scorer.top_n, 10);
    assert_eq!(settings.fields.embed, vec!["title", "description"]);
    assert_eq!(settings.resilience.rerank.retries, 4);
    assert_eq!(settings.resilience.retrieve.retries, 2);
    assert_eq!(settings.lexical.similarity, "cosine");
    assert_eq!(settings.catalog.delimiter, '\t');
    let top_n: usize = config.get("scorer.top_n").unwrap_or(10);
    assert_eq!(top_n, 10);
}

#[test]
fn settings_reject_out_of_range_alpha() {
    let config = Config::from_toml_str("[scorer]\nlexical_alpha = 1.5\n");
    let err = config.settings().unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidConfig(_))));
}

#[test]
fn settings_reject_zero_batch() {
    let config = Config::from_toml_str("[dense]\nmax_batch = 0\n");
    assert!(config.settings().is_err());
}

#[test]
fn top_positions_breaks_ties_by_lower_position() {
    use rankdb_core::types::top_positions;
    let ranked = top_positions(&[0.2, 0.9, 0.9, -0.1, 0.5], 4);
    let order: Vec<usize> = ranked.iter().map(|r| r.position).collect();
    assert_eq!(order, vec![1, 2, 4, 0]);
    assert_eq!(top_positions(&[0.1, 0.2], 10).len(), 2);
}
