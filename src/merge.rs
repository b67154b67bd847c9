use crate::document::Document;
use crate::error::ReflectfigError;
use crate::value::ConfigValue;

/// Deep-merge `overlay` on top of `base`.
/// If both sides are compounds, merge key by key and recurse.
/// Otherwise, `overlay`'s value wins (arrays are replaced, not merged).
pub fn deep_merge(base: ConfigValue, overlay: ConfigValue) -> ConfigValue {
    match (base, overlay) {
        (ConfigValue::Compound(mut base_map), ConfigValue::Compound(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            ConfigValue::Compound(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Overlay the named sections of `document`, left to right.
///
/// The first name is the base; every following section overrides it. Fails
/// if `names` is empty or any name is not a section of the document.
pub fn merge_sections<S: AsRef<str>>(
    document: &Document,
    names: &[S],
) -> Result<ConfigValue, ReflectfigError> {
    let mut merged: Option<ConfigValue> = None;
    for name in names {
        let name = name.as_ref();
        let section =
            document
                .section(name)
                .ok_or_else(|| ReflectfigError::MergeSectionNotFound {
                    name: name.to_string(),
                    known: document.section_names(),
                })?;
        merged = Some(match merged {
            Some(base) => deep_merge(base, section.root.clone()),
            None => section.root.clone(),
        });
    }

    let merged = merged.ok_or(ReflectfigError::EmptySectionList)?;
    tracing::debug!(
        origin = document.origin(),
        sections = names.len(),
        "merged configuration sections"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_plain;

    fn value(yaml: &str) -> ConfigValue {
        parse_plain(yaml).unwrap()
    }

    #[test]
    fn disjoint_keys_merge() {
        let merged = deep_merge(value("host: localhost"), value("port: 3000"));
        assert_eq!(merged, value("host: localhost\nport: 3000"));
    }

    #[test]
    fn same_scalar_key_overlay_wins() {
        let merged = deep_merge(value("port: 8080"), value("port: 3000"));
        assert_eq!(merged.get("port").unwrap().as_scalar(), Some("3000"));
    }

    #[test]
    fn nested_compounds_recurse() {
        let base = value("database:\n  url: pg://old\n  pool_size: 5\n");
        let overlay = value("database:\n  pool_size: 20\n");
        let merged = deep_merge(base, overlay);
        let db = merged.get("database").unwrap();
        assert_eq!(db.get("url").unwrap().as_scalar(), Some("pg://old"));
        assert_eq!(db.get("pool_size").unwrap().as_scalar(), Some("20"));
    }

    #[test]
    fn overlay_scalar_replaces_compound() {
        let merged = deep_merge(value("database:\n  url: x\n"), value("database: flat"));
        assert_eq!(merged.get("database").unwrap().as_scalar(), Some("flat"));
    }

    #[test]
    fn arrays_are_replaced_not_merged() {
        let merged = deep_merge(value("list: [1, 2, 3]"), value("list: [9]"));
        assert_eq!(
            merged.get("list").unwrap(),
            &ConfigValue::Array(vec!["9".into()])
        );
    }

    #[test]
    fn empty_overlay_returns_base() {
        let base = value("port: 8080");
        assert_eq!(deep_merge(base.clone(), ConfigValue::empty_compound()), base);
    }

    fn sections() -> Document {
        Document::parse("--- name:A\nx: 1\ny: 2\n--- name:B\ny: 3\nz: 4\n--- name:C\nz: 5\n")
            .unwrap()
    }

    #[test]
    fn merge_is_left_to_right_overlay() {
        let merged = merge_sections(&sections(), &["A", "B"]).unwrap();
        assert_eq!(merged, value("x: 1\ny: 3\nz: 4"));
    }

    #[test]
    fn later_sections_take_precedence() {
        let merged = merge_sections(&sections(), &["A", "B", "C"]).unwrap();
        assert_eq!(merged.get("z").unwrap().as_scalar(), Some("5"));
        let reversed = merge_sections(&sections(), &["C", "B"]).unwrap();
        assert_eq!(reversed.get("z").unwrap().as_scalar(), Some("4"));
    }

    #[test]
    fn single_section_is_copied() {
        let merged = merge_sections(&sections(), &["C"]).unwrap();
        assert_eq!(merged, value("z: 5"));
    }

    #[test]
    fn empty_name_list_fails() {
        let names: [&str; 0] = [];
        let err = merge_sections(&sections(), &names).unwrap_err();
        assert!(matches!(err, ReflectfigError::EmptySectionList));
    }

    #[test]
    fn missing_section_lists_known_names() {
        let err = merge_sections(&sections(), &["A", "nope"]).unwrap_err();
        match err {
            ReflectfigError::MergeSectionNotFound { name, known } => {
                assert_eq!(name, "nope");
                assert_eq!(known, vec!["A", "B", "C"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
