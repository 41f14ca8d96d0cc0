use std::path::Path;

use super::ConfigError;

/// Load a YAML file, if it exists, and deep-merge it over `root`.
pub(crate) fn merge_yaml_file(path: &Path, root: &mut serde_yaml::Value) -> Result<(), ConfigError> {
    if path.exists() {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        merge_yaml_str(&content, root)?;
    }
    Ok(())
}

/// Parse a YAML string and deep-merge it over `root`.
pub(crate) fn merge_yaml_str(content: &str, root: &mut serde_yaml::Value) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    merge(root, yaml);
    Ok(())
}

/// Mappings merge key by key; any other value replaces the target.
///
/// Keys already present keep their position, so guard declaration order
/// survives a profile override.
pub(crate) fn merge(target: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (target, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        // An empty document parses as null; it must not wipe the base.
        (_, serde_yaml::Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_overlay_keeps_base_order() {
        let mut root = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        merge_yaml_str("guards:\n  web: 1\n  api: 2\n", &mut root).unwrap();
        merge_yaml_str("guards:\n  api: 3\n  admin: 4\n", &mut root).unwrap();

        let guards = root.get("guards").and_then(|g| g.as_mapping()).unwrap();
        let keys: Vec<&str> = guards.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["web", "api", "admin"]);
        assert_eq!(guards.get("api").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn empty_overlay_is_ignored() {
        let mut root = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        merge_yaml_str("a: 1\n", &mut root).unwrap();
        merge_yaml_str("", &mut root).unwrap();
        assert_eq!(root.get("a").and_then(|v| v.as_i64()), Some(1));
    }
}
