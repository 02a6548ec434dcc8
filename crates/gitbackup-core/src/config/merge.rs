use serde_yaml::{Mapping, Value};

/// Merges an overlay document into a base document using a recursive "Deep Merge" strategy.
///
/// # Rules
/// 1. If a key exists in `overlay` but not in `base`, it is added to `base`.
/// 2. If a key exists in both:
///    a. If BOTH values are mappings, they are merged recursively.
///    b. Otherwise, the value from `overlay` overwrites the value in `base`.
/// 3. Sequences are NOT merged; the overlay sequence replaces the base one.
///
/// A non-mapping `base` is replaced by `overlay` entirely. This function
/// modifies `base` in-place.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    },
                }
            }
        },
        (base_val, overlay_val) => {
            *base_val = overlay_val.clone();
        },
    }
}

/// Looks up a nested value by a path of mapping keys.
///
/// Returns `None` as soon as a key is missing or an intermediate value is not
/// a mapping.
pub fn get_deep<'a>(container: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(container, |current, key| current.as_mapping()?.get(*key))
}

/// Sets a nested value, creating intermediate mappings as needed.
///
/// Intermediate values that exist but are not mappings are replaced by empty
/// mappings. An empty `keys` slice replaces the whole container.
pub fn set_deep(container: &mut Value, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        *container = value;
        return;
    };

    let mut current = container;
    for key in parents {
        current = ensure_mapping(current)
            .entry(Value::from(*key))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    ensure_mapping(current).insert(Value::from(*last), value);
}

fn ensure_mapping(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(map) => map,
        _ => unreachable!("value was just replaced by a mapping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_merge_adds_new_keys() {
        let mut base = yaml("{one: 1, two: 2}");
        deep_merge(&mut base, &yaml("{three: 3}"));
        assert_eq!(base, yaml("{one: 1, two: 2, three: 3}"));
    }

    #[test]
    fn test_merge_overwrites_scalars() {
        let mut base = yaml("{one: 1, two: 2}");
        deep_merge(&mut base, &yaml("{two: -2}"));
        assert_eq!(base, yaml("{one: 1, two: -2}"));
    }

    #[test]
    fn test_merge_nested() {
        let mut base = yaml("{a: {one: 1, two: 2}, b: {four: 4}}");
        deep_merge(&mut base, &yaml("{a: {three: 3}}"));
        assert_eq!(base, yaml("{a: {one: 1, two: 2, three: 3}, b: {four: 4}}"));
    }

    #[test]
    fn test_merge_empty() {
        let mut base = yaml("{}");
        deep_merge(&mut base, &yaml("{}"));
        assert_eq!(base, yaml("{}"));

        deep_merge(&mut base, &yaml("{a: {one: 1, two: 2}}"));
        assert_eq!(base, yaml("{a: {one: 1, two: 2}}"));
    }

    #[test]
    fn test_sequences_are_replaced() {
        let mut base = yaml("{items: [1, 2]}");
        deep_merge(&mut base, &yaml("{items: [3, 4, 5]}"));
        assert_eq!(base, yaml("{items: [3, 4, 5]}"));
    }

    #[test]
    fn test_get_deep() {
        let container = yaml("{x: {xx: 1}, y: 2}");

        assert_eq!(get_deep(&container, &["y"]), Some(&Value::from(2)));
        assert_eq!(get_deep(&container, &["x", "xx"]), Some(&Value::from(1)));
        assert_eq!(get_deep(&container, &["x", "xy", "y"]), None);
        assert_eq!(get_deep(&container, &["y", "deeper"]), None);
    }

    #[test]
    fn test_set_deep_existing() {
        let mut container = yaml("{x: 1, y: 2}");
        set_deep(&mut container, &["x"], Value::from(-1));
        assert_eq!(container, yaml("{x: -1, y: 2}"));

        let mut container = yaml("{x: {xx: 1}, y: 2}");
        set_deep(&mut container, &["x", "xx"], Value::from(-1));
        assert_eq!(container, yaml("{x: {xx: -1}, y: 2}"));
    }

    #[test]
    fn test_set_deep_creates_parents() {
        let mut container = yaml("{x: {xx: 1}, y: 2}");
        set_deep(&mut container, &["x", "xy", "y"], Value::from(42));
        assert_eq!(container, yaml("{x: {xx: 1, xy: {y: 42}}, y: 2}"));
    }

    #[test]
    fn test_set_deep_replaces_scalar_parent() {
        let mut container = yaml("{logging: info}");
        set_deep(&mut container, &["logging", "level"], Value::from("debug"));
        assert_eq!(container, yaml("{logging: {level: debug}}"));
    }
}
