/// Field deserializers for loosely typed page and endpoint json.
/// A value of the wrong type degrades to its empty form instead of
/// failing the enclosing object
pub mod lenient {
    use crate::core::sizes::parse_int;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::debug;

    /// `None` for null or any value not shaped like `T`
    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(None);
        }

        match serde_json::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                debug!("Ignoring mistyped optional field: {}", e);
                Ok(None)
            }
        }
    }

    /// Integer with `parseInt` coercion, so `300.0` and `"300px"`
    /// both read as 300
    pub fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(parse_int(&value))
    }

    /// Number or numeric string as a float
    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite()))
    }

    /// Empty for null or a non array, otherwise the members that
    /// parse as `T`. Bad members are skipped, not the whole list
    pub fn each<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!("Skipping malformed list member: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::lenient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Default)]
    #[serde(default)]
    struct LooseFields {
        #[serde(deserialize_with = "lenient::option")]
        age: Option<u32>,
        #[serde(deserialize_with = "lenient::int")]
        w: Option<i64>,
        #[serde(deserialize_with = "lenient::float")]
        price: Option<f64>,
        #[serde(deserialize_with = "lenient::each")]
        urls: Vec<String>,
    }

    fn parse(v: serde_json::Value) -> LooseFields {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_mistyped_fields_degrade() {
        let p = parse(json!({"age": "30", "w": "300px", "price": "1.25", "urls": null}));
        assert_eq!(p.age, None);
        assert_eq!(p.w, Some(300));
        assert_eq!(p.price, Some(1.25));
        assert!(p.urls.is_empty());
    }

    #[test]
    fn test_well_typed_fields_kept() {
        let p = parse(json!({"age": 30, "w": 300.0, "price": 2, "urls": ["a", 1, "b"]}));
        assert_eq!(p.age, Some(30));
        assert_eq!(p.w, Some(300));
        assert_eq!(p.price, Some(2.0));
        assert_eq!(p.urls, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let p = parse(json!({}));
        assert_eq!(p.age, None);
        assert_eq!(p.w, None);
        assert!(p.urls.is_empty());
    }
}
