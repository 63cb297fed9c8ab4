use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};

/// How one generic native asset key is expressed on the tag endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum NativeMapping {
    /// Same parameters, different key
    Rename(&'static str),
    /// Renamed key with fields that must always be sent, plus a
    /// default sent when the page asked only for the asset's presence
    Policy {
        name: &'static str,
        required: Map<String, Value>,
        minimum: Option<Map<String, Value>>,
    },
}

impl NativeMapping {
    fn server_name(&self) -> &'static str {
        match self {
            NativeMapping::Rename(name) => name,
            NativeMapping::Policy { name, .. } => name,
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Maps page native asset specs into server asset specs
#[derive(Debug, Clone)]
pub struct NativeAssetMapper {
    table: HashMap<&'static str, NativeMapping>,
}

impl Default for NativeAssetMapper {
    fn default() -> Self {
        let image_policy = |name| NativeMapping::Policy {
            name,
            required: object(json!({ "required": true })),
            minimum: Some(object(json!({ "sizes": [{}] }))),
        };

        let table = HashMap::from([
            ("body", NativeMapping::Rename("description")),
            ("cta", NativeMapping::Rename("ctatext")),
            ("sponsoredBy", NativeMapping::Rename("sponsored_by")),
            ("image", image_policy("main_image")),
            ("icon", image_policy("icon")),
        ]);

        Self { table }
    }
}

impl NativeAssetMapper {
    pub fn new(table: HashMap<&'static str, NativeMapping>) -> Self {
        Self { table }
    }

    fn map_asset(&self, key: &str, fields: &Map<String, Value>) -> (String, Map<String, Value>) {
        let Some(mapping) = self.table.get(key) else {
            return (key.to_string(), fields.clone());
        };

        let mut out = fields.clone();

        if let NativeMapping::Policy {
            required, minimum, ..
        } = mapping
        {
            let only_required = fields.keys().all(|k| required.contains_key(k));

            if let (Some(minimum), true) = (minimum, only_required) {
                out.extend(minimum.clone());
            }

            out.extend(required.clone());
        }

        (mapping.server_name().to_string(), out)
    }

    /// Translate every asset of a page spec. Keys are handled
    /// independently and unknown keys pass straight through
    pub fn map(&self, assets: &BTreeMap<String, Map<String, Value>>) -> Map<String, Value> {
        assets
            .iter()
            .map(|(key, fields)| {
                let (name, mapped) = self.map_asset(key, fields);
                (name, Value::Object(mapped))
            })
            .collect()
    }
}
