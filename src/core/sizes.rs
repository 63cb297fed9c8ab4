use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A slot size as sent downstream. A component which failed to
/// parse is `None` and serializes as `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl Size {
    pub fn new(width: i64, height: i64) -> Self {
        Size {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Both components parsed to a number
    pub fn is_numeric(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

/// Sizes as declared by the page, which may be a single
/// `[w, h]` pair or a list of pairs, with loosely typed members
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum SizeSpec {
    Pair(Value, Value),
    List(Vec<Value>),
    #[default]
    Empty,
}

impl SizeSpec {
    pub fn pair(width: i64, height: i64) -> Self {
        SizeSpec::Pair(width.into(), height.into())
    }

    pub fn list(sizes: &[(i64, i64)]) -> Self {
        SizeSpec::List(
            sizes
                .iter()
                .map(|(w, h)| Value::Array(vec![(*w).into(), (*h).into()]))
                .collect(),
        )
    }
}

impl From<Value> for SizeSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(mut items) if items.len() == 2 && !items[0].is_array() => {
                let height = items.pop().unwrap_or(Value::Null);
                let width = items.pop().unwrap_or(Value::Null);
                SizeSpec::Pair(width, height)
            }
            Value::Array(items) => SizeSpec::List(items),
            _ => SizeSpec::Empty,
        }
    }
}

impl From<SizeSpec> for Value {
    fn from(spec: SizeSpec) -> Self {
        match spec {
            SizeSpec::Pair(w, h) => Value::Array(vec![w, h]),
            SizeSpec::List(items) => Value::Array(items),
            SizeSpec::Empty => Value::Array(Vec::new()),
        }
    }
}

/// Parse the leading integer of a string the way browsers do
/// for `parseInt(s, 10)`: optional whitespace and sign, then digits.
/// Trailing garbage is ignored, no digits at all is `None`
pub fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: &str = &rest[..rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len())];

    if digits.is_empty() {
        return None;
    }

    let n = digits.parse::<i64>().ok()?;
    Some(if negative { -n } else { n })
}

/// Integer coercion of a loosely typed json value
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

fn pair_to_size(pair: &Value) -> Size {
    match pair.as_array() {
        Some(items) => Size {
            width: items.first().and_then(parse_int),
            height: items.get(1).and_then(parse_int),
        },
        None => Size::default(),
    }
}

/// Converts page declared sizes into the ordered downstream list.
/// Never fails, unparseable members come through as `None`
pub fn normalize_sizes(spec: &SizeSpec) -> Vec<Size> {
    match spec {
        SizeSpec::Pair(w, h) => vec![Size {
            width: parse_int(w),
            height: parse_int(h),
        }],
        SizeSpec::List(items) => items.iter().map(pair_to_size).collect(),
        SizeSpec::Empty => Vec::new(),
    }
}
