//! Query document parser: raw JSON bytes to a validated [`QuerySpec`].
//!
//! Every structural problem is reported here, before a store is touched.

use serde_json::Value as Json;

use super::pattern::LikePattern;
#[cfg(feature = "regex")]
use super::pattern::RegexPattern;
use super::types::{CmpOp, Order, QuerySpec, Selector, SortSpec};
use crate::config::QueryConfig;
use crate::errors::{MangoError, Result};
use crate::value::{FieldPath, Kind, Value};

const TOP_LEVEL_KEYS: &[&str] = &["selector", "where", "fields", "projection", "sort", "limit", "skip"];

// Largest count accepted for `limit`/`skip`, in either integer or float spelling.
const MAX_COUNT: u64 = 1 << 53;

/// Parses a query with the default limits.
///
/// # Errors
/// `MalformedJson`, `InvalidQueryShape` or `UnsupportedOperator`.
pub fn parse_query(raw: &[u8]) -> Result<QuerySpec> {
    parse_query_with(raw, &QueryConfig::default())
}

/// # Errors
/// `MalformedJson`, `InvalidQueryShape` or `UnsupportedOperator`.
pub fn parse_query_str(raw: &str) -> Result<QuerySpec> {
    parse_query(raw.as_bytes())
}

/// # Errors
/// `MalformedJson`, `InvalidQueryShape` or `UnsupportedOperator`.
pub fn parse_query_with(raw: &[u8], cfg: &QueryConfig) -> Result<QuerySpec> {
    let json: Json = serde_json::from_slice(raw).map_err(|e| MangoError::malformed(&e, raw))?;
    parse_query_value(&json, cfg)
}

/// Validates an already-decoded query object.
///
/// # Errors
/// `InvalidQueryShape` or `UnsupportedOperator`.
pub fn parse_query_value(json: &Json, cfg: &QueryConfig) -> Result<QuerySpec> {
    let obj = json.as_object().ok_or_else(|| MangoError::shape("$", "query must be a JSON object"))?;
    for key in obj.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(MangoError::shape(key.as_str(), "unknown top-level key"));
        }
    }
    for (a, b) in [("selector", "where"), ("fields", "projection")] {
        if obj.contains_key(a) && obj.contains_key(b) {
            return Err(MangoError::shape(b, format!("`{a}` and `{b}` are aliases; give only one")));
        }
    }
    let parser = SelectorParser { cfg };
    let selector = match top_level(obj, "selector", Some("where")) {
        Some(sel) => parser.selector(sel, false, "selector", 0)?,
        None => return Err(MangoError::shape("selector", "missing required `selector`")),
    };
    let projection = top_level(obj, "fields", Some("projection")).map(|f| parse_fields(f, cfg)).transpose()?;
    let sort = match top_level(obj, "sort", None) {
        Some(s) => parse_sort(s, cfg)?,
        None => Vec::new(),
    };
    let skip = match top_level(obj, "skip", None) {
        Some(v) => as_count(v).ok_or_else(|| MangoError::shape("skip", "must be a non-negative integer"))?,
        None => 0,
    };
    let limit = top_level(obj, "limit", None)
        .map(|v| as_count(v).ok_or_else(|| MangoError::shape("limit", "must be a non-negative integer")))
        .transpose()?;

    log::debug!(
        "parsed query: sort_keys={} projection={:?} skip={} limit={:?}",
        sort.len(),
        projection.as_ref().map(Vec::len),
        skip,
        limit
    );
    Ok(QuerySpec { selector, projection, sort, skip, limit })
}

// A present `null` stays `Some(Null)` so it is rejected rather than treated
// as an absent key.
fn top_level<'a>(obj: &'a serde_json::Map<String, Json>, name: &str, alias: Option<&str>) -> Option<&'a Json> {
    obj.get(name).or_else(|| alias.and_then(|a| obj.get(a)))
}

/// Parses a bare selector object with the default limits.
///
/// # Errors
/// `InvalidQueryShape` or `UnsupportedOperator`.
pub fn parse_selector(json: &Json) -> Result<Selector> {
    SelectorParser { cfg: &QueryConfig::default() }.selector(json, false, "selector", 0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn as_count(v: &Json) -> Option<usize> {
    let n = match v.as_u64() {
        Some(n) => n,
        None => {
            let f = v.as_f64()?;
            if f < 0.0 || f.fract() != 0.0 || f > MAX_COUNT as f64 {
                return None;
            }
            f as u64
        }
    };
    if n > MAX_COUNT {
        return None;
    }
    usize::try_from(n).ok()
}

fn as_integer(v: &Json) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 {
        #[allow(clippy::cast_possible_truncation)]
        return Some(f as i64);
    }
    None
}

fn parse_path(raw: &str, at: &str, cfg: &QueryConfig) -> Result<FieldPath> {
    let path = FieldPath::parse(raw).map_err(|_| MangoError::shape(at, "field path must be non-empty dotted segments"))?;
    check_path_depth(&path, at, cfg)?;
    Ok(path)
}

fn check_path_depth(path: &FieldPath, at: &str, cfg: &QueryConfig) -> Result<()> {
    if path.depth() > cfg.max_path_depth {
        return Err(MangoError::shape(at, format!("path deeper than {} segments", cfg.max_path_depth)));
    }
    Ok(())
}

fn parse_fields(v: &Json, cfg: &QueryConfig) -> Result<Vec<FieldPath>> {
    let items = v.as_array().ok_or_else(|| MangoError::shape("fields", "must be an array of field paths"))?;
    if items.len() > cfg.max_projection_fields {
        return Err(MangoError::shape(
            "fields",
            format!("at most {} projected fields allowed", cfg.max_projection_fields),
        ));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let at = format!("fields[{i}]");
            let raw = item.as_str().ok_or_else(|| MangoError::shape(&at, "must be a string"))?;
            parse_path(raw, &at, cfg)
        })
        .collect()
}

fn parse_order(v: &Json, at: &str) -> Result<Order> {
    match v.as_str() {
        Some(s) if s.eq_ignore_ascii_case("asc") => Ok(Order::Asc),
        Some(s) if s.eq_ignore_ascii_case("desc") => Ok(Order::Desc),
        _ => Err(MangoError::shape(at, "direction must be \"asc\" or \"desc\"")),
    }
}

fn is_direction(v: &Json) -> bool {
    v.as_str().is_some_and(|s| s.eq_ignore_ascii_case("asc") || s.eq_ignore_ascii_case("desc"))
}

fn parse_sort(v: &Json, cfg: &QueryConfig) -> Result<Vec<SortSpec>> {
    let items = v.as_array().ok_or_else(|| MangoError::shape("sort", "must be an array"))?;
    if items.len() > cfg.max_sort_fields {
        return Err(MangoError::shape("sort", format!("at most {} sort keys allowed", cfg.max_sort_fields)));
    }
    items.iter().enumerate().map(|(i, item)| sort_item(item, &format!("sort[{i}]"), cfg)).collect()
}

// Accepted forms: "field", {"field": "asc"|"desc"}, {"path": "field", "direction": "desc"}.
fn sort_item(item: &Json, at: &str, cfg: &QueryConfig) -> Result<SortSpec> {
    match item {
        Json::String(s) => Ok(SortSpec { path: parse_path(s, at, cfg)?, order: Order::Asc }),
        Json::Object(obj) => {
            let explicit = match (obj.get("path"), obj.len()) {
                (Some(_), 2) => obj.contains_key("direction"),
                (Some(p), 1) => !is_direction(p),
                _ => false,
            };
            if explicit {
                let raw = obj
                    .get("path")
                    .and_then(Json::as_str)
                    .ok_or_else(|| MangoError::shape(format!("{at}.path"), "must be a string"))?;
                let order = match obj.get("direction") {
                    Some(d) => parse_order(d, &format!("{at}.direction"))?,
                    None => Order::Asc,
                };
                return Ok(SortSpec { path: parse_path(raw, at, cfg)?, order });
            }
            let mut entries = obj.iter();
            match (entries.next(), entries.next()) {
                (Some((field, dir)), None) => {
                    let key_at = format!("{at}.{field}");
                    Ok(SortSpec { path: parse_path(field, &key_at, cfg)?, order: parse_order(dir, &key_at)? })
                }
                _ => Err(MangoError::shape(at, "sort object must name exactly one field")),
            }
        }
        _ => Err(MangoError::shape(at, "sort entry must be a field name or object")),
    }
}

/// Operators valid inside a field condition.
const FIELD_OPERATORS: &[&str] = &[
    "$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin", "$exists", "$type", "$size", "$mod",
    "$all", "$like", "$regex", "$elemMatch", "$not",
];

struct SelectorParser<'c> {
    cfg: &'c QueryConfig,
}

impl SelectorParser<'_> {
    fn check_depth(&self, depth: usize, at: &str) -> Result<()> {
        if depth > self.cfg.max_selector_depth {
            return Err(MangoError::shape(
                at,
                format!("selector nested deeper than {}", self.cfg.max_selector_depth),
            ));
        }
        Ok(())
    }

    /// A selector object. With `elem` set (inside `$elemMatch`) bare operator
    /// keys apply to the element itself.
    fn selector(&self, v: &Json, elem: bool, at: &str, depth: usize) -> Result<Selector> {
        self.check_depth(depth, at)?;
        let obj = v.as_object().ok_or_else(|| MangoError::shape(at, "selector must be a JSON object"))?;
        let mut parts = Vec::with_capacity(obj.len());
        for (key, val) in obj {
            let key_at = format!("{at}.{key}");
            let part = match key.as_str() {
                "$and" => Selector::And(self.children(val, elem, &key_at, depth)?),
                "$or" => Selector::Or(self.children(val, elem, &key_at, depth)?),
                "$nor" => Selector::Nor(self.children(val, elem, &key_at, depth)?),
                "$not" => {
                    if !val.is_object() {
                        return Err(MangoError::shape(&key_at, "$not takes exactly one selector object"));
                    }
                    Selector::Not(Box::new(self.selector(val, elem, &key_at, depth + 1)?))
                }
                op if op.starts_with('$') => {
                    if elem {
                        self.operator(&FieldPath::root(), op, val, &key_at, depth)?
                    } else if FIELD_OPERATORS.contains(&op) {
                        return Err(MangoError::shape(&key_at, format!("operator `{op}` must be applied to a field")));
                    } else {
                        return Err(MangoError::unsupported(op, &key_at));
                    }
                }
                field => {
                    let path = parse_path(field, &key_at, self.cfg)?;
                    self.condition(&path, val, &key_at, depth)?
                }
            };
            parts.push(part);
        }
        Ok(Selector::all_of(parts))
    }

    fn children(&self, v: &Json, elem: bool, at: &str, depth: usize) -> Result<Vec<Selector>> {
        let items = v.as_array().ok_or_else(|| MangoError::shape(at, "expects an array of selectors"))?;
        if items.is_empty() {
            return Err(MangoError::shape(at, "expects at least one selector"));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.selector(item, elem, &format!("{at}[{i}]"), depth + 1))
            .collect()
    }

    /// The value under a field key: a literal (implicit `$eq`) or an object of
    /// operators and nested field names, all AND-ed.
    fn condition(&self, path: &FieldPath, v: &Json, at: &str, depth: usize) -> Result<Selector> {
        let obj = match v {
            Json::Object(obj) if !obj.is_empty() => obj,
            other => return Ok(Selector::Cmp { path: path.clone(), op: CmpOp::Eq, value: Value::from(other.clone()) }),
        };
        let mut parts = Vec::with_capacity(obj.len());
        for (key, val) in obj {
            let key_at = format!("{at}.{key}");
            if key.starts_with('$') {
                parts.push(self.operator(path, key, val, &key_at, depth)?);
            } else {
                let nested = path.child(&parse_path(key, &key_at, self.cfg)?);
                check_path_depth(&nested, &key_at, self.cfg)?;
                parts.push(self.condition(&nested, val, &key_at, depth)?);
            }
        }
        Ok(Selector::all_of(parts))
    }

    fn literal_set(&self, v: &Json, at: &str) -> Result<Vec<Value>> {
        let items = v.as_array().ok_or_else(|| MangoError::shape(at, "expects an array"))?;
        if items.len() > self.cfg.max_in_set {
            return Err(MangoError::shape(at, format!("at most {} values allowed", self.cfg.max_in_set)));
        }
        Ok(items.iter().cloned().map(Value::from).collect())
    }

    fn operator(&self, path: &FieldPath, op: &str, v: &Json, at: &str, depth: usize) -> Result<Selector> {
        let path = path.clone();
        if let Some(cmp) = CmpOp::from_operator(op) {
            return Ok(Selector::Cmp { path, op: cmp, value: Value::from(v.clone()) });
        }
        Ok(match op {
            "$in" => Selector::In { path, values: self.literal_set(v, at)? },
            "$nin" => Selector::Nin { path, values: self.literal_set(v, at)? },
            "$all" => Selector::All { path, values: self.literal_set(v, at)? },
            "$exists" => {
                let exists = v.as_bool().ok_or_else(|| MangoError::shape(at, "expects true or false"))?;
                Selector::Exists { path, exists }
            }
            "$type" => {
                let kind = v
                    .as_str()
                    .and_then(Kind::from_type_name)
                    .ok_or_else(|| MangoError::shape(at, "expects one of null, boolean, number, string, array, object"))?;
                Selector::Type { path, kind }
            }
            "$size" => {
                let len = as_count(v).ok_or_else(|| MangoError::shape(at, "expects a non-negative integer"))?;
                Selector::Size { path, len }
            }
            "$mod" => {
                let pair = v.as_array().filter(|a| a.len() == 2);
                let (divisor, remainder) = pair
                    .and_then(|a| Some((as_integer(&a[0])?, as_integer(&a[1])?)))
                    .ok_or_else(|| MangoError::shape(at, "expects [divisor, remainder] integers"))?;
                if divisor == 0 {
                    return Err(MangoError::shape(at, "divisor must not be zero"));
                }
                Selector::Mod { path, divisor, remainder }
            }
            "$like" => {
                let pat = v.as_str().ok_or_else(|| MangoError::shape(at, "expects a pattern string"))?;
                Selector::Like { path, pattern: LikePattern::new(pat) }
            }
            #[cfg(not(feature = "regex"))]
            "$regex" => return Err(MangoError::unsupported(op, at)),
            #[cfg(feature = "regex")]
            "$regex" => {
                let pat = v.as_str().ok_or_else(|| MangoError::shape(at, "expects a pattern string"))?;
                let pattern = RegexPattern::new(pat).map_err(|e| MangoError::shape(at, e))?;
                Selector::Regex { path, pattern }
            }
            "$elemMatch" => {
                self.check_depth(depth + 1, at)?;
                Selector::ElemMatch { path, selector: Box::new(self.selector(v, true, at, depth + 1)?) }
            }
            "$not" => {
                self.check_depth(depth + 1, at)?;
                Selector::Not(Box::new(self.condition(&path, v, at, depth + 1)?))
            }
            "$and" | "$or" | "$nor" => {
                return Err(MangoError::shape(at, format!("`{op}` is not allowed inside a field condition")));
            }
            _ => return Err(MangoError::unsupported(op, at)),
        })
    }
}
