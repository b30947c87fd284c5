use std::cmp::Ordering;

use super::types::{CmpOp, Order, Selector, SortSpec};
use crate::document::{Document, FieldSource, ID_FIELD, REV_FIELD};
use crate::value::{FieldPath, Object, Value, collate, compare_same_kind};

/// Evaluates `selector` against `doc`. Pure and total: type mismatches and
/// absent fields make a predicate false rather than failing.
pub fn matches<D: FieldSource + ?Sized>(selector: &Selector, doc: &D) -> bool {
    match selector {
        Selector::True => true,
        Selector::And(children) => children.iter().all(|s| matches(s, doc)),
        Selector::Or(children) => children.iter().any(|s| matches(s, doc)),
        Selector::Nor(children) => !children.iter().any(|s| matches(s, doc)),
        Selector::Not(child) => !matches(child, doc),
        Selector::Cmp { path, op, value } => {
            let field = doc.field_at(path);
            match op {
                CmpOp::Eq => eq_field(field.as_deref(), value),
                CmpOp::Ne => !eq_field(field.as_deref(), value),
                CmpOp::Gt => ordered(field.as_deref(), value, |o| o == Ordering::Greater),
                CmpOp::Gte => ordered(field.as_deref(), value, |o| o != Ordering::Less),
                CmpOp::Lt => ordered(field.as_deref(), value, |o| o == Ordering::Less),
                CmpOp::Lte => ordered(field.as_deref(), value, |o| o != Ordering::Greater),
            }
        }
        Selector::In { path, values } => in_set(doc.field_at(path).as_deref(), values),
        Selector::Nin { path, values } => !in_set(doc.field_at(path).as_deref(), values),
        Selector::Exists { path, exists } => doc.field_at(path).is_some() == *exists,
        Selector::Type { path, kind } => doc.field_at(path).is_some_and(|v| v.kind() == *kind),
        Selector::Size { path, len } => {
            doc.field_at(path).is_some_and(|v| v.as_array().is_some_and(|a| a.len() == *len))
        }
        Selector::Mod { path, divisor, remainder } => {
            doc.field_at(path).is_some_and(|v| integral(&v).is_some_and(|n| n.checked_rem(*divisor) == Some(*remainder)))
        }
        Selector::All { path, values } => {
            !values.is_empty()
                && doc
                    .field_at(path)
                    .is_some_and(|v| v.as_array().is_some_and(|items| values.iter().all(|want| items.contains(want))))
        }
        Selector::Like { path, pattern } => {
            doc.field_at(path).is_some_and(|v| v.as_str().is_some_and(|s| pattern.is_match(s)))
        }
        #[cfg(feature = "regex")]
        Selector::Regex { path, pattern } => {
            doc.field_at(path).is_some_and(|v| v.as_str().is_some_and(|s| pattern.is_match(s)))
        }
        Selector::ElemMatch { path, selector } => doc
            .field_at(path)
            .is_some_and(|v| v.as_array().is_some_and(|items| items.iter().any(|item| matches(selector, item)))),
    }
}

// Absent equals only a null literal.
fn eq_field(field: Option<&Value>, lit: &Value) -> bool {
    match field {
        Some(v) => v == lit,
        None => matches!(lit, Value::Null),
    }
}

fn ordered(field: Option<&Value>, lit: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    field.and_then(|v| compare_same_kind(v, lit)).is_some_and(accept)
}

fn in_set(field: Option<&Value>, set: &[Value]) -> bool {
    set.iter().any(|lit| eq_field(field, lit))
}

fn integral(v: &Value) -> Option<i64> {
    let n = v.as_f64()?;
    if n.fract() != 0.0 || n.abs() > 9_007_199_254_740_992.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let n = n as i64;
    Some(n)
}

/// Multi-key comparator. Absent sorts before null; `Desc` reverses the key
/// order (absent last). Ties fall back to the document id so the order is total.
pub fn compare_docs(a: &Document, b: &Document, sort: &[SortSpec]) -> Ordering {
    for s in sort {
        let ord = match (a.field_at(&s.path), b.field_at(&s.path)) {
            (Some(x), Some(y)) => collate(&x, &y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return match s.order {
                Order::Asc => ord,
                Order::Desc => ord.reverse(),
            };
        }
    }
    a.id.cmp(&b.id)
}

/// Restricts `doc` to `fields`. `_id` is always kept; `_rev` only when asked
/// for. Dotted paths rebuild their nesting in the output; missing paths are
/// skipped. A path that steps into an array keeps that whole array, so the
/// projection stays a sub-document of the original.
#[must_use]
pub fn project(doc: &Document, fields: &[FieldPath]) -> Document {
    let mut body = Object::new();
    let mut keep_rev = false;
    for path in fields {
        match (path.depth(), path.first()) {
            (1, Some(ID_FIELD)) => continue,
            (1, Some(REV_FIELD)) => {
                keep_rev = true;
                continue;
            }
            _ => {}
        }
        if let Some((segments, v)) = projected_prefix(&doc.body, path.segments()) {
            set_path(&mut body, segments, v.clone());
        }
    }
    Document { id: doc.id.clone(), rev: if keep_rev { doc.rev.clone() } else { None }, body: Value::Object(body) }
}

// The part of `segments` to copy: the full path, or the prefix ending at the
// first array it passes through. `None` when the path does not resolve.
fn projected_prefix<'a, 'v>(body: &'v Value, segments: &'a [String]) -> Option<(&'a [String], &'v Value)> {
    let mut cur = body;
    let mut cut: Option<(usize, &'v Value)> = None;
    for (i, seg) in segments.iter().enumerate() {
        cur = match cur {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => {
                cut.get_or_insert((i, cur));
                items.get(seg.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(match cut {
        Some((i, array)) => (&segments[..i], array),
        None => (segments, cur),
    })
}

fn set_path(obj: &mut Object, segments: &[String], v: Value) {
    let Some((head, rest)) = segments.split_first() else { return };
    if rest.is_empty() {
        obj.insert(head.as_str(), v);
        return;
    }
    if !matches!(obj.get(head), Some(Value::Object(_))) {
        obj.insert(head.as_str(), Value::Object(Object::new()));
    }
    if let Some(Value::Object(child)) = obj.get_mut(head) {
        set_path(child, rest, v);
    }
}
