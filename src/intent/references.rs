//! Implicit reference discovery.
//!
//! A resource refers to another one implicitly when a string value in its
//! attribute tree has the form `$ref.<resource-key>[.<attribute.path>]`.
//! The scan is a recursive visitor over the attribute tree.

use std::collections::BTreeSet;

use serde_json::Value;

use super::index::ResourceIndex;
use super::types::Resource;

/// Prefix marking a string value as a reference to another resource.
pub const REFERENCE_PREFIX: &str = "$ref.";

/// Returns the body of a reference string, the part after the prefix.
///
/// Returns `None` for plain strings and for references with an empty body.
#[must_use]
pub fn parse_reference(value: &str) -> Option<&str> {
    value
        .strip_prefix(REFERENCE_PREFIX)
        .filter(|body| !body.is_empty())
}

/// Splits a reference body into the longest indexed key it starts with and
/// the attribute path after it.
///
/// Keys may contain dots (`networking.k8s.io/v1:Ingress:demo:web`), so the
/// body is matched against the index rather than cut at the first dot.
#[must_use]
pub fn resolve_reference<'a>(
    body: &'a str,
    index: &ResourceIndex,
) -> Option<(&'a str, Option<&'a str>)> {
    if index.contains(body) {
        return Some((body, None));
    }
    body.rmatch_indices('.')
        .map(|(pos, _)| (&body[..pos], &body[pos + 1..]))
        .find(|(key, _)| index.contains(key))
        .map(|(key, path)| (key, Some(path).filter(|p| !p.is_empty())))
}

/// Collects the body of every reference in an attribute tree.
#[must_use]
pub fn implicit_references(attributes: &Value) -> BTreeSet<String> {
    let mut bodies = BTreeSet::new();
    visit(attributes, &mut bodies);
    bodies
}

fn visit(value: &Value, bodies: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            if let Some(body) = parse_reference(s) {
                bodies.insert(body.to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| visit(item, bodies)),
        Value::Object(map) => map.values().for_each(|item| visit(item, bodies)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Returns explicit and implicit dependency keys of a resource.
///
/// Implicit references resolve against `index`; one that matches no key is
/// returned whole so the caller can report it. An implicit self-reference
/// is dropped, since a resource may read its own attributes. An explicit
/// self-dependency is kept.
#[must_use]
pub fn dependency_keys(resource: &Resource, index: &ResourceIndex) -> BTreeSet<String> {
    let mut keys: BTreeSet<String> = implicit_references(&resource.attributes)
        .iter()
        .map(|body| resolve_reference(body, index).map_or(body.as_str(), |(key, _)| key))
        .filter(|key| *key != resource.id)
        .map(str::to_string)
        .collect();
    keys.extend(resource.depends_on.iter().cloned());
    keys
}
