//! Receiver-side reconstruction of a media collection from a payload.

use serde_json::Value;

use crate::error::{CatalogError, Result};

use super::POSITIONS_KEY;

/// One reconstructed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedSlot {
    Url(String),
    Part(String),
}

/// Rebuild the ordered slots of `collection` from the metadata and the
/// names of the binary parts, in the order they arrived.
///
/// Mixed collections are placed by the position map; all-pending
/// collections take arrival order.
pub fn reassemble(
    metadata: &Value,
    collection: &str,
    arrived: &[&str],
) -> Result<Vec<ReceivedSlot>> {
    let prefix = format!("{collection}[");
    let own_parts: Vec<&str> = arrived
        .iter()
        .copied()
        .filter(|n| n.starts_with(&prefix))
        .collect();

    let urls = match resolve(metadata, collection) {
        Some(v) => v,
        None => {
            return Ok(own_parts
                .into_iter()
                .map(|n| ReceivedSlot::Part(n.to_string()))
                .collect())
        }
    };

    let mut slots: Vec<Option<ReceivedSlot>> = urls
        .iter()
        .map(|v| v.as_str().map(|s| ReceivedSlot::Url(s.to_string())))
        .collect();

    let positions = metadata
        .get(POSITIONS_KEY)
        .and_then(|p| p.get(collection))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for entry in &positions {
        let index = entry
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
            .ok_or_else(|| CatalogError::InvalidArgument(format!("bad position entry in {collection}")))?;
        let part = entry
            .get("part")
            .and_then(Value::as_str)
            .ok_or_else(|| CatalogError::InvalidArgument(format!("bad position entry in {collection}")))?;
        if !own_parts.contains(&part) {
            return Err(CatalogError::InvalidArgument(format!("missing part {part}")));
        }
        let len = slots.len();
        let slot = slots
            .get_mut(index)
            .ok_or(CatalogError::IndexOutOfRange { index, len })?;
        *slot = Some(ReceivedSlot::Part(part.to_string()));
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            s.ok_or_else(|| {
                CatalogError::InvalidArgument(format!("{collection}[{i}] has no URL or part"))
            })
        })
        .collect()
}

/// Find the URL list for a collection id such as `images`,
/// `mainImage` or `metalVariations[2].images`.
fn resolve(metadata: &Value, collection: &str) -> Option<Vec<Value>> {
    let mut node = metadata;
    let segments: Vec<&str> = collection.split('.').collect();
    let (last, parents) = segments.split_last()?;
    for seg in parents {
        node = match seg.split_once('[') {
            Some((key, rest)) => {
                let idx: usize = rest.trim_end_matches(']').parse().ok()?;
                node.get(key)?.get(idx)?
            }
            None => node.get(*seg)?,
        };
    }
    let key = if *last == "mainImage" { "imageLink" } else { *last };
    match node.get(key)? {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => Some(vec![Value::from(s.as_str())]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_walks_variant_paths() {
        let meta = json!({
            "metalVariations": [
                {},
                { "images": ["x.jpg", null], "imageLink": "m.jpg" }
            ]
        });
        assert_eq!(
            resolve(&meta, "metalVariations[1].images"),
            Some(vec![json!("x.jpg"), Value::Null])
        );
        assert_eq!(
            resolve(&meta, "metalVariations[1].mainImage"),
            Some(vec![json!("m.jpg")])
        );
        assert_eq!(resolve(&meta, "metalVariations[0].images"), None);
    }

    #[test]
    fn missing_position_part_is_an_error() {
        let meta = json!({
            "images": ["a.jpg", null],
            "mediaPositions": { "images": [{ "index": 1, "part": "images[1]" }] }
        });
        assert!(reassemble(&meta, "images", &[]).is_err());
    }
}
