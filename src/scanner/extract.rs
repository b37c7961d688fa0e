/// Image extraction from a single YAML file
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Marker of an unrendered template expression
const TEMPLATE_MARKER: &str = "{{";

static IMAGE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn image_pattern() -> &'static Regex {
    IMAGE_PATTERN.get_or_init(|| Regex::new(r"image:\s*(\S+)").expect("image pattern is valid"))
}

/// Extract image references from a manifest file.
///
/// Files that parse as YAML contribute the container images of their
/// Deployment documents. Files that don't (Helm templates and the like)
/// are scanned as raw text instead.
pub fn extract_images_from_file(path: &Path) -> Result<BTreeSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(extract_images(&content, path))
}

/// Extract image references from manifest text
pub fn extract_images(content: &str, origin: &Path) -> BTreeSet<String> {
    match parse_documents(content) {
        Ok(documents) => documents.iter().flat_map(deployment_images).collect(),
        Err(e) => {
            debug!(
                "Falling back to text scan for {}: {}",
                origin.display(),
                e
            );
            scan_text(content)
        }
    }
}

/// Parse every `---` separated document, failing if any of them is invalid.
///
/// Unquoted `{{ ... }}` parses as a flow mapping used as a key, which
/// manifests never contain, so a collection key is rejected as well.
fn parse_documents(content: &str) -> Result<Vec<Value>> {
    let documents = serde_yaml::Deserializer::from_str(content)
        .map(Value::deserialize)
        .collect::<Result<Vec<_>, _>>()?;

    if documents.iter().any(has_collection_key) {
        anyhow::bail!("mapping key is a mapping or sequence");
    }
    Ok(documents)
}

/// Whether any mapping in `value` has a mapping or sequence as a key
fn has_collection_key(value: &Value) -> bool {
    match value {
        Value::Mapping(mapping) => mapping.iter().any(|(key, value)| {
            matches!(key, Value::Mapping(_) | Value::Sequence(_))
                || has_collection_key(key)
                || has_collection_key(value)
        }),
        Value::Sequence(items) => items.iter().any(has_collection_key),
        Value::Tagged(tagged) => has_collection_key(&tagged.value),
        _ => false,
    }
}

/// Container images of a Deployment document; empty for anything else
fn deployment_images(document: &Value) -> Vec<String> {
    if !document.is_mapping() {
        return Vec::new();
    }
    if document.get("kind").and_then(Value::as_str) != Some("Deployment") {
        return Vec::new();
    }

    document
        .get("spec")
        .and_then(|spec| spec.get("template"))
        .and_then(|template| template.get("spec"))
        .and_then(|pod| pod.get("containers"))
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
        .filter_map(|container| container.get("image"))
        .filter_map(Value::as_str)
        .filter(|image| !image.is_empty())
        .map(str::to_string)
        .collect()
}

/// Regex scan for `image:` values, ignoring templated ones
fn scan_text(content: &str) -> BTreeSet<String> {
    image_pattern()
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|image| !image.contains(TEMPLATE_MARKER))
        .map(|image| image.trim().to_string())
        .collect()
}
