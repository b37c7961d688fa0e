/// Image reference normalization
const DOCKER_HUB_PREFIX: &str = "docker.io/";
const DEFAULT_TAG: &str = "latest";

/// Whether the reference is pinned to a content digest
pub fn is_digest(image: &str) -> bool {
    image.contains('@')
}

/// Whether the last path segment already carries a tag
fn has_tag(image: &str) -> bool {
    image
        .rsplit('/')
        .next()
        .map_or(false, |segment| segment.contains(':'))
}

/// Normalize an image reference into a canonical, retaggable form.
///
/// Digest references come back untouched (apart from trimming). A leading
/// `docker.io/` is stripped once and an untagged reference gets `:latest`.
pub fn normalize(image: &str) -> String {
    match strip_hub_prefix(image) {
        Some(image) if !has_tag(image) => format!("{}:{}", image, DEFAULT_TAG),
        Some(image) => image.to_string(),
        None => image.trim().to_string(),
    }
}

/// Like [`normalize`], but with a caller-supplied tag.
///
/// A name that already contains `:` anywhere is kept as is and `tag` is
/// ignored. An empty `tag` falls back to `latest`.
pub fn normalize_with_tag(image: &str, tag: &str) -> String {
    match strip_hub_prefix(image) {
        Some(image) if !image.contains(':') => {
            let tag = tag.trim();
            let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
            format!("{}:{}", image, tag)
        }
        Some(image) => image.to_string(),
        None => image.trim().to_string(),
    }
}

/// Trimmed reference without `docker.io/`; `None` for digest references
fn strip_hub_prefix(image: &str) -> Option<&str> {
    let image = image.trim();
    if is_digest(image) {
        return None;
    }
    Some(image.strip_prefix(DOCKER_HUB_PREFIX).unwrap_or(image))
}

/// Compute the mirrored reference under `{registry}/{project}/`.
///
/// With more than two path segments the first one is a registry host and
/// is dropped; otherwise the whole path is kept.
pub fn compute_destination(source: &str, registry: &str, project: &str) -> String {
    let parts: Vec<&str> = source.split('/').collect();
    let repository = if parts.len() > 2 {
        parts[1..].join("/")
    } else {
        parts.join("/")
    };
    format!("{}/{}/{}", registry, project, repository)
}
