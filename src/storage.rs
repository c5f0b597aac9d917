//! Derived URLs for stored images and best-effort cleanup of replaced files.
//!
//! The file store itself is an external concern; on the API side an image is
//! just a stored relative path (or already an absolute URL) that gets turned
//! into something a client can fetch from the `/storage` route.

use std::path::Path;

fn is_absolute_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn base(app_url: &str) -> &str {
    app_url.trim_end_matches('/')
}

/// URL for a file under the storage area, e.g. `recipes/thumbnails/x.jpg`.
pub fn stored_file_url(app_url: &str, path: &str) -> String {
    format!("{}/storage/{}", base(app_url), path.trim_start_matches('/'))
}

/// Recipe thumbnails: stored path when present, nothing otherwise.
pub fn thumbnail_url(app_url: &str, photo: Option<&str>) -> Option<String> {
    photo.map(|p| {
        if is_absolute_url(p) {
            p.to_string()
        } else {
            stored_file_url(app_url, p)
        }
    })
}

/// Catalog ingredient photos: absolute URL passthrough, asset-relative path
/// for bare filenames, placeholder when absent.
pub fn ingredient_image_url(app_url: &str, photo: Option<&str>) -> String {
    match photo {
        None | Some("") => format!(
            "{}/images/placeholders/ingredient-placeholder.jpg",
            base(app_url)
        ),
        Some(p) if is_absolute_url(p) => p.to_string(),
        Some(p) => format!("{}/images/ingredients/{}", base(app_url), p),
    }
}

/// Profile pictures fall back to the default placeholder image.
pub fn profile_picture_url(app_url: &str, picture: Option<&str>) -> String {
    match picture {
        Some(p) if !p.is_empty() => stored_file_url(app_url, p),
        _ => format!("{}/images/default_profile.jpg", base(app_url)),
    }
}

/// Removes a stored file, tolerating absence and logging anything else.
/// Orphans are acceptable; a failed delete must never fail the request.
pub async fn delete_stored_file(storage_dir: &str, path: &str) {
    let full = Path::new(storage_dir).join(path.trim_start_matches('/'));
    if let Err(err) = tokio::fs::remove_file(&full).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %err, path = %full.display(), "failed to delete stored file");
        }
    }
}
