//! # Image URLs
//!
//! Resolves Sanity image asset references to CDN URLs.
//!
//! Asset ids have the shape `image-<hash>-<width>x<height>-<format>`; the
//! CDN serves them at
//! `https://cdn.sanity.io/images/<project>/<dataset>/<hash>-<width>x<height>.<format>`.

pub const CDN_HOST: &str = "https://cdn.sanity.io";

/// CDN URL for `asset_ref`, or `None` if it is not an image asset id
pub fn image_url(project_id: &str, dataset: &str, asset_ref: &str) -> Option<String> {
    let rest = asset_ref.strip_prefix("image-")?;
    let (stem, format) = rest.rsplit_once('-')?;
    let (hash, dimensions) = stem.rsplit_once('-')?;

    let (width, height) = dimensions.split_once('x')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if hash.is_empty() || format.is_empty() || !numeric(width) || !numeric(height) {
        return None;
    }

    Some(format!(
        "{}/images/{}/{}/{}-{}.{}",
        CDN_HOST, project_id, dataset, hash, dimensions, format
    ))
}
