// src/utils/url.rs

//! URL manipulation utilities.

/// Extract the stable listing identifier from a detail URL.
///
/// The identifier is the last path segment with the query string stripped.
///
/// # Examples
/// ```
/// use rentwatch::utils::url::listing_id;
///
/// assert_eq!(
///     listing_id("https://www.halooglasi.com/nekretnine/izdavanje-stanova/stan-vracar-5425636952?kid=4"),
///     Some("stan-vracar-5425636952".to_string())
/// );
/// ```
pub fn listing_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    Some(last.to_string())
}

/// Resolve a potentially relative href against a base URL.
pub fn resolve(base: &url::Url, href: &str) -> Option<String> {
    base.join(href).ok().map(|u| u.to_string())
}
