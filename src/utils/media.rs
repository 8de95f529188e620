//! Resolution of storage references to public URLs.
//!
//! Uploaded files live in external storage; rows only keep their reference.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STORAGE_REF: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

#[derive(Debug, Clone)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if reference.starts_with("https://") || reference.starts_with("http://") {
            return Some(reference.to_string());
        }
        if !STORAGE_REF.is_match(reference) || reference.contains("..") {
            log::warn!("Unresolvable storage reference: {:?}", reference);
            return None;
        }
        Some(format!("{}/{}", self.base_url, reference))
    }

    pub fn resolve_opt(&self, reference: Option<&str>) -> Option<String> {
        reference.and_then(|r| self.resolve(r))
    }

    /// Resolve in order, dropping references that do not resolve.
    pub fn resolve_all(&self, references: &[String]) -> Vec<String> {
        references.iter().filter_map(|r| self.resolve(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_joins_base() {
        let resolver = MediaResolver::new("https://cdn.example.com/files/");
        assert_eq!(
            resolver.resolve("kg2abc_01.jpg").as_deref(),
            Some("https://cdn.example.com/files/kg2abc_01.jpg")
        );
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        let resolver = MediaResolver::new("https://cdn.example.com");
        assert_eq!(
            resolver.resolve("https://img.example.org/a.png").as_deref(),
            Some("https://img.example.org/a.png")
        );
    }

    #[test]
    fn test_rejects_empty_and_unsafe() {
        let resolver = MediaResolver::new("https://cdn.example.com");
        assert_eq!(resolver.resolve("   "), None);
        assert_eq!(resolver.resolve("../etc/passwd"), None);
        assert_eq!(resolver.resolve("a b"), None);
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let resolver = MediaResolver::new("https://cdn.example.com");
        let urls = resolver.resolve_all(&["b".into(), "".into(), "a".into()]);
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/b".to_string(),
                "https://cdn.example.com/a".to_string()
            ]
        );
    }
}
