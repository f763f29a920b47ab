//! Contract discovery on disk.
//!
//! A manifest is a directory tree:
//!
//! ```text
//! manifest/
//! ├── service.toml
//! ├── get/
//! │   └── users/
//! │       ├── 42.json
//! │       └── 42/
//! │           └── orders.json
//! └── post/
//!     └── orders/
//!         └── new.json
//! ```
//!
//! Method directories sit directly under the manifest root, each root is a
//! directory under its method, and each resource is a `.json` file under its
//! root. Nested resources are addressed by their relative path without the
//! extension, so `get/users/42/orders.json` is resource `42/orders` of root
//! `users`.

use std::path::{Path, PathBuf};

use covenant_core::{ContractDocument, GatewayError, GatewayResult};
use tokio::fs;
use tracing::{debug, info};

/// HTTP methods a manifest may define, lowercase.
pub const METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

const CONTRACT_EXTENSION: &str = "json";
const MAX_RESOURCE_DEPTH: usize = 8;

/// Resolves `(method, root, resource)` triples to contract documents.
///
/// Every lookup reads the filesystem; nothing is cached.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    root: PathBuf,
    methods: Vec<String>,
}

impl ManifestResolver {
    /// Opens a manifest and discovers which method directories exist.
    ///
    /// Fails with `MethodNotAllowed` when none do.
    pub async fn open(root: impl Into<PathBuf>) -> GatewayResult<Self> {
        let root = root.into();
        let mut methods = Vec::new();
        for method in METHODS {
            if is_dir(&root.join(method)).await {
                methods.push((*method).to_string());
            }
        }

        if methods.is_empty() {
            info!(path = %root.display(), "manifest has no method directories");
            return Err(GatewayError::method_not_allowed("method not allowed"));
        }

        debug!(path = %root.display(), methods = ?methods, "manifest opened");
        Ok(Self { root, methods })
    }

    /// Returns the manifest directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the methods that have a directory, in canonical order.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Returns whether `method` has a directory.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    /// Lists the roots defined for a method, sorted.
    pub async fn roots(&self, method: &str) -> GatewayResult<Vec<String>> {
        if !self.has_method(method) {
            return Err(GatewayError::method_not_allowed("method not allowed"));
        }

        let dir = self.root.join(method);
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|_| GatewayError::method_not_allowed("method not allowed"))?;

        let mut roots = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| read_failure(&dir, &e))?
        {
            let Some(name) = visible_name(&entry) else {
                continue;
            };
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                roots.push(name);
            }
        }

        roots.sort();
        Ok(roots)
    }

    /// Lists the resources of a root, sorted.
    ///
    /// Resources below subdirectories are included with their relative path.
    /// Fails with `NotFound` when the root is not one of [`roots`](Self::roots).
    pub async fn resources(&self, method: &str, root: &str) -> GatewayResult<Vec<String>> {
        if !self.roots(method).await?.iter().any(|r| r == root) {
            return Err(GatewayError::not_found("root not found"));
        }

        let mut resources = Vec::new();
        let mut pending = vec![(self.root.join(method).join(root), String::new(), 0_usize)];

        while let Some((dir, prefix, depth)) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| read_failure(&dir, &e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| read_failure(&dir, &e))?
            {
                let Some(name) = visible_name(&entry) else {
                    continue;
                };
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };

                if file_type.is_dir() {
                    if depth + 1 < MAX_RESOURCE_DEPTH {
                        pending.push((entry.path(), format!("{prefix}{name}/"), depth + 1));
                    }
                } else if let Some(stem) = name
                    .strip_suffix(CONTRACT_EXTENSION)
                    .and_then(|s| s.strip_suffix('.'))
                    .filter(|s| !s.is_empty())
                {
                    resources.push(format!("{prefix}{stem}"));
                }
            }
        }

        resources.sort();
        Ok(resources)
    }

    /// Reads and parses one contract file.
    ///
    /// Membership is not checked here; callers resolve `root` and `resource`
    /// through [`roots`](Self::roots) and [`resources`](Self::resources)
    /// first. Repeated loads of an unchanged file return identical bytes.
    pub async fn load(
        &self,
        method: &str,
        root: &str,
        resource: &str,
    ) -> GatewayResult<ContractDocument> {
        let path = self.contract_path(method, root, resource);
        let raw = fs::read(&path).await.map_err(|_| {
            GatewayError::internal(format!("contract file not found in {}", path.display()))
        })?;

        debug!(path = %path.display(), bytes = raw.len(), "contract loaded");
        ContractDocument::from_slice(raw)
    }

    /// Resolves a triple with full membership checks, then loads it.
    ///
    /// Only names returned by the listing operations ever reach the
    /// filesystem, so `..` segments cannot escape the manifest.
    pub async fn resolve(
        &self,
        method: &str,
        root: &str,
        resource: &str,
    ) -> GatewayResult<ContractDocument> {
        let resources = self.resources(method, root).await?;
        if !resources.iter().any(|r| r == resource) {
            return Err(GatewayError::not_found("resource not found"));
        }
        self.load(method, root, resource).await
    }

    fn contract_path(&self, method: &str, root: &str, resource: &str) -> PathBuf {
        self.root
            .join(method)
            .join(root)
            .join(format!("{resource}.{CONTRACT_EXTENSION}"))
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

fn visible_name(entry: &fs::DirEntry) -> Option<String> {
    entry
        .file_name()
        .into_string()
        .ok()
        .filter(|name| !name.starts_with('.'))
}

fn read_failure(dir: &Path, err: &std::io::Error) -> GatewayError {
    GatewayError::internal(format!("failed to read manifest directory {}: {err}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::ErrorKind;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn manifest() -> TempDir {
        let dir = TempDir::new().unwrap();
        let users = dir.path().join("get/users");
        std_fs::create_dir_all(users.join("42")).unwrap();
        std_fs::create_dir_all(dir.path().join("post/orders")).unwrap();
        std_fs::write(users.join("42.json"), r#"{"Response": {"id": 42}}"#).unwrap();
        std_fs::write(users.join("42/orders.json"), "{}").unwrap();
        std_fs::write(users.join("notes.txt"), "ignored").unwrap();
        std_fs::write(users.join(".hidden.json"), "{}").unwrap();
        std_fs::write(dir.path().join("post/orders/new.json"), "{}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_open_discovers_methods() {
        let dir = manifest();
        let resolver = ManifestResolver::open(dir.path()).await.unwrap();
        assert_eq!(resolver.methods(), ["get", "post"]);
        assert!(resolver.has_method("get"));
        assert!(!resolver.has_method("delete"));
    }

    #[tokio::test]
    async fn test_open_empty_manifest() {
        let dir = TempDir::new().unwrap();
        let err = ManifestResolver::open(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
    }

    #[tokio::test]
    async fn test_roots_and_resources() {
        let dir = manifest();
        let resolver = ManifestResolver::open(dir.path()).await.unwrap();

        assert_eq!(resolver.roots("get").await.unwrap(), vec!["users"]);
        assert_eq!(
            resolver.resources("get", "users").await.unwrap(),
            vec!["42", "42/orders"]
        );

        let err = resolver.roots("delete").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);

        let err = resolver.resources("get", "accounts").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "root not found");
    }

    #[tokio::test]
    async fn test_resolve_checks_membership() {
        let dir = manifest();
        std_fs::write(dir.path().join("get/secret.json"), "{}").unwrap();
        let resolver = ManifestResolver::open(dir.path()).await.unwrap();

        let err = resolver.resolve("get", "users", "../secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "resource not found");

        let err = resolver.resolve("get", "..", "secret").await.unwrap_err();
        assert_eq!(err.message(), "root not found");
    }

    #[tokio::test]
    async fn test_load_is_byte_stable() {
        let dir = manifest();
        let resolver = ManifestResolver::open(dir.path()).await.unwrap();
        let first = resolver.resolve("get", "users", "42").await.unwrap();
        let second = resolver.resolve("get", "users", "42").await.unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.response()["id"], 42);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = manifest();
        let resolver = ManifestResolver::open(dir.path()).await.unwrap();
        let err = resolver.load("get", "users", "7").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.message().starts_with("contract file not found in"));
    }

    #[tokio::test]
    async fn test_load_malformed_contract() {
        let dir = manifest();
        std_fs::write(dir.path().join("post/orders/broken.json"), "{not json").unwrap();
        let resolver = ManifestResolver::open(dir.path()).await.unwrap();
        let err = resolver.resolve("post", "orders", "broken").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.message().starts_with("failed to parse contract JSON"));
    }
}
