//! Secret reference expansion.
//!
//! Values may embed `${KEY}` references to secrets in the same scope or
//! `${env.path.to.folder.KEY}` references across environments. Expansion
//! resolves them depth-first with memoization; a cycle resolves to the
//! empty string instead of failing the whole request.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use futures::future::BoxFuture;
use regex::Regex;
use tracing::{error, warn};
use uuid::Uuid;

use vaulthub_core::result::AppResult;
use vaulthub_core::traits::SecretCipher;
use vaulthub_core::types::{normalize_path, path_segments};
use vaulthub_database::repositories::environment::EnvironmentRepository;
use vaulthub_database::repositories::folder::FolderRepository;
use vaulthub_database::repositories::secret::SecretRepository;

/// Matches `${...}` reference syntax; the capture is everything between
/// the braces.
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("reference regex is valid"));

/// Source of decrypted Shared secrets for one `(environment, path)`
/// scope. Only the expander consumes this; tests substitute an
/// in-memory map.
#[async_trait]
pub trait SecretLookup: Send + Sync {
    /// Fetch the Shared secrets at a scope as a plaintext key/value
    /// map. Unknown environments or paths yield an empty map.
    async fn fetch_scope(
        &self,
        environment: &str,
        secret_path: &str,
    ) -> AppResult<HashMap<String, String>>;
}

/// One expansion pass over a batch of secrets.
///
/// Caches are scoped to the pass: each referenced `(environment, path)`
/// is fetched at most once, and each referenced secret is expanded at
/// most once, however many values point at it.
pub struct ReferenceExpander {
    lookup: Arc<dyn SecretLookup>,
    fetch_cache: HashMap<String, HashMap<String, String>>,
    expanded: HashMap<String, String>,
    in_progress: HashSet<String>,
}

impl ReferenceExpander {
    pub fn new(lookup: Arc<dyn SecretLookup>) -> Self {
        Self {
            lookup,
            fetch_cache: HashMap::new(),
            expanded: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Expand every reference in `value`, then apply multiline quoting
    /// unless the secret opts out.
    pub async fn expand(
        &mut self,
        environment: &str,
        secret_path: &str,
        value: &str,
        skip_multiline_encoding: bool,
    ) -> AppResult<String> {
        let expanded = self
            .expand_value(
                environment.to_string(),
                normalize_path(secret_path),
                value.to_string(),
            )
            .await?;
        if skip_multiline_encoding {
            Ok(expanded)
        } else {
            Ok(format_multiline(&expanded))
        }
    }

    fn expand_value(
        &mut self,
        environment: String,
        secret_path: String,
        value: String,
    ) -> BoxFuture<'_, AppResult<String>> {
        Box::pin(async move {
            let references: Vec<(String, String)> = REFERENCE_RE
                .captures_iter(&value)
                .map(|c| (c[0].to_string(), c[1].to_string()))
                .collect();
            if references.is_empty() {
                return Ok(value);
            }

            let mut result = value.clone();
            for (matched, inner) in references {
                let replacement = self
                    .resolve_reference(&environment, &secret_path, &inner)
                    .await?;
                result = result.replace(&matched, &replacement);
            }
            Ok(result)
        })
    }

    /// Resolve one reference body to its replacement text.
    ///
    /// Local references expand recursively; cross-environment references
    /// splice the stored value in verbatim.
    async fn resolve_reference(
        &mut self,
        environment: &str,
        secret_path: &str,
        reference: &str,
    ) -> AppResult<String> {
        let (ref_env, ref_path, key) = parse_reference(environment, secret_path, reference);

        let memo_key = format!("{ref_env}-{ref_path}-{key}");
        if let Some(done) = self.expanded.get(&memo_key) {
            return Ok(done.clone());
        }
        if self.in_progress.contains(&memo_key) {
            error!(
                environment = %ref_env,
                secret_path = %ref_path,
                key = %key,
                "Circular secret reference detected"
            );
            return Ok(String::new());
        }
        self.in_progress.insert(memo_key.clone());

        let scope_key = format!("{ref_env}-{ref_path}");
        if !self.fetch_cache.contains_key(&scope_key) {
            let scope = self.lookup.fetch_scope(&ref_env, &ref_path).await?;
            self.fetch_cache.insert(scope_key.clone(), scope);
        }
        let raw = self
            .fetch_cache
            .get(&scope_key)
            .and_then(|scope| scope.get(&key))
            .cloned();

        let is_local = !reference.contains('.');
        let resolved = match raw {
            Some(raw) if is_local => self.expand_value(ref_env, ref_path, raw).await?,
            Some(raw) => raw,
            None => {
                warn!(key = %key, "Referenced secret not found; expanding to empty");
                String::new()
            }
        };
        self.expanded.insert(memo_key, resolved.clone());
        Ok(resolved)
    }
}

/// Split a reference body into its target scope and key.
///
/// A bare `KEY` stays in the current scope; `env.a.b.KEY` addresses the
/// secret `KEY` under `/a/b` of environment `env`.
fn parse_reference(
    current_env: &str,
    current_path: &str,
    reference: &str,
) -> (String, String, String) {
    let parts: Vec<&str> = reference.split('.').collect();
    if parts.len() == 1 {
        return (
            current_env.to_string(),
            current_path.to_string(),
            reference.to_string(),
        );
    }
    let env = parts[0].to_string();
    let key = parts[parts.len() - 1].to_string();
    let path = if parts.len() == 2 {
        "/".to_string()
    } else {
        format!("/{}", parts[1..parts.len() - 1].join("/"))
    };
    (env, path, key)
}

/// Quote a multi-line value for dotenv-style consumers, escaping the
/// newlines. Single-line values pass through untouched.
fn format_multiline(value: &str) -> String {
    if !value.contains('\n') {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('\n', "\\n"))
}

/// [`SecretLookup`] backed by the live tables, decrypting values with
/// the injected cipher.
pub struct DbSecretLookup {
    project_id: Uuid,
    env_repo: Arc<EnvironmentRepository>,
    folder_repo: Arc<FolderRepository>,
    secret_repo: Arc<SecretRepository>,
    cipher: Arc<dyn SecretCipher>,
    encryption_key: String,
}

impl DbSecretLookup {
    pub fn new(
        project_id: Uuid,
        env_repo: Arc<EnvironmentRepository>,
        folder_repo: Arc<FolderRepository>,
        secret_repo: Arc<SecretRepository>,
        cipher: Arc<dyn SecretCipher>,
        encryption_key: String,
    ) -> Self {
        Self {
            project_id,
            env_repo,
            folder_repo,
            secret_repo,
            cipher,
            encryption_key,
        }
    }
}

#[async_trait]
impl SecretLookup for DbSecretLookup {
    async fn fetch_scope(
        &self,
        environment: &str,
        secret_path: &str,
    ) -> AppResult<HashMap<String, String>> {
        let Some(env) = self
            .env_repo
            .find_by_slug(self.project_id, environment)
            .await?
        else {
            return Ok(HashMap::new());
        };
        let segments = path_segments(secret_path);
        let Some(folder) = self.folder_repo.find_by_path(env.id, &segments).await? else {
            return Ok(HashMap::new());
        };

        let secrets = self.secret_repo.find_by_folder_id(folder.id, None).await?;
        let mut scope = HashMap::with_capacity(secrets.len());
        for secret in secrets {
            let key = self.cipher.decrypt(
                &secret.key_ciphertext,
                &secret.key_iv,
                &secret.key_tag,
                &self.encryption_key,
            )?;
            let value = self.cipher.decrypt(
                &secret.value_ciphertext,
                &secret.value_iv,
                &secret.value_tag,
                &self.encryption_key,
            )?;
            scope.insert(key, value);
        }
        Ok(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory scope map keyed by `(environment, path)`.
    struct MapLookup {
        scopes: HashMap<(String, String), HashMap<String, String>>,
        fetches: AtomicUsize,
    }

    impl MapLookup {
        fn new() -> Self {
            Self {
                scopes: HashMap::new(),
                fetches: AtomicUsize::new(0),
            }
        }

        fn with(mut self, env: &str, path: &str, entries: &[(&str, &str)]) -> Self {
            let scope = entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.scopes.insert((env.to_string(), path.to_string()), scope);
            self
        }
    }

    #[async_trait]
    impl SecretLookup for MapLookup {
        async fn fetch_scope(
            &self,
            environment: &str,
            secret_path: &str,
        ) -> AppResult<HashMap<String, String>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .scopes
                .get(&(environment.to_string(), secret_path.to_string()))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn expander(lookup: MapLookup) -> ReferenceExpander {
        ReferenceExpander::new(Arc::new(lookup))
    }

    #[test]
    fn test_parse_reference_forms() {
        assert_eq!(
            parse_reference("dev", "/app", "TOKEN"),
            ("dev".into(), "/app".into(), "TOKEN".into())
        );
        assert_eq!(
            parse_reference("dev", "/app", "prod.TOKEN"),
            ("prod".into(), "/".into(), "TOKEN".into())
        );
        assert_eq!(
            parse_reference("dev", "/app", "prod.db.primary.URL"),
            ("prod".into(), "/db/primary".into(), "URL".into())
        );
    }

    #[tokio::test]
    async fn test_literal_value_passes_through() {
        let mut exp = expander(MapLookup::new());
        let out = exp.expand("dev", "/", "plain-value", false).await.unwrap();
        assert_eq!(out, "plain-value");
    }

    #[tokio::test]
    async fn test_expands_local_reference() {
        let lookup = MapLookup::new().with("dev", "/", &[("HOST", "localhost")]);
        let mut exp = expander(lookup);
        let out = exp
            .expand("dev", "/", "http://${HOST}:8080", false)
            .await
            .unwrap();
        assert_eq!(out, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_expands_nested_references() {
        let lookup = MapLookup::new().with(
            "dev",
            "/",
            &[("URL", "${HOST}:${PORT}"), ("HOST", "db"), ("PORT", "5432")],
        );
        let mut exp = expander(lookup);
        let out = exp.expand("dev", "/", "conn=${URL}", false).await.unwrap();
        assert_eq!(out, "conn=db:5432");
    }

    #[tokio::test]
    async fn test_expands_cross_environment_reference() {
        let lookup = MapLookup::new()
            .with("prod", "/db", &[("URL", "postgres://prod-db")]);
        let mut exp = expander(lookup);
        let out = exp
            .expand("dev", "/", "${prod.db.URL}", false)
            .await
            .unwrap();
        assert_eq!(out, "postgres://prod-db");
    }

    #[tokio::test]
    async fn test_cross_environment_value_is_spliced_verbatim() {
        let lookup = MapLookup::new()
            .with("prod", "/", &[("URL", "${HOST}"), ("HOST", "prod-host")]);
        let mut exp = expander(lookup);
        let out = exp.expand("dev", "/", "${prod.URL}", false).await.unwrap();
        assert_eq!(out, "${HOST}");
    }

    #[tokio::test]
    async fn test_cycle_expands_to_empty_string() {
        let lookup = MapLookup::new().with("dev", "/", &[("A", "${B}"), ("B", "${A}")]);
        let mut exp = expander(lookup);
        let out = exp.expand("dev", "/", "x=${A}", false).await.unwrap();
        assert_eq!(out, "x=");
    }

    #[tokio::test]
    async fn test_missing_reference_expands_to_empty_string() {
        let mut exp = expander(MapLookup::new().with("dev", "/", &[]));
        let out = exp.expand("dev", "/", "x=${NOPE}", false).await.unwrap();
        assert_eq!(out, "x=");
    }

    #[tokio::test]
    async fn test_scope_fetched_once_per_pass() {
        let lookup = Arc::new(MapLookup::new().with("dev", "/", &[("A", "1"), ("B", "2")]));
        let counter = Arc::clone(&lookup);
        let mut exp = ReferenceExpander::new(lookup);

        let out = exp.expand("dev", "/", "${A}-${B}-${A}", false).await.unwrap();
        assert_eq!(out, "1-2-1");
        let out = exp.expand("dev", "/", "${B}", false).await.unwrap();
        assert_eq!(out, "2");
        assert_eq!(counter.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multiline_value_is_quoted() {
        let lookup = MapLookup::new().with("dev", "/", &[("PEM", "line1\nline2")]);
        let mut exp = expander(lookup);

        let quoted = exp.expand("dev", "/", "${PEM}", false).await.unwrap();
        assert_eq!(quoted, "\"line1\\nline2\"");

        let raw = exp.expand("dev", "/", "${PEM}", true).await.unwrap();
        assert_eq!(raw, "line1\nline2");
    }

    #[test]
    fn test_format_multiline() {
        assert_eq!(format_multiline("single"), "single");
        assert_eq!(format_multiline("a\nb"), "\"a\\nb\"");
    }
}
