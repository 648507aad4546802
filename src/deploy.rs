//! The deploy engine: diffing declared entries against stored records,
//! prompting for secrets, writing changes, and optionally removing orphans.

use clap::ValueEnum;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{DeployError, Result};
use crate::spec::{Entry, ResolvedSpec};
use crate::store::{Store, StoredRecord};

/// Which secrets get prompted for during a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PromptMode {
    /// Prompt only for secrets with no stored value.
    Missing,
    /// Prompt for every declared secret, offering the stored value as the
    /// default.
    All,
}

/// Collects secret values interactively.
pub trait SecretPrompt: Send + Sync {
    /// Asks for the value of `key`, offering `default` when present.
    ///
    /// # Errors
    ///
    /// Returns an error when the prompt cannot be completed.
    fn prompt(&self, key: &str, default: Option<&str>) -> Result<String>;
}

/// Deploy run options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Secret prompting mode, when interactive input was requested.
    pub prompt: Option<PromptMode>,
    /// Whether stored records absent from the declaration are deleted.
    pub remove_orphans: bool,
}

/// Outcome of a deploy run.
#[derive(Debug, Clone)]
pub struct DeployReport {
    /// Number of entries written.
    pub written: usize,
    /// Number of orphaned records removed.
    pub orphans_removed: usize,
    /// Service the run targeted.
    pub service: String,
    /// Stage the run targeted.
    pub stage: String,
    /// Effective region.
    pub region: String,
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries written. service = {}, stage = {}, region = {}",
            self.written, self.service, self.stage, self.region
        )?;
        if self.orphans_removed > 0 {
            write!(f, " ({} orphans removed)", self.orphans_removed)?;
        }
        Ok(())
    }
}

/// Reconciles a resolved spec against a store backend.
pub struct Deployer<'a> {
    spec: &'a ResolvedSpec,
    store: &'a dyn Store,
    prompter: &'a dyn SecretPrompt,
}

impl<'a> Deployer<'a> {
    /// Creates a deployer over the given spec, store, and prompter.
    #[must_use]
    pub const fn new(
        spec: &'a ResolvedSpec,
        store: &'a dyn Store,
        prompter: &'a dyn SecretPrompt,
    ) -> Self {
        Self {
            spec,
            store,
            prompter,
        }
    }

    /// Runs one deploy.
    ///
    /// Declared secrets with no stored value and no prompt mode abort the
    /// run before anything is written. Configs are written only when new or
    /// changed, so a repeated deploy with no edits writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when secret values are missing without a prompt
    /// mode, when prompting fails, or when a store write fails.
    pub async fn deploy(&self, options: DeployOptions) -> Result<DeployReport> {
        let stored = self.store.get_many(&self.spec.names()).await?;
        let missing = missing_secrets(self.spec, &stored);

        if !missing.is_empty() && options.prompt.is_none() {
            let names: Vec<&str> = missing.iter().map(|e| e.name.as_str()).collect();
            return Err(DeployError::missing_values(&names).into());
        }

        let mut writes: Vec<Entry> = Vec::new();
        match options.prompt {
            Some(PromptMode::Missing) => {
                for entry in &missing {
                    let value = self.prompter.prompt(entry.key(), None)?;
                    let mut resolved = (*entry).clone();
                    resolved.value = value;
                    writes.push(resolved);
                }
            }
            Some(PromptMode::All) => {
                for entry in &self.spec.secrets {
                    let current = stored
                        .iter()
                        .find(|r| r.name == entry.name)
                        .map(|r| r.value.clone());
                    let value = self.prompter.prompt(entry.key(), current.as_deref())?;
                    if current.as_deref() == Some(value.as_str()) {
                        continue;
                    }
                    let mut resolved = entry.clone();
                    resolved.value = value;
                    writes.push(resolved);
                }
            }
            None => {}
        }

        writes.extend(configs_to_write(self.spec, &stored));

        if writes.is_empty() {
            info!("nothing to write; store matches the declaration");
        } else {
            debug!("writing {} entries", writes.len());
            self.store.put_many(&writes).await?;
        }

        let orphans_removed = if options.remove_orphans {
            self.remove_orphans().await
        } else {
            0
        };

        Ok(DeployReport {
            written: writes.len(),
            orphans_removed,
            service: self.spec.service.clone(),
            stage: self.spec.stage.clone(),
            region: self.spec.region.clone(),
        })
    }

    /// Deletes stored records under the spec prefix that no declared entry
    /// names. Failures here never fail the deploy.
    async fn remove_orphans(&self) -> usize {
        let stored = match self.store.get_by_path(&self.spec.prefix).await {
            Ok(records) => records,
            Err(err) => {
                warn!("skipping orphan removal; listing failed: {err}");
                return 0;
            }
        };

        let declared: HashSet<&str> = self.spec.all.iter().map(|e| e.name.as_str()).collect();
        let orphans: Vec<String> = stored
            .into_iter()
            .filter(|r| !declared.contains(r.name.as_str()))
            .map(|r| r.name)
            .collect();

        if orphans.is_empty() {
            return 0;
        }

        for name in &orphans {
            info!("removing orphaned record {name}");
        }
        match self.store.delete_many(&orphans).await {
            Ok(()) => orphans.len(),
            Err(err) => {
                warn!("orphan removal failed: {err}");
                0
            }
        }
    }
}

/// Returns the declared secrets with neither a declared value nor a stored
/// record.
#[must_use]
pub fn missing_secrets<'s>(spec: &'s ResolvedSpec, stored: &[StoredRecord]) -> Vec<&'s Entry> {
    spec.secrets
        .iter()
        .filter(|e| e.value.is_empty() && !stored.iter().any(|r| r.name == e.name))
        .collect()
}

/// Returns the declared configs that are new or whose stored value differs.
#[must_use]
pub fn configs_to_write(spec: &ResolvedSpec, stored: &[StoredRecord]) -> Vec<Entry> {
    spec.configs
        .iter()
        .filter(|e| {
            stored
                .iter()
                .find(|r| r.name == e.name)
                .map_or(true, |r| r.value != e.value)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfidantError;
    use crate::spec::{parse_spec, Provider, SpecLoader};
    use crate::store::RecordKind;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MemoryStore {
        records: Mutex<Vec<StoredRecord>>,
    }

    impl MemoryStore {
        fn empty() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }

        fn seeded(pairs: &[(&str, &str)]) -> Self {
            let records = pairs
                .iter()
                .map(|(name, value)| StoredRecord {
                    name: (*name).to_string(),
                    value: (*value).to_string(),
                    version: "1".to_string(),
                    kind: RecordKind::Plain,
                    created: Utc::now(),
                    modified: Utc::now(),
                })
                .collect();
            Self {
                records: Mutex::new(records),
            }
        }

        fn names(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.name.clone())
                .collect()
        }

        fn value_of(&self, name: &str) -> Option<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.value.clone())
        }
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn put(&self, entry: &Entry) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            let now = Utc::now();
            if let Some(existing) = records.iter_mut().find(|r| r.name == entry.name) {
                existing.value = entry.value.clone();
                existing.modified = now;
            } else {
                records.push(StoredRecord {
                    name: entry.name.clone(),
                    value: entry.value.clone(),
                    version: "1".to_string(),
                    kind: RecordKind::from_secret(entry.secret),
                    created: now,
                    modified: now,
                });
            }
            Ok(())
        }

        async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.name == name)
                .cloned())
        }

        async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
            let records = self.records.lock().unwrap();
            Ok(names
                .iter()
                .filter_map(|n| records.iter().find(|r| &r.name == n).cloned())
                .collect())
        }

        async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.name.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.records.lock().unwrap().retain(|r| r.name != name);
            Ok(())
        }

        fn backend_type(&self) -> &'static str {
            "memory"
        }
    }

    /// Fails the write of one named entry; otherwise behaves like
    /// [`MemoryStore`].
    struct FailStore {
        inner: MemoryStore,
        fail_on: String,
    }

    #[async_trait]
    impl Store for FailStore {
        async fn put(&self, entry: &Entry) -> Result<()> {
            if entry.name == self.fail_on {
                return Err(ConfidantError::internal("injected write failure"));
            }
            self.inner.put(entry).await
        }

        async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
            self.inner.get(name).await
        }

        async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
            self.inner.get_many(names).await
        }

        async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
            self.inner.get_by_path(prefix).await
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.inner.delete(name).await
        }

        fn backend_type(&self) -> &'static str {
            "memory"
        }
    }

    /// Fails listings, and deletions always; writes and reads pass through
    /// to [`MemoryStore`].
    struct BrokenCleanupStore {
        inner: MemoryStore,
        fail_listing: bool,
    }

    #[async_trait]
    impl Store for BrokenCleanupStore {
        async fn put(&self, entry: &Entry) -> Result<()> {
            self.inner.put(entry).await
        }

        async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
            self.inner.get(name).await
        }

        async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
            self.inner.get_many(names).await
        }

        async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
            if self.fail_listing {
                return Err(ConfidantError::internal("injected listing failure"));
            }
            self.inner.get_by_path(prefix).await
        }

        async fn delete(&self, _name: &str) -> Result<()> {
            Err(ConfidantError::internal("injected delete failure"))
        }

        fn backend_type(&self) -> &'static str {
            "memory"
        }
    }

    struct ScriptedPrompt {
        answers: Mutex<VecDeque<String>>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedPrompt {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().map(|a| (*a).to_string()).collect()),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl SecretPrompt for ScriptedPrompt {
        fn prompt(&self, key: &str, default: Option<&str>) -> Result<String> {
            self.asked.lock().unwrap().push(key.to_string());
            let scripted = self.answers.lock().unwrap().pop_front();
            match scripted {
                Some(answer) => Ok(answer),
                None => default.map(ToString::to_string).ok_or_else(|| {
                    ConfidantError::internal(format!("no scripted answer for {key}"))
                }),
            }
        }
    }

    async fn resolved_spec(yaml: &str) -> ResolvedSpec {
        let raw = parse_spec(yaml, None).unwrap();
        SpecLoader::new().load(raw, "dev").await.unwrap()
    }

    const BASIC_SPEC: &str = r"
provider: local
service: foo
config:
  defaults:
    greeting: hello-{{service}}
    timeout: '30'
secret:
  defaults:
    api-token: API token
";

    #[tokio::test]
    async fn test_deploy_writes_all_configs_into_empty_store() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::empty();
        let prompt = ScriptedPrompt::new(&["s3cret"]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let report = deployer
            .deploy(DeployOptions {
                prompt: Some(PromptMode::Missing),
                remove_orphans: false,
            })
            .await
            .unwrap();

        assert_eq!(report.written, 3);
        assert_eq!(
            store.value_of("/dev/foo/greeting").as_deref(),
            Some("hello-foo")
        );
        assert_eq!(store.value_of("/dev/foo/api-token").as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_repeated_deploy_writes_nothing() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::empty();
        let prompt = ScriptedPrompt::new(&["s3cret"]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let options = DeployOptions {
            prompt: Some(PromptMode::Missing),
            remove_orphans: false,
        };
        deployer.deploy(options).await.unwrap();

        let second = deployer.deploy(options).await.unwrap();
        assert_eq!(second.written, 0);
        // The secret was satisfied on the first run, so nothing is asked.
        assert_eq!(prompt.asked().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_secret_without_prompt_aborts_before_writes() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::empty();
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let err = deployer.deploy(DeployOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("/dev/foo/api-token"));
        assert!(err.to_string().contains("--prompt"));
        assert!(store.names().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_missing_only_asks_unsatisfied_secrets() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::seeded(&[("/dev/foo/api-token", "already-set")]);
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        deployer
            .deploy(DeployOptions {
                prompt: Some(PromptMode::Missing),
                remove_orphans: false,
            })
            .await
            .unwrap();

        assert!(prompt.asked().is_empty());
        assert_eq!(
            store.value_of("/dev/foo/api-token").as_deref(),
            Some("already-set")
        );
    }

    #[tokio::test]
    async fn test_prompt_all_rewrites_only_changed_secrets() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::seeded(&[
            ("/dev/foo/api-token", "old-value"),
            ("/dev/foo/greeting", "hello-foo"),
            ("/dev/foo/timeout", "30"),
        ]);
        // No scripted answer: the prompt falls back to the offered default,
        // modelling the user accepting the current value.
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let report = deployer
            .deploy(DeployOptions {
                prompt: Some(PromptMode::All),
                remove_orphans: false,
            })
            .await
            .unwrap();

        assert_eq!(prompt.asked(), vec!["api-token".to_string()]);
        assert_eq!(report.written, 0);
    }

    #[tokio::test]
    async fn test_changed_config_is_rewritten() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::seeded(&[
            ("/dev/foo/api-token", "set"),
            ("/dev/foo/greeting", "stale"),
            ("/dev/foo/timeout", "30"),
        ]);
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let report = deployer.deploy(DeployOptions::default()).await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(
            store.value_of("/dev/foo/greeting").as_deref(),
            Some("hello-foo")
        );
    }

    #[tokio::test]
    async fn test_partial_write_failure_keeps_earlier_writes() {
        let spec = resolved_spec(
            r"
provider: local
service: foo
config:
  defaults:
    a: '1'
    b: '2'
    c: '3'
    d: '4'
    e: '5'
",
        )
        .await;
        let store = FailStore {
            inner: MemoryStore::empty(),
            fail_on: "/dev/foo/c".to_string(),
        };
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let err = deployer.deploy(DeployOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("/dev/foo/c"));
        assert_eq!(
            store.inner.names(),
            vec!["/dev/foo/a".to_string(), "/dev/foo/b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_orphans_removed_only_when_requested() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = MemoryStore::seeded(&[
            ("/dev/foo/api-token", "set"),
            ("/dev/foo/greeting", "hello-foo"),
            ("/dev/foo/timeout", "30"),
            ("/dev/foo/legacy", "dead"),
        ]);
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let kept = deployer.deploy(DeployOptions::default()).await.unwrap();
        assert_eq!(kept.orphans_removed, 0);
        assert!(store.value_of("/dev/foo/legacy").is_some());

        let removed = deployer
            .deploy(DeployOptions {
                prompt: None,
                remove_orphans: true,
            })
            .await
            .unwrap();
        assert_eq!(removed.orphans_removed, 1);
        assert!(store.value_of("/dev/foo/legacy").is_none());
        assert!(store.value_of("/dev/foo/api-token").is_some());
    }

    #[tokio::test]
    async fn test_orphan_listing_failure_does_not_fail_the_deploy() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = BrokenCleanupStore {
            inner: MemoryStore::seeded(&[
                ("/dev/foo/api-token", "set"),
                ("/dev/foo/greeting", "hello-foo"),
            ]),
            fail_listing: true,
        };
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let report = deployer
            .deploy(DeployOptions {
                prompt: None,
                remove_orphans: true,
            })
            .await
            .unwrap();

        // The write phase still happened; only the cleanup was skipped.
        assert_eq!(report.written, 1);
        assert_eq!(report.orphans_removed, 0);
        assert_eq!(store.inner.value_of("/dev/foo/timeout").as_deref(), Some("30"));
    }

    #[tokio::test]
    async fn test_orphan_deletion_failure_does_not_fail_the_deploy() {
        let spec = resolved_spec(BASIC_SPEC).await;
        let store = BrokenCleanupStore {
            inner: MemoryStore::seeded(&[
                ("/dev/foo/api-token", "set"),
                ("/dev/foo/greeting", "hello-foo"),
                ("/dev/foo/timeout", "30"),
                ("/dev/foo/legacy", "dead"),
            ]),
            fail_listing: false,
        };
        let prompt = ScriptedPrompt::new(&[]);
        let deployer = Deployer::new(&spec, &store, &prompt);

        let report = deployer
            .deploy(DeployOptions {
                prompt: None,
                remove_orphans: true,
            })
            .await
            .unwrap();

        assert_eq!(report.orphans_removed, 0);
        // The orphan survives the failed deletion.
        assert!(store.inner.value_of("/dev/foo/legacy").is_some());
    }

    #[tokio::test]
    async fn test_report_display_mentions_context() {
        let report = DeployReport {
            written: 2,
            orphans_removed: 1,
            service: "foo".to_string(),
            stage: "dev".to_string(),
            region: "us-east-1".to_string(),
        };
        let text = report.to_string();
        assert!(text.contains("2 entries written"));
        assert!(text.contains("stage = dev"));
        assert!(text.contains("1 orphans removed"));
    }

    #[test]
    fn test_missing_secrets_ignores_configs() {
        let spec = ResolvedSpec {
            service: "foo".to_string(),
            stage: "dev".to_string(),
            provider: Provider::Local,
            region: "local".to_string(),
            prefix: "/dev/foo/".to_string(),
            configs: vec![Entry::plain("/dev/foo/a".to_string(), String::new())],
            secrets: vec![Entry::secret("/dev/foo/s".to_string(), "s".to_string())],
            all: Vec::new(),
            stacks: Vec::new(),
            generate: Vec::new(),
            db_dir: None,
        };
        let missing = missing_secrets(&spec, &[]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "/dev/foo/s");
    }
}
