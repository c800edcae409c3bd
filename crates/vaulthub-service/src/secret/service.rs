//! Secret CRUD over pseudonymous selectors.
//!
//! Every operation resolves `(environment, path)` to a folder, derives
//! the blind index of the plaintext name, and addresses rows purely by
//! selector. Mutations record a version snapshot in the same
//! transaction and notify the snapshot and sync collaborators after
//! commit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use vaulthub_core::error::AppError;
use vaulthub_core::result::AppResult;
use vaulthub_core::traits::{EncryptedBlob, SecretCipher, SecretSyncRequest, SnapshotNotifier, SyncNotifier};
use vaulthub_core::types::{normalize_path, path_segments, validate_path};
use vaulthub_crypto::compute_blind_index;
use vaulthub_database::connection::{commit, DatabasePool};
use vaulthub_database::repositories::blind_index::BlindIndexConfigRepository;
use vaulthub_database::repositories::environment::EnvironmentRepository;
use vaulthub_database::repositories::folder::FolderRepository;
use vaulthub_database::repositories::secret::SecretRepository;
use vaulthub_database::repositories::secret_tag::SecretTagRepository;
use vaulthub_database::repositories::secret_version::SecretVersionRepository;
use vaulthub_database::Tx;
use vaulthub_entity::environment::Environment;
use vaulthub_entity::folder::FolderWithPath;
use vaulthub_entity::secret::{
    NewSecret, NewSecretVersion, Secret, SecretEncryptionAlgorithm, SecretKeyEncoding,
    SecretSelector, SecretType, SecretUpdate, SecretVersion, SecretWithTags,
};
use vaulthub_entity::tag::SecretTag;

use crate::context::RequestContext;
use crate::import::{ImportService, ImportedSecretGroup};
use crate::secret::expand::{DbSecretLookup, ReferenceExpander};

/// Manages the secret lifecycle.
#[derive(Clone)]
pub struct SecretService {
    pool: DatabasePool,
    env_repo: Arc<EnvironmentRepository>,
    folder_repo: Arc<FolderRepository>,
    secret_repo: Arc<SecretRepository>,
    secret_version_repo: Arc<SecretVersionRepository>,
    tag_repo: Arc<SecretTagRepository>,
    blind_index_repo: Arc<BlindIndexConfigRepository>,
    imports: Arc<ImportService>,
    cipher: Arc<dyn SecretCipher>,
    encryption_key: String,
    snapshots: Arc<dyn SnapshotNotifier>,
    sync: Arc<dyn SyncNotifier>,
}

/// Scope shared by every secret request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SecretScope {
    /// Owning project.
    pub project_id: Uuid,
    /// Environment slug.
    pub environment: String,
    /// Folder path the operation targets.
    pub secret_path: String,
}

/// Request to create a secret. All sensitive fields arrive encrypted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateSecretRequest {
    /// Target scope.
    pub scope: SecretScope,
    /// Plaintext secret name; persisted only as its blind index.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Encrypted secret name.
    pub key: EncryptedBlob,
    /// Encrypted secret value.
    pub value: EncryptedBlob,
    /// Encrypted comment, if any.
    pub comment: Option<EncryptedBlob>,
    /// Skip multiline quoting during expansion.
    pub skip_multiline_encoding: bool,
    /// Free-form reminder note.
    pub reminder_note: Option<String>,
    /// Reminder repeat interval in days.
    pub reminder_repeat_days: Option<i32>,
    /// Tags to attach.
    pub tag_ids: Vec<Uuid>,
    /// Algorithm the payload was encrypted with.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Encoding of the encryption key used.
    pub key_encoding: SecretKeyEncoding,
}

/// Request to update a secret addressed by its current name.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SecretChanges {
    /// New plaintext name, when renaming.
    pub new_secret_name: Option<String>,
    /// Re-encrypted name; required alongside a rename.
    pub key: Option<EncryptedBlob>,
    /// New encrypted value.
    pub value: Option<EncryptedBlob>,
    /// New encrypted comment.
    pub comment: Option<EncryptedBlob>,
    /// New multiline-encoding flag.
    pub skip_multiline_encoding: Option<bool>,
    /// New reminder note.
    pub reminder_note: Option<String>,
    /// New reminder repeat interval in days.
    pub reminder_repeat_days: Option<i32>,
    /// Replacement tag set, when provided.
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Request to update one secret.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateSecretRequest {
    /// Target scope.
    pub scope: SecretScope,
    /// Current plaintext name.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// The changes to apply.
    pub changes: SecretChanges,
}

/// Request to delete one secret.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeleteSecretRequest {
    /// Target scope.
    pub scope: SecretScope,
    /// Plaintext secret name.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
}

/// Request to fetch one secret by name.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GetSecretRequest {
    /// Target scope.
    pub scope: SecretScope,
    /// Plaintext secret name.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Also search the folder's imports when the name misses.
    pub include_imports: bool,
}

/// One entry of a batch create.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewSecretEntry {
    /// Plaintext secret name.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// Encrypted secret name.
    pub key: EncryptedBlob,
    /// Encrypted secret value.
    pub value: EncryptedBlob,
    /// Encrypted comment, if any.
    pub comment: Option<EncryptedBlob>,
    /// Skip multiline quoting during expansion.
    pub skip_multiline_encoding: bool,
    /// Algorithm the payload was encrypted with.
    pub algorithm: SecretEncryptionAlgorithm,
    /// Encoding of the encryption key used.
    pub key_encoding: SecretKeyEncoding,
}

/// One entry of a batch update.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateSecretEntry {
    /// Current plaintext name.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
    /// The changes to apply.
    pub changes: SecretChanges,
}

/// One entry of a batch delete.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeleteSecretEntry {
    /// Plaintext secret name.
    pub secret_name: String,
    /// Shared or Personal.
    pub secret_type: SecretType,
}

/// A folder listing: the folder's own secrets plus, optionally, the
/// groups contributed by its imports.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SecretListing {
    /// Secrets stored in the folder itself.
    pub secrets: Vec<SecretWithTags>,
    /// Imported groups in declaration order; empty unless requested.
    pub imports: Vec<ImportedSecretGroup>,
}

impl SecretService {
    /// Creates a new secret service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: DatabasePool,
        env_repo: Arc<EnvironmentRepository>,
        folder_repo: Arc<FolderRepository>,
        secret_repo: Arc<SecretRepository>,
        secret_version_repo: Arc<SecretVersionRepository>,
        tag_repo: Arc<SecretTagRepository>,
        blind_index_repo: Arc<BlindIndexConfigRepository>,
        imports: Arc<ImportService>,
        cipher: Arc<dyn SecretCipher>,
        encryption_key: String,
        snapshots: Arc<dyn SnapshotNotifier>,
        sync: Arc<dyn SyncNotifier>,
    ) -> Self {
        Self {
            pool,
            env_repo,
            folder_repo,
            secret_repo,
            secret_version_repo,
            tag_repo,
            blind_index_repo,
            imports,
            cipher,
            encryption_key,
            snapshots,
            sync,
        }
    }

    /// Create a secret, recording version 1 in the same transaction.
    pub async fn create_secret(
        &self,
        ctx: &RequestContext,
        req: CreateSecretRequest,
    ) -> AppResult<SecretWithTags> {
        let (_env, folder) = self.resolve_scope(&req.scope).await?;
        let blind_index = self.blind_index_for(req.scope.project_id, &req.secret_name).await?;
        let selector = self.selector(ctx, folder.id, blind_index.clone(), req.secret_type)?;

        if req.secret_type == SecretType::Personal {
            let shared = SecretSelector {
                secret_type: SecretType::Shared,
                user_id: None,
                ..selector.clone()
            };
            if self.secret_repo.find_one(&shared).await?.is_none() {
                return Err(AppError::validation(
                    "A Shared secret with this name must exist before a Personal override",
                ));
            }
        }
        if self.secret_repo.find_one(&selector).await?.is_some() {
            return Err(AppError::conflict("Secret with the same name already exists"));
        }
        let tags = self.validate_tags(req.scope.project_id, &req.tag_ids).await?;

        let new_secret = NewSecret {
            folder_id: folder.id,
            secret_type: req.secret_type,
            user_id: selector.user_id,
            blind_index,
            key_ciphertext: req.key.ciphertext,
            key_iv: req.key.iv,
            key_tag: req.key.tag,
            value_ciphertext: req.value.ciphertext,
            value_iv: req.value.iv,
            value_tag: req.value.tag,
            comment_ciphertext: req.comment.as_ref().map(|c| c.ciphertext.clone()),
            comment_iv: req.comment.as_ref().map(|c| c.iv.clone()),
            comment_tag: req.comment.as_ref().map(|c| c.tag.clone()),
            reminder_note: req.reminder_note,
            reminder_repeat_days: req.reminder_repeat_days,
            skip_multiline_encoding: req.skip_multiline_encoding,
            algorithm: req.algorithm,
            key_encoding: req.key_encoding,
        };

        let mut tx = self.pool.begin().await?;
        let secret = self.secret_repo.create(&mut tx, &new_secret).await?;
        self.tag_repo
            .replace_for_secret(&mut tx, secret.id, &req.tag_ids)
            .await?;
        self.snapshot_secret(&mut tx, &secret).await?;
        commit(tx).await?;

        self.notify(&folder, &req.scope).await?;
        info!(
            secret_id = %secret.id,
            folder_id = %folder.id,
            actor_id = %ctx.actor_id,
            "Secret created"
        );
        Ok(SecretWithTags { secret, tags })
    }

    /// Update a secret's fields, name, or tags.
    pub async fn update_secret(
        &self,
        ctx: &RequestContext,
        req: UpdateSecretRequest,
    ) -> AppResult<SecretWithTags> {
        let (_env, folder) = self.resolve_scope(&req.scope).await?;
        let blind_index = self.blind_index_for(req.scope.project_id, &req.secret_name).await?;
        let selector = self.selector(ctx, folder.id, blind_index, req.secret_type)?;

        let update = self
            .build_update(req.scope.project_id, ctx, &selector, &req.changes)
            .await?;
        let tags = match &req.changes.tag_ids {
            Some(ids) => Some(self.validate_tags(req.scope.project_id, ids).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let secret = self
            .secret_repo
            .update(&mut tx, &selector, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Secret not found"))?;
        if let Some(ids) = &req.changes.tag_ids {
            self.tag_repo.replace_for_secret(&mut tx, secret.id, ids).await?;
        }
        self.snapshot_secret(&mut tx, &secret).await?;
        commit(tx).await?;

        self.notify(&folder, &req.scope).await?;
        info!(
            secret_id = %secret.id,
            actor_id = %ctx.actor_id,
            version = secret.version,
            "Secret updated"
        );
        let tags = match tags {
            Some(tags) => tags,
            None => self.tags_for(secret.id).await?,
        };
        Ok(SecretWithTags { secret, tags })
    }

    /// Delete a secret. Its version history is kept for audit.
    pub async fn delete_secret(
        &self,
        ctx: &RequestContext,
        req: DeleteSecretRequest,
    ) -> AppResult<Secret> {
        let (_env, folder) = self.resolve_scope(&req.scope).await?;
        let blind_index = self.blind_index_for(req.scope.project_id, &req.secret_name).await?;
        let selector = self.selector(ctx, folder.id, blind_index, req.secret_type)?;

        let mut tx = self.pool.begin().await?;
        let deleted = self
            .secret_repo
            .delete(&mut tx, &selector)
            .await?
            .ok_or_else(|| AppError::not_found("Secret not found"))?;
        commit(tx).await?;

        self.notify(&folder, &req.scope).await?;
        info!(
            secret_id = %deleted.id,
            actor_id = %ctx.actor_id,
            "Secret deleted"
        );
        Ok(deleted)
    }

    /// Fetch one secret by name.
    ///
    /// A Personal request falls back to the Shared row when the actor
    /// has no override; a miss optionally continues into the folder's
    /// imports in declaration order.
    pub async fn get_secret(
        &self,
        ctx: &RequestContext,
        req: GetSecretRequest,
    ) -> AppResult<SecretWithTags> {
        let (_env, folder) = self.resolve_scope(&req.scope).await?;
        let blind_index = self.blind_index_for(req.scope.project_id, &req.secret_name).await?;
        let selector = self.selector(ctx, folder.id, blind_index.clone(), req.secret_type)?;

        let mut found = self.secret_repo.find_one(&selector).await?;
        if found.is_none() && req.secret_type == SecretType::Personal {
            let shared = SecretSelector {
                secret_type: SecretType::Shared,
                user_id: None,
                ..selector
            };
            found = self.secret_repo.find_one(&shared).await?;
        }
        if found.is_none() && req.include_imports {
            found = self.find_in_imports(folder.id, &blind_index).await?;
        }
        let secret = found.ok_or_else(|| AppError::not_found("Secret not found"))?;
        let tags = self.tags_for(secret.id).await?;
        Ok(SecretWithTags { secret, tags })
    }

    /// List a folder's secrets with tags merged in, optionally with the
    /// groups its imports contribute.
    pub async fn list_secrets(
        &self,
        ctx: &RequestContext,
        scope: &SecretScope,
        include_imports: bool,
    ) -> AppResult<SecretListing> {
        let (_env, folder) = self.resolve_scope(scope).await?;
        let secrets = self
            .secret_repo
            .find_by_folder_id(folder.id, ctx.personal_owner_id())
            .await?;

        let ids: Vec<Uuid> = secrets.iter().map(|s| s.id).collect();
        let mut by_secret: HashMap<Uuid, Vec<SecretTag>> = HashMap::new();
        for link in self.tag_repo.find_for_secrets(&ids).await? {
            let (secret_id, tag) = link.into_parts();
            by_secret.entry(secret_id).or_default().push(tag);
        }
        let secrets = secrets
            .into_iter()
            .map(|secret| {
                let tags = by_secret.remove(&secret.id).unwrap_or_default();
                SecretWithTags { secret, tags }
            })
            .collect();

        let imports = if include_imports {
            self.imports.resolve_imported_secrets(folder.id).await?
        } else {
            Vec::new()
        };
        Ok(SecretListing { secrets, imports })
    }

    /// Create a batch of secrets atomically.
    ///
    /// Entries may mix Shared and Personal rows. Each Personal entry
    /// needs a Shared sibling, either already stored in the folder or
    /// created by a Shared entry of the same batch.
    pub async fn create_many_secrets(
        &self,
        ctx: &RequestContext,
        scope: &SecretScope,
        entries: Vec<NewSecretEntry>,
    ) -> AppResult<Vec<Secret>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let (_env, folder) = self.resolve_scope(scope).await?;

        let mut selectors = Vec::with_capacity(entries.len());
        for entry in &entries {
            let bi = self.blind_index_for(scope.project_id, &entry.secret_name).await?;
            selectors.push(self.selector(ctx, folder.id, bi, entry.secret_type)?);
        }
        let keys: Vec<(String, SecretType)> = selectors
            .iter()
            .map(|s| (s.blind_index.clone(), s.secret_type))
            .collect();

        let existing = self
            .secret_repo
            .find_by_blind_indexes(folder.id, &keys, ctx.personal_owner_id())
            .await?;
        if !existing.is_empty() {
            return Err(AppError::conflict(format!(
                "{} of the requested secrets already exist",
                existing.len()
            )));
        }

        let shared_lookups: Vec<(String, SecretType)> = keys
            .iter()
            .filter(|(_, t)| *t == SecretType::Personal)
            .map(|(bi, _)| (bi.clone(), SecretType::Shared))
            .collect();
        let existing_shared: HashSet<String> = self
            .secret_repo
            .find_by_blind_indexes(folder.id, &shared_lookups, None)
            .await?
            .into_iter()
            .map(|s| s.blind_index)
            .collect();
        if !missing_shared_siblings(&keys, &existing_shared).is_empty() {
            return Err(AppError::validation(
                "A Shared secret with this name must exist before a Personal override",
            ));
        }

        let new_secrets: Vec<NewSecret> = entries
            .into_iter()
            .zip(selectors)
            .map(|(entry, selector)| NewSecret {
                folder_id: folder.id,
                secret_type: selector.secret_type,
                user_id: selector.user_id,
                blind_index: selector.blind_index,
                key_ciphertext: entry.key.ciphertext,
                key_iv: entry.key.iv,
                key_tag: entry.key.tag,
                value_ciphertext: entry.value.ciphertext,
                value_iv: entry.value.iv,
                value_tag: entry.value.tag,
                comment_ciphertext: entry.comment.as_ref().map(|c| c.ciphertext.clone()),
                comment_iv: entry.comment.as_ref().map(|c| c.iv.clone()),
                comment_tag: entry.comment.as_ref().map(|c| c.tag.clone()),
                reminder_note: None,
                reminder_repeat_days: None,
                skip_multiline_encoding: entry.skip_multiline_encoding,
                algorithm: entry.algorithm,
                key_encoding: entry.key_encoding,
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        let created = self.secret_repo.insert_many(&mut tx, &new_secrets).await?;
        for secret in &created {
            self.snapshot_secret(&mut tx, secret).await?;
        }
        commit(tx).await?;

        self.notify(&folder, scope).await?;
        info!(
            folder_id = %folder.id,
            actor_id = %ctx.actor_id,
            count = created.len(),
            "Secrets created in batch"
        );
        Ok(created)
    }

    /// Update a batch of secrets atomically.
    ///
    /// Every addressed secret must exist; a single miss fails the whole
    /// batch before any write happens. Tag sets are validated up front
    /// and replaced per entry like the singular update.
    pub async fn update_many_secrets(
        &self,
        ctx: &RequestContext,
        scope: &SecretScope,
        entries: Vec<UpdateSecretEntry>,
    ) -> AppResult<Vec<Secret>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let (_env, folder) = self.resolve_scope(scope).await?;

        let mut selectors = Vec::with_capacity(entries.len());
        let mut updates = Vec::with_capacity(entries.len());
        for entry in &entries {
            let bi = self.blind_index_for(scope.project_id, &entry.secret_name).await?;
            let selector = self.selector(ctx, folder.id, bi, entry.secret_type)?;
            let update = self
                .build_update(scope.project_id, ctx, &selector, &entry.changes)
                .await?;
            selectors.push(selector);
            updates.push(update);
        }
        self.validate_tags(scope.project_id, &distinct_tag_ids(&entries))
            .await?;

        let keys: Vec<(String, SecretType)> = selectors
            .iter()
            .map(|s| (s.blind_index.clone(), s.secret_type))
            .collect();
        let existing = self
            .secret_repo
            .find_by_blind_indexes(folder.id, &keys, ctx.personal_owner_id())
            .await?;
        if existing.len() != selectors.len() {
            return Err(AppError::not_found(
                "One or more of the requested secrets do not exist",
            ));
        }

        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(selectors.len());
        for ((selector, update), entry) in selectors.iter().zip(&updates).zip(&entries) {
            let secret = self
                .secret_repo
                .update(&mut tx, selector, update)
                .await?
                .ok_or_else(|| AppError::not_found("Secret not found"))?;
            if let Some(ids) = &entry.changes.tag_ids {
                self.tag_repo.replace_for_secret(&mut tx, secret.id, ids).await?;
            }
            self.snapshot_secret(&mut tx, &secret).await?;
            updated.push(secret);
        }
        commit(tx).await?;

        self.notify(&folder, scope).await?;
        info!(
            folder_id = %folder.id,
            actor_id = %ctx.actor_id,
            count = updated.len(),
            "Secrets updated in batch"
        );
        Ok(updated)
    }

    /// Delete a batch of secrets, returning the removed rows. Entries
    /// with no matching row are skipped silently.
    pub async fn delete_many_secrets(
        &self,
        ctx: &RequestContext,
        scope: &SecretScope,
        entries: Vec<DeleteSecretEntry>,
    ) -> AppResult<Vec<Secret>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let (_env, folder) = self.resolve_scope(scope).await?;

        let mut keys = Vec::with_capacity(entries.len());
        for entry in &entries {
            let bi = self.blind_index_for(scope.project_id, &entry.secret_name).await?;
            let selector = self.selector(ctx, folder.id, bi, entry.secret_type)?;
            keys.push((selector.blind_index, selector.secret_type));
        }

        let mut tx = self.pool.begin().await?;
        let deleted = self
            .secret_repo
            .delete_many(&mut tx, folder.id, &keys, ctx.personal_owner_id())
            .await?;
        commit(tx).await?;

        self.notify(&folder, scope).await?;
        info!(
            folder_id = %folder.id,
            actor_id = %ctx.actor_id,
            count = deleted.len(),
            "Secrets deleted in batch"
        );
        Ok(deleted)
    }

    /// List a secret's version history, newest first.
    pub async fn get_secret_versions(
        &self,
        _ctx: &RequestContext,
        secret_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<SecretVersion>> {
        self.secret_version_repo
            .find_by_secret_id(secret_id, limit, offset)
            .await
    }

    /// Expand `${...}` references in an already-decrypted value.
    pub async fn expand_secret_value(
        &self,
        scope: &SecretScope,
        value: &str,
        skip_multiline_encoding: bool,
    ) -> AppResult<String> {
        let lookup = DbSecretLookup::new(
            scope.project_id,
            Arc::clone(&self.env_repo),
            Arc::clone(&self.folder_repo),
            Arc::clone(&self.secret_repo),
            Arc::clone(&self.cipher),
            self.encryption_key.clone(),
        );
        let mut expander = ReferenceExpander::new(Arc::new(lookup));
        expander
            .expand(
                &scope.environment,
                &scope.secret_path,
                value,
                skip_multiline_encoding,
            )
            .await
    }

    async fn resolve_scope(&self, scope: &SecretScope) -> AppResult<(Environment, FolderWithPath)> {
        let env = self
            .env_repo
            .find_by_slug(scope.project_id, &scope.environment)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Environment '{}' not found in project",
                    scope.environment
                ))
            })?;
        let path = normalize_path(&scope.secret_path);
        validate_path(&path)?;
        let segments = path_segments(&path);
        let folder = self
            .folder_repo
            .find_by_path(env.id, &segments)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder '{path}' not found")))?;
        Ok((env, folder))
    }

    async fn blind_index_for(&self, project_id: Uuid, secret_name: &str) -> AppResult<String> {
        if secret_name.is_empty() {
            return Err(AppError::validation("Secret name must not be empty"));
        }
        let config = self
            .blind_index_repo
            .find_by_project_id(project_id)
            .await?
            .ok_or_else(|| {
                AppError::configuration("Project has no blind index configuration")
            })?;
        compute_blind_index(secret_name, &config, self.cipher.as_ref(), &self.encryption_key)
    }

    /// Build the selector for an operation, enforcing ownership rules.
    fn selector(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        blind_index: String,
        secret_type: SecretType,
    ) -> AppResult<SecretSelector> {
        let user_id = match secret_type {
            SecretType::Shared => None,
            SecretType::Personal => Some(ctx.personal_owner_id().ok_or_else(|| {
                AppError::validation("Personal secrets require a user actor")
            })?),
        };
        Ok(SecretSelector {
            folder_id,
            blind_index,
            secret_type,
            user_id,
        })
    }

    /// Translate requested changes into column updates, deriving the
    /// new blind index and checking for collision on rename.
    async fn build_update(
        &self,
        project_id: Uuid,
        _ctx: &RequestContext,
        selector: &SecretSelector,
        changes: &SecretChanges,
    ) -> AppResult<SecretUpdate> {
        let mut update = SecretUpdate {
            value_ciphertext: changes.value.as_ref().map(|v| v.ciphertext.clone()),
            value_iv: changes.value.as_ref().map(|v| v.iv.clone()),
            value_tag: changes.value.as_ref().map(|v| v.tag.clone()),
            comment_ciphertext: changes.comment.as_ref().map(|c| c.ciphertext.clone()),
            comment_iv: changes.comment.as_ref().map(|c| c.iv.clone()),
            comment_tag: changes.comment.as_ref().map(|c| c.tag.clone()),
            reminder_note: changes.reminder_note.clone(),
            reminder_repeat_days: changes.reminder_repeat_days,
            skip_multiline_encoding: changes.skip_multiline_encoding,
            ..SecretUpdate::default()
        };

        if let Some(new_name) = &changes.new_secret_name {
            let key = changes.key.as_ref().ok_or_else(|| {
                AppError::validation("Renaming a secret requires its re-encrypted name")
            })?;
            let new_index = self.blind_index_for(project_id, new_name).await?;
            if new_index != selector.blind_index {
                let target = SecretSelector {
                    blind_index: new_index.clone(),
                    ..selector.clone()
                };
                if self.secret_repo.find_one(&target).await?.is_some() {
                    return Err(AppError::conflict(
                        "Secret with the new name already exists",
                    ));
                }
            }
            update.blind_index = Some(new_index);
            update.key_ciphertext = Some(key.ciphertext.clone());
            update.key_iv = Some(key.iv.clone());
            update.key_tag = Some(key.tag.clone());
        } else if let Some(key) = &changes.key {
            update.key_ciphertext = Some(key.ciphertext.clone());
            update.key_iv = Some(key.iv.clone());
            update.key_tag = Some(key.tag.clone());
        }
        Ok(update)
    }

    /// Record the post-mutation snapshot and carry the tag set onto it.
    async fn snapshot_secret(&self, tx: &mut Tx<'_>, secret: &Secret) -> AppResult<()> {
        let version = self
            .secret_version_repo
            .insert(tx, &NewSecretVersion::from(secret))
            .await?;
        self.tag_repo
            .copy_to_version(tx, secret.id, version.id)
            .await?;
        Ok(())
    }

    /// Search the folder's imports for a Shared secret with the given
    /// blind index, honoring declaration order.
    async fn find_in_imports(
        &self,
        folder_id: Uuid,
        blind_index: &str,
    ) -> AppResult<Option<Secret>> {
        let groups = self.imports.resolve_imported_secrets(folder_id).await?;
        for group in groups {
            if let Some(secret) = group
                .secrets
                .into_iter()
                .find(|s| s.blind_index == blind_index)
            {
                return Ok(Some(secret));
            }
        }
        Ok(None)
    }

    async fn validate_tags(&self, project_id: Uuid, tag_ids: &[Uuid]) -> AppResult<Vec<SecretTag>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.tag_repo.find_by_ids(project_id, tag_ids).await?;
        if tags.len() != tag_ids.len() {
            return Err(AppError::validation("One or more tags do not exist"));
        }
        Ok(tags)
    }

    async fn tags_for(&self, secret_id: Uuid) -> AppResult<Vec<SecretTag>> {
        let links = self.tag_repo.find_for_secrets(&[secret_id]).await?;
        Ok(links.into_iter().map(|l| l.into_parts().1).collect())
    }

    /// Snapshot is awaited so history is durable before the call
    /// returns; sync delivery is queue-and-forget.
    async fn notify(&self, folder: &FolderWithPath, scope: &SecretScope) -> AppResult<()> {
        self.snapshots.perform_snapshot(folder.id).await?;
        self.sync.queue_secret_sync(SecretSyncRequest {
            project_id: scope.project_id,
            environment: scope.environment.clone(),
            secret_path: normalize_path(&scope.secret_path),
        });
        Ok(())
    }
}

/// Blind indexes of Personal entries lacking a Shared sibling, counting
/// both the batch's own Shared entries and rows already stored.
fn missing_shared_siblings(
    keys: &[(String, SecretType)],
    existing_shared: &HashSet<String>,
) -> Vec<String> {
    let in_batch: HashSet<&str> = keys
        .iter()
        .filter(|(_, t)| *t == SecretType::Shared)
        .map(|(bi, _)| bi.as_str())
        .collect();
    keys.iter()
        .filter(|(bi, t)| {
            *t == SecretType::Personal
                && !in_batch.contains(bi.as_str())
                && !existing_shared.contains(bi.as_str())
        })
        .map(|(bi, _)| bi.clone())
        .collect()
}

/// Distinct tag ids referenced across a batch of updates, checked in a
/// single validation query before any write.
fn distinct_tag_ids(entries: &[UpdateSecretEntry]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in entries {
        for id in entry.changes.tag_ids.iter().flatten() {
            if seen.insert(*id) {
                out.push(*id);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(parts: &[(&str, SecretType)]) -> Vec<(String, SecretType)> {
        parts.iter().map(|(bi, t)| (bi.to_string(), *t)).collect()
    }

    #[test]
    fn test_personal_entry_covered_by_shared_in_batch() {
        let batch = keys(&[
            ("bi-a", SecretType::Shared),
            ("bi-a", SecretType::Personal),
        ]);
        assert!(missing_shared_siblings(&batch, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_personal_entry_covered_by_stored_shared_row() {
        let batch = keys(&[("bi-a", SecretType::Personal)]);
        let existing: HashSet<String> = ["bi-a".to_string()].into();
        assert!(missing_shared_siblings(&batch, &existing).is_empty());
    }

    #[test]
    fn test_personal_entry_without_shared_sibling_is_reported() {
        let batch = keys(&[
            ("bi-a", SecretType::Personal),
            ("bi-b", SecretType::Shared),
        ]);
        assert_eq!(
            missing_shared_siblings(&batch, &HashSet::new()),
            vec!["bi-a".to_string()]
        );
    }

    #[test]
    fn test_distinct_tag_ids_collects_every_entry() {
        let tag_a = Uuid::new_v4();
        let tag_b = Uuid::new_v4();
        let entries = vec![
            UpdateSecretEntry {
                secret_name: "DB_URL".into(),
                secret_type: SecretType::Shared,
                changes: SecretChanges {
                    tag_ids: Some(vec![tag_a, tag_b]),
                    ..SecretChanges::default()
                },
            },
            UpdateSecretEntry {
                secret_name: "DB_PASSWORD".into(),
                secret_type: SecretType::Shared,
                changes: SecretChanges::default(),
            },
            UpdateSecretEntry {
                secret_name: "API_KEY".into(),
                secret_type: SecretType::Personal,
                changes: SecretChanges {
                    tag_ids: Some(vec![tag_b]),
                    ..SecretChanges::default()
                },
            },
        ];
        assert_eq!(distinct_tag_ids(&entries), vec![tag_a, tag_b]);
        assert!(distinct_tag_ids(&[]).is_empty());
    }
}
