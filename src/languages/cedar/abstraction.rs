//! Cedar implementation of the language contract

use super::request::translate;
use super::statements::split_statements;
use super::*;
use crate::authz::decision::AuthorizationDecision;
use crate::authz::guard::verify_request;
use crate::authz::model::AuthorizationContext;
use crate::authz::store::PolicyStore;
use crate::core::header::{ArtifactType, CodeType, ObjectHeader};
use crate::core::manager::ObjectManager;
use crate::core::manifest::{
    engine_version, Engine, Language, Manifest, Partition, Runtime, ENGINE_DISTRIBUTION,
    ENGINE_NAME,
};
use crate::core::object::{Object, ObjectKind};
use crate::core::sections::{MultiSectionObject, SectionMeta};
use crate::core::tree::ROOT_PARTITION;
use crate::core::validation::PolicyName;
use crate::error::{PolicyError, Result};
use crate::languages::{LanguageAbstraction, LanguageSpecification};
use cedar_policy::{Authorizer, Decision, Policy, PolicyId, PolicySet};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Separator between policies in exported source
const POLICY_SEPARATOR: &str = "\n\n";

/// Random 32-hex policy id for policies without an `@id`
fn generate_policy_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

pub struct CedarLanguageAbstraction {
    spec: LanguageSpecification,
    objects: ObjectManager,
}

impl CedarLanguageAbstraction {
    pub fn new() -> Self {
        CedarLanguageAbstraction {
            spec: LanguageSpecification {
                language: LANGUAGE_CEDAR.to_string(),
                language_version: LANGUAGE_SYNTAX_VERSION.to_string(),
                language_version_id: LANGUAGE_SYNTAX_VERSION_ID,
                frontend_language: LANGUAGE_CEDAR.to_string(),
                frontend_language_id: LANGUAGE_CEDAR_ID,
                backend_language: LANGUAGE_CEDAR_JSON.to_string(),
                backend_language_id: LANGUAGE_CEDAR_JSON_ID,
                supported_policy_file_extensions: vec![LANGUAGE_FILE_EXTENSION.to_string()],
                supported_schema_file_names: vec![LANGUAGE_SCHEMA_FILE_NAME.to_string()],
            },
            objects: ObjectManager::new(),
        }
    }

    fn check_policy_file(&self, file_path: &str) -> Result<()> {
        let extension = Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();
        if !self.spec.supported_policy_file_extensions.contains(&extension) {
            return Err(PolicyError::UnsupportedFrontendLanguage(format!(
                "'{}' is not a {} policy file",
                file_path, self.spec.frontend_language
            )));
        }
        Ok(())
    }

    fn check_schema_file(&self, file_path: &str) -> Result<()> {
        let file_name = Path::new(file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if !self
            .spec
            .supported_schema_file_names
            .iter()
            .any(|name| name == file_name)
        {
            return Err(PolicyError::UnsupportedFrontendLanguage(format!(
                "'{}' is not a {} schema file",
                file_path, self.spec.frontend_language
            )));
        }
        Ok(())
    }

    fn section_meta(&self, partition: &str, code_id: &str, code_type: CodeType) -> SectionMeta {
        let language_type = match code_type {
            CodeType::Policy => LANGUAGE_POLICY_TYPE,
            CodeType::Schema => LANGUAGE_SCHEMA_TYPE,
        };
        SectionMeta {
            partition: partition.to_string(),
            kind: ObjectKind::Blob,
            name: code_id.to_string(),
            code_id: code_id.to_string(),
            code_type: code_type.as_str().to_string(),
            language: self.spec.backend_language.clone(),
            language_version: self.spec.language_version.clone(),
            language_type: language_type.to_string(),
        }
    }

    /// Parse one statement into a policy blob
    fn create_policy_section(
        &self,
        partition: &str,
        statement: &str,
        seen: &mut HashSet<String>,
    ) -> Result<(Object, SectionMeta)> {
        let policy =
            Policy::parse(None, statement).map_err(|e| PolicyError::SyntaxError(e.to_string()))?;

        let code_id = match policy.annotation(POLICY_ID_ANNOTATION) {
            Some(id) => PolicyName::new(id)?.into_string(),
            None => generate_policy_id(),
        };
        if !seen.insert(code_id.clone()) {
            return Err(PolicyError::SyntaxError(format!(
                "duplicate policy id '{}'",
                code_id
            )));
        }

        let mut json = policy
            .to_json()
            .map_err(|e| PolicyError::EncodingFailed(e.to_string()))?;
        // Stored form always carries its id, generated or not
        if let Value::Object(fields) = &mut json {
            let annotations = fields
                .entry("annotations")
                .or_insert_with(|| Value::Object(Default::default()));
            if let Value::Object(annotations) = annotations {
                annotations.insert(
                    POLICY_ID_ANNOTATION.to_string(),
                    Value::String(code_id.clone()),
                );
            }
        }
        let data = serde_json::to_vec(&json)?;

        let header = ObjectHeader::new(
            true,
            self.spec.backend_language_id,
            self.spec.language_version_id,
            LANGUAGE_POLICY_TYPE_ID,
            code_id.as_str(),
            CodeType::Policy as u32,
        );
        let object = self.objects.create_blob_object(&header, &data)?;
        Ok((object, self.section_meta(partition, &code_id, CodeType::Policy)))
    }

    fn policy_set(&self, store: &PolicyStore) -> Result<PolicySet> {
        let mut policy_set = PolicySet::new();
        for item in store.policies() {
            let header = item.header();
            if header.language_id != self.spec.backend_language_id
                || header.language_version_id != self.spec.language_version_id
            {
                return Err(PolicyError::LanguageMismatch {
                    expected: self.spec.backend_language.clone(),
                    found: format!(
                        "language id {} version id {}",
                        header.language_id, header.language_version_id
                    ),
                });
            }
            let json: Value = serde_json::from_slice(item.content())?;
            let policy = Policy::from_json(Some(PolicyId::new(item.code_id())), json)
                .map_err(|e| {
                    PolicyError::Evaluation(format!("policy '{}': {}", item.code_id(), e))
                })?;
            policy_set.add(policy).map_err(|e| {
                PolicyError::Evaluation(format!("policy '{}': {}", item.code_id(), e))
            })?;
        }
        Ok(policy_set)
    }
}

impl Default for CedarLanguageAbstraction {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAbstraction for CedarLanguageAbstraction {
    fn language_specification(&self) -> &LanguageSpecification {
        &self.spec
    }

    fn build_manifest(&self, mut manifest: Manifest) -> Result<Manifest> {
        let key = runtime_key();
        manifest.runtimes.entry(key.clone()).or_insert_with(|| Runtime {
            engine: Engine {
                name: ENGINE_NAME.to_string(),
                version: engine_version(),
                distribution: ENGINE_DISTRIBUTION.to_string(),
            },
            language: Language {
                name: LANGUAGE_CEDAR.to_string(),
                version: format!("{}+", LANGUAGE_SYNTAX_VERSION),
            },
        });
        manifest
            .partitions
            .entry(ROOT_PARTITION.to_string())
            .or_insert_with(|| Partition {
                runtime: key,
                schema: false,
            });
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate_manifest(&self, manifest: &Manifest) -> Result<()> {
        manifest.validate()?;
        let key = runtime_key();
        let runtime = manifest.runtimes.get(&key).ok_or_else(|| {
            PolicyError::Manifest(format!("missing the '{}' runtime", key))
        })?;
        if runtime.language.name != LANGUAGE_CEDAR {
            return Err(PolicyError::Manifest(format!(
                "runtime '{}' declares language '{}'",
                key, runtime.language.name
            )));
        }
        let partition = manifest.partitions.get(ROOT_PARTITION).ok_or_else(|| {
            PolicyError::Manifest("missing the root partition".to_string())
        })?;
        if partition.runtime != key {
            return Err(PolicyError::Manifest(format!(
                "root partition uses runtime '{}' instead of '{}'",
                partition.runtime, key
            )));
        }
        Ok(())
    }

    fn create_policy_blob_objects(
        &self,
        partition: &str,
        file_path: &str,
        data: &[u8],
    ) -> Result<MultiSectionObject> {
        self.check_policy_file(file_path)?;
        let source = std::str::from_utf8(data)
            .map_err(|e| PolicyError::SyntaxError(format!("{}: {}", file_path, e)))?;

        let statements = split_statements(source);
        let mut sections = MultiSectionObject::new(file_path, statements.len());
        let mut seen = HashSet::new();
        for (index, statement) in statements.iter().enumerate() {
            match self.create_policy_section(partition, statement, &mut seen) {
                Ok((object, meta)) => sections.add_section_at(index, object, meta)?,
                Err(err) => sections.add_section_error_at(index, err)?,
            }
        }

        info!(
            path = %file_path,
            sections = sections.len(),
            errors = sections.errors().count(),
            "parsed policy file"
        );
        Ok(sections)
    }

    fn create_multi_policy_content_bytes(&self, objects: &[Object]) -> Result<(Vec<u8>, String)> {
        let mut blocks = Vec::with_capacity(objects.len());
        for object in objects {
            let (header, content) = self.objects.convert_object_to_blob(object)?;
            if header.artifact_type() != Some(ArtifactType::Policy) {
                return Err(PolicyError::InvalidObject(format!(
                    "blob '{}' is not a policy",
                    header.code_id
                )));
            }
            let text = self.convert_bytes_to_frontend_language(
                header.language_id,
                header.language_version_id,
                header.artifact_type_id,
                &content,
            )?;
            blocks.push(String::from_utf8_lossy(&text).into_owned());
        }
        Ok((
            blocks.join(POLICY_SEPARATOR).into_bytes(),
            LANGUAGE_FILE_EXTENSION.to_string(),
        ))
    }

    fn create_schema_blob_objects(
        &self,
        partition: &str,
        file_path: &str,
        data: &[u8],
    ) -> Result<MultiSectionObject> {
        self.check_schema_file(file_path)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(PolicyError::SchemaEmpty);
        }

        let mut sections = MultiSectionObject::new(file_path, 1);
        let created = serde_json::from_slice::<Value>(data)
            .map_err(|e| PolicyError::SyntaxError(format!("schema: {}", e)))
            .and_then(|_| {
                let header = ObjectHeader::new(
                    true,
                    self.spec.backend_language_id,
                    self.spec.language_version_id,
                    LANGUAGE_SCHEMA_TYPE_ID,
                    SCHEMA_CODE_ID,
                    CodeType::Schema as u32,
                );
                self.objects.create_blob_object(&header, data)
            });
        match created {
            Ok(object) => {
                let meta = self.section_meta(partition, SCHEMA_CODE_ID, CodeType::Schema);
                sections.add_section_at(0, object, meta)?;
            }
            Err(err) => sections.add_section_error_at(0, err)?,
        }
        debug!(path = %file_path, "parsed schema file");
        Ok(sections)
    }

    fn create_schema_content_bytes(&self, data: &[u8]) -> Result<(Vec<u8>, String)> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(PolicyError::SchemaEmpty);
        }
        Ok((data.to_vec(), LANGUAGE_SCHEMA_FILE_NAME.to_string()))
    }

    fn convert_bytes_to_frontend_language(
        &self,
        language_id: u32,
        language_version_id: u32,
        artifact_type_id: u32,
        content: &[u8],
    ) -> Result<Vec<u8>> {
        if language_id != self.spec.backend_language_id {
            return Err(PolicyError::LanguageMismatch {
                expected: format!("language id {}", self.spec.backend_language_id),
                found: format!("language id {}", language_id),
            });
        }
        if language_version_id != self.spec.language_version_id {
            return Err(PolicyError::LanguageMismatch {
                expected: format!("version id {}", self.spec.language_version_id),
                found: format!("version id {}", language_version_id),
            });
        }

        match artifact_type_id {
            LANGUAGE_POLICY_TYPE_ID => {
                let json: Value = serde_json::from_slice(content)
                    .map_err(|e| PolicyError::SyntaxError(format!("policy: {}", e)))?;
                let policy = Policy::from_json(None, json)
                    .map_err(|e| PolicyError::SyntaxError(format!("policy: {}", e)))?;
                Ok(policy.to_string().into_bytes())
            }
            LANGUAGE_SCHEMA_TYPE_ID => {
                serde_json::from_slice::<Value>(content)
                    .map_err(|e| PolicyError::SyntaxError(format!("schema: {}", e)))?;
                Ok(content.to_vec())
            }
            other => Err(PolicyError::SyntaxError(format!(
                "unsupported artifact type id {}",
                other
            ))),
        }
    }

    fn authorization_check(
        &self,
        request_id: &str,
        store: &PolicyStore,
        ctx: &AuthorizationContext,
    ) -> Result<AuthorizationDecision> {
        verify_request(ctx)?;
        let translated = translate(ctx)?;
        let policy_set = self.policy_set(store)?;

        let response =
            Authorizer::new().is_authorized(&translated.request, &policy_set, &translated.entities);

        let errors: Vec<String> = response
            .diagnostics()
            .errors()
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(PolicyError::Evaluation(errors.join("; ")));
        }

        let reasons: Vec<String> = response
            .diagnostics()
            .reason()
            .map(|id| id.to_string())
            .collect();
        debug!(
            request_id,
            version = store.version(),
            decision = ?response.decision(),
            reasons = ?reasons,
            "evaluated request"
        );

        Ok(match response.decision() {
            Decision::Allow => AuthorizationDecision::permit(request_id),
            Decision::Deny if reasons.is_empty() => {
                AuthorizationDecision::forbidden(request_id, "denied: no permit policy matched")
            }
            Decision::Deny => AuthorizationDecision::forbidden(
                request_id,
                format!("denied by policies: {}", reasons.join(", ")),
            ),
        })
    }
}
