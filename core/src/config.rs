use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Configuration scope, least specific first. Page/tab/subtab overrides
/// replace each other along the path; the stream overlay is orthogonal and
/// layered on top of a page-level resolution, never in the middle of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Global,
    Page,
    Tab,
    Subtab,
    StreamInstruction,
}

/// Where a configuration override applies: a page, optionally narrowed to a
/// tab and further to a subtab. A subtab without a tab is rejected at
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopePath {
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtab: Option<String>,
}

impl ScopePath {
    pub fn page(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            tab: None,
            subtab: None,
        }
    }

    pub fn tab(page: impl Into<String>, tab: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            tab: Some(tab.into()),
            subtab: None,
        }
    }

    pub fn subtab(
        page: impl Into<String>,
        tab: impl Into<String>,
        subtab: impl Into<String>,
    ) -> Self {
        Self {
            page: page.into(),
            tab: Some(tab.into()),
            subtab: Some(subtab.into()),
        }
    }

    /// Build from raw parts, rejecting a subtab that has no enclosing tab.
    pub fn new(
        page: impl Into<String>,
        tab: Option<String>,
        subtab: Option<String>,
    ) -> Result<Self, ConfigError> {
        if subtab.is_some() && tab.is_none() {
            return Err(ConfigError::InvalidScopePath {
                message: "subtab requires a tab".to_string(),
            });
        }
        Ok(Self {
            page: page.into(),
            tab,
            subtab,
        })
    }

    /// How specific this path is.
    pub fn level(&self) -> ScopeLevel {
        match (&self.tab, &self.subtab) {
            (_, Some(_)) => ScopeLevel::Subtab,
            (Some(_), None) => ScopeLevel::Tab,
            (None, None) => ScopeLevel::Page,
        }
    }

    /// The path and its ancestors, most specific first. A subtab path yields
    /// itself, its tab, and its page; a page path yields only itself.
    pub fn chain(&self) -> Vec<ScopePath> {
        let mut out = Vec::with_capacity(3);
        if self.subtab.is_some() {
            out.push(self.clone());
        }
        if let Some(tab) = &self.tab {
            out.push(ScopePath::tab(self.page.clone(), tab.clone()));
        }
        out.push(ScopePath::page(self.page.clone()));
        out
    }
}

impl std::fmt::Display for ScopePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.page)?;
        if let Some(tab) = &self.tab {
            write!(f, "/{tab}")?;
        }
        if let Some(subtab) = &self.subtab {
            write!(f, "/{subtab}")?;
        }
        Ok(())
    }
}

/// How a field participates in resolution. Replacing fields (identity,
/// persona) shadow less specific scopes outright; additive fields (stream
/// instructions) are concatenated onto a page-level resolution by the
/// consumer. The resolver never auto-merges across kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Replacing,
    Additive,
}

/// A stored, admin-authored override at one scope.
///
/// `has_override` is true iff `override_value` is non-null — and an override
/// value is never stored empty: `set_override` trims its input and treats an
/// empty result as a delete, so whitespace-only saves fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OverrideRecord {
    pub scope_path: ScopePath,
    pub field_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_value: Option<String>,
    pub has_override: bool,
    pub updated_at: DateTime<Utc>,
}

/// The effective value for a (scope path, field key) pair after precedence.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ResolvedValue {
    pub value: String,
    /// Which scope level supplied the value.
    pub source: ScopeLevel,
    /// Whether the value came from a stored override rather than a default.
    pub has_override: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No default is registered anywhere in the scope chain. The only hard
    /// failure in resolution — every other input degrades to a default.
    #[error("no configuration registered for field '{field_key}' at scope '{scope}'")]
    ConfigurationNotFound { scope: String, field_key: String },

    #[error("invalid scope path: {message}")]
    InvalidScopePath { message: String },
}

/// Compiled-in default for one field at one scope, plus the page surface
/// metadata the admin console renders (available tools, payload types).
#[derive(Debug, Clone)]
struct ScopeDefaults {
    fields: BTreeMap<String, String>,
}

/// In-memory configuration store: compiled-in defaults plus admin overrides.
///
/// Resolution and mutation are synchronous and pure with respect to the store;
/// callers that share a store across writers wrap it in a single-writer lock.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    /// Global fallback defaults, keyed by field.
    global_defaults: BTreeMap<String, String>,
    /// Per-scope defaults, keyed by (path, field).
    scope_defaults: BTreeMap<ScopePath, ScopeDefaults>,
    /// Admin overrides, keyed by (path, field). Values are always trimmed and
    /// non-empty.
    overrides: BTreeMap<(ScopePath, String), (String, DateTime<Utc>)>,
    /// Per-stream instruction overlays, keyed by stream id. Trimmed,
    /// non-empty.
    stream_instructions: BTreeMap<String, (String, DateTime<Utc>)>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform-wide fallback default for a field.
    pub fn register_global_default(&mut self, field_key: impl Into<String>, value: impl Into<String>) {
        self.global_defaults.insert(field_key.into(), value.into());
    }

    /// Register a compiled-in default for a field at a specific scope.
    pub fn register_default(
        &mut self,
        path: ScopePath,
        field_key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.scope_defaults
            .entry(path)
            .or_insert_with(|| ScopeDefaults {
                fields: BTreeMap::new(),
            })
            .fields
            .insert(field_key.into(), value.into());
    }

    /// Pages that have at least one registered default, in order.
    pub fn registered_pages(&self) -> Vec<String> {
        let mut pages: Vec<String> = self
            .scope_defaults
            .keys()
            .map(|p| p.page.clone())
            .collect();
        pages.dedup();
        pages
    }

    /// Scope paths registered under a page (the page itself plus its tabs and
    /// subtabs), most general first.
    pub fn registered_scopes(&self, page: &str) -> Vec<ScopePath> {
        self.scope_defaults
            .keys()
            .filter(|p| p.page == page)
            .cloned()
            .collect()
    }

    /// Field keys with a default visible at this path (scope chain plus
    /// global), deduplicated and sorted.
    pub fn registered_fields(&self, path: &ScopePath) -> Vec<String> {
        let mut fields: Vec<String> = self.global_defaults.keys().cloned().collect();
        for ancestor in path.chain() {
            if let Some(defaults) = self.scope_defaults.get(&ancestor) {
                fields.extend(defaults.fields.keys().cloned());
            }
        }
        fields.sort();
        fields.dedup();
        fields
    }

    /// Resolve the effective value for a replacing field: nearest override in
    /// the scope chain, else the nearest registered default, else the global
    /// default. `ConfigurationNotFound` only when no default exists anywhere.
    pub fn resolve(&self, path: &ScopePath, field_key: &str) -> Result<ResolvedValue, ConfigError> {
        let chain = path.chain();

        for ancestor in &chain {
            let key = (ancestor.clone(), field_key.to_string());
            if let Some((value, _)) = self.overrides.get(&key) {
                return Ok(ResolvedValue {
                    value: value.clone(),
                    source: ancestor.level(),
                    has_override: true,
                });
            }
        }

        for ancestor in &chain {
            if let Some(defaults) = self.scope_defaults.get(ancestor) {
                if let Some(value) = defaults.fields.get(field_key) {
                    return Ok(ResolvedValue {
                        value: value.clone(),
                        source: ancestor.level(),
                        has_override: false,
                    });
                }
            }
        }

        if let Some(value) = self.global_defaults.get(field_key) {
            return Ok(ResolvedValue {
                value: value.clone(),
                source: ScopeLevel::Global,
                has_override: false,
            });
        }

        Err(ConfigError::ConfigurationNotFound {
            scope: path.to_string(),
            field_key: field_key.to_string(),
        })
    }

    /// The override record currently stored at exactly this path, whether or
    /// not it is what `resolve` would pick. Used by the admin console to show
    /// per-scope custom/inherited badges.
    pub fn override_record(&self, path: &ScopePath, field_key: &str) -> OverrideRecord {
        let key = (path.clone(), field_key.to_string());
        match self.overrides.get(&key) {
            Some((value, updated_at)) => OverrideRecord {
                scope_path: path.clone(),
                field_key: field_key.to_string(),
                override_value: Some(value.clone()),
                has_override: true,
                updated_at: *updated_at,
            },
            None => OverrideRecord {
                scope_path: path.clone(),
                field_key: field_key.to_string(),
                override_value: None,
                has_override: false,
                updated_at: Utc::now(),
            },
        }
    }

    /// Store an override. The raw value is trimmed; an empty result deletes
    /// the override instead of storing an empty string, so saving whitespace
    /// is identical to clearing. Idempotent: re-saving the same trimmed value
    /// leaves one record.
    pub fn set_override(
        &mut self,
        path: &ScopePath,
        field_key: &str,
        raw_value: &str,
    ) -> OverrideRecord {
        let trimmed = raw_value.trim();
        let key = (path.clone(), field_key.to_string());
        let now = Utc::now();

        if trimmed.is_empty() {
            self.overrides.remove(&key);
            return OverrideRecord {
                scope_path: path.clone(),
                field_key: field_key.to_string(),
                override_value: None,
                has_override: false,
                updated_at: now,
            };
        }

        self.overrides
            .insert(key, (trimmed.to_string(), now));
        OverrideRecord {
            scope_path: path.clone(),
            field_key: field_key.to_string(),
            override_value: Some(trimmed.to_string()),
            has_override: true,
            updated_at: now,
        }
    }

    /// Delete an override. Clearing one that does not exist is a no-op;
    /// returns whether anything was removed.
    pub fn clear_override(&mut self, path: &ScopePath, field_key: &str) -> bool {
        self.overrides
            .remove(&(path.clone(), field_key.to_string()))
            .is_some()
    }

    /// Store a per-stream instruction overlay with the same trim/empty
    /// semantics as `set_override`.
    pub fn set_stream_instructions(&mut self, stream_id: &str, raw_value: &str) -> OverrideRecord {
        let trimmed = raw_value.trim();
        let now = Utc::now();
        let path = ScopePath::page(format!("stream:{stream_id}"));

        if trimmed.is_empty() {
            self.stream_instructions.remove(stream_id);
            return OverrideRecord {
                scope_path: path,
                field_key: "instructions".to_string(),
                override_value: None,
                has_override: false,
                updated_at: now,
            };
        }

        self.stream_instructions
            .insert(stream_id.to_string(), (trimmed.to_string(), now));
        OverrideRecord {
            scope_path: path,
            field_key: "instructions".to_string(),
            override_value: Some(trimmed.to_string()),
            has_override: true,
            updated_at: now,
        }
    }

    pub fn clear_stream_instructions(&mut self, stream_id: &str) -> bool {
        self.stream_instructions.remove(stream_id).is_some()
    }

    pub fn stream_instructions(&self, stream_id: &str) -> Option<&str> {
        self.stream_instructions
            .get(stream_id)
            .map(|(value, _)| value.as_str())
    }

    /// Stream ids carrying an instruction overlay.
    pub fn stream_ids(&self) -> Vec<String> {
        self.stream_instructions.keys().cloned().collect()
    }

    /// Compose the effective prompt for a stream: the page-level resolved
    /// identity first, then the stream instructions, in that fixed order.
    /// Additive layering happens here and only here.
    pub fn effective_stream_prompt(
        &self,
        stream_id: &str,
        page_path: &ScopePath,
    ) -> Result<String, ConfigError> {
        let identity = self.resolve(page_path, "identity")?;
        match self.stream_instructions(stream_id) {
            Some(instructions) => Ok(format!("{}\n\n{}", identity.value, instructions)),
            None => Ok(identity.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConfigStore, ScopeLevel, ScopePath};

    fn store_with_reports_page() -> ConfigStore {
        let mut store = ConfigStore::new();
        store.register_global_default("identity", "You are a helpful assistant.");
        store.register_default(
            ScopePath::page("reports"),
            "identity",
            "You are a research assistant.",
        );
        store
    }

    #[test]
    fn resolve_returns_page_default_when_no_override() {
        let store = store_with_reports_page();
        let resolved = store
            .resolve(&ScopePath::page("reports"), "identity")
            .unwrap();
        assert_eq!(resolved.value, "You are a research assistant.");
        assert_eq!(resolved.source, ScopeLevel::Page);
        assert!(!resolved.has_override);
    }

    #[test]
    fn resolve_falls_back_to_global_default_for_unregistered_page_field() {
        let store = store_with_reports_page();
        let resolved = store
            .resolve(&ScopePath::page("settings"), "identity")
            .unwrap();
        assert_eq!(resolved.value, "You are a helpful assistant.");
        assert_eq!(resolved.source, ScopeLevel::Global);
    }

    #[test]
    fn resolve_fails_only_when_no_default_exists_anywhere() {
        let store = store_with_reports_page();
        let err = store
            .resolve(&ScopePath::page("reports"), "nonexistent_field")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConfigurationNotFound { .. }));
    }

    #[test]
    fn set_override_is_idempotent() {
        let mut store = store_with_reports_page();
        let path = ScopePath::page("reports");

        store.set_override(&path, "identity", "Custom persona.");
        let first = store.resolve(&path, "identity").unwrap();
        store.set_override(&path, "identity", "Custom persona.");
        let second = store.resolve(&path, "identity").unwrap();

        assert_eq!(first, second);
        assert_eq!(second.value, "Custom persona.");
        assert!(second.has_override);
    }

    #[test]
    fn whitespace_only_override_is_treated_as_cleared() {
        let mut store = store_with_reports_page();
        let path = ScopePath::page("reports");

        let record = store.set_override(&path, "identity", "   ");
        assert!(!record.has_override);
        assert_eq!(record.override_value, None);

        let resolved = store.resolve(&path, "identity").unwrap();
        assert_eq!(resolved.value, "You are a research assistant.");
        assert!(!resolved.has_override);
    }

    #[test]
    fn empty_override_equals_cleared_override() {
        let mut a = store_with_reports_page();
        let mut b = store_with_reports_page();
        let path = ScopePath::page("reports");

        a.set_override(&path, "identity", "custom");
        a.set_override(&path, "identity", " ");

        b.set_override(&path, "identity", "custom");
        b.clear_override(&path, "identity");

        assert_eq!(
            a.resolve(&path, "identity").unwrap(),
            b.resolve(&path, "identity").unwrap()
        );
    }

    #[test]
    fn set_override_trims_stored_value() {
        let mut store = store_with_reports_page();
        let path = ScopePath::page("reports");
        let record = store.set_override(&path, "identity", "  trimmed persona  ");
        assert_eq!(record.override_value.as_deref(), Some("trimmed persona"));

        let resolved = store.resolve(&path, "identity").unwrap();
        assert_eq!(resolved.value, "trimmed persona");
    }

    #[test]
    fn subtab_override_shadows_page_override() {
        let mut store = store_with_reports_page();
        let page = ScopePath::page("reports");
        let subtab = ScopePath::subtab("reports", "overview", "summary");

        store.set_override(&page, "identity", "Page persona.");
        store.set_override(&subtab, "identity", "Subtab persona.");

        let resolved = store.resolve(&subtab, "identity").unwrap();
        assert_eq!(resolved.value, "Subtab persona.");
        assert_eq!(resolved.source, ScopeLevel::Subtab);

        // The page path is untouched by the subtab override.
        let at_page = store.resolve(&page, "identity").unwrap();
        assert_eq!(at_page.value, "Page persona.");
    }

    #[test]
    fn tab_path_inherits_page_override() {
        let mut store = store_with_reports_page();
        let page = ScopePath::page("reports");
        let tab = ScopePath::tab("reports", "overview");

        store.set_override(&page, "identity", "Page persona.");

        let resolved = store.resolve(&tab, "identity").unwrap();
        assert_eq!(resolved.value, "Page persona.");
        assert_eq!(resolved.source, ScopeLevel::Page);
        assert!(resolved.has_override);
    }

    #[test]
    fn clear_override_falls_through_to_default() {
        let mut store = store_with_reports_page();
        let path = ScopePath::page("reports");

        store.set_override(&path, "identity", "Custom persona.");
        assert!(store.clear_override(&path, "identity"));

        let resolved = store.resolve(&path, "identity").unwrap();
        assert_eq!(resolved.value, "You are a research assistant.");
        assert!(!resolved.has_override);
    }

    #[test]
    fn clearing_missing_override_is_a_noop() {
        let mut store = store_with_reports_page();
        assert!(!store.clear_override(&ScopePath::page("reports"), "identity"));
    }

    #[test]
    fn subtab_without_tab_is_rejected() {
        let err = ScopePath::new("reports", None, Some("summary".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidScopePath { .. }));
    }

    #[test]
    fn stream_prompt_layers_page_identity_before_instructions() {
        let mut store = store_with_reports_page();
        store.set_stream_instructions("stream-1", "Focus on oncology trials.");

        let prompt = store
            .effective_stream_prompt("stream-1", &ScopePath::page("reports"))
            .unwrap();
        assert_eq!(
            prompt,
            "You are a research assistant.\n\nFocus on oncology trials."
        );
    }

    #[test]
    fn stream_prompt_without_overlay_is_page_identity_alone() {
        let store = store_with_reports_page();
        let prompt = store
            .effective_stream_prompt("stream-1", &ScopePath::page("reports"))
            .unwrap();
        assert_eq!(prompt, "You are a research assistant.");
    }

    #[test]
    fn whitespace_stream_instructions_clear_the_overlay() {
        let mut store = store_with_reports_page();
        store.set_stream_instructions("stream-1", "Focus on oncology trials.");
        let record = store.set_stream_instructions("stream-1", "  \n ");
        assert!(!record.has_override);
        assert_eq!(store.stream_instructions("stream-1"), None);
    }
}
