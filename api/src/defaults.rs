use horizon_core::config::{ConfigStore, FieldKind, ScopePath};

/// Assistant persona / identity text shown to the model. Replacing: the most
/// specific scope wins outright.
pub const FIELD_IDENTITY: &str = "identity";
/// Tool names the embedded assistant may call, comma-separated.
pub const FIELD_TOOLS: &str = "tools";
/// Payload types the assistant may attach to a reply, comma-separated.
pub const FIELD_PAYLOAD_TYPES: &str = "payload_types";
/// Stream instruction overlay. Additive: layered onto the page identity.
pub const FIELD_INSTRUCTIONS: &str = "instructions";

/// How each field participates in resolution. Stream instructions are the
/// only additive field; everything else replaces less specific scopes.
pub fn field_kind(field_key: &str) -> FieldKind {
    match field_key {
        FIELD_INSTRUCTIONS => FieldKind::Additive,
        _ => FieldKind::Replacing,
    }
}

/// Compiled-in configuration defaults for every product page that embeds the
/// chat assistant. Changes here ship with a deployment; admins override at
/// runtime through the chat-config endpoints.
pub fn seed_config() -> ConfigStore {
    let mut store = ConfigStore::new();

    store.register_global_default(
        FIELD_IDENTITY,
        "You are Knowledge Horizon's assistant. Answer questions about the \
         user's research streams and reports.",
    );
    store.register_global_default(FIELD_TOOLS, "search_reports,lookup_article");
    store.register_global_default(FIELD_PAYLOAD_TYPES, "text,citation");

    store.register_default(
        ScopePath::page("reports"),
        FIELD_IDENTITY,
        "You are a research assistant.",
    );
    store.register_default(
        ScopePath::page("reports"),
        FIELD_TOOLS,
        "search_reports,lookup_article,summarize_report",
    );
    store.register_default(
        ScopePath::tab("reports", "articles"),
        FIELD_IDENTITY,
        "You are a research assistant helping the reader triage articles in \
         this report.",
    );
    store.register_default(
        ScopePath::subtab("reports", "articles", "excluded"),
        FIELD_IDENTITY,
        "You are a research assistant. Explain why the pipeline excluded each \
         article and what would change the decision.",
    );

    store.register_default(
        ScopePath::page("streams"),
        FIELD_IDENTITY,
        "You are a guide helping the user refine a research stream: its \
         topics, sources, and monitoring focus.",
    );
    store.register_default(
        ScopePath::page("streams"),
        FIELD_PAYLOAD_TYPES,
        "text,citation,stream_draft",
    );

    store.register_default(
        ScopePath::page("help"),
        FIELD_IDENTITY,
        "You answer questions about using the Knowledge Horizon console.",
    );

    store
}

#[cfg(test)]
mod tests {
    use horizon_core::config::{FieldKind, ScopeLevel, ScopePath};

    use super::{FIELD_IDENTITY, FIELD_INSTRUCTIONS, field_kind, seed_config};

    #[test]
    fn reports_page_has_research_assistant_identity() {
        let store = seed_config();
        let resolved = store
            .resolve(&ScopePath::page("reports"), FIELD_IDENTITY)
            .unwrap();
        assert_eq!(resolved.value, "You are a research assistant.");
        assert!(!resolved.has_override);
    }

    #[test]
    fn every_registered_scope_resolves_identity() {
        let store = seed_config();
        for page in store.registered_pages() {
            for scope in store.registered_scopes(&page) {
                store.resolve(&scope, FIELD_IDENTITY).unwrap();
            }
        }
    }

    #[test]
    fn unregistered_page_falls_back_to_global_identity() {
        let store = seed_config();
        let resolved = store
            .resolve(&ScopePath::page("workbench"), FIELD_IDENTITY)
            .unwrap();
        assert_eq!(resolved.source, ScopeLevel::Global);
    }

    #[test]
    fn only_instructions_are_additive() {
        assert_eq!(field_kind(FIELD_INSTRUCTIONS), FieldKind::Additive);
        assert_eq!(field_kind(FIELD_IDENTITY), FieldKind::Replacing);
        assert_eq!(field_kind("anything_else"), FieldKind::Replacing);
    }
}
