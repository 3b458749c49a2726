use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// The automated pipeline's classification of a candidate article.
/// Immutable once ingested — curators layer decisions on top, never rewrite it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineDecision {
    Included,
    Excluded,
    /// The pipeline matched this candidate to another item; duplicates always
    /// resolve to excluded.
    Duplicate { of: Uuid },
}

impl PipelineDecision {
    /// What the pipeline decision alone would produce.
    pub fn effective(&self) -> EffectiveState {
        match self {
            PipelineDecision::Included => EffectiveState::Included,
            PipelineDecision::Excluded | PipelineDecision::Duplicate { .. } => {
                EffectiveState::Excluded
            }
        }
    }
}

/// A human curator's explicit override. Absence (`None` on the item) means
/// the pipeline decision stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CuratorDecision {
    Included,
    Excluded,
}

impl CuratorDecision {
    pub fn effective(&self) -> EffectiveState {
        match self {
            CuratorDecision::Included => EffectiveState::Included,
            CuratorDecision::Excluded => EffectiveState::Excluded,
        }
    }
}

/// Whether the article ends up in the published report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveState {
    Included,
    Excluded,
}

/// One candidate article in a generated report, carrying the pipeline's
/// classification and any curator override.
///
/// `effective_state` is a pure function of the two decisions; the mutation
/// methods below are the only writers and recompute it on every change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CandidateItem {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub pipeline_decision: PipelineDecision,
    pub pipeline_score: f64,
    pub pipeline_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curator_decision: Option<CuratorDecision>,
    /// Editorial category assigned when a curator pulls an article in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub effective_state: EffectiveState,
    pub updated_at: DateTime<Utc>,
}

impl CandidateItem {
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        url: Option<String>,
        pipeline_decision: PipelineDecision,
        pipeline_score: f64,
        pipeline_reason: impl Into<String>,
    ) -> Self {
        let effective_state = pipeline_decision.effective();
        Self {
            id,
            title: title.into(),
            url,
            pipeline_decision,
            pipeline_score,
            pipeline_reason: pipeline_reason.into(),
            curator_decision: None,
            category: None,
            effective_state,
            updated_at: Utc::now(),
        }
    }

    fn recompute(&mut self) {
        self.effective_state = match self.curator_decision {
            Some(decision) => decision.effective(),
            None => self.pipeline_decision.effective(),
        };
        self.updated_at = Utc::now();
    }

    /// Pull the article into the report. When the pipeline already said
    /// included, the action merely restores the pipeline's original decision,
    /// so it is treated as a reset instead of storing a redundant override.
    pub fn include(&mut self, category: Option<String>) {
        if self.pipeline_decision.effective() == EffectiveState::Included {
            self.curator_decision = None;
            self.category = None;
        } else {
            self.curator_decision = Some(CuratorDecision::Included);
            if category.is_some() {
                self.category = category;
            }
        }
        self.recompute();
    }

    /// Drop the article from the report. Symmetric to `include`: excluding an
    /// article the pipeline already excluded (or marked duplicate) clears the
    /// curator override rather than storing one that matches the pipeline.
    pub fn exclude(&mut self) {
        if self.pipeline_decision.effective() == EffectiveState::Excluded {
            self.curator_decision = None;
            self.category = None;
        } else {
            self.curator_decision = Some(CuratorDecision::Excluded);
        }
        self.recompute();
    }

    /// The explicit undo surfaced to the curator: unconditionally clear the
    /// override so the effective state reverts to the pipeline decision.
    /// Returns false when there was nothing to clear — a no-op, not an error.
    pub fn reset(&mut self) -> bool {
        if self.curator_decision.is_none() {
            return false;
        }
        self.curator_decision = None;
        self.category = None;
        self.recompute();
        true
    }

    /// True when the pipeline excluded this item and a curator pulled it in.
    pub fn curator_added(&self) -> bool {
        self.pipeline_decision.effective() == EffectiveState::Excluded
            && self.curator_decision == Some(CuratorDecision::Included)
    }

    /// True when the pipeline included this item and a curator dropped it.
    pub fn curator_removed(&self) -> bool {
        self.pipeline_decision == PipelineDecision::Included
            && self.curator_decision == Some(CuratorDecision::Excluded)
    }
}

/// Aggregate counts over every candidate in one report. Always recomputed
/// from the full candidate set after a mutation, never incrementally patched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ReportContentState {
    pub total: usize,
    pub pipeline_included: usize,
    pub curator_added: usize,
    pub curator_removed: usize,
    pub duplicates: usize,
    pub effective_included: usize,
}

impl ReportContentState {
    pub fn recompute(items: &[CandidateItem]) -> Self {
        Self {
            total: items.len(),
            pipeline_included: items
                .iter()
                .filter(|i| i.pipeline_decision == PipelineDecision::Included)
                .count(),
            curator_added: items.iter().filter(|i| i.curator_added()).count(),
            curator_removed: items.iter().filter(|i| i.curator_removed()).count(),
            duplicates: items
                .iter()
                .filter(|i| matches!(i.pipeline_decision, PipelineDecision::Duplicate { .. }))
                .count(),
            effective_included: items
                .iter()
                .filter(|i| i.effective_state == EffectiveState::Included)
                .count(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurationError {
    #[error("candidate item {item_id} not found in report {report_id}")]
    ItemNotFound { report_id: Uuid, item_id: Uuid },
}

/// Outcome of a reset: whether anything was cleared, plus the item as stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResetOutcome {
    pub reset: bool,
    pub item: CandidateItem,
}

/// All candidates for one generated report, addressed by item id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportCuration {
    pub report_id: Uuid,
    pub items: Vec<CandidateItem>,
}

impl ReportCuration {
    pub fn new(report_id: Uuid, items: Vec<CandidateItem>) -> Self {
        Self { report_id, items }
    }

    pub fn content_state(&self) -> ReportContentState {
        ReportContentState::recompute(&self.items)
    }

    fn item_mut(&mut self, item_id: Uuid) -> Result<&mut CandidateItem, CurationError> {
        let report_id = self.report_id;
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(CurationError::ItemNotFound { report_id, item_id })
    }

    pub fn include(
        &mut self,
        item_id: Uuid,
        category: Option<String>,
    ) -> Result<CandidateItem, CurationError> {
        let item = self.item_mut(item_id)?;
        item.include(category);
        Ok(item.clone())
    }

    pub fn exclude(&mut self, item_id: Uuid) -> Result<CandidateItem, CurationError> {
        let item = self.item_mut(item_id)?;
        item.exclude();
        Ok(item.clone())
    }

    pub fn reset(&mut self, item_id: Uuid) -> Result<ResetOutcome, CurationError> {
        let item = self.item_mut(item_id)?;
        let reset = item.reset();
        Ok(ResetOutcome {
            reset,
            item: item.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{
        CandidateItem, CuratorDecision, EffectiveState, PipelineDecision, ReportContentState,
        ReportCuration,
    };

    fn item(pipeline_decision: PipelineDecision) -> CandidateItem {
        CandidateItem::new(
            Uuid::now_v7(),
            "CAR-T therapy shows durable remission",
            None,
            pipeline_decision,
            0.32,
            "low relevance score",
        )
    }

    #[test]
    fn pipeline_decision_alone_drives_effective_state() {
        assert_eq!(
            item(PipelineDecision::Included).effective_state,
            EffectiveState::Included
        );
        assert_eq!(
            item(PipelineDecision::Excluded).effective_state,
            EffectiveState::Excluded
        );
        // Duplicates always resolve to excluded.
        assert_eq!(
            item(PipelineDecision::Duplicate { of: Uuid::now_v7() }).effective_state,
            EffectiveState::Excluded
        );
    }

    #[test]
    fn include_on_pipeline_excluded_sets_curator_override() {
        let mut a = item(PipelineDecision::Excluded);
        a.include(Some("immunotherapy".to_string()));

        assert_eq!(a.curator_decision, Some(CuratorDecision::Included));
        assert_eq!(a.effective_state, EffectiveState::Included);
        assert_eq!(a.category.as_deref(), Some("immunotherapy"));
        assert!(a.curator_added());
    }

    #[test]
    fn exclude_then_include_round_trips_to_no_override() {
        let mut a = item(PipelineDecision::Included);
        a.exclude();
        assert_eq!(a.curator_decision, Some(CuratorDecision::Excluded));
        assert!(a.curator_removed());

        // Include would restore the pipeline's original decision, so it must
        // clear the override instead of storing a redundant one.
        a.include(None);
        assert_eq!(a.curator_decision, None);
        assert_eq!(a.effective_state, EffectiveState::Included);
    }

    #[test]
    fn exclude_on_curator_included_item_clears_the_override() {
        // Pipeline excluded, curator pulled it in, curator drops it again:
        // excluding matches the pipeline's original decision, so the stored
        // override is cleared rather than flipped to excluded.
        let mut a = item(PipelineDecision::Excluded);
        a.include(None);
        a.exclude();

        assert_eq!(a.curator_decision, None);
        assert_eq!(a.effective_state, EffectiveState::Excluded);
    }

    #[test]
    fn curator_decision_never_matches_what_pipeline_would_produce() {
        for pipeline in [
            PipelineDecision::Included,
            PipelineDecision::Excluded,
            PipelineDecision::Duplicate { of: Uuid::now_v7() },
        ] {
            let mut a = item(pipeline.clone());
            a.include(None);
            if let Some(decision) = a.curator_decision {
                assert_ne!(decision.effective(), pipeline.effective());
            }
            let mut b = item(pipeline.clone());
            b.exclude();
            if let Some(decision) = b.curator_decision {
                assert_ne!(decision.effective(), pipeline.effective());
            }
        }
    }

    #[test]
    fn reset_restores_pipeline_decision_exactly() {
        let mut a = item(PipelineDecision::Duplicate { of: Uuid::now_v7() });
        a.include(Some("oncology".to_string()));
        assert_eq!(a.effective_state, EffectiveState::Included);

        assert!(a.reset());
        assert_eq!(a.curator_decision, None);
        assert_eq!(a.category, None);
        assert_eq!(a.effective_state, EffectiveState::Excluded);
    }

    #[test]
    fn reset_on_clean_item_signals_noop_without_side_effects() {
        let mut a = item(PipelineDecision::Included);
        let before = a.effective_state;

        assert!(!a.reset());
        assert_eq!(a.curator_decision, None);
        assert_eq!(a.effective_state, before);
    }

    #[test]
    fn include_on_duplicate_keeps_duplicate_provenance() {
        let original = Uuid::now_v7();
        let mut a = item(PipelineDecision::Duplicate { of: original });
        a.include(None);

        assert_eq!(a.effective_state, EffectiveState::Included);
        assert_eq!(a.pipeline_decision, PipelineDecision::Duplicate { of: original });
    }

    #[test]
    fn content_state_counts_satisfy_added_removed_formulas() {
        let mut report = ReportCuration::new(
            Uuid::now_v7(),
            vec![
                item(PipelineDecision::Included),
                item(PipelineDecision::Included),
                item(PipelineDecision::Excluded),
                item(PipelineDecision::Duplicate { of: Uuid::now_v7() }),
            ],
        );

        let excluded_id = report.items[2].id;
        let duplicate_id = report.items[3].id;
        let included_id = report.items[0].id;

        report.include(excluded_id, None).unwrap();
        report.include(duplicate_id, None).unwrap();
        report.exclude(included_id).unwrap();

        let state = report.content_state();
        assert_eq!(state.total, 4);
        assert_eq!(state.pipeline_included, 2);
        assert_eq!(state.curator_added, 2);
        assert_eq!(state.curator_removed, 1);
        assert_eq!(state.duplicates, 1);
        // 1 pipeline-included survivor + 2 curator-added.
        assert_eq!(state.effective_included, 3);
    }

    #[test]
    fn content_state_is_recomputed_after_reset() {
        let mut report = ReportCuration::new(
            Uuid::now_v7(),
            vec![item(PipelineDecision::Excluded)],
        );
        let id = report.items[0].id;

        report.include(id, None).unwrap();
        assert_eq!(report.content_state().curator_added, 1);

        let outcome = report.reset(id).unwrap();
        assert!(outcome.reset);
        assert_eq!(report.content_state().curator_added, 0);
        assert_eq!(report.content_state().effective_included, 0);
    }

    #[test]
    fn report_reset_on_clean_item_returns_false_flag() {
        let mut report = ReportCuration::new(
            Uuid::now_v7(),
            vec![item(PipelineDecision::Included)],
        );
        let id = report.items[0].id;

        let outcome = report.reset(id).unwrap();
        assert!(!outcome.reset);
        assert_eq!(outcome.item.effective_state, EffectiveState::Included);
    }

    #[test]
    fn unknown_item_id_is_an_error() {
        let mut report = ReportCuration::new(Uuid::now_v7(), vec![]);
        assert!(report.include(Uuid::now_v7(), None).is_err());
    }

    #[test]
    fn recompute_matches_manual_count_over_random_edit_sequence() {
        let mut report = ReportCuration::new(
            Uuid::now_v7(),
            vec![
                item(PipelineDecision::Included),
                item(PipelineDecision::Excluded),
                item(PipelineDecision::Included),
            ],
        );
        let ids: Vec<_> = report.items.iter().map(|i| i.id).collect();

        report.exclude(ids[0]).unwrap();
        report.include(ids[1], None).unwrap();
        report.exclude(ids[1]).unwrap(); // clears the override it just set
        report.reset(ids[0]).unwrap();
        report.exclude(ids[2]).unwrap();

        let state = report.content_state();
        let manual = ReportContentState::recompute(&report.items);
        assert_eq!(state, manual);
        assert_eq!(state.curator_added, 0);
        assert_eq!(state.curator_removed, 1);
        assert_eq!(state.effective_included, 1);
    }
}
