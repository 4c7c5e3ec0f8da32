//! Storage collaborator seam.
//!
//! The engine never calls a store itself; the owning layer loads, edits,
//! recalculates and saves. Saves replace the whole analysis and are guarded
//! by the `version` token so two editors cannot silently overwrite each other.

use std::collections::HashMap;

use crate::historical::HistoricalFinancialAnalysis;
use crate::{PlanFinanceError, PlanFinanceResult};

pub trait AnalysisStore {
    fn load(&self, project_id: &str) -> PlanFinanceResult<Option<HistoricalFinancialAnalysis>>;

    /// Persist `analysis` for `project_id` and return the new version.
    fn save(
        &mut self,
        project_id: &str,
        analysis: &HistoricalFinancialAnalysis,
    ) -> PlanFinanceResult<u64>;
}

/// Check `submitted` against what is currently stored and return the version
/// the saved copy must carry. Shared by every store implementation.
pub fn next_version(
    project_id: &str,
    stored: Option<&HistoricalFinancialAnalysis>,
    submitted: &HistoricalFinancialAnalysis,
) -> PlanFinanceResult<u64> {
    if !submitted.project_id.is_empty() && submitted.project_id != project_id {
        return Err(PlanFinanceError::Validation {
            field: "project_id".into(),
            reason: format!(
                "Analysis belongs to project '{}', not '{project_id}'.",
                submitted.project_id
            ),
        });
    }
    let stored_version = stored.map(|a| a.version).unwrap_or(0);
    if submitted.version != stored_version {
        return Err(PlanFinanceError::VersionConflict {
            project_id: project_id.to_string(),
            stored: stored_version,
            submitted: submitted.version,
        });
    }
    Ok(stored_version + 1)
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    analyses: HashMap<String, HistoricalFinancialAnalysis>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

impl AnalysisStore for MemoryStore {
    fn load(&self, project_id: &str) -> PlanFinanceResult<Option<HistoricalFinancialAnalysis>> {
        Ok(self.analyses.get(project_id).cloned())
    }

    fn save(
        &mut self,
        project_id: &str,
        analysis: &HistoricalFinancialAnalysis,
    ) -> PlanFinanceResult<u64> {
        let version = next_version(project_id, self.analyses.get(project_id), analysis)?;
        let mut stored = analysis.clone();
        stored.version = version;
        self.analyses.insert(project_id.to_string(), stored);
        tracing::debug!(project_id, version, "analysis saved");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::historical::initialize_for_project;

    #[test]
    fn test_first_save_starts_at_version_one() {
        let mut store = MemoryStore::new();
        let a = initialize_for_project("p1", "u1", 2024).unwrap();
        assert_eq!(store.save("p1", &a).unwrap(), 1);
        assert_eq!(store.load("p1").unwrap().unwrap().version, 1);
        assert!(store.load("p2").unwrap().is_none());
    }

    #[test]
    fn test_stale_copy_rejected() {
        let mut store = MemoryStore::new();
        let a = initialize_for_project("p1", "u1", 2024).unwrap();
        store.save("p1", &a).unwrap();

        let first = store.load("p1").unwrap().unwrap();
        let second = first.clone();
        store.save("p1", &first).unwrap();

        match store.save("p1", &second).unwrap_err() {
            PlanFinanceError::VersionConflict {
                stored, submitted, ..
            } => {
                assert_eq!(stored, 2);
                assert_eq!(submitted, 1);
            }
            other => panic!("Expected VersionConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_project_rejected() {
        let mut store = MemoryStore::new();
        let a = initialize_for_project("p1", "u1", 2024).unwrap();
        assert!(matches!(
            store.save("other", &a),
            Err(PlanFinanceError::Validation { .. })
        ));
        assert!(store.is_empty());
    }
}
