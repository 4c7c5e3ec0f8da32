use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plan_finance_core::historical::HistoricalFinancialAnalysis;
use plan_finance_core::storage::{next_version, AnalysisStore};
use plan_finance_core::{PlanFinanceError, PlanFinanceResult};

/// One pretty-printed JSON document per project under `dir`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, project_id: &str) -> PlanFinanceResult<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !project_id.starts_with('.');
        if !valid {
            return Err(PlanFinanceError::Validation {
                field: "project_id".into(),
                reason: format!(
                    "'{project_id}' is not a valid project id (letters, digits, '-', '_', '.')."
                ),
            });
        }
        Ok(self.dir.join(format!("{project_id}.json")))
    }
}

fn storage_error(path: &Path, e: io::Error) -> PlanFinanceError {
    PlanFinanceError::Storage(format!("{}: {e}", path.display()))
}

impl AnalysisStore for JsonDirStore {
    fn load(&self, project_id: &str) -> PlanFinanceResult<Option<HistoricalFinancialAnalysis>> {
        let path = self.path_for(project_id)?;
        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&path, e)),
        };
        let analysis = serde_json::from_str(&contents)?;
        Ok(Some(analysis))
    }

    fn save(
        &mut self,
        project_id: &str,
        analysis: &HistoricalFinancialAnalysis,
    ) -> PlanFinanceResult<u64> {
        let path = self.path_for(project_id)?;
        let stored = self.load(project_id)?;
        let version = next_version(project_id, stored.as_ref(), analysis)?;

        let mut to_write = analysis.clone();
        to_write.version = version;
        let json = serde_json::to_string_pretty(&to_write)?;

        fs::create_dir_all(&self.dir).map_err(|e| storage_error(&self.dir, e))?;
        // Replace via rename; readers never see a partial document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| storage_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| storage_error(&path, e))?;

        tracing::debug!(project_id, version, path = %path.display(), "analysis written");
        Ok(version)
    }
}
