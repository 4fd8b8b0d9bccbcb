use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecoveryError, Result};
use crate::learner::RecoveryLearner;
use crate::model::{AntiPattern, StrategyStats};

/// Schema version for persisted learner state (spec.md §6, "Persisted
/// state — learner"). `restore` rejects any other value.
pub const LEARNER_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerStateV1 {
    pub version: u32,
    pub stats: HashMap<String, StrategyStats>,
    pub anti_patterns: Vec<AntiPattern>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serialize a learner's state to the versioned JSON envelope (spec.md
/// §4.F, "Serialize/restore").
pub fn serialize(learner: &RecoveryLearner, now: DateTime<Utc>) -> LearnerStateV1 {
    LearnerStateV1 {
        version: LEARNER_STATE_VERSION,
        stats: learner.stats_snapshot(),
        anti_patterns: learner.anti_patterns(),
        created_at: learner.created_at(),
        updated_at: now,
    }
}

/// Restore a learner from a previously serialized state. Rejects unknown
/// versions; tolerates clock skew in stored timestamps (spec.md §4.F,
/// "Serialize/restore").
pub fn restore(state: LearnerStateV1) -> Result<RecoveryLearner> {
    if state.version != LEARNER_STATE_VERSION {
        tracing::warn!(
            found = state.version,
            expected = LEARNER_STATE_VERSION,
            "refusing to restore learner state from an unsupported schema version"
        );
        return Err(RecoveryError::UnsupportedVersion(state.version));
    }
    let learner = RecoveryLearner::new(state.created_at);
    learner.restore_stats(state.stats);
    Ok(learner)
}

/// Persist a learner's state to `path` via temp-file-then-rename so a
/// concurrent reader never observes a partially written file (spec.md §5,
/// "Resource bounds": "atomic replace semantics").
pub fn save_to_file(learner: &RecoveryLearner, path: &Path, now: DateTime<Utc>) -> Result<()> {
    let state = serialize(learner, now);
    let json = serde_json::to_vec_pretty(&state)?;

    let tmp_path = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| RecoveryError::Write {
            path: path.display().to_string(),
            source,
        })?;
    }

    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|source| RecoveryError::Write {
                path: tmp_path.display().to_string(),
                source,
            })?;
        file.write_all(&json).map_err(|source| RecoveryError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
        file.sync_all().map_err(|source| RecoveryError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|source| RecoveryError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<RecoveryLearner> {
    let bytes = fs::read(path).map_err(|source| {
        tracing::warn!(path = %path.display(), error = %source, "failed to read learner state file");
        RecoveryError::Read {
            path: path.display().to_string(),
            source,
        }
    })?;
    let state: LearnerStateV1 = serde_json::from_slice(&bytes).map_err(|source| {
        tracing::warn!(path = %path.display(), error = %source, "learner state file failed to parse");
        RecoveryError::Parse(source)
    })?;
    restore(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learner::Outcome;

    #[test]
    fn round_trip_preserves_summary_and_anti_patterns() {
        let learner = RecoveryLearner::new(Utc::now());
        for (success, delta) in [(true, 1.0), (true, 1.0), (false, -1.0)] {
            learner.record_outcome(Outcome {
                strategy: "retry".into(),
                degradation_type: "timeout".into(),
                success,
                fitness_delta: delta,
                timestamp: None,
            });
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".librarian/recovery_learner_state.json");
        save_to_file(&learner, &path, Utc::now()).unwrap();

        let restored = load_from_file(&path).unwrap();
        assert_eq!(restored.stats_snapshot(), learner.stats_snapshot());
        assert_eq!(restored.anti_patterns(), learner.anti_patterns());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let state = LearnerStateV1 {
            version: 2,
            stats: HashMap::new(),
            anti_patterns: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(restore(state), Err(RecoveryError::UnsupportedVersion(2))));
    }
}
