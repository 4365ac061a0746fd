use crate::events::{
    BuildEvents, BuildFailed, BuildFinished, BuildStarted, DiagnosticsUpdated, StatusChanged,
};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use texpilot_log::Diagnostic;

/// Lifecycle state of one file's build.
///
/// `idle -> building -> success | error -> building -> ...`; `reset` returns
/// any state to `idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    #[default]
    Idle,
    Building,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildRecord {
    pub status: BuildState,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    /// Description of the last failure.
    pub error: Option<String>,
}

/// Snapshot of a single file's build state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub status: BuildState,
    pub file: PathBuf,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    pub error: Option<String>,
}

impl FileStatus {
    fn new(file: &Path, record: &BuildRecord) -> Self {
        Self {
            status: record.status,
            file: file.to_path_buf(),
            start_time: record.start_time,
            end_time: record.end_time,
            error: record.error.clone(),
        }
    }
}

/// Snapshot of every tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    /// `building` while any file builds, `idle` otherwise.
    pub status: BuildState,
    pub building_count: usize,
    pub files: Vec<FileStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatusReport {
    File(FileStatus),
    All(RegistryStatus),
}

/// Authoritative record of which files are building and how their last build ended.
///
/// All mutation goes through the named operations below; each one updates
/// the record in place and publishes the matching events. The registry
/// never rejects a transition. Callers decide policy, for example by
/// checking [`is_building`](Self::is_building) before
/// [`start_build`](Self::start_build).
///
/// Transitions of different files are independent; the events of one file
/// are published in the order its operations are called.
#[derive(Default)]
pub struct BuildRegistry {
    records: BTreeMap<PathBuf, BuildRecord>,
    diagnostics: HashMap<PathBuf, Vec<Diagnostic>>,
    events: BuildEvents,
}

impl BuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_build(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let record = self.records.entry(path.to_path_buf()).or_default();
        record.status = BuildState::Building;
        record.start_time = Some(SystemTime::now());
        record.end_time = None;
        record.error = None;
        log::info!("build started: {}", path.display());

        self.events.started.publish(BuildStarted {
            file: path.to_path_buf(),
        });
        self.publish_status(BuildState::Building, Some(path), None);
    }

    /// Marks the build of `path` as successful.
    ///
    /// When `elapsed` is not given it is measured from the recorded start.
    pub fn finish_build(
        &mut self,
        path: impl AsRef<Path>,
        output: impl Into<String>,
        elapsed: Option<Duration>,
    ) {
        let path = path.as_ref();
        let now = SystemTime::now();
        let record = self.records.entry(path.to_path_buf()).or_default();
        record.status = BuildState::Success;
        record.end_time = Some(now);
        record.error = None;
        let elapsed = elapsed.or_else(|| {
            record
                .start_time
                .and_then(|start| now.duration_since(start).ok())
        });
        log::info!("build finished: {} ({:?})", path.display(), elapsed);

        self.events.finished.publish(BuildFinished {
            file: path.to_path_buf(),
            output: output.into(),
            elapsed,
        });
        self.publish_status(BuildState::Success, Some(path), None);
    }

    pub fn fail_build(
        &mut self,
        path: impl AsRef<Path>,
        error: impl Into<String>,
        output: impl Into<String>,
    ) {
        let path = path.as_ref();
        let error = error.into();
        let record = self.records.entry(path.to_path_buf()).or_default();
        record.status = BuildState::Error;
        record.end_time = Some(SystemTime::now());
        record.error = Some(error.clone());
        log::warn!("build failed: {}: {}", path.display(), error);

        self.events.failed.publish(BuildFailed {
            file: path.to_path_buf(),
            error: error.clone(),
            output: output.into(),
        });
        self.publish_status(BuildState::Error, Some(path), Some(error));
    }

    /// Forgets `path`, or every file when `path` is `None`.
    pub fn reset(&mut self, path: Option<&Path>) {
        match path {
            Some(path) => {
                self.records.remove(path);
                self.diagnostics.remove(path);
                log::debug!("build state reset: {}", path.display());
            }
            None => {
                self.records.clear();
                self.diagnostics.clear();
                log::debug!("build state reset for all files");
            }
        }
        self.publish_status(BuildState::Idle, path, None);
    }

    /// Replaces the diagnostics of `path` and notifies subscribers.
    pub fn update_diagnostics(&mut self, path: impl AsRef<Path>, diagnostics: Vec<Diagnostic>) {
        let path = path.as_ref();
        log::debug!("{} diagnostics for {}", diagnostics.len(), path.display());
        self.diagnostics
            .insert(path.to_path_buf(), diagnostics.clone());
        self.events.diagnostics_updated.publish(DiagnosticsUpdated {
            file: path.to_path_buf(),
            diagnostics,
        });
    }

    /// The diagnostics last published for `path`.
    pub fn diagnostics(&self, path: impl AsRef<Path>) -> &[Diagnostic] {
        self.diagnostics
            .get(path.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Status of `path`, or of every tracked file when `path` is `None`.
    pub fn get_status(&self, path: Option<&Path>) -> StatusReport {
        match path {
            Some(path) => StatusReport::File(self.file_status(path)),
            None => StatusReport::All(self.aggregate_status()),
        }
    }

    /// Status of `path`; files never built report `idle`.
    pub fn file_status(&self, path: impl AsRef<Path>) -> FileStatus {
        let path = path.as_ref();
        match self.records.get(path) {
            Some(record) => FileStatus::new(path, record),
            None => FileStatus::new(path, &BuildRecord::default()),
        }
    }

    pub fn aggregate_status(&self) -> RegistryStatus {
        let building_count = self.building_count();
        RegistryStatus {
            status: if building_count > 0 {
                BuildState::Building
            } else {
                BuildState::Idle
            },
            building_count,
            files: self
                .records
                .iter()
                .map(|(path, record)| FileStatus::new(path, record))
                .collect(),
        }
    }

    pub fn is_building(&self, path: impl AsRef<Path>) -> bool {
        self.records
            .get(path.as_ref())
            .is_some_and(|record| record.status == BuildState::Building)
    }

    pub fn is_any_building(&self) -> bool {
        self.building_count() > 0
    }

    fn building_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.status == BuildState::Building)
            .count()
    }

    pub fn record(&self, path: impl AsRef<Path>) -> Option<&BuildRecord> {
        self.records.get(path.as_ref())
    }

    pub fn on_build_started(&self) -> Receiver<BuildStarted> {
        self.events.started.subscribe()
    }

    pub fn on_build_finished(&self) -> Receiver<BuildFinished> {
        self.events.finished.subscribe()
    }

    pub fn on_build_failed(&self) -> Receiver<BuildFailed> {
        self.events.failed.subscribe()
    }

    pub fn on_status_changed(&self) -> Receiver<StatusChanged> {
        self.events.status_changed.subscribe()
    }

    pub fn on_diagnostics_updated(&self) -> Receiver<DiagnosticsUpdated> {
        self.events.diagnostics_updated.subscribe()
    }

    fn publish_status(&self, status: BuildState, file: Option<&Path>, error: Option<String>) {
        self.events.status_changed.publish(StatusChanged {
            status,
            file: file.map(Path::to_path_buf),
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use texpilot_log::Severity;
    use texpilot_log::ir::{Location, Position};

    #[test]
    fn test_finish_build_reports_success() {
        let mut registry = BuildRegistry::new();
        registry.start_build("a.tex");
        assert!(registry.is_building("a.tex"));

        registry.finish_build("a.tex", "...", Some(Duration::from_millis(1500)));

        let status = registry.file_status("a.tex");
        assert_eq!(status.status, BuildState::Success);
        assert_eq!(status.file, PathBuf::from("a.tex"));
        assert!(status.start_time.is_some());
        assert!(status.end_time >= status.start_time);
        assert!(!registry.is_building("a.tex"));
    }

    #[test]
    fn test_concurrent_builds_are_aggregated() {
        let mut registry = BuildRegistry::new();
        registry.start_build("a.tex");
        registry.start_build("b.tex");

        let aggregate = registry.aggregate_status();
        assert_eq!(aggregate.status, BuildState::Building);
        assert_eq!(aggregate.building_count, 2);
        let files: Vec<_> = aggregate.files.iter().map(|f| f.file.clone()).collect();
        assert_eq!(files, vec![PathBuf::from("a.tex"), PathBuf::from("b.tex")]);

        registry.fail_build("a.tex", "boom", "");
        assert_eq!(registry.aggregate_status().building_count, 1);
        assert!(registry.is_any_building());
    }

    #[test]
    fn test_untracked_file_is_idle() {
        let registry = BuildRegistry::new();
        match registry.get_status(Some(Path::new("never.tex"))) {
            StatusReport::File(status) => {
                assert_eq!(status.status, BuildState::Idle);
                assert_eq!(status.start_time, None);
                assert_eq!(status.error, None);
            }
            other => panic!("expected file status, got {:?}", other),
        }
        match registry.get_status(None) {
            StatusReport::All(all) => {
                assert_eq!(all.status, BuildState::Idle);
                assert!(all.files.is_empty());
            }
            other => panic!("expected aggregate status, got {:?}", other),
        }
    }

    #[test]
    fn test_fail_build_stores_error() {
        let mut registry = BuildRegistry::new();
        registry.start_build("a.tex");
        registry.fail_build("a.tex", "Compilation failed with exit code 12", "stdout");
        let record = registry.record("a.tex").unwrap();
        assert_eq!(record.status, BuildState::Error);
        assert_eq!(record.error.as_deref(), Some("Compilation failed with exit code 12"));

        // A new start clears the previous outcome.
        registry.start_build("a.tex");
        let record = registry.record("a.tex").unwrap();
        assert_eq!(record.error, None);
        assert_eq!(record.end_time, None);
    }

    #[test]
    fn test_reset_single_file_and_all() {
        let mut registry = BuildRegistry::new();
        let status = registry.on_status_changed();
        registry.start_build("a.tex");
        registry.start_build("b.tex");

        registry.reset(Some(Path::new("a.tex")));
        assert!(registry.record("a.tex").is_none());
        assert!(registry.is_building("b.tex"));

        registry.reset(None);
        assert!(!registry.is_any_building());

        let events: Vec<_> = status.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[2],
            StatusChanged {
                status: BuildState::Idle,
                file: Some(PathBuf::from("a.tex")),
                error: None,
            }
        );
        assert_eq!(
            events[3],
            StatusChanged {
                status: BuildState::Idle,
                file: None,
                error: None,
            }
        );
    }

    #[test]
    fn test_events_follow_call_order() {
        let mut registry = BuildRegistry::new();
        let started = registry.on_build_started();
        let finished = registry.on_build_finished();
        let failed = registry.on_build_failed();
        let status = registry.on_status_changed();

        registry.start_build("a.tex");
        registry.fail_build("a.tex", "interrupted", "");
        registry.start_build("a.tex");
        registry.finish_build("a.tex", "out", None);

        assert_eq!(started.try_iter().count(), 2);
        let finished: Vec<_> = finished.try_iter().collect();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].output, "out");
        assert!(finished[0].elapsed.is_some());
        assert_eq!(failed.try_recv().unwrap().error, "interrupted");

        let states: Vec<_> = status.try_iter().map(|e| e.status).collect();
        assert_eq!(
            states,
            vec![
                BuildState::Building,
                BuildState::Error,
                BuildState::Building,
                BuildState::Success,
            ]
        );
    }

    fn error_at(row: u32, excerpt: &str) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            excerpt: excerpt.to_string(),
            description: None,
            location: Location::new(PathBuf::from("a.tex"), Position::rows(row, row)),
            log_range: None,
        }
    }

    #[test]
    fn test_diagnostics_are_replaced_and_cleared() {
        let mut registry = BuildRegistry::new();
        let updates = registry.on_diagnostics_updated();
        registry.update_diagnostics("a.tex", vec![error_at(3, "Undefined control sequence.")]);
        let second = vec![
            error_at(7, "Missing $ inserted."),
            error_at(9, "Extra }, or forgotten $."),
        ];
        registry.update_diagnostics("a.tex", second.clone());

        assert_eq!(registry.diagnostics("a.tex"), second.as_slice());
        let published: Vec<_> = updates.try_iter().collect();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].diagnostics.len(), 1);
        assert_eq!(published[1].file, PathBuf::from("a.tex"));
        assert_eq!(published[1].diagnostics, second);

        registry.update_diagnostics("b.tex", Vec::new());
        assert_eq!(registry.diagnostics("a.tex").len(), 2);

        registry.reset(None);
        assert!(registry.diagnostics("a.tex").is_empty());
    }
}
