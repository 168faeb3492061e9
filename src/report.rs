use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

lazy_static! {
    static ref MD_SUFFIX: Regex = Regex::new(r"(?i)\.md$").unwrap();
}

/// How long a successful export stays visible before the status resets and
/// the close callback fires
pub const SUCCESS_CLOSE_DELAY: Duration = Duration::from_millis(1500);

/// Status of the report export flow, surfaced as UI text
///
/// Transitions are strictly linear:
/// `Idle -> Exporting -> (Succeeded | Failed) -> Idle`. Success reverts to
/// `Idle` automatically after [`SUCCESS_CLOSE_DELAY`]; failure stays until the
/// user dismisses or retries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum ExportStatus {
    Idle,
    Exporting,
    Succeeded,
    Failed(String),
}

/// One export action: which document to push for which agent
///
/// Transient value, alive for the duration of a single export; never
/// persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportJob {
    /// Opaque tenant/dataset key for the backend
    pub scope_id: String,

    /// Agent selected in the export dialog
    pub agent_id: String,

    /// On-screen document name; normalized before the backend call
    pub file_name: String,
}

/// Seam to the export-population collaborator
///
/// The production implementation is [`crate::backend::BackendClient`]; tests
/// substitute a mock to drive the status machine deterministically.
pub trait ExportBackend: Send + Sync {
    fn populate_export(
        &self,
        scope_id: &str,
        agent_id: &str,
        file_name: &str,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

/// Normalize a document file name for the export backend
///
/// The backend only accepts PDF artifacts for this flow, so a markdown
/// extension is rewritten to `.pdf` (case-insensitive match on the suffix);
/// any other name passes through unchanged.
///
/// # Arguments
/// * `file_name` - The on-screen document name
///
/// # Returns
/// * `String` - The name to hand to the backend
pub fn normalize_file_name(file_name: &str) -> String {
    MD_SUFFIX.replace(file_name, ".pdf").into_owned()
}

/// Driver for the remote report export flow
///
/// Owns the export status and serializes the flow: a new export is refused
/// while one is in flight, and completions that arrive after [`cancel`] are
/// dropped via a generation counter so a dismissed dialog never sees a stale
/// status update or close callback.
///
/// [`cancel`]: ReportExporter::cancel
pub struct ReportExporter {
    status: Mutex<ExportStatus>,
    generation: AtomicU64,
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportExporter {
    pub fn new() -> Self {
        ReportExporter {
            status: Mutex::new(ExportStatus::Idle),
            generation: AtomicU64::new(0),
        }
    }

    /// Current status of the flow
    pub fn status(&self) -> ExportStatus {
        self.status.lock().unwrap().clone()
    }

    /// Run one export action against the population backend
    ///
    /// Sets `Exporting`, awaits exactly one `populate_export` call with the
    /// normalized file name, then:
    /// * on success sets `Succeeded` and schedules the reset to `Idle` plus
    ///   the close callback after [`SUCCESS_CLOSE_DELAY`];
    /// * on failure sets `Failed("Failed to export data: <message>")` and
    ///   leaves it there, the close callback never fires.
    ///
    /// # Arguments
    /// * `backend` - Collaborator performing the actual population
    /// * `job` - Scope, agent, and file name for this action
    /// * `on_close` - Invoked once when a successful export auto-dismisses
    ///
    /// # Returns
    /// * `Ok(ExportStatus)` - Final status of this action
    /// * `Err(String)` - An export was already in flight; nothing was done
    pub async fn export_report<B: ExportBackend>(
        self: Arc<Self>,
        backend: &B,
        job: ExportJob,
        on_close: impl FnOnce() + Send + 'static,
    ) -> Result<ExportStatus, String> {
        // The generation must be read while the status lock is held: a
        // cancel landing between "set Exporting" and the read would let this
        // export pass the staleness check and close a dismissed dialog
        let generation = {
            let mut status = self.status.lock().unwrap();
            if *status == ExportStatus::Exporting {
                return Err("An export is already in progress".to_string());
            }
            *status = ExportStatus::Exporting;
            self.generation.load(Ordering::SeqCst)
        };
        let file_name = normalize_file_name(&job.file_name);

        match backend
            .populate_export(&job.scope_id, &job.agent_id, &file_name)
            .await
        {
            Ok(()) => {
                log::info!(
                    "export for agent '{}' of '{}' succeeded",
                    job.agent_id,
                    file_name
                );
                self.apply_if_current(generation, ExportStatus::Succeeded);

                let exporter = Arc::clone(&self);
                tokio::spawn(async move {
                    tokio::time::sleep(SUCCESS_CLOSE_DELAY).await;
                    if exporter.apply_if_current(generation, ExportStatus::Idle) {
                        on_close();
                    }
                });

                Ok(ExportStatus::Succeeded)
            }
            Err(e) => {
                log::warn!("export for agent '{}' failed: {}", job.agent_id, e);
                let failed = ExportStatus::Failed(format!("Failed to export data: {}", e));
                self.apply_if_current(generation, failed.clone());
                Ok(failed)
            }
        }
    }

    /// Dismiss the flow: back to `Idle`, stale completions become no-ops
    ///
    /// The bump happens under the status lock so it is ordered against every
    /// export's generation read.
    pub fn cancel(&self) {
        let mut status = self.status.lock().unwrap();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *status = ExportStatus::Idle;
    }

    /// Apply a status update unless the flow was cancelled in the meantime
    fn apply_if_current(&self, generation: u64, status: ExportStatus) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *self.status.lock().unwrap() = status;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{advance, sleep};

    #[test]
    fn markdown_suffix_is_rewritten_to_pdf() {
        assert_eq!(normalize_file_name("report.md"), "report.pdf");
        assert_eq!(normalize_file_name("report.MD"), "report.pdf");
        assert_eq!(normalize_file_name("report.Md"), "report.pdf");
    }

    #[test]
    fn other_names_pass_through() {
        assert_eq!(normalize_file_name("report.txt"), "report.txt");
        assert_eq!(normalize_file_name("report"), "report");
        assert_eq!(normalize_file_name("markdown.md.txt"), "markdown.md.txt");
    }

    struct MockBackend {
        outcome: Result<(), String>,
        delay: Duration,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl MockBackend {
        fn ok() -> Self {
            Self::with_outcome(Ok(()))
        }

        fn with_outcome(outcome: Result<(), String>) -> Self {
            MockBackend {
                outcome,
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ExportBackend for MockBackend {
        fn populate_export(
            &self,
            scope_id: &str,
            agent_id: &str,
            file_name: &str,
        ) -> impl Future<Output = Result<(), String>> + Send {
            self.seen.lock().unwrap().push((
                scope_id.to_string(),
                agent_id.to_string(),
                file_name.to_string(),
            ));
            let outcome = self.outcome.clone();
            let delay = self.delay;
            async move {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                outcome
            }
        }
    }

    fn job() -> ExportJob {
        ExportJob {
            scope_id: "001".to_string(),
            agent_id: "agentX".to_string(),
            file_name: "doc.md".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_runs_exporting_succeeded_idle_and_closes_once() {
        let exporter = Arc::new(ReportExporter::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let closes_seen = Arc::clone(&closes);

        let status = Arc::clone(&exporter)
            .export_report(&MockBackend::ok(), job(), move || {
                closes_seen.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        assert_eq!(status, ExportStatus::Succeeded);
        assert_eq!(exporter.status(), ExportStatus::Succeeded);

        // Poll the spawned reset task once before advancing the paused
        // clock so its sleep registers a deadline measured from now
        tokio::task::yield_now().await;

        // Just before the delay elapses nothing has reset yet
        advance(Duration::from_millis(1499)).await;
        assert_eq!(exporter.status(), ExportStatus::Succeeded);
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        advance(Duration::from_millis(2)).await;
        // Park once so the timer driver delivers the now-due reset before
        // the observation
        tokio::task::yield_now().await;
        assert_eq!(exporter.status(), ExportStatus::Idle);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_receives_normalized_file_name() {
        let exporter = Arc::new(ReportExporter::new());
        let backend = MockBackend::ok();

        Arc::clone(&exporter)
            .export_report(&backend, job(), || {})
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            (
                "001".to_string(),
                "agentX".to_string(),
                "doc.pdf".to_string()
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_failed_status_and_never_closes() {
        let exporter = Arc::new(ReportExporter::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let closes_seen = Arc::clone(&closes);

        let backend = MockBackend::with_outcome(Err("timeout".to_string()));
        let status = Arc::clone(&exporter)
            .export_report(&backend, job(), move || {
                closes_seen.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        let expected = ExportStatus::Failed("Failed to export data: timeout".to_string());
        assert_eq!(status, expected);
        assert_eq!(exporter.status(), expected);

        advance(Duration::from_secs(10)).await;
        assert_eq!(exporter.status(), expected);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_trigger_while_exporting_is_rejected() {
        let exporter = Arc::new(ReportExporter::new());
        let mut backend = MockBackend::ok();
        backend.delay = Duration::from_millis(100);
        let backend = Arc::new(backend);

        let runner = Arc::clone(&exporter);
        let runner_backend = Arc::clone(&backend);
        let first = tokio::spawn(async move {
            runner.export_report(runner_backend.as_ref(), job(), || {}).await
        });

        // Let the first export reach its awaited backend call
        tokio::task::yield_now().await;
        assert_eq!(exporter.status(), ExportStatus::Exporting);

        let second = Arc::clone(&exporter)
            .export_report(backend.as_ref(), job(), || {})
            .await;
        assert!(second.is_err());
        assert_eq!(backend.seen.lock().unwrap().len(), 1);

        advance(Duration::from_millis(101)).await;
        assert_eq!(first.await.unwrap().unwrap(), ExportStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_flight_drops_the_completion() {
        let exporter = Arc::new(ReportExporter::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let closes_seen = Arc::clone(&closes);

        let mut backend = MockBackend::ok();
        backend.delay = Duration::from_millis(100);
        let backend = Arc::new(backend);

        let runner = Arc::clone(&exporter);
        let runner_backend = Arc::clone(&backend);
        let flight = tokio::spawn(async move {
            runner
                .export_report(runner_backend.as_ref(), job(), move || {
                    closes_seen.fetch_add(1, Ordering::SeqCst);
                })
                .await
        });

        // Dismiss the dialog while the backend call is still pending
        tokio::task::yield_now().await;
        assert_eq!(exporter.status(), ExportStatus::Exporting);
        exporter.cancel();
        assert_eq!(exporter.status(), ExportStatus::Idle);

        // The completion lands after the cancel; it must not resurface a
        // status or fire the close callback for the dismissed dialog
        advance(Duration::from_millis(101)).await;
        assert_eq!(flight.await.unwrap().unwrap(), ExportStatus::Succeeded);
        assert_eq!(exporter.status(), ExportStatus::Idle);

        advance(Duration::from_secs(5)).await;
        assert_eq!(exporter.status(), ExportStatus::Idle);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_pending_reset_and_close() {
        let exporter = Arc::new(ReportExporter::new());
        let closes = Arc::new(AtomicUsize::new(0));
        let closes_seen = Arc::clone(&closes);

        Arc::clone(&exporter)
            .export_report(&MockBackend::ok(), job(), move || {
                closes_seen.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        assert_eq!(exporter.status(), ExportStatus::Succeeded);

        exporter.cancel();
        assert_eq!(exporter.status(), ExportStatus::Idle);

        advance(Duration::from_secs(5)).await;
        assert_eq!(exporter.status(), ExportStatus::Idle);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }
}
