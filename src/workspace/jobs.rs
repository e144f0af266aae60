//! Background jobs
//!
//! Each job owns one skeleton tab. Tasks never touch the tab manager: they
//! report a [`JobEvent`] over a channel and [`apply_job_event`] mutates the
//! tabs by id, so completions can arrive in any order.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{TabId, TabManager, TabRoute, TabUpdate};
use crate::api::{ContentApi, QuizGenerationRequest};
use crate::config::QuizDefaults;
use crate::models::{Difficulty, FileContent, GeneratedQuiz, QuestionType, Question, QuizMeta, UploadedFile};
use crate::quiz::markdown::quiz_to_markdown;
use crate::util::format_duration;
use crate::workspace::PendingFile;
use crate::{Result, StudyError, GENERAL_FOLDER, UPLOADED_FOLDER};

const CHANNEL_CAPACITY: usize = 100;

/// What a finished job produced
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// Upload and summarization of one file; may still carry a per-file error
    Summarized(UploadedFile),
    /// Quiz generated from an open document
    QuizGenerated {
        base_title: String,
        subject: String,
        difficulty: Difficulty,
        quiz: GeneratedQuiz,
    },
}

/// Completion report for the job owning `tab_id`
#[derive(Debug)]
pub struct JobEvent {
    pub tab_id: TabId,
    /// File name or quiz title, for status messages
    pub label: String,
    pub outcome: Result<JobOutcome>,
}

/// How an event changed the workspace
#[derive(Debug)]
pub enum JobResolution {
    /// Skeleton now shows the finished content and is active
    Completed(TabId),
    /// Skeleton now shows a generated quiz, ready to run
    QuizReady {
        tab_id: TabId,
        meta: QuizMeta,
        questions: Vec<Question>,
    },
    /// Another tab already showed this content; it was activated instead
    AlreadyOpen(TabId),
    /// The job failed and its skeleton was closed
    Failed(StudyError),
    /// The skeleton was closed before the job finished
    Orphaned,
}

/// Options for a quiz generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizGenerationParams {
    pub quiz_type: QuestionType,
    pub subject: String,
    pub question_count: usize,
    pub difficulty: Difficulty,
    pub user_prompt: Option<String>,
}

impl QuizGenerationParams {
    pub fn from_defaults(defaults: &QuizDefaults, subject: impl Into<String>) -> Self {
        Self {
            quiz_type: QuestionType::MultipleChoice,
            subject: subject.into(),
            question_count: defaults.question_count,
            difficulty: defaults.difficulty,
            user_prompt: None,
        }
    }

    pub fn with_type(mut self, quiz_type: QuestionType) -> Self {
        self.quiz_type = quiz_type;
        self
    }
}

/// Spawns collaborator calls and collects their completions
pub struct JobRunner {
    api: Arc<dyn ContentApi>,
    timeout: Duration,
    tx: mpsc::Sender<JobEvent>,
    rx: mpsc::Receiver<JobEvent>,
    pending: usize,
}

impl JobRunner {
    pub fn new(api: Arc<dyn ContentApi>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            api,
            timeout,
            tx,
            rx,
            pending: 0,
        }
    }

    pub fn api(&self) -> Arc<dyn ContentApi> {
        Arc::clone(&self.api)
    }

    /// Jobs spawned whose events have not been received yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Open a skeleton tab per file and upload each file on its own task.
    ///
    /// Returns the skeleton tab ids in input order.
    pub fn submit_uploads(
        &mut self,
        tabs: &mut TabManager,
        files: Vec<PendingFile>,
        prompt: Option<String>,
    ) -> Result<Vec<TabId>> {
        if files.is_empty() {
            return Err(StudyError::Validation(
                "Select at least one file to upload.".to_string(),
            ));
        }

        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let skeleton = FileContent {
                title: format!("{} (processing…)", file.name),
                summary: Some(format!("Summarizing {}…", file.name)),
                size: Some(file.size),
                mime_type: file.mime_type.clone(),
                ..FileContent::default()
            };
            let tab_id = tabs.open_skeleton_tab(UPLOADED_FOLDER, skeleton);
            ids.push(tab_id);

            let api = Arc::clone(&self.api);
            let prompt = prompt.clone();
            let label = file.name.clone();
            self.spawn(tab_id, label, async move {
                let response = api.upload(vec![file], prompt).await?;
                response
                    .files
                    .into_iter()
                    .next()
                    .map(JobOutcome::Summarized)
                    .ok_or_else(|| StudyError::ApiError("Upload response has no files".to_string()))
            });
        }

        info!(count = ids.len(), "upload jobs submitted");
        Ok(ids)
    }

    /// Open an active skeleton tab and generate a quiz from `source`
    pub fn submit_quiz_generation(
        &mut self,
        tabs: &mut TabManager,
        source: &FileContent,
        params: QuizGenerationParams,
    ) -> Result<TabId> {
        if source.title.to_lowercase().contains("quiz") {
            return Err(StudyError::Validation(
                "A quiz cannot be generated from another quiz.".to_string(),
            ));
        }
        let content = source
            .summary
            .as_deref()
            .or(source.transcript.as_deref())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                StudyError::Validation(format!("'{}' has no content to quiz on.", source.title))
            })?
            .to_string();

        let base_title = source.title.clone();
        let skeleton = FileContent::new(
            format!("{} quiz (generating…)", base_title),
            format!("Generating a {} quiz…", params.quiz_type),
        );
        let tab_id = tabs.open_skeleton_tab(GENERAL_FOLDER, skeleton);
        tabs.set_route(tab_id, TabRoute::Quiz)?;

        let request = QuizGenerationRequest {
            content,
            quiz_type: params.quiz_type,
            subject: params.subject.clone(),
            question_count: params.question_count,
            difficulty: params.difficulty,
            user_prompt: params.user_prompt,
            base_title: base_title.clone(),
        };
        let api = Arc::clone(&self.api);
        let label = format!("{} quiz", base_title);
        self.spawn(tab_id, label, async move {
            let quiz = api.generate_quiz(&request).await?;
            Ok(JobOutcome::QuizGenerated {
                base_title: request.base_title,
                subject: request.subject,
                difficulty: request.difficulty,
                quiz,
            })
        });

        info!(%tab_id, "quiz generation submitted");
        Ok(tab_id)
    }

    fn spawn<F>(&mut self, tab_id: TabId, label: String, job: F)
    where
        F: std::future::Future<Output = Result<JobOutcome>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let timeout = self.timeout;
        self.pending += 1;
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, job).await {
                Ok(outcome) => outcome,
                Err(_) => Err(StudyError::Timeout(format!(
                    "{} after {}",
                    label,
                    format_duration(timeout)
                ))),
            };
            debug!(%tab_id, ok = outcome.is_ok(), "job finished");
            // The runner may be gone during shutdown
            let _ = tx
                .send(JobEvent {
                    tab_id,
                    label,
                    outcome,
                })
                .await;
        });
    }

    /// Next finished job, without waiting
    pub fn try_next(&mut self) -> Option<JobEvent> {
        let event = self.rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(event)
    }

    /// Wait for the next finished job; `None` when nothing is pending
    pub async fn next(&mut self) -> Option<JobEvent> {
        if self.pending == 0 {
            return None;
        }
        let event = self.rx.recv().await?;
        self.pending -= 1;
        Some(event)
    }
}

/// Apply a finished job to the workspace
pub fn apply_job_event(tabs: &mut TabManager, event: JobEvent) -> JobResolution {
    let JobEvent {
        tab_id,
        label,
        outcome,
    } = event;

    if tabs.tab(tab_id).is_none() {
        debug!(%tab_id, %label, "skeleton closed before job finished");
        return JobResolution::Orphaned;
    }

    let outcome = outcome.and_then(|outcome| match outcome {
        JobOutcome::Summarized(file) => file.into_result().map(JobOutcome::Summarized),
        other => Ok(other),
    });

    match outcome {
        Ok(JobOutcome::Summarized(file)) => {
            let summary = file
                .summary
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| format!("# {}\n\nNo summary available.", file.name));
            finish(tabs, tab_id, TabUpdate::new(file.name.clone(), summary))
                .map(|_| JobResolution::Completed(tab_id))
                .unwrap_or_else(|resolution| resolution)
        }
        Ok(JobOutcome::QuizGenerated {
            base_title,
            subject,
            difficulty,
            quiz,
        }) => {
            let title = format!("{} quiz", base_title);
            let markdown = quiz_to_markdown(&quiz, &base_title, &subject, difficulty);
            let types = quiz
                .quiz_type
                .as_deref()
                .and_then(|t| t.parse::<QuestionType>().ok())
                .into_iter()
                .collect();
            let meta = QuizMeta::new(subject, vec![base_title], types);
            match finish(tabs, tab_id, TabUpdate::new(title, markdown)) {
                Ok(()) => JobResolution::QuizReady {
                    tab_id,
                    meta,
                    questions: quiz.into_questions(),
                },
                Err(resolution) => resolution,
            }
        }
        Err(err) => {
            warn!(%tab_id, %label, error = %err, "job failed, closing skeleton tab");
            // Presence was checked above
            let _ = tabs.close_tab(tab_id);
            JobResolution::Failed(err)
        }
    }
}

fn finish(
    tabs: &mut TabManager,
    tab_id: TabId,
    update: TabUpdate,
) -> std::result::Result<(), JobResolution> {
    match tabs.update_tab_content(tab_id, update) {
        Ok(()) => {
            let _ = tabs.set_active_tab(Some(tab_id));
            Ok(())
        }
        Err(StudyError::DuplicateTab(identifier)) => {
            let _ = tabs.close_tab(tab_id);
            let existing = tabs.find_by_identifier(&identifier).map(|t| t.id());
            match existing {
                Some(id) => {
                    info!(identifier = %identifier, "content already open, reusing tab");
                    let _ = tabs.set_active_tab(Some(id));
                    Err(JobResolution::AlreadyOpen(id))
                }
                None => Err(JobResolution::Orphaned),
            }
        }
        Err(err) => Err(JobResolution::Failed(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryContentApi;
    use crate::models::GeneratedQuestion;

    fn runner(api: Arc<InMemoryContentApi>) -> JobRunner {
        JobRunner::new(api, Duration::from_secs(5))
    }

    fn summarized(tab_id: TabId, name: &str, summary: Option<&str>) -> JobEvent {
        JobEvent {
            tab_id,
            label: name.to_string(),
            outcome: Ok(JobOutcome::Summarized(UploadedFile {
                name: name.to_string(),
                summary: summary.map(str::to_string),
                ..UploadedFile::default()
            })),
        }
    }

    fn skeleton(tabs: &mut TabManager, name: &str) -> TabId {
        tabs.open_skeleton_tab(
            UPLOADED_FOLDER,
            FileContent::new(format!("{} (processing…)", name), "…"),
        )
    }

    #[test]
    fn test_success_replaces_skeleton_and_activates() {
        let mut tabs = TabManager::new();
        let skel = skeleton(&mut tabs, "os.pdf");
        let other = tabs.open_file_tab("OS", FileContent::new("Paging", "x"));
        assert_eq!(tabs.active_tab_id(), Some(other));

        let resolution = apply_job_event(&mut tabs, summarized(skel, "os.pdf", Some("# OS")));
        assert!(matches!(resolution, JobResolution::Completed(id) if id == skel));

        let tab = tabs.tab(skel).unwrap();
        assert_eq!(tab.title, "os.pdf");
        assert_eq!(tab.content_identifier(), "uploaded/os.pdf");
        assert_eq!(tabs.active_tab_id(), Some(skel));
    }

    #[test]
    fn test_missing_summary_gets_fallback() {
        let mut tabs = TabManager::new();
        let skel = skeleton(&mut tabs, "talk.mp3");
        apply_job_event(&mut tabs, summarized(skel, "talk.mp3", None));
        assert_eq!(
            tabs.tab(skel).unwrap().file.summary.as_deref(),
            Some("# talk.mp3\n\nNo summary available.")
        );
    }

    #[test]
    fn test_per_file_error_closes_skeleton() {
        let mut tabs = TabManager::new();
        let skel = skeleton(&mut tabs, "bad.mp4");
        let event = JobEvent {
            tab_id: skel,
            label: "bad.mp4".into(),
            outcome: Ok(JobOutcome::Summarized(UploadedFile {
                name: "bad.mp4".into(),
                error: Some("unsupported codec".into()),
                ..UploadedFile::default()
            })),
        };
        let resolution = apply_job_event(&mut tabs, event);
        assert!(matches!(resolution, JobResolution::Failed(StudyError::ApiError(_))));
        assert!(tabs.is_empty());
    }

    #[test]
    fn test_collision_activates_existing_tab() {
        let mut tabs = TabManager::new();
        let existing = tabs.open_file_tab(UPLOADED_FOLDER, FileContent::new("os.pdf", "old"));
        let skel = skeleton(&mut tabs, "os.pdf");

        let resolution = apply_job_event(&mut tabs, summarized(skel, "os.pdf", Some("new")));
        assert!(matches!(resolution, JobResolution::AlreadyOpen(id) if id == existing));
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.active_tab_id(), Some(existing));
    }

    #[test]
    fn test_event_for_closed_tab_is_ignored() {
        let mut tabs = TabManager::new();
        let skel = skeleton(&mut tabs, "a.pdf");
        tabs.close_tab(skel).unwrap();
        let resolution = apply_job_event(&mut tabs, summarized(skel, "a.pdf", Some("s")));
        assert!(matches!(resolution, JobResolution::Orphaned));
        assert!(tabs.is_empty());
    }

    #[test]
    fn test_completion_order_does_not_change_final_tabs() {
        let build = |reverse: bool| {
            let mut tabs = TabManager::new();
            let a = skeleton(&mut tabs, "a.pdf");
            let b = skeleton(&mut tabs, "b.pdf");
            let mut events = vec![
                summarized(a, "a.pdf", Some("A")),
                JobEvent {
                    tab_id: b,
                    label: "b.pdf".into(),
                    outcome: Err(StudyError::NetworkError("down".into())),
                },
            ];
            if reverse {
                events.reverse();
            }
            for event in events {
                apply_job_event(&mut tabs, event);
            }
            tabs.tabs()
                .iter()
                .map(|t| (t.content_identifier(), t.file.summary.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(build(false), build(true));
        assert_eq!(build(false).len(), 1);
    }

    #[test]
    fn test_quiz_event_renders_markdown_and_questions() {
        let mut tabs = TabManager::new();
        let skel = tabs.open_file_tab(GENERAL_FOLDER, FileContent::new("Week 3 quiz (generating…)", "…"));
        let event = JobEvent {
            tab_id: skel,
            label: "Week 3 quiz".into(),
            outcome: Ok(JobOutcome::QuizGenerated {
                base_title: "Week 3".into(),
                subject: "OS".into(),
                difficulty: Difficulty::Medium,
                quiz: GeneratedQuiz {
                    quiz_type: Some("O/X".into()),
                    questions: vec![GeneratedQuestion {
                        text: "Paging uses frames".into(),
                        choices: Some(vec!["O".into(), "X".into()]),
                        answer: Some(serde_json::json!(0)),
                        ..GeneratedQuestion::default()
                    }],
                },
            }),
        };

        match apply_job_event(&mut tabs, event) {
            JobResolution::QuizReady { tab_id, meta, questions } => {
                assert_eq!(tab_id, skel);
                assert_eq!(meta.types, vec![QuestionType::TrueFalse]);
                assert_eq!(questions.len(), 1);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
        let tab = tabs.tab(skel).unwrap();
        assert_eq!(tab.title, "Week 3 quiz");
        assert!(tab.file.summary.as_deref().unwrap().contains("Paging uses frames"));
    }

    #[tokio::test]
    async fn test_submit_uploads_requires_files() {
        let mut runner = runner(Arc::new(InMemoryContentApi::new()));
        let mut tabs = TabManager::new();
        let err = runner.submit_uploads(&mut tabs, Vec::new(), None).unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
        assert!(tabs.is_empty());
        assert_eq!(runner.pending(), 0);
    }

    #[tokio::test]
    async fn test_uploads_round_trip_through_channel() {
        let api = Arc::new(InMemoryContentApi::new());
        api.set_upload_error("broken.mp4", "unsupported codec");
        let mut runner = runner(api.clone());
        let mut tabs = TabManager::new();

        let ids = runner
            .submit_uploads(
                &mut tabs,
                vec![PendingFile::new("os.pdf", 10), PendingFile::new("broken.mp4", 20)],
                None,
            )
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(tabs.tab(ids[0]).unwrap().title, "os.pdf (processing…)");
        assert_eq!(runner.pending(), 2);

        while let Some(event) = runner.next().await {
            apply_job_event(&mut tabs, event);
        }

        assert_eq!(api.upload_calls(), 2);
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.tabs()[0].content_identifier(), "uploaded/os.pdf");
        assert_eq!(tabs.active_tab_id(), Some(ids[0]));
    }

    #[tokio::test]
    async fn test_same_name_uploads_get_their_own_skeletons() {
        let mut runner = runner(Arc::new(InMemoryContentApi::new()));
        let mut tabs = TabManager::new();

        let ids = runner
            .submit_uploads(
                &mut tabs,
                vec![PendingFile::new("notes.pdf", 10), PendingFile::new("notes.pdf", 20)],
                None,
            )
            .unwrap();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs.active_tab_id(), Some(ids[1]));

        let done = apply_job_event(&mut tabs, summarized(ids[0], "notes.pdf", Some("# Notes")));
        assert!(matches!(done, JobResolution::Completed(id) if id == ids[0]));
        let failed = apply_job_event(
            &mut tabs,
            JobEvent {
                tab_id: ids[1],
                label: "notes.pdf".into(),
                outcome: Err(StudyError::NetworkError("connection reset".into())),
            },
        );
        assert!(matches!(failed, JobResolution::Failed(_)));

        assert_eq!(tabs.len(), 1);
        let tab = tabs.tab(ids[0]).unwrap();
        assert_eq!(tab.content_identifier(), "uploaded/notes.pdf");
        assert_eq!(tab.file.summary.as_deref(), Some("# Notes"));
    }

    #[tokio::test]
    async fn test_timeout_closes_skeleton() {
        let api = Arc::new(InMemoryContentApi::new());
        api.set_latency(Duration::from_millis(200));
        let mut runner = JobRunner::new(api, Duration::from_millis(20));
        let mut tabs = TabManager::new();

        runner
            .submit_uploads(&mut tabs, vec![PendingFile::new("slow.pdf", 1)], None)
            .unwrap();
        let event = runner.next().await.unwrap();
        assert!(matches!(event.outcome, Err(StudyError::Timeout(_))));
        apply_job_event(&mut tabs, event);
        assert!(tabs.is_empty());
    }

    #[tokio::test]
    async fn test_quiz_from_quiz_is_rejected() {
        let mut runner = runner(Arc::new(InMemoryContentApi::new()));
        let mut tabs = TabManager::new();
        let params = QuizGenerationParams::from_defaults(&QuizDefaults::default(), "OS");

        let err = runner
            .submit_quiz_generation(&mut tabs, &FileContent::new("Week 3 Quiz", "q"), params)
            .unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
        assert!(tabs.is_empty());
    }

    #[tokio::test]
    async fn test_quiz_generation_fills_general_tab() {
        let mut runner = runner(Arc::new(InMemoryContentApi::new()));
        let mut tabs = TabManager::new();
        let params = QuizGenerationParams::from_defaults(&QuizDefaults::default(), "OS")
            .with_type(QuestionType::MultipleChoice);

        let tab_id = runner
            .submit_quiz_generation(&mut tabs, &FileContent::new("Week 3", "paging"), params)
            .unwrap();
        assert_eq!(tabs.active_tab_id(), Some(tab_id));
        assert_eq!(tabs.tab(tab_id).unwrap().folder(), GENERAL_FOLDER);

        let event = runner.next().await.unwrap();
        match apply_job_event(&mut tabs, event) {
            JobResolution::QuizReady { questions, .. } => assert_eq!(questions.len(), 5),
            other => panic!("unexpected resolution: {:?}", other),
        }
        assert_eq!(tabs.tab(tab_id).unwrap().content_identifier(), "general/Week 3 quiz");
    }
}
