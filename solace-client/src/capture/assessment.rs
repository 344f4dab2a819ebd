//! Guided voice assessment
//!
//! A fixed question list answered one at a time by voice. Each answer
//! runs the capture pipeline, submits the finished clip for
//! assessment-flow analysis, then auto-advances. One recorder exists at
//! a time, keyed by the question being answered; starting an answer
//! discards any half-finished one.
//!
//! Starting a run clears the previous run's assessment sentiment records
//! so the analysis view only ever reflects the run in progress.

use crate::capture::device::DeviceProvider;
use crate::capture::recorder::Recorder;
use crate::gateway::{AnalysisGateway, DataGateway, DocPath, Query};
use crate::services::SessionState;
use crate::{Error, Result};
use solace_common::events::SolaceEvent;
use solace_common::time;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Question list of the standard check-in
pub const DEFAULT_QUESTIONS: [&str; 4] = [
    "How have you been managing stress lately?",
    "What activities bring you joy and fulfillment?",
    "How would you describe your sleep patterns recently?",
    "What are your current goals and aspirations?",
];

/// Drives a multi-question voice assessment for the signed-in user
pub struct AssessmentSession {
    questions: Vec<String>,
    data: Arc<dyn DataGateway>,
    analysis: Arc<dyn AnalysisGateway>,
    session: Arc<SessionState>,
    provider: Arc<dyn DeviceProvider>,
    current: usize,
    started: bool,
    complete: bool,
    /// Recorder for the question currently being answered
    recorder: Option<(usize, Recorder)>,
}

impl AssessmentSession {
    pub fn new(
        data: Arc<dyn DataGateway>,
        analysis: Arc<dyn AnalysisGateway>,
        provider: Arc<dyn DeviceProvider>,
        session: Arc<SessionState>,
    ) -> Self {
        Self::with_questions(
            data,
            analysis,
            provider,
            session,
            DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        )
    }

    pub fn with_questions(
        data: Arc<dyn DataGateway>,
        analysis: Arc<dyn AnalysisGateway>,
        provider: Arc<dyn DeviceProvider>,
        session: Arc<SessionState>,
        questions: Vec<String>,
    ) -> Self {
        AssessmentSession {
            questions,
            data,
            analysis,
            session,
            provider,
            current: 0,
            started: false,
            complete: false,
            recorder: None,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Index of the question awaiting an answer
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.current).map(|q| q.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Begin a fresh run: clear the previous run's results and rewind
    ///
    /// Also raises the session flags the frame sampler keys off, so
    /// webcam sampling covers the whole run.
    pub async fn start(&mut self) -> Result<()> {
        let uid = self.session.require_uid().await?;

        let path = DocPath::assessment_sentiments(&uid);
        let stale = self.data.get_once(&path, Query::default()).await?;
        for doc in &stale {
            self.data.delete(&path.doc(&doc.id)).await?;
        }
        if !stale.is_empty() {
            debug!(cleared = stale.len(), "Previous assessment results removed");
        }

        if let Some((_, mut recorder)) = self.recorder.take() {
            recorder.abort();
        }
        self.current = 0;
        self.started = true;
        self.complete = false;
        self.session.set_assessment_active(true);
        self.session.set_capture_session_active(true);
        info!(uid = %uid, questions = self.questions.len(), "Assessment started");
        Ok(())
    }

    /// Start recording the answer to the current question
    ///
    /// Any recorder left over from an abandoned answer is discarded
    /// first; the capture pipeline itself guarantees a single live
    /// device handle.
    pub async fn begin_answer(&mut self) -> Result<()> {
        if !self.started || self.complete {
            return Err(Error::Validation(
                "no assessment question awaiting an answer".to_string(),
            ));
        }
        if let Some((index, mut recorder)) = self.recorder.take() {
            warn!(index, "Discarding unfinished answer recording");
            recorder.abort();
        }

        let mut recorder = Recorder::new(Arc::clone(&self.provider), self.session.event_sender());
        recorder.start().await?;
        self.recorder = Some((self.current, recorder));
        Ok(())
    }

    /// Pull buffered audio through; call periodically while recording
    pub fn flush(&mut self) {
        if let Some((_, recorder)) = self.recorder.as_mut() {
            recorder.flush();
        }
    }

    /// Finish the current answer: encode, submit, auto-advance
    ///
    /// On submission failure the question stays current so the user can
    /// re-record; nothing advances on an error path.
    pub async fn finish_answer(&mut self) -> Result<()> {
        let uid = self.session.require_uid().await?;
        let (index, mut recorder) = self
            .recorder
            .take()
            .ok_or_else(|| Error::Validation("no answer recording in progress".to_string()))?;

        let clip = recorder.stop().await?;
        self.analysis.analyze_audio(&uid, true, clip.bytes).await?;
        debug!(index, samples = clip.sample_count, "Answer submitted");

        self.current = index + 1;
        if self.current >= self.questions.len() {
            self.complete = true;
            self.session.set_assessment_active(false);
            self.session.set_capture_session_active(false);
            self.session.broadcast(SolaceEvent::AssessmentCompleted {
                timestamp: time::now(),
            });
            info!(uid = %uid, "Assessment complete");
        } else {
            self.session.broadcast(SolaceEvent::AssessmentAdvanced {
                question_index: self.current,
                timestamp: time::now(),
            });
        }
        Ok(())
    }

    /// Abandon the run, releasing any held device and clearing flags
    pub fn cancel(&mut self) {
        if let Some((_, mut recorder)) = self.recorder.take() {
            recorder.abort();
        }
        self.started = false;
        self.complete = false;
        self.session.set_assessment_active(false);
        self.session.set_capture_session_active(false);
    }
}

impl Drop for AssessmentSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::device::{CaptureConstraints, CaptureDevice};
    use crate::capture::wav;
    use crate::gateway::{Document, Snapshot, Subscription};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use solace_common::model::{Demographics, UserProfile};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct BlobDevice {
        blob: Vec<u8>,
        released: bool,
        outstanding: Arc<AtomicUsize>,
    }

    impl CaptureDevice for BlobDevice {
        fn start(&mut self) -> Result<()> {
            Ok(())
        }
        fn take_chunk(&mut self) -> Option<Vec<u8>> {
            None
        }
        fn stop(&mut self) -> Result<Vec<u8>> {
            Ok(std::mem::take(&mut self.blob))
        }
        fn release(&mut self) {
            if !self.released {
                self.released = true;
                self.outstanding.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    struct BlobProvider {
        outstanding: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DeviceProvider for BlobProvider {
        async fn acquire(&self, _: &CaptureConstraints) -> Result<Box<dyn CaptureDevice>> {
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            let samples: Vec<f32> = (0..441).map(|i| (i as f32 * 0.05).sin() * 0.4).collect();
            Ok(Box::new(BlobDevice {
                blob: wav::encode(&samples, 1, 44_100),
                released: false,
                outstanding: self.outstanding.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingData {
        docs: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DataGateway for RecordingData {
        async fn subscribe(&self, _: &DocPath, _: Query) -> Result<Subscription> {
            Err(Error::Internal("not used".to_string()))
        }
        async fn get_once(&self, _: &DocPath, _: Query) -> Result<Snapshot> {
            Ok(self
                .docs
                .lock()
                .unwrap()
                .iter()
                .map(|id| Document::new(id.clone(), json!({})))
                .collect())
        }
        async fn add(&self, _: &DocPath, _: Value) -> Result<String> {
            Ok("id".to_string())
        }
        async fn update(&self, _: &DocPath, _: Value) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, doc_path: &DocPath) -> Result<()> {
            self.deletes.lock().unwrap().push(doc_path.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingAnalysis {
        audio: AtomicUsize,
        assessment_flags: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl AnalysisGateway for CountingAnalysis {
        async fn analyze_post(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn analyze_note(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn analyze_audio(&self, _: &str, assessment: bool, wav: Vec<u8>) -> Result<()> {
            assert!(wav::read_header(&wav).is_ok());
            self.audio.fetch_add(1, Ordering::SeqCst);
            self.assessment_flags.lock().unwrap().push(assessment);
            Ok(())
        }
        async fn analyze_image(&self, _: &str, _: bool, _: Vec<u8>) -> Result<()> {
            Ok(())
        }
        async fn reflect(&self, _: &str, _: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    async fn signed_in_session() -> Arc<SessionState> {
        let session = Arc::new(SessionState::new());
        session
            .set_user(Some(UserProfile {
                uid: "u1".to_string(),
                display_name: "Dana".to_string(),
                photo_url: None,
                is_anonymous: false,
                anonymous_name: String::new(),
                demographics: Demographics::default(),
                created_at: Utc::now(),
            }))
            .await;
        session
    }

    fn new_session(
        data: Arc<RecordingData>,
        analysis: Arc<CountingAnalysis>,
        session: Arc<SessionState>,
        outstanding: Arc<AtomicUsize>,
    ) -> AssessmentSession {
        AssessmentSession::with_questions(
            data,
            analysis,
            Arc::new(BlobProvider { outstanding }),
            session,
            vec!["Q1".to_string(), "Q2".to_string()],
        )
    }

    #[tokio::test]
    async fn test_start_clears_previous_results() {
        let data = Arc::new(RecordingData::default());
        data.docs.lock().unwrap().extend(["s1".to_string(), "s2".to_string()]);
        let session = signed_in_session().await;
        let mut assessment = new_session(
            Arc::clone(&data),
            Arc::new(CountingAnalysis::default()),
            session,
            Arc::new(AtomicUsize::new(0)),
        );

        assessment.start().await.unwrap();
        let deletes = data.deletes.lock().unwrap().clone();
        assert_eq!(
            deletes,
            vec!["users/u1/q_sentiments/s1", "users/u1/q_sentiments/s2"]
        );
        assert_eq!(assessment.current_index(), 0);
    }

    #[tokio::test]
    async fn test_full_run_advances_and_completes() {
        let analysis = Arc::new(CountingAnalysis::default());
        let session = signed_in_session().await;
        let mut events = session.subscribe_events();
        let outstanding = Arc::new(AtomicUsize::new(0));
        let mut assessment = new_session(
            Arc::new(RecordingData::default()),
            Arc::clone(&analysis),
            Arc::clone(&session),
            Arc::clone(&outstanding),
        );

        assessment.start().await.unwrap();
        assert!(session.assessment_active());
        assert!(session.capture_session_active());
        assert_eq!(assessment.current_question(), Some("Q1"));

        assessment.begin_answer().await.unwrap();
        assessment.finish_answer().await.unwrap();
        assert_eq!(assessment.current_index(), 1);
        assert!(!assessment.is_complete());

        assessment.begin_answer().await.unwrap();
        assessment.finish_answer().await.unwrap();
        assert!(assessment.is_complete());
        assert!(!session.assessment_active());
        assert!(!session.capture_session_active());

        // Both clips went out with the assessment flag raised
        assert_eq!(analysis.audio.load(Ordering::SeqCst), 2);
        assert!(analysis.assessment_flags.lock().unwrap().iter().all(|&f| f));
        // Every device handle released
        assert_eq!(outstanding.load(Ordering::SeqCst), 0);

        let mut saw_advance = false;
        let mut saw_complete = false;
        while let Ok(event) = events.try_recv() {
            match event {
                SolaceEvent::AssessmentAdvanced { question_index, .. } => {
                    assert_eq!(question_index, 1);
                    saw_advance = true;
                }
                SolaceEvent::AssessmentCompleted { .. } => saw_complete = true,
                _ => {}
            }
        }
        assert!(saw_advance && saw_complete);
    }

    #[tokio::test]
    async fn test_begin_answer_discards_unfinished_recording() {
        let session = signed_in_session().await;
        let outstanding = Arc::new(AtomicUsize::new(0));
        let mut assessment = new_session(
            Arc::new(RecordingData::default()),
            Arc::new(CountingAnalysis::default()),
            session,
            Arc::clone(&outstanding),
        );

        assessment.start().await.unwrap();
        assessment.begin_answer().await.unwrap();
        assessment.begin_answer().await.unwrap();
        // The first answer's device was released before the second acquire
        assert_eq!(outstanding.load(Ordering::SeqCst), 1);

        assessment.cancel();
        assert_eq!(outstanding.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_without_start_rejected() {
        let session = signed_in_session().await;
        let mut assessment = new_session(
            Arc::new(RecordingData::default()),
            Arc::new(CountingAnalysis::default()),
            session,
            Arc::new(AtomicUsize::new(0)),
        );
        assert!(assessment.begin_answer().await.is_err());
        assert!(assessment.finish_answer().await.is_err());
    }
}
