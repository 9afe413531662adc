//! The assistant conversation.
//!
//! A session owns an append-only log of turns that starts with the greeting.
//! Every action (a typed question, a voice toggle, an image) is one unit of
//! work guarded by a loading flag, so a second action arriving while one is
//! in flight is rejected rather than interleaved.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::{
    base::prompts::{ASSISTANT_GREETING, QUICK_QUESTIONS},
    prelude::*,
    service::{audio::Recorder, classifier::ClassifierClient, notify::NotifierClient},
};

/// The user turn recorded for a voice submission.
pub const VOICE_TURN_TEXT: &str = "[Voice input recorded: Health query about patient condition]";
/// What the classifier is asked for a voice submission.
pub const VOICE_QUERY: &str = "voice input recorded";
/// The user turn recorded for an image submission.
pub const IMAGE_TURN_TEXT: &str = "[Image uploaded: Medical photo for analysis]";
/// What the classifier is asked for an image submission.
pub const IMAGE_QUERY: &str = "image uploaded for analysis";

/// Resets the loading flag when the unit of work ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One worker's conversation with the assistant.
pub struct AssistantSession {
    classifier: ClassifierClient,
    notifier: NotifierClient,
    recorder: Recorder,
    turns: Mutex<Vec<Turn>>,
    loading: AtomicBool,
}

impl AssistantSession {
    pub fn new(classifier: ClassifierClient, notifier: NotifierClient, recorder: Recorder) -> Self {
        Self {
            classifier,
            notifier,
            recorder,
            turns: Mutex::new(vec![Turn::assistant(ASSISTANT_GREETING, false)]),
            loading: AtomicBool::new(false),
        }
    }

    /// A snapshot of the conversation, oldest first.
    pub async fn turns(&self) -> Vec<Turn> {
        self.turns.lock().await.clone()
    }

    /// The quick questions, offered only before the first submission.
    pub async fn quick_questions(&self) -> &'static [&'static str] {
        let questions: &'static [&'static str] = &QUICK_QUESTIONS;

        if self.turns.lock().await.len() == 1 { questions } else { &[] }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Ask a typed question.
    #[instrument(skip_all)]
    pub async fn submit_text(&self, text: &str) -> Res<Turn> {
        if text.trim().is_empty() {
            return Err(AssistantError::validation("Please enter a question."));
        }

        if self.is_recording() {
            return Err(AssistantError::validation("Stop the recording before sending a question."));
        }

        let _loading = self.begin()?;

        self.push(Turn::user(text)).await;
        self.answer(text).await
    }

    /// Start a recording, or stop the active one and ask about it.
    ///
    /// Returns the assistant turn when a recording was stopped.
    #[instrument(skip_all)]
    pub async fn toggle_recording(&self) -> Res<Option<Turn>> {
        let _loading = self.begin()?;

        if !self.is_recording() {
            self.recorder.start().await?;
            self.show(Notice::info("Recording Started", "Speak now... Tap again to stop.")).await;

            return Ok(None);
        }

        let audio = self.recorder.stop().await?;
        debug!("Captured {} bytes of audio.", audio.len());

        self.show(Notice::info("Voice Recording Captured", "Processing your voice input...")).await;
        self.push(Turn::user(VOICE_TURN_TEXT)).await;

        self.answer(VOICE_QUERY).await.map(Some)
    }

    /// Ask about a captured image.
    #[instrument(skip_all)]
    pub async fn submit_image(&self, image: &[u8]) -> Res<Turn> {
        if image.is_empty() {
            return Err(AssistantError::validation("No image was selected."));
        }

        if self.is_recording() {
            return Err(AssistantError::validation("Stop the recording before sending an image."));
        }

        let _loading = self.begin()?;
        debug!("Received {} bytes of image data.", image.len());

        self.show(Notice::info("Image Captured", "Analyzing image for medical assessment...")).await;
        self.push(Turn::user(IMAGE_TURN_TEXT)).await;

        self.answer(IMAGE_QUERY).await
    }

    /// Turn a failed action into a notice; successful results pass through.
    pub async fn handle<T>(&self, result: Res<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!("Assistant action failed: {err:#}");
                self.show(Notice::from_error(&err)).await;
                None
            }
        }
    }

    fn begin(&self) -> Res<LoadingGuard<'_>> {
        if self.loading.swap(true, Ordering::SeqCst) {
            return Err(AssistantError::validation("A request is already in progress."));
        }

        Ok(LoadingGuard(&self.loading))
    }

    async fn answer(&self, query: &str) -> Res<Turn> {
        let classification = self.classifier.classify(query).await?;

        if classification.is_high_risk {
            warn!("High-risk turn ({:?}).", classification.risk_source);
        }

        let turn = Turn::assistant(classification.response_text, classification.is_high_risk);
        self.push(turn.clone()).await;

        Ok(turn)
    }

    async fn push(&self, turn: Turn) {
        self.turns.lock().await.push(turn);
    }

    async fn show(&self, notice: Notice) {
        if let Err(err) = self.notifier.notify(&notice).await {
            warn!("Could not show notice `{}`: {err:#}", notice.title);
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::{
        base::types::{NoticeVariant, Role},
        service::{
            audio::{AudioClient, GenericAudioSource},
            classifier::{Classification, GenericClassifier},
            notify::GenericNotifier,
        },
        triage::risk::RiskSource,
    };

    mock! {
        pub Notifier {}

        #[async_trait]
        impl GenericNotifier for Notifier {
            async fn notify(&self, notice: &Notice) -> Void;
        }
    }

    mock! {
        pub Audio {}

        #[async_trait]
        impl GenericAudioSource for Audio {
            async fn start(&self) -> Void;
            async fn stop(&self) -> Res<Vec<u8>>;
            fn release(&self);
        }
    }

    /// A classifier that takes a while to answer.
    struct SlowClassifier;

    #[async_trait]
    impl GenericClassifier for SlowClassifier {
        async fn classify(&self, input: &str) -> Res<Classification> {
            tokio::time::sleep(Duration::from_millis(50)).await;

            Ok(Classification {
                response_text: format!("answer to {input}"),
                is_high_risk: false,
                risk_source: RiskSource::Input,
            })
        }
    }

    /// A classifier whose backend is down.
    struct FailingClassifier;

    #[async_trait]
    impl GenericClassifier for FailingClassifier {
        async fn classify(&self, _input: &str) -> Res<Classification> {
            Err(AssistantError::transport("LLM backend error: 502"))
        }
    }

    fn quiet_notifier() -> NotifierClient {
        let mut mock = MockNotifier::new();
        mock.expect_notify().returning(|_| Ok(()));
        NotifierClient::new(Arc::new(mock))
    }

    fn idle_recorder() -> Recorder {
        Recorder::new(AudioClient::new(Arc::new(MockAudio::new())))
    }

    fn session_with(classifier: ClassifierClient) -> AssistantSession {
        AssistantSession::new(classifier, quiet_notifier(), idle_recorder())
    }

    #[tokio::test]
    async fn test_session_starts_with_greeting_and_quick_questions() {
        let session = session_with(ClassifierClient::rule_table());

        let turns = session.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(session.quick_questions().await.len(), 4);

        session.submit_text(session.quick_questions().await[0]).await.unwrap();
        assert!(session.quick_questions().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_assistant_turns() {
        let session = session_with(ClassifierClient::rule_table());

        let turn = session.submit_text("Child vaccination schedule").await.unwrap();
        let turns = session.turns().await;

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], Turn::user("Child vaccination schedule"));
        assert_eq!(turns[2], turn);
        assert!(turn.text.starts_with("💉 CHILD VACCINATION SCHEDULE:"));
        assert!(!turn.is_high_risk);
    }

    #[tokio::test]
    async fn test_unconscious_baby_is_high_risk() {
        let session = session_with(ClassifierClient::rule_table());

        let turn = session.submit_text("baby is unconscious").await.unwrap();

        assert!(turn.is_high_risk);
    }

    #[tokio::test]
    async fn test_empty_submission_appends_nothing() {
        let session = session_with(ClassifierClient::rule_table());

        let err = session.submit_text("   \n").await.unwrap_err();

        assert!(matches!(AssistantError::classify(&err), AssistantError::Validation(_)));
        assert_eq!(session.turns().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_rejected() {
        let session = session_with(ClassifierClient::new(Arc::new(SlowClassifier)));

        let (first, second) = tokio::join!(session.submit_text("fever"), session.submit_text("cough"));

        assert!(first.is_ok());
        assert!(matches!(AssistantError::classify(&second.unwrap_err()), AssistantError::Validation(_)));
        assert!(!session.is_loading());
        assert_eq!(session.turns().await.len(), 3);
    }

    #[tokio::test]
    async fn test_backend_failure_resets_loading_and_notifies() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice| notice.variant == NoticeVariant::Destructive && notice.title == "Error")
            .times(1)
            .returning(|_| Ok(()));
        let session = AssistantSession::new(ClassifierClient::new(Arc::new(FailingClassifier)), NotifierClient::new(Arc::new(notifier)), idle_recorder());

        let result = session.submit_text("Danger signs in pregnancy").await;
        assert!(session.handle(result).await.is_none());

        assert!(!session.is_loading());
        // The question stays in the log; no canned answer replaces the failure.
        let turns = session.turns().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_voice_round_trip() {
        let mut audio = MockAudio::new();
        audio.expect_start().times(1).returning(|| Ok(()));
        audio.expect_stop().times(1).returning(|| Ok(vec![0u8; 16]));
        audio.expect_release().times(1).return_const(());
        let session = AssistantSession::new(ClassifierClient::rule_table(), quiet_notifier(), Recorder::new(AudioClient::new(Arc::new(audio))));

        assert!(session.toggle_recording().await.unwrap().is_none());
        assert!(session.is_recording());
        assert!(session.submit_text("fever").await.is_err());

        let turn = session.toggle_recording().await.unwrap().unwrap();
        let turns = session.turns().await;

        assert!(!session.is_recording());
        assert_eq!(turns[1].text, VOICE_TURN_TEXT);
        assert!(turn.text.starts_with("I've received your voice input."));
    }

    #[tokio::test]
    async fn test_microphone_denied_leaves_session_usable() {
        let mut audio = MockAudio::new();
        audio.expect_start().times(1).returning(|| Err(anyhow!("NotAllowedError")));
        audio.expect_release().times(1).return_const(());
        let session = AssistantSession::new(ClassifierClient::rule_table(), quiet_notifier(), Recorder::new(AudioClient::new(Arc::new(audio))));

        let err = session.toggle_recording().await.unwrap_err();

        assert!(matches!(AssistantError::classify(&err), AssistantError::Permission(_)));
        assert!(!session.is_recording());
        assert!(!session.is_loading());
        assert!(session.submit_text("fever in child").await.is_ok());
    }

    #[tokio::test]
    async fn test_image_submission() {
        let session = session_with(ClassifierClient::rule_table());

        assert!(session.submit_image(&[]).await.is_err());

        let turn = session.submit_image(&[0xFF, 0xD8, 0xFF]).await.unwrap();
        let turns = session.turns().await;

        assert_eq!(turns[1].text, IMAGE_TURN_TEXT);
        assert!(turn.text.starts_with("I've received your image input."));
    }
}
