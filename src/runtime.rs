//! Runtime services and shared state for the chw-assistant.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::{
    interaction::{
        case_events::CaseSubscriptionManager,
        console::{Console, Outcome},
    },
    prelude::*,
    service::{audio::AudioClient, auth::AuthClient, classifier::ClassifierClient, db::DbClient, notify::NotifierClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the case store, the auth provider, the classifier, the
/// notifier, and configuration. It is designed to be trivially cloneable,
/// allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The case store.
    pub db: DbClient,
    /// The authentication provider.
    pub auth: AuthClient,
    /// The question classifier.
    pub classifier: ClassifierClient,
    /// Where notices are shown.
    pub notifier: NotifierClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the case store.
        let db = DbClient::surreal(&config).await?;

        // Initialize the classifier.
        let classifier = ClassifierClient::from_config(&config);

        Ok(Self {
            config,
            db,
            auth: AuthClient::local(),
            classifier,
            notifier: NotifierClient::log(),
        })
    }

    /// Sign in the configured worker.
    pub async fn sign_in(&self) -> Res<Session> {
        let Some(worker_id) = self.config.worker_id.as_deref() else {
            return Err(AssistantError::configuration("No worker identity is configured. Set `worker_id` or `CHW_ASSISTANT_WORKER_ID`."));
        };

        self.auth.sign_in(worker_id).await
    }

    /// Run the assistant: answer `ask` once, or hold a console session on stdin.
    pub async fn start(&self, ask: Option<&str>) -> Void {
        let session = self.sign_in().await?;
        let console = Console::new(self, session, AudioClient::unavailable());

        if let Some(question) = ask {
            if let Outcome::Reply(text) = console.handle_line(question).await {
                println!("{text}");
            }

            return self.auth.sign_out().await;
        }

        self.run_console(&console, BufReader::new(tokio::io::stdin())).await
    }

    /// Hold a console session over `input` until `/quit`, `/logout`, or end of input.
    ///
    /// The worker is signed out and the case subscription stopped on every exit.
    pub async fn run_console<R: AsyncBufRead + Unpin>(&self, console: &Console, input: R) -> Void {
        let subscriptions = CaseSubscriptionManager::new(self.db.clone(), self.notifier.clone()).spawn(self.auth.session_events());

        println!("{}", console.greeting().await);

        let result = read_commands(console, input).await;

        subscriptions.abort();
        self.auth.sign_out().await?;

        info!("Session ended.");

        result
    }
}

async fn read_commands<R: AsyncBufRead + Unpin>(console: &Console, input: R) -> Void {
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match console.handle_line(&line).await {
            Outcome::Reply(text) => println!("{text}\n"),
            Outcome::Silent => {}
            Outcome::Quit => break,
        }
    }

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    use tokio::io::{AsyncRead, ReadBuf};

    use super::*;
    use crate::base::config::ConfigInner;

    /// Input whose every read fails.
    struct BrokenInput;

    impl AsyncRead for BrokenInput {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("terminal hung up")))
        }
    }

    async fn create_test_runtime() -> Runtime {
        Runtime {
            config: Config {
                inner: std::sync::Arc::new(ConfigInner {
                    worker_id: Some("chw-5".to_string()),
                    ..Default::default()
                }),
            },
            db: DbClient::surreal_memory().await.unwrap(),
            auth: AuthClient::local(),
            classifier: ClassifierClient::rule_table(),
            notifier: NotifierClient::log(),
        }
    }

    #[tokio::test]
    async fn test_console_input_failure_still_signs_out() {
        let runtime = create_test_runtime().await;
        let console = Console::new(&runtime, runtime.sign_in().await.unwrap(), AudioClient::unavailable());

        let result = runtime.run_console(&console, BufReader::new(BrokenInput)).await;

        assert!(result.is_err());
        assert!(runtime.auth.current_session().is_none());
    }

    #[tokio::test]
    async fn test_console_runs_until_quit() {
        let runtime = create_test_runtime().await;
        let console = Console::new(&runtime, runtime.sign_in().await.unwrap(), AudioClient::unavailable());
        let input: &[u8] = b"/new anc Asha 24\n/quit\n/new child Ravi 3\n";

        runtime.run_console(&console, input).await.unwrap();

        let cases = runtime.db.list_cases("chw-5").await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].patient_name, "Asha");
        assert!(runtime.auth.current_session().is_none());
    }
}
