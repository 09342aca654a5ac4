use crate::features::lifecycle::repo::{WorkerEnvironment, INSTANCE_ID_VAR, WEBHOOK_URL_VAR};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_core::{
    ComputeControl, CoreError, InstanceDescription, InstanceState, NotificationMessage, Notifier,
    SecretResolver, WorkerTarget,
};

pub const DEFAULT_STOP_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_STOP_MAX_ATTEMPTS: u32 = 60;

/// Report returned by start/stop workers, which have no state tag of their own.
pub const NO_STATE_REPORT: &str = "-";

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Failed(#[from] CoreError),
    /// The instance operation completed; only the follow-up message was lost.
    #[error("{} worker completed but notification failed: {source}", .report.target)]
    NotificationFailed {
        report: WorkerReport,
        source: CoreError,
    },
}

pub type WorkerResult<T> = std::result::Result<T, WorkerError>;

/// Terminal result of one worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub target: WorkerTarget,
    pub instance_id: String,
    pub summary: String,
}

/// Bounds on how long the stop worker waits for the instance to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_STOP_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_STOP_MAX_ATTEMPTS,
        }
    }
}

impl StopPolicy {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str, default: u64| -> Result<u64, CoreError> {
            match lookup(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map_err(|e| CoreError::Configuration(format!("{key} is invalid: {e}"))),
                None => Ok(default),
            }
        };

        let interval = parse(
            "WARDEN_STOP_POLL_INTERVAL_SECS",
            DEFAULT_STOP_POLL_INTERVAL_SECS,
        )?;
        let max_attempts = parse("WARDEN_STOP_MAX_ATTEMPTS", DEFAULT_STOP_MAX_ATTEMPTS as u64)?;
        if max_attempts == 0 {
            return Err(CoreError::Configuration(
                "WARDEN_STOP_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            poll_interval: Duration::from_secs(interval),
            max_attempts: u32::try_from(max_attempts).unwrap_or(u32::MAX),
        })
    }
}

/// Plaintext inputs every worker resolves before touching the instance.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub instance_id: String,
    pub webhook_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PollOutcome {
    Stopped { attempts: u32 },
    Exhausted { attempts: u32, last_state: InstanceState },
    Cancelled,
}

/// Notification content for a status check, plus the compact state tag.
///
/// Pure: the same description always produces the same message.
pub fn status_message(description: &InstanceDescription) -> (NotificationMessage, String) {
    let id = &description.instance_id;
    match &description.state {
        InstanceState::Running => {
            let address = description
                .public_ip
                .as_deref()
                .unwrap_or("no public address");
            (
                NotificationMessage::new(format!("Instance [{id}] is running\r{address}")),
                format!("running {address}"),
            )
        }
        InstanceState::Stopped => (
            NotificationMessage::new(format!("Instance [{id}] is stopped")),
            "stopped".to_string(),
        ),
        other => (
            NotificationMessage::new(format!("Instance [{id}] status is {other}")),
            other.to_string(),
        ),
    }
}

pub struct LifecycleService {
    env: Arc<dyn WorkerEnvironment>,
    secrets: Arc<dyn SecretResolver>,
    compute: Arc<dyn ComputeControl>,
    notifier: Arc<dyn Notifier>,
    stop_policy: StopPolicy,
}

impl LifecycleService {
    pub fn new(
        env: Arc<dyn WorkerEnvironment>,
        secrets: Arc<dyn SecretResolver>,
        compute: Arc<dyn ComputeControl>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            env,
            secrets,
            compute,
            notifier,
            stop_policy: StopPolicy::default(),
        }
    }

    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    /// Run one worker to completion.
    pub async fn run(
        &self,
        target: WorkerTarget,
        cancel: &CancellationToken,
    ) -> WorkerResult<WorkerReport> {
        let context = self.resolve_context(target).await?;
        match target {
            WorkerTarget::Start => self.start_instance(context).await,
            WorkerTarget::Stop => self.stop_instance(context, cancel).await,
            WorkerTarget::Status => self.check_status(context).await,
        }
    }

    /// Read the sealed configuration and decrypt it under the worker's context.
    pub async fn resolve_context(&self, target: WorkerTarget) -> Result<WorkerContext, CoreError> {
        let sealed_instance_id = self.required_var(INSTANCE_ID_VAR)?;
        let sealed_webhook_url = self.required_var(WEBHOOK_URL_VAR)?;
        let scope = target.worker_name();

        let instance_id = self.secrets.decrypt(&sealed_instance_id, scope).await?;
        let webhook_url = self.secrets.decrypt(&sealed_webhook_url, scope).await?;
        debug!(worker = scope, "Resolved worker secrets");

        Ok(WorkerContext {
            instance_id,
            webhook_url,
        })
    }

    fn required_var(&self, key: &str) -> Result<String, CoreError> {
        self.env
            .var(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| CoreError::Configuration(format!("environment variable {key} not found")))
    }

    async fn check_status(&self, context: WorkerContext) -> WorkerResult<WorkerReport> {
        let description = self.compute.describe(&context.instance_id).await?;
        let (message, summary) = status_message(&description);
        info!(instance_id = %context.instance_id, state = %description.state, "Checked instance status");

        self.deliver(
            &context,
            &message,
            WorkerReport {
                target: WorkerTarget::Status,
                instance_id: context.instance_id.clone(),
                summary,
            },
        )
        .await
    }

    async fn start_instance(&self, context: WorkerContext) -> WorkerResult<WorkerReport> {
        self.compute.start(&context.instance_id).await?;
        info!(instance_id = %context.instance_id, "Start requested");

        let message =
            NotificationMessage::new(format!("Instance [{}] is starting", context.instance_id));
        self.deliver(
            &context,
            &message,
            WorkerReport {
                target: WorkerTarget::Start,
                instance_id: context.instance_id.clone(),
                summary: NO_STATE_REPORT.to_string(),
            },
        )
        .await
    }

    async fn stop_instance(
        &self,
        context: WorkerContext,
        cancel: &CancellationToken,
    ) -> WorkerResult<WorkerReport> {
        self.compute.stop(&context.instance_id).await?;
        info!(instance_id = %context.instance_id, "Stop requested");

        match self.await_stopped(&context.instance_id, cancel).await? {
            PollOutcome::Stopped { attempts } => {
                info!(instance_id = %context.instance_id, attempts, "Instance stopped");
                let message =
                    NotificationMessage::new(format!("Instance [{}] has stopped", context.instance_id));
                self.deliver(
                    &context,
                    &message,
                    WorkerReport {
                        target: WorkerTarget::Stop,
                        instance_id: context.instance_id.clone(),
                        summary: NO_STATE_REPORT.to_string(),
                    },
                )
                .await
            }
            PollOutcome::Exhausted {
                attempts,
                last_state,
            } => {
                warn!(
                    instance_id = %context.instance_id,
                    attempts,
                    state = %last_state,
                    "Instance did not reach stopped within the polling budget"
                );
                let message = NotificationMessage::new(format!(
                    "Stop requested for instance [{}], but it is still {last_state} after {attempts} checks",
                    context.instance_id
                ));
                if let Err(error) = self.notifier.notify(&context.webhook_url, &message).await {
                    warn!(error = %error, "Failed to deliver stop timeout notification");
                }
                Err(CoreError::Timeout(format!(
                    "instance {} still {last_state} after {attempts} checks",
                    context.instance_id
                ))
                .into())
            }
            PollOutcome::Cancelled => {
                info!(instance_id = %context.instance_id, "Stop polling cancelled");
                Err(CoreError::Cancelled(format!(
                    "stop polling for instance {} cancelled",
                    context.instance_id
                ))
                .into())
            }
        }
    }

    async fn await_stopped(
        &self,
        instance_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, CoreError> {
        let mut last_state = InstanceState::Other("unknown".to_string());

        for attempt in 1..=self.stop_policy.max_attempts {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled);
            }

            let description = self.compute.describe(instance_id).await?;
            if description.state == InstanceState::Stopped {
                return Ok(PollOutcome::Stopped { attempts: attempt });
            }
            debug!(instance_id, attempt, state = %description.state, "Waiting for instance to stop");
            last_state = description.state;

            if attempt == self.stop_policy.max_attempts {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(self.stop_policy.poll_interval) => {}
            }
        }

        Ok(PollOutcome::Exhausted {
            attempts: self.stop_policy.max_attempts,
            last_state,
        })
    }

    async fn deliver(
        &self,
        context: &WorkerContext,
        message: &NotificationMessage,
        report: WorkerReport,
    ) -> WorkerResult<WorkerReport> {
        match self.notifier.notify(&context.webhook_url, message).await {
            Ok(()) => Ok(report),
            Err(source) => Err(WorkerError::NotificationFailed { report, source }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::features::lifecycle::repo::StaticEnvironment;
    use std::sync::Mutex;

    struct Harness {
        service: LifecycleService,
        secrets: Arc<PrefixSecrets>,
        compute: Arc<ScriptedCompute>,
        notifier: Arc<RecordingNotifier>,
        log: CallLog,
    }

    fn harness_with(
        env: StaticEnvironment,
        states: Vec<InstanceState>,
        public_ip: Option<&str>,
        configure: impl FnOnce(&mut PrefixSecrets, &mut ScriptedCompute, &mut RecordingNotifier),
    ) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut secrets = PrefixSecrets::new();
        let mut compute = ScriptedCompute::new(states, public_ip, log.clone());
        let mut notifier = RecordingNotifier::new(log.clone());
        configure(&mut secrets, &mut compute, &mut notifier);

        let secrets = Arc::new(secrets);
        let compute = Arc::new(compute);
        let notifier = Arc::new(notifier);
        let service = LifecycleService::new(
            Arc::new(env),
            secrets.clone(),
            compute.clone(),
            notifier.clone(),
        )
        .with_stop_policy(fast_policy(5));

        Harness {
            service,
            secrets,
            compute,
            notifier,
            log,
        }
    }

    fn harness(states: Vec<InstanceState>, public_ip: Option<&str>) -> Harness {
        harness_with(sealed_env(), states, public_ip, |_, _, _| {})
    }

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_status_running_includes_id_and_address() {
        let h = harness(vec![InstanceState::Running], Some("10.0.0.5"));

        let report = h
            .service
            .run(WorkerTarget::Status, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.summary, "running 10.0.0.5");
        let contents = h.notifier.contents();
        assert_eq!(contents.len(), 1);
        assert!(contents[0].contains("i-123"));
        assert!(contents[0].contains("10.0.0.5"));
        assert_eq!(calls(&h.log), vec!["describe", "notify"]);
    }

    #[tokio::test]
    async fn test_status_stopped_has_no_address() {
        let h = harness(vec![InstanceState::Stopped], Some("10.0.0.5"));

        let report = h
            .service
            .run(WorkerTarget::Status, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.summary, "stopped");
        let content = &h.notifier.contents()[0];
        assert!(content.contains("stopped"));
        assert!(!content.contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_status_unrecognized_state_is_echoed() {
        let h = harness(vec![InstanceState::from("pending")], None);

        let report = h
            .service
            .run(WorkerTarget::Status, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.summary, "pending");
        assert!(h.notifier.contents()[0].contains("pending"));
    }

    #[tokio::test]
    async fn test_status_is_idempotent_for_unchanged_state() {
        let h = harness(vec![InstanceState::Running], Some("10.0.0.5"));
        let cancel = CancellationToken::new();

        for _ in 0..3 {
            h.service.run(WorkerTarget::Status, &cancel).await.unwrap();
        }

        let contents = h.notifier.contents();
        assert_eq!(contents.len(), 3);
        assert!(contents.iter().all(|c| c.as_bytes() == contents[0].as_bytes()));
    }

    #[test]
    fn test_status_message_for_other_state() {
        let (message, summary) = status_message(&InstanceDescription {
            instance_id: "i-9".to_string(),
            state: InstanceState::Other("shutting-down".to_string()),
            public_ip: None,
        });
        assert_eq!(message.content, "Instance [i-9] status is shutting-down");
        assert_eq!(summary, "shutting-down");
    }

    #[tokio::test]
    async fn test_start_issues_start_once_then_notifies() {
        let h = harness(vec![InstanceState::Pending], None);

        let report = h
            .service
            .run(WorkerTarget::Start, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.summary, NO_STATE_REPORT);
        assert_eq!(calls(&h.log), vec!["start", "notify"]);
        assert_eq!(h.notifier.contents(), vec!["Instance [i-123] is starting"]);
    }

    #[tokio::test]
    async fn test_stop_polls_until_stopped_then_notifies_once() {
        let h = harness(
            vec![
                InstanceState::from("stopping"),
                InstanceState::from("stopping"),
                InstanceState::Stopped,
                InstanceState::Running,
            ],
            None,
        );

        h.service
            .run(WorkerTarget::Stop, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            calls(&h.log),
            vec!["stop", "describe", "describe", "describe", "notify"]
        );
        assert_eq!(h.notifier.contents(), vec!["Instance [i-123] has stopped"]);
    }

    #[tokio::test]
    async fn test_stop_gives_up_after_attempt_budget() {
        let h = harness(vec![InstanceState::from("stopping")], None);

        let err = h
            .service
            .run(WorkerTarget::Stop, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Failed(CoreError::Timeout(_))));
        assert_eq!(h.compute.describe_calls(), 5);
        let contents = h.notifier.contents();
        assert_eq!(contents.len(), 1);
        assert!(contents[0].contains("still stopping after 5 checks"));
    }

    #[tokio::test]
    async fn test_stop_cancelled_sends_no_notification() {
        let h = harness(vec![InstanceState::from("stopping")], None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h.service.run(WorkerTarget::Stop, &cancel).await.unwrap_err();

        assert!(matches!(err, WorkerError::Failed(CoreError::Cancelled(_))));
        assert_eq!(calls(&h.log), vec!["stop"]);
        assert!(h.notifier.contents().is_empty());
    }

    #[tokio::test]
    async fn test_stop_cancelled_while_waiting() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let compute = Arc::new(ScriptedCompute::new(
            vec![InstanceState::from("stopping")],
            None,
            log.clone(),
        ));
        let notifier = Arc::new(RecordingNotifier::new(log.clone()));
        let service = LifecycleService::new(
            Arc::new(sealed_env()),
            Arc::new(PrefixSecrets::new()),
            compute.clone(),
            notifier.clone(),
        )
        .with_stop_policy(StopPolicy {
            poll_interval: Duration::from_secs(3600),
            max_attempts: 10,
        });

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = service.run(WorkerTarget::Stop, &cancel).await.unwrap_err();
        assert!(matches!(err, WorkerError::Failed(CoreError::Cancelled(_))));
        assert_eq!(compute.describe_calls(), 1);
        assert!(notifier.contents().is_empty());
    }

    #[tokio::test]
    async fn test_describe_failure_during_polling_is_fatal() {
        let h = harness_with(sealed_env(), vec![InstanceState::Running], None, |_, c, _| {
            c.fail_describe = true
        });

        let err = h
            .service
            .run(WorkerTarget::Stop, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            WorkerError::Failed(e) => assert!(e.is_external()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls(&h.log), vec!["stop", "describe"]);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_completed_start() {
        let h = harness_with(sealed_env(), vec![InstanceState::Running], None, |_, _, n| {
            n.fail = true
        });

        let err = h
            .service
            .run(WorkerTarget::Start, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            WorkerError::NotificationFailed { report, source } => {
                assert_eq!(report.target, WorkerTarget::Start);
                assert_eq!(report.instance_id, "i-123");
                assert!(source.to_string().starts_with("webhook notify failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls(&h.log), vec!["start", "notify"]);
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_before_any_control_call() {
        let env = StaticEnvironment::new().with(INSTANCE_ID_VAR, "sealed:i-123");
        let h = harness_with(env, vec![InstanceState::Running], None, |_, _, _| {});

        let err = h
            .service
            .run(WorkerTarget::Stop, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Failed(CoreError::Configuration(_))));
        assert!(calls(&h.log).is_empty());
    }

    #[tokio::test]
    async fn test_secrets_are_scoped_to_worker_name() {
        let h = harness(vec![InstanceState::Stopped], None);

        h.service
            .run(WorkerTarget::Status, &CancellationToken::new())
            .await
            .unwrap();

        let contexts = h.secrets.contexts.lock().unwrap().clone();
        assert_eq!(
            contexts,
            vec!["warden-check-instance", "warden-check-instance"]
        );
        let destination = h.notifier.messages.lock().unwrap()[0].0.clone();
        assert_eq!(destination, "https://chat.example/hook");
    }

    #[tokio::test]
    async fn test_decryption_failure_is_external() {
        let h = harness_with(sealed_env(), vec![InstanceState::Running], None, |s, _, _| {
            s.fail = true
        });

        let err = h
            .service
            .run(WorkerTarget::Status, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            WorkerError::Failed(e) => assert!(e.is_external()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(calls(&h.log).is_empty());
    }

    #[test]
    fn test_stop_policy_from_lookup() {
        let policy = StopPolicy::from_lookup(|key| match key {
            "WARDEN_STOP_POLL_INTERVAL_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(policy.poll_interval, Duration::from_secs(2));
        assert_eq!(policy.max_attempts, DEFAULT_STOP_MAX_ATTEMPTS);

        let zero = StopPolicy::from_lookup(|key| {
            (key == "WARDEN_STOP_MAX_ATTEMPTS").then(|| "0".to_string())
        });
        assert!(matches!(zero, Err(CoreError::Configuration(_))));
    }
}
