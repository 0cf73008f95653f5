//! orchestrator.rs: the poll loop.
//!
//! fetch mentions → drop seen ids → classify → decide → record → act → mark seen → sleep.
//! One notification at a time; per-item failures are logged and never abort
//! the batch. Only a failed fetch ends a batch early.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, gauge};
use once_cell::sync::OnceCell;
use tracing::{error, info, warn};

use crate::classify::{ClassificationGateway, ClassificationResult};
use crate::config::AppConfig;
use crate::decision::{Action, Decision, DecisionPath};
use crate::dedup::DedupStore;
use crate::engine;
use crate::error::{ModerationError, Result};
use crate::ledger::InfractionLedger;
use crate::social::text::preview;
use crate::social::{Notification, SocialClient};
use crate::warning::compose_warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Processing,
}

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub notification_id: String,
    pub handle: String,
    pub action: Action,
    pub path: DecisionPath,
    pub infraction_count: u32,
    /// Effects whose API call failed.
    pub failed: Vec<Action>,
    pub marked_seen: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub fetched: usize,
    pub already_seen: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct Orchestrator {
    config: Arc<AppConfig>,
    social: Arc<dyn SocialClient>,
    gateway: ClassificationGateway,
    ledger: InfractionLedger,
    dedup: DedupStore,
    state: LoopState,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        metrics::describe_counter!(
            "moderator_notifications_total",
            "Mentions classified and decided."
        );
        metrics::describe_counter!(
            "moderator_actions_total",
            "Moderation effects issued, by action (dry runs included)."
        );
        metrics::describe_counter!(
            "moderator_action_errors_total",
            "Mute/block/warning calls that failed."
        );
        metrics::describe_counter!(
            "moderator_infractions_total",
            "Infractions written to the ledger."
        );
        metrics::describe_counter!(
            "moderator_classifier_failures_total",
            "Messages that fell back to the neutral fail-safe."
        );
        metrics::describe_gauge!("moderator_last_poll_ts", "Unix ts of the last poll.");
    });
}

impl Orchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        social: Arc<dyn SocialClient>,
        gateway: ClassificationGateway,
        ledger: InfractionLedger,
        dedup: DedupStore,
    ) -> Self {
        ensure_metrics_described();
        Self {
            config,
            social,
            gateway,
            ledger,
            dedup,
            state: LoopState::Idle,
        }
    }

    /// Open the ledger and dedup store at the configured paths.
    pub fn from_config(
        config: Arc<AppConfig>,
        social: Arc<dyn SocialClient>,
        gateway: ClassificationGateway,
    ) -> Result<Self> {
        let ledger = InfractionLedger::open(&config.infractions_file)?;
        let dedup = DedupStore::open(&config.processed_ids_file)?;
        Ok(Self::new(config, social, gateway, ledger, dedup))
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ledger(&self) -> &InfractionLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut InfractionLedger {
        &mut self.ledger
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    /// Poll until `shutdown` resolves. The signal is honoured between cycles.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let interval = self.config.poll_interval();
        loop {
            info!("checking for new notifications");
            match self.poll_once().await {
                Ok(report) if report.outcomes.is_empty() => info!("no new mentions found"),
                Ok(report) => info!(
                    fetched = report.fetched,
                    processed = report.processed(),
                    "batch drained"
                ),
                Err(e) => error!(error = %e, "poll cycle failed"),
            }

            info!(secs = interval.as_secs(), "sleeping until next poll");
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// One IDLE → PROCESSING → IDLE cycle.
    pub async fn poll_once(&mut self) -> Result<BatchReport> {
        self.state = LoopState::Processing;
        let res = self.drain().await;
        self.state = LoopState::Idle;
        gauge!("moderator_last_poll_ts").set(Utc::now().timestamp() as f64);
        res
    }

    async fn drain(&mut self) -> Result<BatchReport> {
        let mentions = self.social.fetch_mentions().await?;
        let fetched = mentions.len();

        // server order is newest first
        let mut fresh: Vec<Notification> = mentions
            .into_iter()
            .filter(|n| !self.dedup.seen(&n.id))
            .collect();
        fresh.reverse();

        let mut report = BatchReport {
            fetched,
            already_seen: fetched - fresh.len(),
            outcomes: Vec::with_capacity(fresh.len()),
        };
        if !fresh.is_empty() {
            info!(count = fresh.len(), "found new mention(s)");
        }

        for n in &fresh {
            // the same id can show up twice in one page
            if self.dedup.seen(&n.id) {
                report.already_seen += 1;
                continue;
            }
            let outcome = self.process(n).await;
            report.outcomes.push(outcome);
        }
        Ok(report)
    }

    async fn process(&mut self, n: &Notification) -> ItemOutcome {
        info!(
            notification_id = %n.id,
            handle = %n.author.handle,
            content = %preview(&n.text, 200),
            "processing mention"
        );

        let result = self.gateway.classify(&n.text).await;
        let now = Utc::now();
        let mut decision = engine::decide(&self.config.policy, &n.author, &result, &self.ledger, now);
        counter!("moderator_notifications_total").increment(1);
        self.log_decision(n, &result, &decision);

        if let Some(entry) = decision.infraction.take() {
            match self.ledger.record(&n.author.handle, entry) {
                Ok(count) => {
                    counter!("moderator_infractions_total").increment(1);
                    if count != decision.infraction_count {
                        warn!(
                            handle = %n.author.handle,
                            expected = decision.infraction_count,
                            actual = count,
                            "ledger count diverged from decision"
                        );
                    }
                }
                Err(e) => error!(
                    handle = %n.author.handle,
                    error = %e,
                    "failed to persist infraction"
                ),
            }
        }

        let failed = self.execute(n, &result, &decision).await;

        let marked_seen = match self.dedup.mark_seen(&n.id) {
            Ok(()) => true,
            Err(e) => {
                error!(notification_id = %n.id, error = %e, "failed to mark notification processed");
                false
            }
        };

        ItemOutcome {
            notification_id: n.id.clone(),
            handle: n.author.handle.clone(),
            action: decision.action,
            path: decision.path,
            infraction_count: decision.infraction_count,
            failed,
            marked_seen,
        }
    }

    fn log_decision(&self, n: &Notification, result: &ClassificationResult, d: &Decision) {
        let handle = n.author.handle.as_str();
        match d.path {
            DecisionPath::Neutral => info!(handle, "no action needed"),
            DecisionPath::LowConfidence => warn!(
                handle,
                confidence = result.confidence as f64,
                floor = self.config.policy.confidence_floor as f64,
                "low confidence, skipping action"
            ),
            DecisionPath::Allowlisted => info!(handle, "allowlisted, no action taken"),
            DecisionPath::NewAccountBlock => warn!(
                handle,
                age_days = engine::account_age_days(&n.author, Utc::now()).unwrap_or_default(),
                "new account being hostile, instant block"
            ),
            DecisionPath::Escalation if d.action == Action::None => info!(
                handle,
                count = d.infraction_count,
                "tracking infraction, no action yet"
            ),
            DecisionPath::Escalation => warn!(
                handle,
                action = %d.action,
                count = d.infraction_count,
                "escalating"
            ),
        }
    }

    /// Returns the effects that failed. A failed warning never stops the mute/block.
    async fn execute(
        &self,
        n: &Notification,
        result: &ClassificationResult,
        d: &Decision,
    ) -> Vec<Action> {
        let mut failed = Vec::new();
        let handle = n.author.handle.as_str();

        for effect in d.effects() {
            counter!("moderator_actions_total", "action" => effect.as_str()).increment(1);

            if self.config.dry_run {
                info!(handle, action = %effect, "DRY RUN: would have applied action");
                continue;
            }

            let res = match effect {
                Action::Warn => {
                    let text = compose_warning(
                        handle,
                        result.classification,
                        d.infraction_count,
                        d.action,
                    );
                    self.social
                        .send_warning(&n.status_id, &text, self.config.policy.warning_visibility)
                        .await
                }
                Action::Mute => self.social.mute(&n.author.id).await,
                Action::Block => self.social.block(&n.author.id).await,
                Action::None => Ok(()),
            };

            match res {
                Ok(()) => info!(handle, "successfully {}", effect.past_tense()),
                Err(e) => {
                    let err = ModerationError::ActionExecution {
                        action: effect,
                        target: handle.to_string(),
                        message: e.to_string(),
                    };
                    error!(error = %err, "moderation call failed");
                    counter!("moderator_action_errors_total").increment(1);
                    failed.push(effect);
                }
            }
        }
        failed
    }
}
