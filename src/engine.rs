//! # Escalation Engine
//! Pure, testable logic that maps `(author, classification, ledger state)` → `Decision`.
//! No I/O; the caller commits `Decision::infraction` to the ledger.
//!
//! Gates, first match wins: neutral, confidence floor, allowlist, new-account
//! fast path. Anything left records an infraction and escalates by count.

use chrono::{DateTime, Utc};

use crate::classify::{Classification, ClassificationResult};
use crate::config::PolicyConfig;
use crate::decision::{Action, Decision, DecisionPath, InfractionEntry};
use crate::social::Author;

/// Read-only view of infraction counts.
pub trait InfractionView {
    /// 0 for unknown handles.
    fn count(&self, handle: &str) -> u32;
}

/// Whole days since account creation; `None` if the creation time is unknown.
pub fn account_age_days(author: &Author, now: DateTime<Utc>) -> Option<i64> {
    author
        .created_at
        .map(|created| now.signed_duration_since(created).num_days())
}

/// Unknown creation time counts as established.
pub fn is_new_account(policy: &PolicyConfig, author: &Author, now: DateTime<Utc>) -> bool {
    account_age_days(author, now).is_some_and(|age| age <= policy.new_account_days)
}

pub fn decide<L>(
    policy: &PolicyConfig,
    author: &Author,
    result: &ClassificationResult,
    ledger: &L,
    now: DateTime<Utc>,
) -> Decision
where
    L: InfractionView + ?Sized,
{
    if result.classification == Classification::Neutral {
        return Decision::skip(DecisionPath::Neutral);
    }
    if result.confidence < policy.confidence_floor {
        return Decision::skip(DecisionPath::LowConfidence);
    }
    if policy.is_allowlisted(&author.handle) {
        return Decision::skip(DecisionPath::Allowlisted);
    }

    let is_new = is_new_account(policy, author, now);
    let warn = policy.send_warnings && !(is_new && policy.new_account_no_warning);

    // Disposable accounts skip the ledger entirely.
    if is_new && policy.new_account_instant_block {
        return Decision {
            action: Action::Block,
            path: DecisionPath::NewAccountBlock,
            warn,
            infraction: None,
            infraction_count: 0,
        };
    }

    let count = ledger.count(&author.handle).saturating_add(1);
    let action = escalate(policy, result.classification, count);

    Decision {
        action,
        path: DecisionPath::Escalation,
        warn: warn && action != Action::None,
        infraction: Some(InfractionEntry::new(
            now,
            result.classification,
            result.reason.clone(),
        )),
        infraction_count: count,
    }
}

/// Severity × running count (this infraction included).
pub fn escalate(policy: &PolicyConfig, classification: Classification, count: u32) -> Action {
    match classification {
        Classification::SeverelyNegative => {
            if count >= policy.block_threshold {
                Action::Block
            } else {
                Action::Mute
            }
        }
        Classification::MildlyNegative => {
            if count >= policy.block_threshold {
                Action::Block
            } else if count >= policy.mute_threshold {
                Action::Mute
            } else {
                Action::None
            }
        }
        Classification::Neutral => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    impl InfractionView for HashMap<String, u32> {
        fn count(&self, handle: &str) -> u32 {
            self.get(handle).copied().unwrap_or(0)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn author(handle: &str, age_days: i64) -> Author {
        Author {
            id: "1".into(),
            handle: handle.into(),
            created_at: Some(now() - Duration::days(age_days)),
        }
    }

    fn res(c: Classification, conf: f32) -> ClassificationResult {
        ClassificationResult::new(c, "test", conf)
    }

    fn empty() -> HashMap<String, u32> {
        HashMap::new()
    }

    fn ledger_with(handle: &str, n: u32) -> HashMap<String, u32> {
        let mut m = HashMap::new();
        m.insert(handle.to_string(), n);
        m
    }

    const ALL: [Classification; 3] = [
        Classification::Neutral,
        Classification::MildlyNegative,
        Classification::SeverelyNegative,
    ];

    #[test]
    fn neutral_never_acts() {
        let p = PolicyConfig::default();
        let d = decide(
            &p,
            &author("a@x.social", 400),
            &res(Classification::Neutral, 1.0),
            &ledger_with("a@x.social", 10),
            now(),
        );
        assert_eq!(d.action, Action::None);
        assert_eq!(d.path, DecisionPath::Neutral);
        assert!(d.infraction.is_none());
    }

    #[test]
    fn below_floor_never_acts_nor_records() {
        let p = PolicyConfig::default();
        for c in ALL {
            for conf in [0.0, 0.3, 0.59, 0.599] {
                for age in [1, 400] {
                    let d = decide(
                        &p,
                        &author("a@x.social", age),
                        &res(c, conf),
                        &ledger_with("a@x.social", 7),
                        now(),
                    );
                    assert_eq!(d.action, Action::None, "{c} at {conf}");
                    assert!(d.infraction.is_none());
                }
            }
        }
    }

    #[test]
    fn floor_is_inclusive() {
        let p = PolicyConfig::default();
        let d = decide(
            &p,
            &author("a@x.social", 400),
            &res(Classification::SeverelyNegative, 0.6),
            &empty(),
            now(),
        );
        assert_eq!(d.action, Action::Mute);
    }

    #[test]
    fn floor_is_configurable() {
        let p = PolicyConfig {
            confidence_floor: 0.9,
            ..PolicyConfig::default()
        };
        let d = decide(
            &p,
            &author("a@x.social", 400),
            &res(Classification::SeverelyNegative, 0.85),
            &empty(),
            now(),
        );
        assert_eq!(d.path, DecisionPath::LowConfidence);
    }

    #[test]
    fn allowlisted_authors_are_never_touched() {
        let p = PolicyConfig::default().with_allowlist(["friend@mastodon.social"]);
        for c in ALL {
            for conf in [0.6, 0.8, 1.0] {
                for age in [0, 5, 400] {
                    let d = decide(
                        &p,
                        &author("Friend@mastodon.social", age),
                        &res(c, conf),
                        &ledger_with("Friend@mastodon.social", 50),
                        now(),
                    );
                    assert_eq!(d.action, Action::None);
                    assert!(d.infraction.is_none());
                    assert!(!d.warn);
                }
            }
        }
    }

    #[test]
    fn same_inputs_same_decision() {
        let p = PolicyConfig::default();
        let a = author("a@x.social", 400);
        let r = res(Classification::MildlyNegative, 0.9);
        let l = ledger_with("a@x.social", 1);
        let d1 = decide(&p, &a, &r, &l, now());
        let d2 = decide(&p, &a, &r, &l, now());
        assert_eq!(d1, d2);
    }

    #[test]
    fn severe_mutes_below_block_threshold_and_blocks_at_it() {
        let p = PolicyConfig::default();
        let a = author("a@x.social", 400);
        let r = res(Classification::SeverelyNegative, 0.95);

        let d = decide(&p, &a, &r, &ledger_with("a@x.social", 0), now());
        assert_eq!((d.action, d.infraction_count), (Action::Mute, 1));
        let d = decide(&p, &a, &r, &ledger_with("a@x.social", 1), now());
        assert_eq!((d.action, d.infraction_count), (Action::Mute, 2));
        let d = decide(&p, &a, &r, &ledger_with("a@x.social", 2), now());
        assert_eq!((d.action, d.infraction_count), (Action::Block, 3));
        let d = decide(&p, &a, &r, &ledger_with("a@x.social", 9), now());
        assert_eq!(d.action, Action::Block);
    }

    #[test]
    fn mild_is_tracked_silently_below_mute_threshold() {
        let p = PolicyConfig {
            mute_threshold: 2,
            block_threshold: 4,
            ..PolicyConfig::default()
        };
        let a = author("a@x.social", 400);
        let r = res(Classification::MildlyNegative, 0.9);

        let d = decide(&p, &a, &r, &empty(), now());
        assert_eq!(d.action, Action::None);
        assert_eq!(d.infraction_count, 1);
        assert!(d.infraction.is_some(), "still recorded");
        assert!(!d.warn, "no warning without an action");

        let d = decide(&p, &a, &r, &ledger_with("a@x.social", 1), now());
        assert_eq!(d.action, Action::Mute);
        let d = decide(&p, &a, &r, &ledger_with("a@x.social", 3), now());
        assert_eq!(d.action, Action::Block);
    }

    #[test]
    fn new_hostile_account_is_blocked_without_ledger_update() {
        let p = PolicyConfig {
            new_account_days: 30,
            new_account_instant_block: true,
            ..PolicyConfig::default()
        };
        let d = decide(
            &p,
            &author("alt@evil.example", 5),
            &res(Classification::MildlyNegative, 0.8),
            &empty(),
            now(),
        );
        assert_eq!(d.action, Action::Block);
        assert_eq!(d.path, DecisionPath::NewAccountBlock);
        assert!(d.infraction.is_none());
        assert_eq!(d.infraction_count, 0);
        assert!(!d.warn, "new_account_no_warning defaults on");
    }

    #[test]
    fn new_account_age_boundary_is_inclusive() {
        let p = PolicyConfig::default();
        let r = res(Classification::MildlyNegative, 0.8);
        let d = decide(&p, &author("a@x", 30), &r, &empty(), now());
        assert_eq!(d.path, DecisionPath::NewAccountBlock);
        let d = decide(&p, &author("a@x", 31), &r, &empty(), now());
        assert_eq!(d.path, DecisionPath::Escalation);
    }

    #[test]
    fn new_account_without_instant_block_escalates_normally() {
        let p = PolicyConfig {
            new_account_instant_block: false,
            ..PolicyConfig::default()
        };
        let d = decide(
            &p,
            &author("a@x.social", 2),
            &res(Classification::SeverelyNegative, 0.9),
            &empty(),
            now(),
        );
        assert_eq!(d.action, Action::Mute);
        assert_eq!(d.infraction_count, 1);
        assert!(!d.warn, "still a new account with no-warning set");
    }

    #[test]
    fn unknown_creation_date_counts_as_established() {
        let p = PolicyConfig::default();
        let a = Author {
            id: "9".into(),
            handle: "anon@x.social".into(),
            created_at: None,
        };
        assert!(!is_new_account(&p, &a, now()));
        let d = decide(
            &p,
            &a,
            &res(Classification::SeverelyNegative, 0.9),
            &empty(),
            now(),
        );
        assert_eq!(d.path, DecisionPath::Escalation);
    }

    #[test]
    fn warning_follows_send_warnings_flag() {
        let a = author("a@x.social", 400);
        let r = res(Classification::SeverelyNegative, 0.9);
        let on = decide(&PolicyConfig::default(), &a, &r, &empty(), now());
        assert!(on.warn);
        assert_eq!(on.effects(), vec![Action::Warn, Action::Mute]);

        let off = PolicyConfig {
            send_warnings: false,
            ..PolicyConfig::default()
        };
        let d = decide(&off, &a, &r, &empty(), now());
        assert!(!d.warn);
        assert_eq!(d.effects(), vec![Action::Mute]);
    }

    #[test]
    fn instant_block_warns_when_no_warning_flag_is_off() {
        let p = PolicyConfig {
            new_account_no_warning: false,
            ..PolicyConfig::default()
        };
        let d = decide(
            &p,
            &author("alt@x", 1),
            &res(Classification::SeverelyNegative, 0.9),
            &empty(),
            now(),
        );
        assert_eq!(d.effects(), vec![Action::Warn, Action::Block]);
    }
}
