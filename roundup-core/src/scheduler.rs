use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use roundup_aggregator::DateRange;
use roundup_common::domain::{Bank, User};
use roundup_common::time::{clamp_before, first_day_of_month};
use roundup_common::Result;
use roundup_store::Store;

use crate::worker::{IntakeWorker, WorkItem, WorkOutcome};

/// Default concurrency cap on intake workers (§5 "hard concurrency cap of 10").
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Builds a work item for one user, or returns `None` when the user
/// should be skipped this pass (§4.9). Pure and deterministic given
/// `now`/`month`, so the selection logic is testable without I/O.
fn select_work_item(
    user: &User,
    bank: &Bank,
    now: &str,
    month: &str,
    override_gte: Option<&str>,
    override_lte: Option<&str>,
) -> Option<WorkItem> {
    let pledge = user.active_pledge()?;

    if user.latest_roundup_date.as_deref() == Some(now) {
        return None;
    }

    let address = pledge.addresses.get(month)?.clone();
    let aggregator_token = user.aggregator_tokens.get(&bank.bank_type)?.clone();

    let gte = override_gte
        .map(str::to_string)
        .or_else(|| user.latest_roundup_date.clone())
        .unwrap_or_else(|| first_day_of_month(now).unwrap_or_else(|| now.to_string()));
    let gte = clamp_before(&gte, now);
    let lte = override_lte.map(|lte| clamp_before(lte, now));

    Some(WorkItem {
        user_id: user.id.clone(),
        address,
        aggregator_token,
        monthly_limit: pledge.monthly_limit,
        bank_type: bank.bank_type.clone(),
        date_range: DateRange { gte, lte },
    })
}

/// Selects eligible users, builds their work items, and fans them out
/// to bounded-concurrency intake workers (C9).
pub struct Scheduler {
    store: Arc<dyn Store>,
    worker: Arc<IntakeWorker>,
    concurrency: usize,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, worker: Arc<IntakeWorker>, concurrency: usize) -> Self {
        Self {
            store,
            worker,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs one scheduling pass. `override_gte`/`override_lte` let an
    /// operator widen or narrow the fetched window for a single
    /// invocation (§4.9 "caller.gte", "caller.lte").
    pub async fn run(&self, override_gte: Option<String>, override_lte: Option<String>) -> Result<()> {
        let now = roundup_common::time::today();
        let month = roundup_common::time::current_month();
        let users = self.store.list_active_users().await?;
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let mut handles = Vec::with_capacity(users.len());

        for user in users {
            let Some(pledge) = user.active_pledge() else {
                continue;
            };

            let bank = match self.store.get_bank(&pledge.bank_id).await {
                Ok(Some(bank)) => bank,
                Ok(None) => {
                    warn!(target: "roundup_core::scheduler", user_id = %user.id, bank_id = %pledge.bank_id, "bank not found, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(target: "roundup_core::scheduler", user_id = %user.id, error = %e, "failed to look up bank, skipping");
                    continue;
                }
            };

            let Some(item) = select_work_item(
                &user,
                &bank,
                &now,
                &month,
                override_gte.as_deref(),
                override_lte.as_deref(),
            ) else {
                info!(target: "roundup_core::scheduler", user_id = %user.id, "not eligible this pass, skipping");
                continue;
            };

            let store = Arc::clone(&self.store);
            let worker = Arc::clone(&self.worker);
            let permit = Arc::clone(&semaphore);
            let run_date = now.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore is never closed");
                let outcome = worker.run(item.clone()).await;
                if matches!(outcome, WorkOutcome::Enqueued) {
                    if let Err(e) = store.set_latest_roundup_date(&item.user_id, &run_date).await {
                        warn!(target: "roundup_core::scheduler", user_id = %item.user_id, error = %e, "failed to persist latestRoundupDate");
                    }
                }
                outcome
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        self.store.record_run("roundup", &now).await?;
        info!(target: "roundup_core::scheduler", "scheduling pass complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use roundup_common::domain::Pledge;
    use rust_decimal_macros::dec;

    fn bank() -> Bank {
        Bank {
            id: "bank-1".to_string(),
            bank_type: "chase".to_string(),
        }
    }

    fn user(latest_roundup_date: Option<&str>, address_month: &str) -> User {
        let mut addresses = HashMap::new();
        addresses.insert(address_month.to_string(), "addr-1".to_string());

        let mut aggregator_tokens = HashMap::new();
        aggregator_tokens.insert("chase".to_string(), "token-1".to_string());

        User {
            id: "user-1".to_string(),
            active: true,
            latest_roundup_date: latest_roundup_date.map(str::to_string),
            pledges: vec![Pledge {
                active: true,
                bank_id: "bank-1".to_string(),
                npo_id: "npo-1".to_string(),
                monthly_limit: dec!(-500),
                addresses,
            }],
            aggregator_tokens,
            aggregator_accounts: HashMap::new(),
        }
    }

    #[test]
    fn skips_a_user_already_run_today() {
        let u = user(Some("2026-07-28"), "2026-07");
        let item = select_work_item(&u, &bank(), "2026-07-28", "2026-07", None, None);
        assert!(item.is_none());
    }

    #[test]
    fn skips_a_user_with_no_address_for_the_current_month() {
        let u = user(None, "2026-06");
        let item = select_work_item(&u, &bank(), "2026-07-28", "2026-07", None, None);
        assert!(item.is_none());
    }

    #[test]
    fn skips_a_user_with_no_aggregator_token_for_the_bank_type() {
        let mut u = user(None, "2026-07");
        u.aggregator_tokens.clear();
        let item = select_work_item(&u, &bank(), "2026-07-28", "2026-07", None, None);
        assert!(item.is_none());
    }

    #[test]
    fn builds_a_work_item_defaulting_gte_to_first_of_month() {
        let u = user(None, "2026-07");
        let item = select_work_item(&u, &bank(), "2026-07-28", "2026-07", None, None).unwrap();
        assert_eq!(item.address, "addr-1");
        assert_eq!(item.aggregator_token, "token-1");
        assert_eq!(item.bank_type, "chase");
        assert_eq!(item.date_range.gte, "2026-07-01");
        assert_eq!(item.date_range.lte, None);
    }

    #[test]
    fn gte_falls_back_to_latest_roundup_date_when_present() {
        let u = user(Some("2026-07-10"), "2026-07");
        let item = select_work_item(&u, &bank(), "2026-07-28", "2026-07", None, None).unwrap();
        assert_eq!(item.date_range.gte, "2026-07-10");
    }

    #[test]
    fn caller_overrides_take_precedence_and_are_clamped() {
        let u = user(None, "2026-07");
        let item = select_work_item(
            &u,
            &bank(),
            "2026-07-28",
            "2026-07",
            Some("2026-07-28"),
            Some("2026-08-05"),
        )
        .unwrap();
        assert_eq!(item.date_range.gte, "2026-07-27");
        assert_eq!(item.date_range.lte, Some("2026-07-27".to_string()));
    }
}
