//! One-shot pass over every registered reminder.
//!
//! Stateless by design: an already-dry stream re-alerts on every run until
//! the reminder is removed or the stream is topped up. Periodicity is
//! external (a timer invokes the process with --check-once).

use chrono::Utc;
use tracing::{info, warn};

use crate::gauge::{GaugeReader, hours_remaining};
use crate::store::{GaugeReminder, Store};

/// Outbound message capability; Telegram in production, a capture in tests.
pub trait AlertSink {
    async fn send_alert(&self, chat_id: &str, text: &str) -> Result<(), String>;
}

/// Walks every chat and reminder in insertion order and alerts where the
/// remaining hours are at or under the threshold. A failed read or send is
/// logged and skipped; one bad gauge never blocks the rest of the run.
/// Never mutates the store. Returns the number of alerts delivered.
pub async fn run_once<R: GaugeReader, S: AlertSink>(
    store: &Store,
    reader: &R,
    sink: &S,
) -> usize {
    let now = Utc::now().timestamp();
    let mut alerts = 0;

    for (chat_id, group) in store.iter() {
        for reminder in &group.gauges {
            let data = match reader
                .reward_data(&reminder.gauge_address, &reminder.reward_token)
                .await
            {
                Ok(d) => d,
                Err(e) => {
                    warn!(
                        "skipping {} / {} in chat {chat_id}: {e}",
                        reminder.gauge_address, reminder.reward_token
                    );
                    continue;
                }
            };

            let remaining = hours_remaining(data.period_finish, now);
            if remaining > reminder.hours_before as f64 {
                continue;
            }

            let text = alert_text(reminder, remaining);
            match sink.send_alert(chat_id, &text).await {
                Ok(()) => alerts += 1,
                Err(e) => warn!("failed to alert chat {chat_id}: {e}"),
            }
        }
    }

    info!("checker pass complete, {alerts} alert(s) sent");
    alerts
}

fn alert_text(reminder: &GaugeReminder, remaining: f64) -> String {
    let status = if remaining < 0.0 {
        format!("ran dry {:.1}h ago", -remaining)
    } else {
        format!("runs dry in {remaining:.1}h")
    };
    format!(
        "{} ⚠️ the reward stream for token {} on gauge {} {} \
         (threshold {}h). Top it up: approve the token for the gauge, \
         then call deposit_reward_token.",
        reminder.user_to_ping,
        reminder.reward_token,
        reminder.gauge_address,
        status,
        reminder.hours_before,
    )
}
