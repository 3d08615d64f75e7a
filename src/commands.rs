//! Chat command handling. Each command is a stateless transaction against
//! the store; replies are canned strings, never raw error text.

use chrono::Utc;
use tracing::warn;

use crate::address::is_valid_address;
use crate::gauge::{GaugeReader, hours_remaining};
use crate::store::{GaugeReminder, Store, StoreError};

pub const HELP_TEXT: &str = "\
Gauge reward reminders:\n\
/add_gauge_reminder <gauge_address> <reward_token> <hours_before> <user_to_ping>\n\
/remove_gauge_reminder <gauge_address> <reward_token>\n\
/list_gauge_reminders\n\
/help\n\
\n\
An alert is sent to the chat when a reward stream has <hours_before> hours \
or less left before period_finish.";

const USAGE_ADD: &str =
    "Usage: /add_gauge_reminder <gauge_address> <reward_token> <hours_before> <user_to_ping>";
const USAGE_REMOVE: &str = "Usage: /remove_gauge_reminder <gauge_address> <reward_token>";
const MSG_INVALID_ADDRESS: &str =
    "That doesn't look like a valid address (expected 0x followed by 40 hex characters).";
const MSG_INVALID_HOURS: &str = "hours_before must be a positive whole number.";
const MSG_TOKEN_NOT_FOUND: &str = "That reward token is not configured on the gauge.";
const MSG_READ_FAILED: &str = "Could not read the gauge contract, please try again later.";
const MSG_NOTHING_TO_REMOVE: &str = "No reminders set for this chat.";
const MSG_PAIR_NOT_FOUND: &str = "No reminder found for that gauge/token pair.";
const MSG_NONE_SET: &str = "No reminders set. Use /add_gauge_reminder to create one.";

/// Dispatches one incoming message. Returns `Ok(None)` when the text is not
/// one of our commands; a store write failure aborts the command and
/// propagates with no reply.
pub async fn handle_command<R: GaugeReader>(
    store: &mut Store,
    reader: &R,
    chat_id: &str,
    text: &str,
) -> Result<Option<String>, StoreError> {
    let mut parts = text.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let Some(name) = command.strip_prefix('/') else {
        return Ok(None);
    };
    // "/list_gauge_reminders@somebot" arrives in group chats
    let name = name.split('@').next().unwrap_or(name);
    let args: Vec<&str> = parts.collect();

    let reply = match name {
        "add_gauge_reminder" => add(store, reader, chat_id, &args).await?,
        "remove_gauge_reminder" => remove(store, chat_id, &args)?,
        "list_gauge_reminders" => list(store, chat_id),
        "help" | "start" => HELP_TEXT.to_string(),
        _ => return Ok(None),
    };
    Ok(Some(reply))
}

async fn add<R: GaugeReader>(
    store: &mut Store,
    reader: &R,
    chat_id: &str,
    args: &[&str],
) -> Result<String, StoreError> {
    let &[gauge, token, hours, user] = args else {
        return Ok(USAGE_ADD.to_string());
    };
    if !is_valid_address(gauge) || !is_valid_address(token) {
        return Ok(MSG_INVALID_ADDRESS.to_string());
    }
    let hours_before = match hours.parse::<u64>() {
        Ok(h) if h > 0 => h,
        _ => return Ok(MSG_INVALID_HOURS.to_string()),
    };

    match reader.token_exists_on_gauge(gauge, token).await {
        Ok(true) => {}
        Ok(false) => return Ok(MSG_TOKEN_NOT_FOUND.to_string()),
        Err(e) => {
            warn!("token lookup on {gauge} failed: {e}");
            return Ok(MSG_READ_FAILED.to_string());
        }
    }

    // Estimate for the confirmation only; a failed read never blocks the add.
    let estimate = match reader.reward_data(gauge, token).await {
        Ok(data) => Some(hours_remaining(data.period_finish, Utc::now().timestamp())),
        Err(e) => {
            warn!("reward_data on {gauge} failed: {e}");
            None
        }
    };

    store.add_reminder(
        chat_id,
        GaugeReminder {
            gauge_address: gauge.to_string(),
            reward_token: token.to_string(),
            hours_before,
            user_to_ping: user.to_string(),
        },
    );
    store.save()?;

    Ok(match estimate {
        Some(h) => format!(
            "Reminder saved. The stream currently has {h:.1}h of rewards left; \
             {user} will be pinged when it drops to {hours_before}h."
        ),
        None => format!(
            "Reminder saved. {user} will be pinged when the stream drops to {hours_before}h."
        ),
    })
}

fn remove(store: &mut Store, chat_id: &str, args: &[&str]) -> Result<String, StoreError> {
    let &[gauge, token] = args else {
        return Ok(USAGE_REMOVE.to_string());
    };
    if !is_valid_address(gauge) || !is_valid_address(token) {
        return Ok(MSG_INVALID_ADDRESS.to_string());
    }
    if store.group(chat_id).is_none_or(|g| g.gauges.is_empty()) {
        return Ok(MSG_NOTHING_TO_REMOVE.to_string());
    }

    let removed = store.remove_matching(chat_id, gauge, token);
    if removed == 0 {
        return Ok(MSG_PAIR_NOT_FOUND.to_string());
    }
    store.save()?;
    Ok(format!("Removed {removed} reminder(s) for that pair."))
}

fn list(store: &Store, chat_id: &str) -> String {
    let Some(group) = store.group(chat_id) else {
        return MSG_NONE_SET.to_string();
    };
    if group.gauges.is_empty() {
        return MSG_NONE_SET.to_string();
    }

    let mut out = String::from("Registered reminders:\n");
    for (i, r) in group.gauges.iter().enumerate() {
        out.push_str(&format!(
            "{}. gauge {} token {} threshold {}h ping {}\n",
            i + 1,
            r.gauge_address,
            r.reward_token,
            r.hours_before,
            r.user_to_ping,
        ));
    }
    out.trim_end().to_string()
}
