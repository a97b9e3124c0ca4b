//! Greets members once they actually join the group.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use spotgate_telegram::{Messenger, Update, User};
use tokio::sync::Mutex;

use crate::metrics::GateMetrics;

/// Placeholder substituted with the member's display name.
pub const NAME_PLACEHOLDER: &str = "{name}";

pub const DEFAULT_TEMPLATE: &str = "Welcome, {name}!";

/// How many recent (chat, user) joins are remembered for de-duplication.
pub const RECENT_JOINS_CAPACITY: usize = 4096;

/// Bounded FIFO set of recently greeted (chat id, user id) pairs.
///
/// One join reaches the webhook twice: as a `new_chat_members` message and
/// as a `chat_member` transition. Only the first sighting is greeted.
struct RecentJoins {
    set: HashSet<(i64, i64)>,
    order: VecDeque<(i64, i64)>,
    capacity: usize,
}

impl RecentJoins {
    fn new(capacity: usize) -> Self {
        Self {
            set: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a join. Returns false if it was already seen.
    fn insert(&mut self, key: (i64, i64)) -> bool {
        if self.capacity == 0 {
            return true;
        }
        if self.set.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        self.set.insert(key);
        self.order.push_back(key);
        true
    }
}

pub struct WelcomeNotifier {
    messenger: Arc<dyn Messenger>,
    template: String,
    /// When set, updates from any other chat are ignored.
    group_chat_id: Option<i64>,
    recent: Mutex<RecentJoins>,
    metrics: Arc<GateMetrics>,
}

impl WelcomeNotifier {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        template: impl Into<String>,
        metrics: Arc<GateMetrics>,
    ) -> Self {
        Self {
            messenger,
            template: template.into(),
            group_chat_id: None,
            recent: Mutex::new(RecentJoins::new(RECENT_JOINS_CAPACITY)),
            metrics,
        }
    }

    pub fn restrict_to_chat(mut self, chat_id: i64) -> Self {
        self.group_chat_id = Some(chat_id);
        self
    }

    /// Non-bot users who joined in this update, paired with the chat they
    /// joined. Covers both `new_chat_members` service messages and
    /// `chat_member` transitions into membership.
    pub fn joined_members(&self, update: &Update) -> Vec<(i64, User)> {
        let mut joined = Vec::new();
        if let Some(message) = &update.message {
            joined.extend(
                message
                    .new_chat_members
                    .iter()
                    .map(|user| (message.chat.id, user.clone())),
            );
        }
        if let Some(change) = &update.chat_member {
            if let Some(user) = change.joined_user() {
                joined.push((change.chat.id, user.clone()));
            }
        }
        joined.retain(|(chat_id, user)| {
            !user.is_bot && self.group_chat_id.map_or(true, |group| group == *chat_id)
        });
        joined
    }

    pub fn render(&self, user: &User) -> String {
        self.template
            .replace(NAME_PLACEHOLDER, &user.display_name())
    }

    /// Send one greeting per joined member. A member already greeted through
    /// the other update kind is skipped. Delivery failures are logged and
    /// counted, never returned. Returns the number of greetings sent.
    pub async fn greet(&self, update: &Update) -> usize {
        let mut sent = 0;
        for (chat_id, user) in self.joined_members(update) {
            if !self.recent.lock().await.insert((chat_id, user.id)) {
                tracing::debug!(chat_id, user_id = user.id, "join already greeted");
                continue;
            }
            let text = self.render(&user);
            match self.messenger.send_message(chat_id, &text).await {
                Ok(()) => {
                    sent += 1;
                    self.metrics.greetings_sent.inc();
                    tracing::debug!(chat_id, user_id = user.id, "welcome sent");
                }
                Err(e) => {
                    self.metrics.greetings_failed.inc();
                    tracing::warn!(chat_id, user_id = user.id, error = %e, "welcome failed");
                }
            }
        }
        sent
    }
}
