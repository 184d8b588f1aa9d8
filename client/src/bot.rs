//! Telegram bot that hands out the link to the web client.
//!
//! The bot holds no game state. It long-polls `getUpdates` and answers every
//! `/start` with a button that opens the mini app.

use crate::{Error, Result};
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Message sent in reply to `/start`
pub const GREETING: &str = "💸 Card Score — tap the winner each round, no pen needed.";

/// Label of the button that opens the web client
pub const BUTTON_TEXT: &str = "Open Card Score";

/// Seconds Telegram may hold a `getUpdates` call open
const POLL_TIMEOUT_SECS: u64 = 30;

/// Request timeout; must outlive a long poll
const TIMEOUT: Duration = Duration::from_secs(POLL_TIMEOUT_SECS + 15);

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Message {
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_markup: InlineKeyboardMarkup,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub web_app: WebAppInfo,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WebAppInfo {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Whether `text` asks the bot to start (anywhere in the message, as in
/// `/start` or `/start@card_score_bot`).
pub fn is_start_command(text: &str) -> bool {
    text.contains("/start")
}

pub struct Bot {
    api_url: Url,
    http_client: HttpClient,
    webapp_url: String,
    offset: i64,
}

impl Bot {
    /// Create a bot talking to the Bot API at `api_base` (normally
    /// `https://api.telegram.org`).
    pub fn new(api_base: &str, token: &str, webapp_url: &str) -> Result<Self> {
        let base = Url::parse(api_base)?;
        match base.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }
        let api_url = base.join(&format!("bot{token}/"))?;
        let http_client = HttpClient::builder().timeout(TIMEOUT).build()?;

        Ok(Self {
            api_url,
            http_client,
            webapp_url: webapp_url.to_string(),
            offset: 0,
        })
    }

    /// Next update id the bot expects.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Reply sent to a `/start` in `chat_id`.
    pub fn start_message(&self, chat_id: i64) -> SendMessage {
        SendMessage {
            chat_id,
            text: GREETING.to_string(),
            reply_markup: InlineKeyboardMarkup {
                inline_keyboard: vec![vec![InlineKeyboardButton {
                    text: BUTTON_TEXT.to_string(),
                    web_app: WebAppInfo {
                        url: self.webapp_url.clone(),
                    },
                }]],
            },
        }
    }

    /// Fetches one batch of updates and answers them. Returns how many
    /// `/start` messages were answered.
    ///
    /// An update is acknowledged only once handled, so a `/start` whose reply
    /// fails is fetched again on the next poll.
    pub async fn poll(&mut self, timeout_secs: u64) -> Result<usize> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &GetUpdates {
                    offset: self.offset,
                    timeout: timeout_secs,
                    allowed_updates: ["message"],
                },
            )
            .await?;

        let mut answered = 0;
        for update in updates {
            let start = update
                .message
                .filter(|message| message.text.as_deref().is_some_and(is_start_command));
            if let Some(message) = start {
                let reply = self.start_message(message.chat.id);
                if let Err(err) = self.call::<_, Message>("sendMessage", &reply).await {
                    warn!(chat = message.chat.id, update = update.update_id, "reply failed");
                    return Err(err);
                }
                debug!(chat = message.chat.id, "sent web app link");
                answered += 1;
            }
            self.offset = self.offset.max(update.update_id + 1);
        }
        Ok(answered)
    }

    /// Polls forever, backing off after failures.
    pub async fn run(mut self) -> Result<()> {
        info!(webapp_url = %self.webapp_url, "bot running");
        let mut backoff = Duration::from_secs(1);
        loop {
            match self.poll(POLL_TIMEOUT_SECS).await {
                Ok(_) => backoff = Duration::from_secs(1),
                Err(err) => {
                    warn!(%err, ?backoff, "polling failed");
                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff.saturating_mul(2), MAX_BACKOFF);
                }
            }
        }
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.api_url.join(method)?;
        // Request URLs embed the token, so errors are stripped of them
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| Error::Reqwest(err.without_url()))?;
        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| Error::Reqwest(err.without_url()))?;
        match envelope {
            Envelope {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Envelope { description, .. } => Err(Error::Telegram(
                description.unwrap_or_else(|| format!("{method} failed with {status}")),
            )),
        }
    }
}
