//! Telegram client wrapper for group forwarding.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use grammers_client::client::{UpdateStream, UpdatesConfiguration};
use grammers_client::media::Media;
use grammers_client::peer::Peer;
use grammers_client::update::Update;
use grammers_client::{
    button, reply_markup, sender, Client, InputMessage, InvocationError, SenderPool, SignInError,
};
use grammers_session::storages::SqliteSession;
use grammers_session::types::PeerRef;
use grammers_session::updates::UpdatesLike;
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::transport::{AccountInfo, InboundMessage, Transport};
use super::RateLimiter;
use crate::config::TelegramConfig;
use crate::text::OutboundMessage;

pub use grammers_client::client::{LoginToken, PasswordToken};

type UpdatesReceiver = mpsc::UnboundedReceiver<UpdatesLike>;

/// Failures of the Telegram client.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("This session is not logged in")]
    NotAuthorized,

    #[error("Login failed: {0}")]
    SignInFailed(String),

    #[error("Wrong 2FA password")]
    InvalidPassword(PasswordToken),

    #[error("Telegram asked to wait {0} seconds (FLOOD_WAIT)")]
    FloodWait(u32),

    #[error("Cannot reach Telegram: {0}")]
    Connection(String),

    #[error("Cannot open session file: {0}")]
    Session(String),

    #[error("Chat {0} is not among this account's dialogs")]
    PeerNotFound(i64),

    #[error("Update stream already taken")]
    UpdatesTaken,

    #[error("Telegram request failed: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let text = err.to_string();
        match flood_wait_seconds(&text) {
            Some(seconds) => Self::FloodWait(seconds),
            None => Self::Invocation(text),
        }
    }
}

/// Parses the wait from `FLOOD_WAIT_<n>` or "flood wait <n>" error texts.
fn flood_wait_seconds(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();

    ["flood_wait_", "flood wait "].into_iter().find_map(|marker| {
        let digits: String = lowered[lowered.find(marker)? + marker.len()..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    })
}

/// Outcome of submitting a login code.
#[derive(Debug)]
pub enum SignIn {
    /// The session is logged in.
    Complete,

    /// The account has 2FA enabled; finish with [`TelegramBot::check_password`].
    PasswordNeeded(PasswordToken),
}

/// A chat the account can write to.
#[derive(Debug, Clone)]
struct KnownChat {
    peer: PeerRef,
    title: String,
}

/// grammers-backed [`Transport`] with login and chat resolution.
pub struct TelegramBot {
    client: Client,

    /// Used to quit the pool on shutdown.
    handle: sender::SenderPoolHandle,

    /// Raw updates, until [`TelegramBot::stream_updates`] takes them.
    updates: Mutex<Option<UpdatesReceiver>>,

    /// Paces outbound sends.
    rate_limiter: RateLimiter,

    /// Chats resolved from the dialog list, keyed by Bot API id.
    chats: RwLock<HashMap<i64, KnownChat>>,

    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Opens the session file and starts the sender pool.
    pub async fn connect(
        config: &TelegramConfig,
        send_interval_ms: u64,
    ) -> Result<Self, TelegramError> {
        info!("Opening session {}", config.session_path().display());

        let session = Arc::new(
            SqliteSession::open(&config.session_path())
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Sender pool running (logged in: {})", is_authorized);

        Ok(Self {
            client,
            handle: handle.thin,
            updates: Mutex::new(Some(updates)),
            rate_limiter: RateLimiter::from_millis(send_interval_ms),
            chats: RwLock::new(HashMap::new()),
            _pool_task: pool_task,
        })
    }

    /// Whether the session is already logged in.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Asks Telegram to send a login code to `phone`.
    pub async fn request_login_code(
        &self,
        phone: &str,
        api_hash: &str,
    ) -> Result<LoginToken, TelegramError> {
        info!("Sending login code to {}", mask_phone(phone));

        self.client
            .request_login_code(phone, api_hash)
            .await
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))
    }

    /// Submits the login code received in the Telegram app.
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<SignIn, TelegramError> {
        match self.client.sign_in(token, code).await {
            Ok(_) => Ok(SignIn::Complete),
            Err(SignInError::PasswordRequired(password)) => {
                debug!("Account has 2FA enabled, hint: {:?}", password.hint());
                Ok(SignIn::PasswordNeeded(password))
            }
            Err(SignInError::InvalidCode) => {
                Err(TelegramError::SignInFailed("wrong login code".to_owned()))
            }
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Completes a 2FA login.
    pub async fn check_password(
        &self,
        token: PasswordToken,
        password: &str,
    ) -> Result<(), TelegramError> {
        match self.client.check_password(token, password).await {
            Ok(_) => Ok(()),
            Err(SignInError::InvalidPassword(retry)) => Err(TelegramError::InvalidPassword(retry)),
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Reloads the dialog list into the chat cache.
    ///
    /// Returns the number of chats known afterwards.
    pub async fn refresh_chats(&self) -> Result<usize, TelegramError> {
        debug!("Loading dialogs...");

        let mut found = HashMap::new();
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await? {
            let peer = dialog.peer();
            let id = peer.id().bot_api_dialog_id();
            if let Some(peer_ref) = peer.to_ref() {
                let title = peer.name().unwrap_or_default().to_owned();
                found.insert(id, KnownChat { peer: peer_ref, title });
            }
        }

        let count = found.len();
        *self.chats.write().await = found;
        info!("Loaded {} dialogs", count);
        Ok(count)
    }

    /// Finds a chat in the cache, reloading dialogs once on a miss.
    async fn resolve(&self, chat_id: i64) -> Result<KnownChat, TelegramError> {
        if let Some(chat) = self.chats.read().await.get(&chat_id) {
            return Ok(chat.clone());
        }

        debug!("Chat {} not cached, reloading dialogs", chat_id);
        self.refresh_chats().await?;

        self.chats
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .ok_or(TelegramError::PeerNotFound(chat_id))
    }

    /// Starts the update stream. Can only be called once.
    pub async fn stream_updates(&self) -> Result<UpdateFeed, TelegramError> {
        let receiver = self
            .updates
            .lock()
            .await
            .take()
            .ok_or(TelegramError::UpdatesTaken)?;

        let stream = self
            .client
            .stream_updates(
                receiver,
                UpdatesConfiguration {
                    catch_up: false,
                    ..Default::default()
                },
            )
            .await;

        Ok(UpdateFeed { stream })
    }

    async fn deliver(&self, chat_id: i64, input: InputMessage) -> Result<(), TelegramError> {
        let chat = self.resolve(chat_id).await?;

        self.rate_limiter.wait_and_acquire().await;

        let Err(e) = self.client.send_message(chat.peer, input).await else {
            return Ok(());
        };

        let err = TelegramError::from(e);
        if let TelegramError::FloodWait(seconds) = err {
            self.rate_limiter.defer_for_flood_wait(seconds).await;
        }
        Err(err)
    }

    /// Stops the sender pool; pending requests fail afterwards.
    pub fn disconnect(&self) {
        info!("Closing Telegram connection");
        self.handle.quit();
    }
}

#[async_trait]
impl Transport for TelegramBot {
    type Media = Media;

    async fn send_message(
        &self,
        chat_id: i64,
        message: OutboundMessage<Media>,
    ) -> Result<(), TelegramError> {
        let mut input = InputMessage::new().text(message.text);

        if !message.buttons.is_empty() {
            let rows = message
                .buttons
                .iter()
                .map(|b| vec![button::url(&b.label, &b.url)])
                .collect();
            input = input.reply_markup(&reply_markup::inline(rows));
        }

        if let Some(media) = &message.media {
            input = input.copy_media(media);
        }

        self.deliver(chat_id, input).await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.deliver(chat_id, InputMessage::new().text(text)).await
    }

    async fn whoami(&self) -> Result<AccountInfo, TelegramError> {
        let request = tl::functions::users::GetUsers {
            id: vec![tl::enums::InputUser::UserSelf],
        };

        let users = self.client.invoke(&request).await?;
        match users.into_iter().next() {
            Some(tl::enums::User::User(user)) => Ok(AccountInfo {
                id: user.id,
                username: user.username,
                first_name: user.first_name.unwrap_or_default(),
            }),
            _ => {
                warn!("Could not get own user info");
                Err(TelegramError::NotAuthorized)
            }
        }
    }

    async fn chat_title(&self, chat_id: i64) -> Result<String, TelegramError> {
        let chat = self.resolve(chat_id).await?;
        if chat.title.is_empty() {
            Ok(format!("chat {chat_id}"))
        } else {
            Ok(chat.title)
        }
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Incoming messages, reduced to [`InboundMessage`]s.
pub struct UpdateFeed {
    stream: UpdateStream,
}

impl UpdateFeed {
    /// Waits for the next update.
    ///
    /// Returns `Ok(None)` for updates that are not new messages.
    pub async fn next(&mut self) -> Result<Option<InboundMessage<Media>>, TelegramError> {
        let update = self.stream.next().await?;

        let Update::NewMessage(message) = update else {
            return Ok(None);
        };

        Ok(Some(InboundMessage {
            id: message.id(),
            chat_id: message.peer_id().bot_api_dialog_id(),
            sender_id: message.sender_id().map(|id| id.bot_api_dialog_id()),
            sender_is_bot: matches!(message.sender(), Some(Peer::User(user)) if user.is_bot()),
            outgoing: message.outgoing(),
            text: message.text().to_owned(),
            media: message.media(),
        }))
    }

    /// Persists the update state so the next run resumes cleanly.
    pub fn sync_state(&mut self) {
        self.stream.sync_update_state();
    }
}

impl std::fmt::Debug for UpdateFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateFeed").finish_non_exhaustive()
    }
}

/// Keeps only the last four digits of a phone number.
fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        0..=4 => "****".to_owned(),
        n => format!("***{}", digits[n - 4..].iter().collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_is_masked() {
        assert_eq!(mask_phone("+15550001234"), "***1234");
        assert_eq!(mask_phone("+7 (999) 123-45-67"), "***4567");
        assert_eq!(mask_phone("1234"), "****");
        assert_eq!(mask_phone(""), "****");
    }

    #[test]
    fn test_flood_wait_parsed_from_rpc_errors() {
        assert_eq!(flood_wait_seconds("rpc error 420: FLOOD_WAIT_7 caused by messages.sendMessage"), Some(7));
        assert_eq!(flood_wait_seconds("FLOOD_WAIT_120"), Some(120));
        assert_eq!(flood_wait_seconds("a flood wait 60 seconds is required"), Some(60));
        assert_eq!(flood_wait_seconds("CHAT_WRITE_FORBIDDEN"), None);
        assert_eq!(flood_wait_seconds("FLOOD_WAIT_"), None);
    }
}
