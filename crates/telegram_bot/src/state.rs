use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use ledger::Amount;
use serde::{Deserialize, Serialize};
use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Where a chat is in a multi-step operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversation {
    #[default]
    Idle,
    Add(AddStep),
    Show(ShowStep),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddStep {
    AwaitingAmount { date: NaiveDate },
    AwaitingDescription { date: NaiveDate, amount: Amount },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShowStep {
    AwaitingDate,
}

impl Conversation {
    /// Command that started the operation in progress.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::Add(_) => Some("add"),
            Self::Show(_) => Some("show"),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionsFile {
    chats: HashMap<String, Conversation>,
}

/// Copy of the conversations kept on disk.
struct SessionFile {
    path: PathBuf,
    saved: Mutex<SessionsFile>,
}

/// Conversation of every chat. Updates of one chat are serialized by holding
/// that chat's lock for the whole handling of the update.
///
/// Without a file the conversations live as long as the process.
#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, Arc<Mutex<Conversation>>>>>,
    file: Option<Arc<SessionFile>>,
}

impl SessionStore {
    /// Store backed by the JSON file at `path`; a missing or unreadable file
    /// starts every chat idle.
    pub(crate) fn load_or_empty(path: PathBuf) -> Self {
        let saved = read_json_file(&path).unwrap_or_default();
        let chats = saved
            .chats
            .iter()
            .filter_map(|(chat, conversation)| {
                let id = chat.parse::<i64>().ok()?;
                Some((ChatId(id), Arc::new(Mutex::new(conversation.clone()))))
            })
            .collect();
        Self {
            inner: Arc::new(Mutex::new(chats)),
            file: Some(Arc::new(SessionFile {
                path,
                saved: Mutex::new(saved),
            })),
        }
    }

    pub(crate) async fn lock(&self, chat_id: ChatId) -> OwnedMutexGuard<Conversation> {
        let slot = {
            let mut guard = self.inner.lock().await;
            guard.entry(chat_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    pub(crate) async fn get(&self, chat_id: ChatId) -> Conversation {
        self.lock(chat_id).await.clone()
    }

    /// Writes the conversation of `chat_id` to the file, if any.
    pub(crate) async fn save(
        &self,
        chat_id: ChatId,
        conversation: &Conversation,
    ) -> Result<(), std::io::Error> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let mut saved = file.saved.lock().await;
        let key = chat_id.0.to_string();
        if conversation.is_idle() {
            saved.chats.remove(&key);
        } else {
            saved.chats.insert(key, conversation.clone());
        }
        write_json_file(&file.path, &saved)
    }
}

fn read_json_file(path: &Path) -> Option<SessionsFile> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_json_file(path: &Path, sessions: &SessionsFile) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(sessions).map_err(std::io::Error::other)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

/// Source of "today".
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    /// Current date in a timezone.
    Zone(Tz),
    Fixed(NaiveDate),
}

impl Default for Clock {
    fn default() -> Self {
        Self::Zone(chrono_tz::UTC)
    }
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Self::Zone(tz) => Utc::now().with_timezone(tz).date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}
