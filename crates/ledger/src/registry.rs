//! Name based selection of the storage backend.
//!
//! Backends are registered explicitly under a parent entry, forming a small
//! static graph. Instantiating `"GoogleSheets"` below `"Repository"` looks the
//! name up among all the transitive descendants of `"Repository"`.
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use serde::Deserialize;

use crate::{
    Error, GoogleSheets, InMemory, Repository, ResultLedger,
    memory::IN_MEMORY,
    sheets::{GOOGLE_SHEETS, GoogleSheetsSettings},
};

/// Root entry every storage backend is registered below.
pub const REPOSITORY: &str = "Repository";

/// Builds a value from the arguments handed to [`Registry::instantiate`].
pub type Constructor<T, A> = fn(&A) -> ResultLedger<T>;

struct Entry<T, A> {
    parents: Vec<&'static str>,
    constructor: Option<Constructor<T, A>>,
}

/// Static registry of named constructors with explicit parent edges.
pub struct Registry<T, A> {
    entries: BTreeMap<&'static str, Entry<T, A>>,
}

impl<T, A> Default for Registry<T, A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T, A> Registry<T, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry that can be looked up below, but not built.
    pub fn register_abstract(mut self, name: &'static str, parents: &[&'static str]) -> Self {
        self.entries.insert(
            name,
            Entry {
                parents: parents.to_vec(),
                constructor: None,
            },
        );
        self
    }

    pub fn register(
        mut self,
        name: &'static str,
        parents: &[&'static str],
        constructor: Constructor<T, A>,
    ) -> Self {
        self.entries.insert(
            name,
            Entry {
                parents: parents.to_vec(),
                constructor: Some(constructor),
            },
        );
        self
    }

    /// Direct children of `name`.
    fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.parents.iter().any(|parent| *parent == name))
            .map(|(child, _)| *child)
    }

    /// All transitive descendants of `name`, without duplicates.
    ///
    /// An entry reachable through more than one parent (a diamond) is
    /// reported once.
    pub fn descendants(&self, name: &str) -> BTreeSet<&'static str> {
        let mut found = BTreeSet::new();
        let mut stack: Vec<&str> = vec![name];
        while let Some(current) = stack.pop() {
            for child in self.children(current) {
                if found.insert(child) {
                    stack.push(child);
                }
            }
        }
        found
    }

    /// Builds the descendant of `base` registered as `name`.
    pub fn instantiate(&self, base: &str, name: &str, args: &A) -> ResultLedger<T> {
        let candidates = self.descendants(base);
        let constructor = candidates
            .get(name)
            .and_then(|found| self.entries.get(found))
            .and_then(|entry| entry.constructor);

        match constructor {
            Some(constructor) => {
                tracing::info!("Instantiating {base} backend: {name}");
                constructor(args)
            }
            None => Err(Error::Configuration(format!(
                "Could not find subclass of {base} for name: {name}"
            ))),
        }
    }
}

/// Backend selection as read from the configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct BackendSettings {
    /// Registered name of the backend: `"InMemory"` or `"GoogleSheets"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    pub google_sheets: Option<GoogleSheetsSettings>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            google_sheets: None,
        }
    }
}

fn default_backend() -> String {
    IN_MEMORY.to_string()
}

/// Registry of the storage backends known to the bot.
pub fn repositories() -> Registry<Arc<dyn Repository>, BackendSettings> {
    Registry::<Arc<dyn Repository>, BackendSettings>::new()
        .register_abstract(REPOSITORY, &[])
        .register(IN_MEMORY, &[REPOSITORY], |_: &BackendSettings| {
            Ok(Arc::new(InMemory::new()) as Arc<dyn Repository>)
        })
        .register(GOOGLE_SHEETS, &[REPOSITORY], |settings: &BackendSettings| {
            let Some(sheets) = settings.google_sheets.as_ref() else {
                return Err(Error::Configuration(
                    "missing [repository.google_sheets] settings".to_string(),
                ));
            };
            let repository: Arc<dyn Repository> = Arc::new(GoogleSheets::from_settings(sheets)?);
            Ok(repository)
        })
}

/// Builds the backend named in `settings`.
pub fn new_repository(settings: &BackendSettings) -> ResultLedger<Arc<dyn Repository>> {
    repositories().instantiate(REPOSITORY, &settings.backend, settings)
}
