use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

pub mod error;

pub use error::FetchError;

/// Observable snapshot of the current fetch session.
///
/// `data` holds the most recent successful payload and survives url changes
/// and failed attempts, so callers can keep rendering stale content until
/// something better arrives.
#[derive(Debug)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
}

impl<T> FetchState<T> {
    fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    pub fn settled(&self) -> bool {
        !self.loading
    }
}

struct SessionShared<T> {
    state: watch::Sender<FetchState<T>>,
    generation: AtomicU64,
}

/// Fetches JSON documents one url at a time and publishes session state over
/// a watch channel. Changing the url supersedes the running attempt; the
/// superseded request finishes in the background and its outcome is
/// discarded.
pub struct DataFetcher<T> {
    http: Client,
    shared: Arc<SessionShared<T>>,
    current_url: Mutex<Option<String>>,
}

impl<T> DataFetcher<T> {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(http: Client) -> Self {
        let (state, _) = watch::channel(FetchState::idle());
        Self {
            http,
            shared: Arc::new(SessionShared {
                state,
                generation: AtomicU64::new(0),
            }),
            current_url: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }

    /// Supersedes the live session without starting a new one. In-flight
    /// attempts keep running but can no longer touch the published state.
    pub fn detach(&self) {
        let mut current = self
            .current_url
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.take();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        trace!("fetch: controller detached");
    }
}

impl<T> DataFetcher<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Points the controller at `url`. A changed url starts a fresh session:
    /// the in-flight marker goes up, the failure slot clears, and whatever
    /// attempt was running is superseded. Setting the current url again is a
    /// no-op. Must be called from within a Tokio runtime.
    pub fn set_url(&self, url: impl Into<String>) {
        let url = url.into();
        let generation = {
            let mut current = self
                .current_url
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if current.as_deref() == Some(url.as_str()) {
                trace!(%url, "fetch: url unchanged, keeping live session");
                return;
            }
            *current = Some(url.clone());
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            // Publish the in-flight marker while still holding the url lock
            // so racing calls cannot reorder their session starts.
            self.shared.state.send_modify(|state| {
                state.loading = true;
                state.error = None;
            });
            generation
        };
        debug!(%url, generation, "fetch: session started");

        let http = self.http.clone();
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = fetch_json::<T>(&http, &url).await;
            settle(&shared, generation, &url, outcome);
        });
    }
}

impl<T> Drop for DataFetcher<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// One GET plus JSON decode, with the failure cause classified for display.
pub async fn fetch_json<T: DeserializeOwned>(http: &Client, url: &str) -> Result<T, FetchError> {
    let response = http.get(url).send().await.map_err(FetchError::Transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    response.json::<T>().await.map_err(FetchError::Decode)
}

fn settle<T>(
    shared: &SessionShared<T>,
    generation: u64,
    url: &str,
    outcome: Result<T, FetchError>,
) {
    let failure = match &outcome {
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    };
    // The generation check runs inside the modify closure so a newer session
    // cannot slip in between the check and the write.
    let applied = shared.state.send_if_modified(|state| {
        if shared.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        match outcome {
            Ok(value) => {
                state.data = Some(value);
                state.error = None;
            }
            Err(err) => state.error = Some(err),
        }
        state.loading = false;
        true
    });

    if !applied {
        trace!(%url, generation, "fetch: superseded attempt discarded");
    } else if let Some(message) = failure {
        warn!(%url, generation, "fetch: attempt failed: {message}");
    } else {
        debug!(%url, generation, "fetch: session settled");
    }
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
