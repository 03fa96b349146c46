//! Character profile generation with session caching

use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use super::completion_service::{CompletionClient, FragmentStream};
use super::session::SessionContext;
use crate::domain::cache::{CacheKey, ResponseCache};
use crate::domain::catalog::CharacterRecord;
use crate::domain::completion::{CollectedText, StreamFragment, collect_fragments};
use crate::domain::prompt::{DEFAULT_DESCRIPTION_BUDGET, PromptRequest, PromptSet};
use crate::infrastructure::observability::{
    CacheLookup, record_cache_lookup, record_degraded_result,
};

/// Streams character profiles, answering repeats from the session cache
///
/// The cache key covers the entity id and the truncated description that is
/// actually sent, so a changed biography never replays an old profile.
#[derive(Debug, Clone)]
pub struct ProfileService {
    completion: CompletionClient,
    prompts: Arc<PromptSet>,
    session: SessionContext,
    description_budget: usize,
}

impl ProfileService {
    pub fn new(completion: CompletionClient, prompts: Arc<PromptSet>, session: SessionContext) -> Self {
        Self {
            completion,
            prompts,
            session,
            description_budget: DEFAULT_DESCRIPTION_BUDGET,
        }
    }

    pub fn with_description_budget(mut self, budget: usize) -> Self {
        self.description_budget = budget;
        self
    }

    /// Profile as a stream of fragments
    ///
    /// A cache hit yields the stored text as one fragment. A miss streams from
    /// the model and stores the full text once the stream ends cleanly.
    pub fn stream_profile(&self, record: &CharacterRecord) -> FragmentStream {
        let service = self.clone();
        let request = PromptRequest::profile(record, self.description_budget);

        stream::once(async move { service.open(request).await })
            .flatten()
            .boxed()
    }

    /// Profile gathered into one text
    pub async fn generate_text(&self, record: &CharacterRecord) -> CollectedText {
        let fragments: Vec<StreamFragment> = self.stream_profile(record).collect().await;
        collect_fragments(fragments)
    }

    async fn open(self, request: PromptRequest) -> FragmentStream {
        let key = request.cache_key();

        if let Some(key) = &key {
            match self.session.cache.get(key).await {
                Ok(Some(entry)) => {
                    record_cache_lookup(CacheLookup::Hit);
                    debug!(key = %key, "Profile cache hit");
                    return stream::iter([StreamFragment::content(entry.text)]).boxed();
                }
                Ok(None) => {
                    record_cache_lookup(CacheLookup::Miss);
                    debug!(key = %key, "Profile cache miss");
                }
                Err(e) => {
                    record_cache_lookup(CacheLookup::Error);
                    warn!(key = %key, error = %e, "Profile cache lookup failed, generating");
                }
            }
        }

        let llm_request = match self.prompts.render(&request) {
            Ok(llm_request) => llm_request,
            Err(e) => {
                warn!(error = %e, "Failed to render profile prompt");
                record_degraded_result("profile");
                return stream::iter([StreamFragment::failed(e.to_string())]).boxed();
            }
        };

        let upstream = self.completion.complete_stream(llm_request);

        match key {
            Some(key) => fill_cache_on_completion(upstream, self.session.cache.clone(), key),
            None => upstream,
        }
    }
}

struct CacheFill {
    upstream: FragmentStream,
    buffer: String,
    degraded: bool,
    cache: Arc<dyn ResponseCache>,
    key: CacheKey,
}

impl CacheFill {
    async fn store(self) {
        if self.degraded {
            record_degraded_result("profile");
            debug!(key = %self.key, "Degraded profile not cached");
            return;
        }
        if self.buffer.trim().is_empty() {
            return;
        }

        match self.cache.put(&self.key, &self.buffer).await {
            Ok(()) => debug!(key = %self.key, chars = self.buffer.len(), "Profile cached"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to cache profile"),
        }
    }
}

/// Passes fragments through and caches the text once the stream is exhausted
fn fill_cache_on_completion(
    upstream: FragmentStream,
    cache: Arc<dyn ResponseCache>,
    key: CacheKey,
) -> FragmentStream {
    let state = CacheFill {
        upstream,
        buffer: String::new(),
        degraded: false,
        cache,
        key,
    };

    stream::unfold(state, |mut state| async move {
        match state.upstream.next().await {
            Some(fragment) => {
                match &fragment {
                    StreamFragment::Content { text } => state.buffer.push_str(text),
                    StreamFragment::Degraded { .. } => state.degraded = true,
                }
                Some((fragment, state))
            }
            None => {
                state.store().await;
                None
            }
        }
    })
    .boxed()
}
