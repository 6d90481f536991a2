//! [ReferenceService]: the single object a host talks to. It owns the current index snapshot,
//! the page cache, the match engine and the event queue, and wires them to the host's
//! providers.
use std::{ops::Range, sync::Arc};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    config::RefConfig,
    error::RefIndexError,
    event::IndexEvent,
    index::{BacklinkIndex, OrderedSet},
    inline::MatchEngine,
    page::PageCache,
    properties::{DecorationDescriptor, Edge, EnumSet, ReferenceKind, SharedPage},
    provider::{ContentProvider, MetadataProvider},
    scheduler::{Clock, Debouncer, SystemClock},
};

pub struct ReferenceService {
    config: RefConfig,
    metadata: Arc<dyn MetadataProvider>,
    content: Arc<dyn ContentProvider>,
    clock: Arc<dyn Clock>,
    index: Arc<BacklinkIndex>,
    pages: PageCache,
    engine: MatchEngine,
    debouncer: Debouncer,
    events_tx: UnboundedSender<IndexEvent>,
    events_rx: UnboundedReceiver<IndexEvent>,
    next_generation: u64,
}

impl std::fmt::Debug for ReferenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceService")
            .field("config", &self.config)
            .field("index", &self.index)
            .field("pages", &self.pages.len())
            .field("engine", &self.engine)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

fn require_path(path: &str) -> Result<(), RefIndexError> {
    if path.trim().is_empty() {
        return Err(RefIndexError::InvalidInput(
            "file path must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl ReferenceService {
    /// Create a service over the host's providers. The index starts out empty; call
    /// [ReferenceService::rebuild] or send [IndexEvent::VaultResolved] once metadata is ready.
    pub fn new(
        config: RefConfig,
        metadata: Arc<dyn MetadataProvider>,
        content: Arc<dyn ContentProvider>,
    ) -> Result<ReferenceService, RefIndexError> {
        config.validate()?;
        let engine = MatchEngine::from_config(&config)?;
        let (events_tx, events_rx) = unbounded_channel();
        Ok(ReferenceService {
            pages: PageCache::new(config.cache_ttl()),
            debouncer: Debouncer::new(config.rebuild_cooldown()),
            config,
            metadata,
            content,
            clock: Arc::new(SystemClock),
            index: Arc::new(BacklinkIndex::empty()),
            engine,
            events_tx,
            events_rx,
            next_generation: 1,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RefConfig {
        &self.config
    }

    /// Replace the configuration. Cached pages are dropped since their TTL may have changed.
    pub fn set_config(&mut self, config: RefConfig) -> Result<(), RefIndexError> {
        config.validate()?;
        self.engine = MatchEngine::from_config(&config)?;
        self.pages = PageCache::new(config.cache_ttl());
        self.debouncer = Debouncer::new(config.rebuild_cooldown());
        self.config = config;
        Ok(())
    }

    /// Compile only the recognizers for `kinds` into the match engine.
    pub fn set_enabled_kinds(&mut self, kinds: EnumSet<ReferenceKind>) -> Result<(), RefIndexError> {
        self.config.enabled_kinds = kinds;
        self.engine = MatchEngine::from_config(&self.config)?;
        Ok(())
    }

    /// The current index snapshot. Holders keep seeing it unchanged across rebuilds.
    pub fn index(&self) -> Arc<BacklinkIndex> {
        self.index.clone()
    }

    pub fn pages(&self) -> &PageCache {
        &self.pages
    }

    /// Build a fresh index snapshot and install it if it is the newest one.
    pub fn rebuild(&mut self) -> Arc<BacklinkIndex> {
        let generation = self.next_generation;
        self.next_generation += 1;
        let candidate = BacklinkIndex::build(self.metadata.as_ref(), generation, self.clock.now());
        if candidate.supersedes(&self.index) {
            self.index = Arc::new(candidate);
        } else {
            tracing::warn!(
                "[ReferenceService::rebuild] discarding {}: older than installed {}",
                candidate,
                self.index
            );
        }
        self.index.clone()
    }

    pub fn lookup(&self, key: &str) -> &[Edge] {
        self.index.lookup(key)
    }

    pub fn get_page(&mut self, path: &str) -> Result<SharedPage, RefIndexError> {
        require_path(path)?;
        let now = self.clock.now();
        Ok(self
            .pages
            .get_page(path, &self.index, self.metadata.as_ref(), now))
    }

    /// Decorations for `path` within the half-open `viewport`. Without an explicit viewport
    /// the host's reported viewport is used, falling back to the whole file (end included).
    pub fn compute_decorations(
        &mut self,
        path: &str,
        viewport: Option<Range<usize>>,
    ) -> Result<Vec<DecorationDescriptor>, RefIndexError> {
        require_path(path)?;
        let text = match self.content.content(path) {
            Ok(text) => text,
            Err(err) if err.is_missing_data() => {
                tracing::debug!(
                    "[ReferenceService::compute_decorations] no content for {}: {}",
                    path,
                    err
                );
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        let window = viewport
            .or_else(|| self.content.viewport(path))
            .unwrap_or(0..text.len() + 1);
        let page = self.get_page(path)?;
        Ok(self
            .engine
            .compute(&text, window, &page, self.index.resolver()))
    }

    pub fn event_sender(&self) -> UnboundedSender<IndexEvent> {
        self.events_tx.clone()
    }

    pub fn notify(&self, event: IndexEvent) -> Result<(), RefIndexError> {
        self.events_tx.send(event)?;
        Ok(())
    }

    /// Events absorbed by the rebuild debouncer since it last fired.
    pub fn absorbed_events(&self) -> usize {
        self.debouncer.absorbed()
    }

    /// Drain queued events. Affected pages are evicted, index events feed the debouncer and
    /// at most one rebuild runs for the whole batch. Returns the files needing a new match
    /// pass, first-seen order.
    pub fn process_events(&mut self) -> Vec<String> {
        let now = self.clock.now();
        let mut needs_rebuild =
            self.config.rebuild_after_burst && self.debouncer.take_settled(now);
        let mut rematch = OrderedSet::new();

        while let Ok(event) = self.events_rx.try_recv() {
            tracing::debug!("[ReferenceService::process_events] {}", event);
            for path in event.evicted_paths() {
                self.pages.invalidate(path);
            }
            if event.triggers_rebuild() && self.debouncer.trigger(now) {
                needs_rebuild = true;
            }
            if let Some(path) = event.rematch_path() {
                rematch.insert(path.to_string());
            }
        }

        if needs_rebuild {
            let index = self.rebuild();
            tracing::info!("[ReferenceService::process_events] rebuilt {}", index);
        }
        rematch.into_vec()
    }
}
