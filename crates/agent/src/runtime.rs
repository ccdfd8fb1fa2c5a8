use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};
use taskroute_core::{
    AgentStatus, CacheStats, ClassificationResult, Config, Error, PerformanceMode, Result,
    TaskResponse, ToolInfo,
};
use taskroute_tools::ToolRegistry;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{cache_key, CacheManager};
use crate::dispatcher::ToolDispatcher;
use crate::intent::IntentClassifier;
use crate::mode::PerformanceModeController;

/// Routes tasks to tools or the general responder, memoizing results per
/// performance mode.
///
/// Owns its tool registry, cache and mode controller; two agents never share
/// state. `initialize` must run before `process_task`.
pub struct Agent {
    config: Config,
    dispatcher: ToolDispatcher,
    classifier: OnceLock<IntentClassifier>,
    modes: RwLock<PerformanceModeController>,
    cache: Arc<CacheManager>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Agent {
    pub fn new(config: Config, tools: ToolRegistry) -> Self {
        let modes = PerformanceModeController::new(
            config.modes.clone(),
            config.agent.default_mode,
            config.classifier.similarity_threshold,
        );
        Self {
            dispatcher: ToolDispatcher::new(tools),
            classifier: OnceLock::new(),
            modes: RwLock::new(modes),
            cache: Arc::new(CacheManager::new()),
            sweeper: Mutex::new(None),
            config,
        }
    }

    /// Agent with the built-in tools enabled in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let tools = ToolRegistry::with_defaults(&config)?;
        Ok(Self::new(config, tools))
    }

    /// Resolve classifier patterns and start the cache sweeper. Idempotent.
    pub async fn initialize(&self) -> Result<()> {
        if self.classifier.get().is_none() {
            let classifier = IntentClassifier::new(self.dispatcher.tools().descriptors())?;
            // A concurrent initialize may have won; either classifier is equivalent.
            let _ = self.classifier.set(classifier);
            info!(
                tools = self.dispatcher.tools().len(),
                mode = %self.performance_mode()?,
                "Agent initialized"
            );
        }
        self.start_sweeper()
    }

    fn start_sweeper(&self) -> Result<()> {
        let secs = self.config.agent.sweep_interval_secs;
        if secs == 0 {
            return Ok(());
        }
        let mut slot = self
            .sweeper
            .lock()
            .map_err(|_| Error::Internal("sweeper lock poisoned".to_string()))?;
        if slot.is_some() {
            return Ok(());
        }

        let weak = Arc::downgrade(&self.cache);
        let period = Duration::from_secs(secs);
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                match cache.sweep_expired() {
                    Ok(0) => {}
                    Ok(n) => debug!(removed = n, "Swept expired cache entries"),
                    Err(e) => warn!(error = %e, "Cache sweep failed"),
                }
            }
        }));
        debug!(interval_secs = secs, "Cache sweeper started");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.classifier.get().is_some()
    }

    fn classifier(&self) -> Result<&IntentClassifier> {
        self.classifier.get().ok_or_else(|| {
            Error::Uninitialized("call initialize() before processing tasks".to_string())
        })
    }

    pub async fn process_task(&self, query: &str) -> Result<TaskResponse> {
        let started = Instant::now();
        let classifier = self.classifier()?;

        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("task must be a non-empty string".to_string()));
        }

        let snapshot = self
            .modes
            .read()
            .map_err(|_| Error::Internal("mode lock poisoned".to_string()))?
            .snapshot();
        let mode = snapshot.config.mode;
        let key = cache_key(query, mode);

        if let Some(result) = self.cache.get(&key)? {
            debug!(mode = %mode, "Cache hit");
            return Ok(TaskResponse {
                result,
                processing_time_ms: started.elapsed().as_millis() as u64,
                cached: true,
            });
        }

        let classification = classifier.classify(query, snapshot.strategy.as_ref());
        debug!(
            mode = %mode,
            intent = ?classification.intent,
            tool = classification.tool_name.as_deref().unwrap_or("-"),
            "Cache miss, dispatching"
        );

        let result = match self
            .dispatcher
            .dispatch(&classification, query, &snapshot.config)
            .await
        {
            Ok(output) => {
                let ttl = Duration::from_secs(self.config.agent.cache_ttl_secs);
                self.cache.set(&key, &output, ttl)?;
                output
            }
            Err(Error::Execution { tool, detail }) => {
                warn!(tool = %tool, detail = %detail, "Tool execution failed");
                format!("Sorry, {} could not complete the request: {}", tool, detail)
            }
            Err(e) => return Err(e),
        };

        Ok(TaskResponse {
            result,
            processing_time_ms: started.elapsed().as_millis() as u64,
            cached: false,
        })
    }

    /// Classify under the current mode without dispatching or touching the cache.
    pub fn classify(&self, query: &str) -> Result<ClassificationResult> {
        let classifier = self.classifier()?;
        let strategy = self
            .modes
            .read()
            .map_err(|_| Error::Internal("mode lock poisoned".to_string()))?
            .strategy();
        Ok(classifier.classify(query, strategy.as_ref()))
    }

    /// Switch modes for subsequent calls. Returns the previous mode.
    pub fn set_performance_mode(&self, mode: PerformanceMode) -> Result<PerformanceMode> {
        let mut modes = self
            .modes
            .write()
            .map_err(|_| Error::Internal("mode lock poisoned".to_string()))?;
        Ok(modes.set_mode(mode))
    }

    pub fn performance_mode(&self) -> Result<PerformanceMode> {
        self.modes
            .read()
            .map(|m| m.mode())
            .map_err(|_| Error::Internal("mode lock poisoned".to_string()))
    }

    pub fn status(&self) -> Result<AgentStatus> {
        Ok(AgentStatus {
            initialized: self.is_initialized(),
            performance_mode: self.performance_mode()?,
            tools_count: self.dispatcher.tools().len(),
        })
    }

    pub fn tools_info(&self) -> Vec<ToolInfo> {
        self.dispatcher.tools().tools_info()
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()?;
        info!("Cache cleared");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        if let Ok(slot) = self.sweeper.get_mut() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskroute_core::{CapabilityDescriptor, Intent};
    use taskroute_tools::CapabilityProvider;

    struct MockPokemon {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CapabilityProvider for MockPokemon {
        fn descriptor(&self) -> CapabilityDescriptor {
            CapabilityDescriptor::new(
                "pokemon_info",
                "Look up Pokemon species data: types, abilities, base stats, height and weight.",
            )
            .with_aliases(["pikachu"])
        }

        async fn execute(&self, query: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.to_lowercase().contains("missingno") {
                return Err(Error::execution("pokemon_info", "Pokemon 'missingno' not found"));
            }
            Ok(format!("mock:{}", query))
        }
    }

    fn agent_with(config: Config) -> (Agent, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tools = ToolRegistry::new();
        tools
            .register(Arc::new(MockPokemon { calls: Arc::clone(&calls) }))
            .unwrap();
        (Agent::new(config, tools), calls)
    }

    fn config(mode: PerformanceMode) -> Config {
        let mut config = Config::default();
        config.agent.default_mode = mode;
        config.agent.sweep_interval_secs = 0;
        config
    }

    async fn ready(mode: PerformanceMode) -> (Agent, Arc<AtomicUsize>) {
        let (agent, calls) = agent_with(config(mode));
        agent.initialize().await.unwrap();
        (agent, calls)
    }

    #[tokio::test]
    async fn test_uninitialized_is_rejected_before_cache() {
        let (agent, calls) = agent_with(config(PerformanceMode::Balanced));
        let err = agent.process_task("Tell me about Pikachu").await.unwrap_err();
        assert!(matches!(err, Error::Uninitialized(_)));
        assert_eq!(agent.cache_stats().unwrap(), CacheStats::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!agent.status().unwrap().initialized);
    }

    #[tokio::test]
    async fn test_blank_query_is_validation_error() {
        let (agent, _) = ready(PerformanceMode::Balanced).await;
        for q in ["", "   ", "\n\t"] {
            let err = agent.process_task(q).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert_eq!(agent.cache_stats().unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_repeat_query_is_served_from_cache() {
        let (agent, calls) = ready(PerformanceMode::Balanced).await;
        let first = agent.process_task("Tell me about Pikachu").await.unwrap();
        let second = agent.process_task("Tell me about Pikachu").await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.result, second.result);
        assert_eq!(first.result, "mock:Tell me about Pikachu");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = agent.cache_stats().unwrap();
        assert_eq!((stats.hits, stats.misses, stats.keys), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_classification_routes() {
        let (agent, calls) = ready(PerformanceMode::Balanced).await;

        let tool = agent.classify("Tell me about Pikachu").unwrap();
        assert_eq!(tool.intent, Intent::Tool);
        assert_eq!(tool.tool_name.as_deref(), Some("pokemon_info"));

        let general = agent.classify("What is machine learning?").unwrap();
        assert_eq!(general.intent, Intent::General);

        let resp = agent.process_task("What is machine learning?").await.unwrap();
        assert!(resp.result.starts_with("Machine learning is a topic"));
        assert!(resp.result.len() >= 20);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_modes_partition_the_cache() {
        let (agent, calls) = ready(PerformanceMode::Fast).await;
        let q = "Tell me about Pikachu";

        assert!(!agent.process_task(q).await.unwrap().cached);
        assert_eq!(
            agent.set_performance_mode(PerformanceMode::Quality).unwrap(),
            PerformanceMode::Fast
        );
        assert!(!agent.process_task(q).await.unwrap().cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(agent.cache_stats().unwrap().keys, 2);

        agent.set_performance_mode(PerformanceMode::Fast).unwrap();
        assert!(agent.process_task(q).await.unwrap().cached);
    }

    #[tokio::test]
    async fn test_general_answers_depend_on_mode() {
        let (agent, _) = ready(PerformanceMode::Fast).await;
        let q = "What is machine learning?";
        let fast = agent.process_task(q).await.unwrap();
        agent.set_performance_mode(PerformanceMode::Quality).unwrap();
        let quality = agent.process_task(q).await.unwrap();
        assert!(!quality.cached);
        assert!(quality.result.len() > fast.result.len());
    }

    #[tokio::test]
    async fn test_mode_switch_does_not_clear_cache() {
        let (agent, _) = ready(PerformanceMode::Balanced).await;
        agent.process_task("Tell me about Pikachu").await.unwrap();
        agent.set_performance_mode(PerformanceMode::Quality).unwrap();
        assert_eq!(agent.cache_stats().unwrap().keys, 1);
    }

    #[tokio::test]
    async fn test_quality_similarity_vs_fast_general() {
        let q = "Which abilities and base stats does that electric creature have?";

        let (fast, fast_calls) = ready(PerformanceMode::Fast).await;
        assert_eq!(fast.classify(q).unwrap().intent, Intent::General);
        fast.process_task(q).await.unwrap();
        assert_eq!(fast_calls.load(Ordering::SeqCst), 0);

        let (quality, quality_calls) = ready(PerformanceMode::Quality).await;
        let routed = quality.classify(q).unwrap();
        assert_eq!(routed.tool_name.as_deref(), Some("pokemon_info"));
        let resp = quality.process_task(q).await.unwrap();
        assert_eq!(resp.result, format!("mock:{}", q));
        assert_eq!(quality_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execution_error_is_rendered_and_not_cached() {
        let (agent, calls) = ready(PerformanceMode::Balanced).await;
        let q = "Tell me about pikachu and missingno";

        let first = agent.process_task(q).await.unwrap();
        assert!(!first.cached);
        assert_eq!(
            first.result,
            "Sorry, pokemon_info could not complete the request: Pokemon 'missingno' not found"
        );
        assert_eq!(agent.cache_stats().unwrap().keys, 0);

        let second = agent.process_task(q).await.unwrap();
        assert!(!second.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_resets_stats() {
        let (agent, _) = ready(PerformanceMode::Balanced).await;
        agent.process_task("Tell me about Pikachu").await.unwrap();
        agent.process_task("Tell me about Pikachu").await.unwrap();
        agent.clear_cache().unwrap();

        assert_eq!(agent.cache_stats().unwrap(), CacheStats::default());
        assert!(!agent.process_task("Tell me about Pikachu").await.unwrap().cached);
    }

    #[tokio::test]
    async fn test_hits_plus_misses_counts_cache_lookups() {
        let (agent, _) = ready(PerformanceMode::Balanced).await;
        let queries = ["hello", "Tell me about Pikachu", "hello", "HELLO ", "What is rust?"];
        for q in queries {
            agent.process_task(q).await.unwrap();
        }
        let _ = agent.process_task("   ").await;

        let stats = agent.cache_stats().unwrap();
        assert_eq!(stats.hits + stats.misses, queries.len() as u64);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_entries_expire() {
        let mut cfg = config(PerformanceMode::Balanced);
        cfg.agent.cache_ttl_secs = 0;
        let (agent, calls) = agent_with(cfg);
        agent.initialize().await.unwrap();

        agent.process_task("Tell me about Pikachu").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let again = agent.process_task("Tell me about Pikachu").await.unwrap();

        assert!(!again.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_agents_do_not_share_state() {
        let (a, _) = ready(PerformanceMode::Balanced).await;
        let (b, _) = ready(PerformanceMode::Balanced).await;
        a.process_task("Tell me about Pikachu").await.unwrap();

        assert!(!b.process_task("Tell me about Pikachu").await.unwrap().cached);
        a.set_performance_mode(PerformanceMode::Fast).unwrap();
        assert_eq!(b.performance_mode().unwrap(), PerformanceMode::Balanced);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent_and_status() {
        let mut cfg = config(PerformanceMode::Quality);
        cfg.agent.sweep_interval_secs = 60;
        let (agent, _) = agent_with(cfg);
        agent.initialize().await.unwrap();
        agent.initialize().await.unwrap();

        let status = agent.status().unwrap();
        assert!(status.initialized);
        assert_eq!(status.performance_mode, PerformanceMode::Quality);
        assert_eq!(status.tools_count, 1);
        assert!(agent.sweeper.lock().unwrap().is_some());

        let tools = agent.tools_info();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "pokemon_info");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_entries() {
        let mut cfg = config(PerformanceMode::Balanced);
        cfg.agent.sweep_interval_secs = 1;
        cfg.agent.cache_ttl_secs = 0;
        let (agent, _) = agent_with(cfg);
        agent.initialize().await.unwrap();

        agent.process_task("Tell me about Pikachu").await.unwrap();
        assert_eq!(agent.cache().keys().unwrap().len(), 1);
        let before = agent.cache_stats().unwrap();

        // Entry age is measured on the wall clock, which paused tokio time does not move.
        std::thread::sleep(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;

        assert!(agent.cache().keys().unwrap().is_empty());
        let after = agent.cache_stats().unwrap();
        assert_eq!((after.hits, after.misses), (before.hits, before.misses));
        assert_eq!(after.keys, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_sweeper() {
        let mut cfg = config(PerformanceMode::Balanced);
        cfg.agent.sweep_interval_secs = 1;
        let (agent, _) = agent_with(cfg);
        agent.initialize().await.unwrap();

        let handle = agent
            .sweeper
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| h.abort_handle())
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!handle.is_finished());

        drop(agent);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());
    }
}
