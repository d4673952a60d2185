//! Request building and the concurrent fan-out/join barrier.
//!
//! One request is built per registered checker, candidates are pruned
//! through the sources predicate, empty requests are dropped (implicit
//! skip), and the survivors are dispatched to the task engine concurrently.
//! Nothing downstream observes a result until every dispatched invocation
//! has settled.

use futures::future::{join_all, try_join_all};
use tracing::debug;
use verdict_engine::{CheckRequest, EngineError, EngineResult, ExecutionOutcome, TaskEngine};

use crate::registry::CheckerRegistry;
use crate::target::{SourcesProvider, Target};

/// Build the dispatchable request set for one run.
///
/// Every registered checker gets a request built, even with zero applicable
/// candidates; requests whose candidates all fail the sources predicate are
/// then excluded, so irrelevant checkers never cost an engine call.
pub async fn build_valid_requests(
    registry: &CheckerRegistry,
    targets: &[Target],
    sources: &dyn SourcesProvider,
) -> Vec<CheckRequest> {
    let requests: Vec<CheckRequest> = registry
        .iter()
        .map(|backend| {
            let descriptor = backend.field_descriptor();
            let candidates = targets
                .iter()
                .filter(|target| descriptor.is_applicable(target))
                .map(|target| descriptor.create(target))
                .collect();
            backend.build_request(candidates)
        })
        .collect();

    let filtered = join_all(requests.into_iter().map(|request| async move {
        let mut kept = Vec::with_capacity(request.candidates.len());
        for candidate in request.candidates {
            if sources.has_sources(&candidate).await {
                kept.push(candidate);
            }
        }
        CheckRequest {
            candidates: kept,
            ..request
        }
    }))
    .await;

    filtered
        .into_iter()
        .filter(|request| {
            let keep = !request.candidates.is_empty();
            if !keep {
                debug!(checker = %request.checker_name, "no applicable candidates, skipping dispatch");
            }
            keep
        })
        .collect()
}

/// Fan the requests out to the engine and join on all of them.
///
/// A strict barrier: all requests are submitted before any result is
/// awaited, and an engine failure on any single invocation aborts the whole
/// run. There is no per-checker isolation.
pub async fn dispatch(
    engine: &dyn TaskEngine,
    requests: &[CheckRequest],
) -> EngineResult<Vec<(String, ExecutionOutcome)>> {
    try_join_all(requests.iter().map(|request| async move {
        let outcome = engine.execute(request).await?;
        Ok::<_, EngineError>((request.checker_name.clone(), outcome))
    }))
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use verdict_engine::fakes::StaticEngine;
    use verdict_engine::ProcessOutcome;

    use super::*;
    use crate::registry::ConfiguredChecker;
    use crate::target::{FieldDescriptor, NonEmptySources};

    fn registry_with(names: &[&str]) -> CheckerRegistry {
        let mut registry = CheckerRegistry::new();
        for name in names {
            registry
                .register(Arc::new(ConfiguredChecker::new(
                    *name,
                    FieldDescriptor::new(["sources"]),
                )))
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn builds_one_request_per_checker_with_sourced_candidates() {
        let registry = registry_with(&["mypy", "pytype"]);
        let targets = vec![
            Target::new("src/app:lib").with_field("sources", json!(["app.py"])),
            Target::new("src/app:empty").with_field("sources", json!([])),
        ];

        let requests = build_valid_requests(&registry, &targets, &NonEmptySources::new()).await;
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.candidates.len(), 1);
            assert_eq!(request.candidates[0].address, "src/app:lib");
        }
    }

    #[tokio::test]
    async fn checkers_without_candidates_are_excluded() {
        let mut registry = registry_with(&["mypy"]);
        registry
            .register(Arc::new(ConfiguredChecker::new(
                "scalac",
                FieldDescriptor::new(["scala_sources"]),
            )))
            .unwrap();
        let targets = vec![Target::new("src/app:lib").with_field("sources", json!(["app.py"]))];

        let requests = build_valid_requests(&registry, &targets, &NonEmptySources::new()).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].checker_name, "mypy");
    }

    #[tokio::test]
    async fn dispatch_joins_all_requests() {
        let engine = StaticEngine::new();
        engine.insert("a", vec![ProcessOutcome::new(0, "", "")]);
        engine.insert("b", vec![ProcessOutcome::new(1, "", "")]);

        let requests = vec![CheckRequest::new("a", vec![]), CheckRequest::new("b", vec![])];
        let results = dispatch(&engine, &requests).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
    }

    #[tokio::test]
    async fn engine_failure_aborts_the_whole_dispatch() {
        let engine = StaticEngine::new();
        engine.insert("a", vec![ProcessOutcome::new(0, "", "")]);
        engine.fail("b", "sandbox exploded");

        let requests = vec![CheckRequest::new("a", vec![]), CheckRequest::new("b", vec![])];
        assert!(dispatch(&engine, &requests).await.is_err());
    }
}
