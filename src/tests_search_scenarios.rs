#[cfg(test)]
mod tests {
    use crate::backend::{TotalHits, TotalRelation};
    use crate::error::SearchError;
    use crate::index::{IndexManager, IndexState, PollSettings};
    use crate::search::{
        DocumentResult, FilterValue, MatchType, SearchEngine, SearchMode, SearchOptions, SmartOptions,
        SortBy, SortOrder, TypoTolerance,
    };
    use crate::service::SearchService;
    use crate::testing::{FakeBackend, FakeSemantic, StaticSynonyms};
    use crate::EngineConfig;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn fields() -> Vec<String> {
        vec!["title".to_string(), "body".to_string()]
    }

    fn seeded(count: usize) -> Arc<FakeBackend> {
        let backend = Arc::new(FakeBackend::new());
        for i in 0..count {
            backend.add_document(
                "questions",
                &format!("q{:03}", i),
                json!({ "title": format!("Question {}", i), "likeCount": i }),
            );
        }
        backend
    }

    #[tokio::test]
    async fn semantic_requested_but_model_not_deployed_still_returns_hits() {
        let backend = seeded(3);
        let engine = SearchEngine::new(backend.clone()).with_semantic(Arc::new(FakeSemantic::deployed(false)));
        let options = SearchOptions {
            smart_search: true,
            smart_options: SmartOptions {
                linguistic: false,
                semantic: true,
            },
            ..Default::default()
        };

        let result: DocumentResult = engine.search("questions", &fields(), "question", &options).await.unwrap();
        assert!(!result.hits.is_empty());
        assert!(result.semantic_unavailable());
        assert_eq!(
            serde_json::to_value(&result).unwrap()["warnings"],
            json!({ "semanticSearchUnavailable": true })
        );
        // no semantic clauses reached the engine
        assert!(!backend.last_search().unwrap().to_string().contains("text_expansion"));
    }

    #[tokio::test]
    async fn semantic_clauses_sent_when_model_deployed() {
        let backend = seeded(1);
        let engine = SearchEngine::new(backend.clone()).with_semantic(Arc::new(FakeSemantic::deployed(true)));
        let options = SearchOptions {
            smart_search: true,
            smart_options: SmartOptions {
                linguistic: false,
                semantic: true,
            },
            ..Default::default()
        };

        let result: DocumentResult = engine.search("questions", &fields(), "question", &options).await.unwrap();
        assert!(result.warnings.is_none());
        let body = backend.last_search().unwrap().to_string();
        assert!(body.contains("title.semantic"));
        assert!(body.contains("body.semantic"));
    }

    #[tokio::test]
    async fn absent_index_is_created_exactly_once() {
        let backend = Arc::new(FakeBackend::new());
        let manager = IndexManager::new(
            backend.clone(),
            "en",
            PollSettings {
                attempts: 1,
                delay: Duration::from_millis(1),
            },
        );

        for _ in 0..3 {
            manager.ensure_index_exists("questions", &fields()).await.unwrap();
        }
        assert_eq!(backend.create_calls("questions"), 1);
        assert_eq!(manager.state("questions").await, IndexState::Exists);
    }

    #[tokio::test]
    async fn concurrent_ensure_creates_once() {
        let backend = Arc::new(FakeBackend::new());
        let manager = Arc::new(IndexManager::new(
            backend.clone(),
            "en",
            PollSettings {
                attempts: 0,
                delay: Duration::ZERO,
            },
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let fields = vec!["title".to_string()];
                manager.ensure_index_exists("answers", &fields).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(backend.create_calls("answers"), 1);
    }

    #[tokio::test]
    async fn all_words_two_fields_should_with_and_clauses() {
        let backend = seeded(0);
        let engine = SearchEngine::new(backend.clone());
        let options = SearchOptions {
            search_mode: SearchMode::AllWords,
            ..Default::default()
        };

        let _: DocumentResult = engine.search("questions", &fields(), "hello world", &options).await.unwrap();
        let body = backend.last_search().unwrap();
        let text = &body["query"]["bool"]["must"][0]["function_score"]["query"]["bool"];
        assert_eq!(text["minimum_should_match"], 1);
        let should = text["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(should[0]["match"]["title"]["operator"], "and");
        assert_eq!(should[1]["match"]["body"]["operator"], "and");
        assert_eq!(should[0]["match"]["title"]["boost"], 3.0);
        assert_eq!(should[1]["match"]["body"]["boost"], 2.0);
    }

    #[tokio::test]
    async fn excluded_ids_never_returned() {
        let backend = seeded(5);
        let engine = SearchEngine::new(backend.clone());
        let options = SearchOptions {
            exclude_ids: vec!["q001".to_string(), "q003".to_string()],
            ..Default::default()
        };

        let result: DocumentResult = engine.search("questions", &fields(), "question", &options).await.unwrap();
        let ids: Vec<&str> = result.hits.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["q000", "q002", "q004"]);
        assert_eq!(result.total, 3);
    }

    #[tokio::test]
    async fn paging_metadata() {
        let backend = seeded(25);
        let engine = SearchEngine::new(backend.clone());
        let options = SearchOptions {
            page: 3,
            limit: 10,
            ..Default::default()
        };

        let result: DocumentResult = engine.search("questions", &fields(), "", &options).await.unwrap();
        assert_eq!(result.total, 25);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.page, 3);
        assert_eq!(result.hits.len(), 5);
        assert_eq!(result.hits[0].id, "q020");
        assert!(result.hits.len() <= result.limit as usize);
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped() {
        let backend = seeded(150);
        let engine = SearchEngine::new(backend.clone());
        let options = SearchOptions {
            limit: 500,
            ..Default::default()
        };

        let result: DocumentResult = engine.search("questions", &fields(), "", &options).await.unwrap();
        assert_eq!(result.limit, 100);
        assert_eq!(result.hits.len(), 100);
        assert_eq!(result.total_pages, 2);
    }

    #[tokio::test]
    async fn lower_bound_totals_are_flagged() {
        let backend = seeded(2);
        backend.override_total(TotalHits {
            value: 10_000,
            relation: TotalRelation::Gte,
        });
        let engine = SearchEngine::new(backend.clone());

        let result: DocumentResult = engine
            .search("questions", &fields(), "", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.total, 10_000);
        assert!(!result.total_is_exact);
        assert_eq!(result.total_pages, 1_000);
    }

    #[tokio::test]
    async fn filters_sort_and_synonyms_reach_the_engine() {
        let backend = seeded(1);
        let synonyms = Arc::new(StaticSynonyms::new(&["automobile"]));
        let engine = SearchEngine::new(backend.clone()).with_synonyms(synonyms.clone());
        let options = SearchOptions {
            sort_by: SortBy::Popularity,
            sort_order: SortOrder::Asc,
            match_type: MatchType::Exact,
            typo_tolerance: TypoTolerance::High,
            smart_search: true,
            smart_options: SmartOptions {
                linguistic: true,
                semantic: false,
            },
            language: "fr".to_string(),
            ..Default::default()
        }
        .with_filter("tags", FilterValue::Many(vec!["rust".into()]));

        let _: DocumentResult = engine.search("questions", &fields(), "car", &options).await.unwrap();
        let body = backend.last_search().unwrap();

        assert_eq!(body["query"]["bool"]["filter"][0], json!({ "terms": { "tags": ["rust"] } }));
        assert_eq!(
            body["sort"],
            json!([{ "likeCount": { "order": "asc" } }, { "viewCount": { "order": "asc" } }])
        );
        assert_eq!(body["query"]["bool"]["must"][0]["function_score"]["min_score"], 0.5);
        assert!(body.to_string().contains("automobile"));
        assert_eq!(synonyms.lookups(), vec![(vec!["car".to_string()], "fr".to_string())]);
    }

    #[tokio::test]
    async fn registered_search_uses_registered_fields() {
        let backend = seeded(1);
        let service = SearchService::builder(EngineConfig::default())
            .backend(backend.clone())
            .register_index("questions", &["body", "title"])
            .unwrap()
            .build()
            .unwrap();

        let _: DocumentResult = service
            .search_registered("questions", "tokio", &SearchOptions::default())
            .await
            .unwrap();
        let body = backend.last_search().unwrap();
        let should = &body["query"]["bool"]["must"][0]["function_score"]["query"]["bool"]["should"];
        // registration order decides boosts
        assert_eq!(should[0]["match"]["body"]["boost"], 3.0);
        assert_eq!(should[1]["match"]["title"]["boost"], 2.0);

        let err = service
            .search_registered::<crate::search::SearchDocument>("users", "tokio", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn over_long_query_rejected_before_any_call() {
        let backend = seeded(1);
        let engine = SearchEngine::new(backend.clone());
        let err = engine
            .search::<crate::search::SearchDocument>("questions", &fields(), &"q".repeat(201), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::QueryTooLong { length: 201, max: 200 }));
        assert_eq!(backend.search_calls(), 0);
    }
}
