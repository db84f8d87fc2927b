//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{Extractor, ExtractorConfig, ExtractorError, FileTextSource};
    use cardsmith_domain::traits::FlashcardStore;
    use cardsmith_domain::RawText;
    use cardsmith_gatekeeper::RejectionReason;
    use cardsmith_llm::MockProvider;
    use cardsmith_store::JsonStore;
    use std::fs;
    use tempfile::tempdir;

    const TWO_PAIRS: &str = r#"[
        {"question": "How fast do the cells divide?", "answer": "Quickly, when the water is warm."},
        {"question": "What do the cells do after dividing?", "answer": "They rest for a long while."}
    ]"#;

    /// A fifteen-word sentence starting with `topic`
    fn sentence(topic: &str) -> String {
        format!("{} cells divide quickly in warm water and then rest for a long while afterwards.", topic)
    }

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            generate_summaries: false,
            retry_backoff_ms: 1,
            ..ExtractorConfig::default()
        }
    }

    /// One chunk per sentence
    fn small_chunks() -> ExtractorConfig {
        ExtractorConfig {
            target_chunk_words: 20,
            chunk_overlap_ratio: 0.0,
            min_segment_words: 1,
            ..config()
        }
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        // Three paragraphs, 300 words
        let sentences: Vec<String> = (0..20).map(|i| sentence(&format!("Group{}", i))).collect();
        let text = [
            sentences[..7].join(" "),
            sentences[7..14].join(" "),
            sentences[14..].join(" "),
        ]
        .join("\n\n");

        let extractor = Extractor::new(MockProvider::new(TWO_PAIRS), JsonStore::in_memory(), config());
        let report = extractor.extract(RawText::with_source(text, "biology.txt")).await.unwrap();

        assert_eq!(report.chunks_total, 2);
        assert_eq!(report.chunks_processed, 2);
        assert_eq!(report.candidates_parsed, 4);
        // The second chunk asks the same questions again
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected_duplicate, 2);
        assert_eq!(report.metadata.source_id.as_deref(), Some("biology.txt"));
        assert_eq!(report.metadata.model_name, "mock");

        let store = extractor.store();
        let store = store.lock().unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_quality_rejections_are_counted() {
        let response = r#"[
            {"question": "What is DNA?", "answer": "Genes."},
            {"question": "What is a gene?", "answer": "what is a  GENE?"},
            {"question": "What is RNA?", "answer": "A single-stranded nucleic acid."}
        ]"#;
        let extractor = Extractor::new(MockProvider::new(response), JsonStore::in_memory(), config());

        let report = extractor.extract(RawText::new(sentence("Alpha"))).await.unwrap();

        assert_eq!(report.rejected.get(&RejectionReason::TooShort), Some(&1));
        assert_eq!(report.rejected.get(&RejectionReason::Identical), Some(&1));
        assert_eq!(report.accepted, 1);
    }

    #[tokio::test]
    async fn test_failing_chunk_is_skipped() {
        let mut llm = MockProvider::new(TWO_PAIRS);
        llm.add_error("Zebra");
        let text = format!("{} {}", sentence("Alpha"), sentence("Zebra"));

        let extractor = Extractor::new(llm, JsonStore::in_memory(), small_chunks());
        let report = extractor.extract(RawText::new(text)).await.unwrap();

        assert_eq!(report.chunks_total, 2);
        assert_eq!(report.chunks_processed, 1);
        assert_eq!(report.chunks_skipped, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].index, 1);
        assert_eq!(report.accepted, 2);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let text = format!("{} {}", sentence("Alpha"), sentence("Bravo"));

        let first = Extractor::new(MockProvider::new(TWO_PAIRS), JsonStore::open(&path).unwrap(), config());
        let report = first.extract(RawText::new(text.clone())).await.unwrap();
        assert_eq!(report.accepted, 2);

        let second = Extractor::new(MockProvider::new(TWO_PAIRS), JsonStore::open(&path).unwrap(), config());
        let report = second.extract(RawText::new(text)).await.unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected_duplicate, 2);

        assert_eq!(JsonStore::open(&path).unwrap().len(), 2);
    }

    fn scripted_by_topic() -> MockProvider {
        let mut llm = MockProvider::new("[]");
        for topic in ["Alpha", "Bravo", "Charlie", "Delta"] {
            llm.add_response(
                format!("{} cells", topic),
                format!(r#"[{{"question": "What do {} cells do?", "answer": "They divide quickly in warm water."}}]"#, topic),
            );
        }
        llm
    }

    #[tokio::test]
    async fn test_concurrent_generation_keeps_chunk_order() {
        let text = ["Alpha", "Bravo", "Charlie", "Delta"]
            .iter()
            .map(|topic| sentence(topic))
            .collect::<Vec<_>>()
            .join(" ");

        let sequential = Extractor::new(scripted_by_topic(), JsonStore::in_memory(), small_chunks());
        sequential.extract(RawText::new(text.clone())).await.unwrap();

        let concurrent = Extractor::new(
            scripted_by_topic(),
            JsonStore::in_memory(),
            ExtractorConfig {
                max_concurrent_chunks: 4,
                ..small_chunks()
            },
        );
        let report = concurrent.extract(RawText::new(text)).await.unwrap();
        assert_eq!(report.chunks_processed, 4);

        let questions = |extractor: &Extractor<MockProvider, JsonStore>| -> Vec<String> {
            let store = extractor.store();
            let store = store.lock().unwrap();
            let questions = store.flashcards().iter().map(|c| c.question.clone()).collect();
            questions
        };
        assert_eq!(questions(&sequential), questions(&concurrent));
        assert_eq!(questions(&concurrent)[0], "What do Alpha cells do?");
        assert_eq!(questions(&concurrent)[3], "What do Delta cells do?");
    }

    #[tokio::test]
    async fn test_persistence_failure_aborts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("cards.json");
        let store = JsonStore::open(&path).unwrap();
        fs::write(dir.path().join("sub"), "").unwrap();

        let llm = MockProvider::new(TWO_PAIRS);
        let extractor = Extractor::new(llm, store, small_chunks());
        let text = format!("{} {}", sentence("Alpha"), sentence("Bravo"));

        let result = extractor.extract(RawText::new(text)).await;
        assert!(matches!(result, Err(ExtractorError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_extract_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, format!("Chapter notes\n\n{}\n\nPage 1\n", sentence("Alpha"))).unwrap();

        let extractor = Extractor::new(MockProvider::new(TWO_PAIRS), JsonStore::in_memory(), config());
        let source = path.to_string_lossy().to_string();
        let report = extractor
            .extract_from_source(&FileTextSource::new(), &source)
            .await
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert_eq!(report.metadata.source_id.as_deref(), Some(source.as_str()));

        let missing = extractor
            .extract_from_source(&FileTextSource::new(), "/nonexistent/notes.txt")
            .await;
        assert!(matches!(missing, Err(ExtractorError::Input(_))));
    }

    #[tokio::test]
    async fn test_summaries_are_reported() {
        let mut llm = MockProvider::new(TWO_PAIRS);
        llm.add_response("Summarize", "Cells divide in warm water.");
        let extractor = Extractor::new(
            llm,
            JsonStore::in_memory(),
            ExtractorConfig {
                generate_summaries: true,
                ..config()
            },
        );

        let report = extractor.extract(RawText::new(sentence("Alpha"))).await.unwrap();

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].summary, "Cells divide in warm water.");
    }
}
