use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use manhwa_translator::ocr::parse_detections;
use manhwa_translator::providers::TextsFuture;
use manhwa_translator::{
    BubbleGrouper, ERROR_MARKER, PipelineOptions, ProviderKind, TranslationItem,
    TranslationPipeline, TranslationProvider,
};

/// Answers from a fixed phrase book and records every text it was sent.
#[derive(Clone, Default)]
struct PhraseBook {
    phrases: Arc<HashMap<String, String>>,
    sent: Arc<Mutex<Vec<String>>>,
    down: bool,
}

impl PhraseBook {
    fn new(pairs: &[(&str, &str)]) -> Self {
        let phrases = pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self {
            phrases: Arc::new(phrases),
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl TranslationProvider for PhraseBook {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepL
    }

    fn translate_texts(&self, texts: Vec<String>, _source: &str, _target: &str) -> TextsFuture {
        let book = self.clone();
        Box::pin(async move {
            if book.down {
                return Err(anyhow!("service unavailable"));
            }
            book.sent.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts
                .iter()
                .map(|text| {
                    book.phrases
                        .get(text)
                        .cloned()
                        .unwrap_or_else(|| ERROR_MARKER.to_string())
                })
                .collect())
        })
    }
}

// Block 0 spans y 0..50, block 1 y 55..100, block 2 y 200..230.
const PAGE: &str = r#"[
    [[[20, 0], [220, 0], [220, 50], [20, 50]], "hello world", 0.97],
    [[[30, 55], [210, 55], [210, 100], [30, 100]], "foo", 0.93],
    [[[40, 200], [200, 200], [200, 230], [40, 230]], "see you", 0.90]
]"#;

fn pipeline(provider: PhraseBook) -> TranslationPipeline<PhraseBook> {
    TranslationPipeline::new(
        provider,
        BubbleGrouper::default(),
        PipelineOptions {
            source_lang: "EN".to_string(),
            target_lang: "FR".to_string(),
            ..PipelineOptions::default()
        },
    )
}

#[tokio::test]
async fn page_is_grouped_translated_and_redistributed() {
    let provider = PhraseBook::new(&[
        ("hello world foo", "bonjour monde ici"),
        ("see you", "a bientot"),
    ]);
    let detections = parse_detections(PAGE).unwrap();
    let page = pipeline(provider.clone()).run(&detections).await.unwrap();

    let groups: Vec<Vec<usize>> = page.groups().iter().map(|g| g.ids().to_vec()).collect();
    assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    assert_eq!(provider.sent(), vec!["hello world foo", "see you"]);

    let translated: Vec<&str> = page
        .blocks()
        .iter()
        .map(|block| block.translated_text.as_str())
        .collect();
    insta::assert_json_snapshot!(translated, @r#"
    [
      "bonjour monde",
      "ici",
      "a bientot"
    ]
    "#);
    assert!(page.failed_groups().is_empty());
}

#[tokio::test]
async fn single_block_group_takes_whole_translation() {
    let provider = PhraseBook::new(&[("hello", "hola")]);
    let detections =
        parse_detections(r#"[[[[0, 0], [50, 0], [50, 20], [0, 20]], "hello", 0.9]]"#).unwrap();
    let page = pipeline(provider).run(&detections).await.unwrap();
    assert_eq!(page.blocks()[0].translated_text, "hola");
}

#[tokio::test]
async fn blank_items_never_reach_the_backend() {
    let provider = PhraseBook::new(&[("one", "un"), ("three", "trois")]);
    let items = vec![
        TranslationItem::new("one"),
        TranslationItem::new(""),
        TranslationItem::new("three"),
    ];
    let result = provider
        .translate_batch(items, "EN", "FR")
        .await
        .unwrap();
    let translated: Vec<&str> = result.iter().map(|item| item.translated.as_str()).collect();
    assert_eq!(translated, vec!["un", "", "trois"]);
    assert_eq!(provider.sent(), vec!["one", "three"]);
}

#[tokio::test]
async fn unknown_phrase_marks_only_its_group() {
    let provider = PhraseBook::new(&[("see you", "a bientot")]);
    let detections = parse_detections(PAGE).unwrap();
    let page = pipeline(provider).run(&detections).await.unwrap();
    assert_eq!(page.failed_groups(), vec![0]);
    assert_eq!(page.blocks()[2].translated_text, "a bientot");
}

#[tokio::test]
async fn failed_batch_keeps_grouped_page() {
    let provider = PhraseBook {
        down: true,
        ..PhraseBook::default()
    };
    let detections = parse_detections(PAGE).unwrap();
    let err = pipeline(provider).run(&detections).await.unwrap_err();
    assert!(err.to_string().contains("service unavailable"));
    assert_eq!(err.page.groups().len(), 2);
    assert!(!err.page.has_translations());
}

#[tokio::test]
async fn edited_translation_is_split_again() {
    let provider = PhraseBook::new(&[
        ("hello world foo", "bonjour monde ici"),
        ("see you", "a bientot"),
    ]);
    let detections = parse_detections(PAGE).unwrap();
    let mut page = pipeline(provider).run(&detections).await.unwrap();

    page.edit_group_translation(0, "salut tout le monde").unwrap();
    assert_eq!(page.blocks()[0].translated_text, "salut tout le");
    assert_eq!(page.blocks()[1].translated_text, "monde");
    assert_eq!(page.combined_translation(0).unwrap(), "salut tout le monde");
    assert!(page.edit_group_translation(5, "x").is_err());
}
