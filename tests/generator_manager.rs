//! Dispatch behaviour of GeneratorManager against recording generators.

mod common;

use std::sync::Arc;

use common::RecordingGenerator;
use futures::StreamExt;
use verba_components::generation::builtin_generators;
use verba_components::tokens::{BpeTokenizer, CharTokenizer, EncodingKind, Tokenizer};
use verba_components::{
    ConversationItem, Error, GenerationChunk, Generator, GeneratorManager, VerbaConfig,
};

fn manager_with(
    gens: Vec<Arc<RecordingGenerator>>,
    default: &str,
    tokenizer: Arc<dyn Tokenizer>,
) -> GeneratorManager {
    let entries: Vec<(String, Arc<dyn Generator>)> = gens
        .into_iter()
        .map(|g| (g.name.clone(), g as Arc<dyn Generator>))
        .collect();
    GeneratorManager::with_generators(entries, default, tokenizer).unwrap()
}

fn queries(q: &str) -> Vec<String> {
    vec![q.to_string()]
}

#[test]
fn test_builtin_generators() {
    let manager = GeneratorManager::from_config(&VerbaConfig::default()).unwrap();
    let names: Vec<_> = manager.list().keys().cloned().collect();
    assert_eq!(
        names,
        vec![
            "CohereGenerator",
            "GPT3Generator",
            "GPT4Generator",
            "Llama2Generator"
        ]
    );
    assert_eq!(manager.active_name(), "GPT3Generator");
    assert_eq!(manager.context_budget(), 3750);

    let windows: Vec<_> = builtin_generators(&VerbaConfig::default())
        .unwrap()
        .into_iter()
        .map(|(name, g)| (name, g.context_window()))
        .collect();
    assert!(windows.contains(&("CohereGenerator".to_string(), 3000)));
    assert!(windows.contains(&("Llama2Generator".to_string(), 3000)));
}

#[tokio::test]
async fn test_unknown_selection_keeps_default() {
    let a = RecordingGenerator::new("Alpha", 100);
    let b = RecordingGenerator::new("Beta", 100);
    let manager = manager_with(vec![a.clone(), b.clone()], "Alpha", Arc::new(CharTokenizer));

    assert!(!manager.select("NoSuchBackend"));
    let answer = manager.generate(&queries("q"), &[], None).await.unwrap();
    assert_eq!(answer, "Alpha:q");
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 0);

    assert!(manager.select("Beta"));
    let answer = manager.generate(&queries("q"), &[], None).await.unwrap();
    assert_eq!(answer, "Beta:q");
}

#[tokio::test]
async fn test_history_is_fit_to_active_window() {
    // window 16 -> budget 6
    let small = RecordingGenerator::new("Small", 16);
    let large = RecordingGenerator::new("Large", 1000);
    let manager = manager_with(
        vec![small.clone(), large.clone()],
        "Small",
        Arc::new(CharTokenizer),
    );
    let history = vec![
        ConversationItem::user("first question"),
        ConversationItem::system("answer"),
        ConversationItem::user("next"),
    ];

    manager
        .generate(&queries("q"), &[], Some(&history))
        .await
        .unwrap();
    let seen = small.last_seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].content, "an");
    assert_eq!(seen[1].content, "next");

    manager.select("Large");
    manager
        .generate(&queries("q"), &[], Some(&history))
        .await
        .unwrap();
    assert_eq!(large.last_seen(), history);
}

#[tokio::test]
async fn test_stream_is_forwarded() {
    let g = RecordingGenerator::new("Streamer", 8);
    let manager = manager_with(vec![g.clone()], "Streamer", Arc::new(CharTokenizer));
    let history = vec![ConversationItem::user("abcdef")];

    let chunks: Vec<GenerationChunk> = manager
        .generate_stream(&queries("q"), &[], Some(&history))
        .await
        .unwrap()
        .map(|c| c.unwrap())
        .collect()
        .await;
    assert_eq!(
        chunks,
        vec![
            GenerationChunk::delta("Hel"),
            GenerationChunk::delta("lo"),
            GenerationChunk::finish("")
        ]
    );
    assert_eq!(g.last_seen()[0].content, "abc");
}

#[tokio::test]
async fn test_backend_errors_propagate_unchanged() {
    let g = RecordingGenerator::failing("Broken", 503);
    let manager = manager_with(vec![g], "Broken", Arc::new(CharTokenizer));
    let err = manager.generate(&queries("q"), &[], None).await.unwrap_err();
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream rejected");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_per_call_selection() {
    let a = RecordingGenerator::new("Alpha", 100);
    let b = RecordingGenerator::new("Beta", 100);
    let manager = manager_with(vec![a, b.clone()], "Alpha", Arc::new(CharTokenizer));

    let answer = manager
        .generate_with("Beta", &queries("q"), &[], None)
        .await
        .unwrap();
    assert_eq!(answer, "Beta:q");
    assert_eq!(manager.active_name(), "Alpha");

    let err = manager
        .generate_with("Gamma", &queries("q"), &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));

    let stream = manager
        .generate_stream_with("Beta", &queries("q"), &[], None)
        .await;
    assert!(stream.is_ok());
    assert_eq!(b.calls(), 2);
}

#[test]
fn test_truncation_with_bpe_tokens() {
    let tok = Arc::new(BpeTokenizer::new(EncodingKind::Cl100kBase).unwrap());
    let g = RecordingGenerator::new("G", 100);
    let manager = manager_with(vec![g], "G", tok.clone());

    let history = vec![
        ConversationItem::user("A"),
        ConversationItem::system("B"),
        ConversationItem::user("C"),
    ];
    let out = manager.truncate(&history, 2);
    let contents: Vec<_> = out.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(contents, vec!["B", "C"]);

    let long = "one two three four five six seven eight nine ten";
    let ids = tok.encode(long);
    assert!(ids.len() > 3);
    let out = manager.truncate(&[ConversationItem::system(long)], 3);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].content, tok.decode(&ids[..3]).unwrap());
    assert!(long.starts_with(&out[0].content));
}

#[test]
fn test_truncation_is_idempotent() {
    let tok = Arc::new(BpeTokenizer::for_model("gpt-3.5-turbo").unwrap());
    let g = RecordingGenerator::new("G", 100);
    let manager = manager_with(vec![g], "G", tok);
    let history = vec![
        ConversationItem::user("How do I configure the reader?"),
        ConversationItem::system("Select it in the import page."),
    ];
    let once = manager.truncate(&history, 1000);
    assert_eq!(once, history);
    assert_eq!(manager.truncate(&once, 1000), once);
}
