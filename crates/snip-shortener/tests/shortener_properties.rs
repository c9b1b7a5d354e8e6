use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use snip_core::{Repository, ShortCode, Shortener, ShortenerError};
use snip_generator::{Generator, RandomGenerator, SeqGenerator};
use snip_shortener::{LinkMapping, ShortenerService, ShortenerSettings};
use snip_storage::InMemoryRepository;

/// Hands every code out twice, so concurrent callers keep colliding.
struct ContendedGenerator {
    counter: AtomicUsize,
}

impl Generator for ContendedGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(format!("C{:04}", n / 2))
    }
}

fn code(s: &str) -> ShortCode {
    ShortCode::new(s).unwrap()
}

#[tokio::test]
async fn created_codes_resolve_to_their_targets() {
    let service = ShortenerService::new(InMemoryRepository::new(), RandomGenerator::default());
    let targets = [
        "https://example.com",
        "http://localhost:8000/path?q=1#frag",
        "ftp://files.example/archive.tar.gz",
        "not even a url",
        "https://例え.jp/パス",
    ];

    for target in targets {
        let mapping = service.create(target.to_string(), None).await.unwrap();
        let resolved = service.resolve(&mapping.code).await.unwrap();
        assert_eq!(resolved.as_deref(), Some(target));
    }
}

#[tokio::test]
async fn scripted_scenario_resolves_and_misses() {
    let service = ShortenerService::new(
        InMemoryRepository::new(),
        SeqGenerator::from_codes(["Ab3X9"]).unwrap(),
    );

    let mapping = service
        .create("https://example.com".to_string(), None)
        .await
        .unwrap();

    assert_eq!(mapping.code.as_str(), "Ab3X9");
    assert_eq!(mapping.target_url, "https://example.com");
    assert_eq!(
        service.resolve(&code("Ab3X9")).await.unwrap().as_deref(),
        Some("https://example.com")
    );
    assert_eq!(service.resolve(&code("zzzzz")).await.unwrap(), None);
}

#[tokio::test]
async fn two_collisions_then_success() {
    let repo = InMemoryRepository::new();
    repo.insert(LinkMapping::new(code("AAAAA"), "https://first.example", None))
        .await
        .unwrap();
    let generator = Arc::new(SeqGenerator::from_codes(["AAAAA", "AAAAA", "BBBBB"]).unwrap());
    let service = ShortenerService::from_shared(
        Arc::new(repo),
        Arc::clone(&generator),
        ShortenerSettings::default(),
    );

    let mapping = service
        .create("https://second.example".to_string(), None)
        .await
        .unwrap();

    assert_eq!(mapping.code.as_str(), "BBBBB");
    assert_eq!(generator.issued(), 3);
    assert_eq!(
        service.resolve(&code("AAAAA")).await.unwrap().as_deref(),
        Some("https://first.example")
    );
}

#[tokio::test]
async fn never_created_codes_are_not_found() {
    let service = ShortenerService::new(InMemoryRepository::new(), RandomGenerator::default());
    service
        .create("https://example.com".to_string(), None)
        .await
        .unwrap();

    for probe in ["zzzzz", "00000", "a", "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345"] {
        let probe = code(probe);
        if service.lookup(&probe).await.unwrap().is_none() {
            assert_eq!(service.resolve(&probe).await.unwrap(), None);
        }
    }
}

#[tokio::test]
async fn empty_target_stores_nothing() {
    let service = ShortenerService::new(InMemoryRepository::new(), RandomGenerator::default());

    let err = service.create(String::new(), Some("alice".into())).await;

    assert_eq!(err.unwrap_err(), ShortenerError::MissingTarget);
    assert!(service.repository().is_empty());
}

#[tokio::test]
async fn resolve_is_repeatable_and_read_only() {
    let service = ShortenerService::new(InMemoryRepository::new(), RandomGenerator::default());
    let mapping = service
        .create("https://example.com".to_string(), None)
        .await
        .unwrap();
    let before = service.repository().mappings();

    for _ in 0..5 {
        assert_eq!(
            service.resolve(&mapping.code).await.unwrap().as_deref(),
            Some("https://example.com")
        );
        assert_eq!(service.resolve(&code("zzzzz")).await.unwrap(), None);
    }

    assert_eq!(service.repository().mappings(), before);
}

#[tokio::test]
async fn sequential_creates_never_share_a_code() {
    // Two-character codes leave 3844 slots, so collisions actually happen.
    let service = ShortenerService::with_settings(
        InMemoryRepository::new(),
        RandomGenerator::with_length(2).unwrap(),
        ShortenerSettings::builder().max_attempts(1_000).build(),
    );

    for i in 0..500 {
        service
            .create(format!("https://example.com/{i}"), None)
            .await
            .unwrap();
    }

    let mappings = service.repository().mappings();
    let codes: HashSet<_> = mappings.iter().map(|m| m.code.clone()).collect();
    assert_eq!(mappings.len(), 500);
    assert_eq!(codes.len(), 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_codes() {
    const TASKS: usize = 64;

    let service = ShortenerService::with_settings(
        InMemoryRepository::new(),
        ContendedGenerator {
            counter: AtomicUsize::new(0),
        },
        ShortenerSettings::builder().max_attempts(TASKS as u32).build(),
    );

    let mut handles = Vec::with_capacity(TASKS);
    for i in 0..TASKS {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .create(format!("https://example.com/{i}"), None)
                .await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let mapping = handle.await.unwrap().unwrap();
        assert!(codes.insert(mapping.code.clone()));
        assert_eq!(
            service.resolve(&mapping.code).await.unwrap(),
            Some(mapping.target_url)
        );
    }

    assert_eq!(codes.len(), TASKS);
    assert_eq!(service.repository().len(), TASKS);
}
