//! Benchmarks for lexical classification
//!
//! Run with: cargo bench -p classify

use chrono::Utc;
use classify::TextClassifier;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use keywords::KeywordSet;

fn generate_keywords(count: usize) -> KeywordSet {
  let words = (0..count).map(|i| format!("keyword{:04}", i));
  KeywordSet::new(words, Utc::now())
}

fn bench_text_classify_miss(c: &mut Criterion) {
  let mut group = c.benchmark_group("text_classify_miss");
  let classifier = TextClassifier::new();
  let title = "Top 10 Travel Destinations You Have To See Before You Die";

  for size in [10, 100, 1000].iter() {
    let set = generate_keywords(*size);
    group.bench_with_input(BenchmarkId::from_parameter(size), &set, |b, set| {
      b.iter(|| classifier.classify(black_box(title), black_box(set)));
    });
  }

  group.finish();
}

fn bench_text_classify_hit(c: &mut Criterion) {
  let mut group = c.benchmark_group("text_classify_hit");
  let classifier = TextClassifier::new();

  let set = KeywordSet::new(
    ["pizza", "cake", "pasta", "burger"].iter().map(|w| w.to_string()),
    Utc::now(),
  );
  let title = "Best Pizza Recipe 2024 - wood fired at home";

  group.bench_function("small_set", |b| {
    b.iter(|| classifier.classify(black_box(title), black_box(&set)));
  });

  group.finish();
}

criterion_group!(benches, bench_text_classify_miss, bench_text_classify_hit);
criterion_main!(benches);
