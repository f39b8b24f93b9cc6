#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and scoring arbitrary text must not panic
    if let Ok(query) = vvsearch::query::parse_query(data) {
        let scorer = vvsearch::query::Scorer::new(&query);
        let (score, _) = scorer.score(&data.to_lowercase());
        assert!((0.0..=100.0).contains(&score));
    }
});
