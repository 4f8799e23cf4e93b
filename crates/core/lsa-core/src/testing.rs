//! Shared fixtures for tests and benches

use crate::nlp::StopwordSet;

/// Three-document corpus: one about a cat, one about dogs, one about both
pub fn sample_corpus() -> Vec<String> {
    vec![
        "the cat sat on the mat".to_string(),
        "dogs are loyal animals".to_string(),
        "cats and dogs are pets".to_string(),
    ]
}

/// Stopwords matching [`sample_corpus`]
pub fn sample_stopwords() -> StopwordSet {
    StopwordSet::from_words(["the", "on", "and", "are"])
}

/// Twelve documents spread over four topics with overlapping vocabulary
pub fn topic_corpus() -> Vec<String> {
    [
        "The rocket launch was delayed by weather at the space center",
        "Astronauts aboard the space station repaired a solar panel",
        "A new telescope captured images of a distant galaxy in space",
        "The goalkeeper saved a penalty in the final minute of the match",
        "Fans cheered as the striker scored twice in the football final",
        "The coach praised the defense after a tough away match",
        "Simmer the tomato sauce with garlic and fresh basil",
        "Knead the dough, let it rise, then bake the bread until golden",
        "Roast the garlic and season the vegetables before baking",
        "The compiler rejected the program because of a borrow error",
        "Refactor the parser so the compiler reports better errors",
        "The program crashed when the parser hit an unexpected token",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// `n` synthetic documents cycling through ten topics
pub fn synthetic_corpus(n: usize) -> Vec<String> {
    const TOPICS: [&str; 10] = [
        "rocket orbit launch payload",
        "football goal striker match",
        "garlic basil sauce recipe",
        "compiler parser token borrow",
        "piano melody chord rhythm",
        "election ballot senate vote",
        "glacier climate carbon warming",
        "protein enzyme cell genome",
        "bitcoin ledger wallet mining",
        "castle knight siege kingdom",
    ];
    (0..n)
        .map(|i| {
            let topic = TOPICS[i % TOPICS.len()];
            let neighbor = TOPICS[(i * 7 + 3) % TOPICS.len()];
            format!("document {} about {} with a note on {}", i, topic, neighbor)
        })
        .collect()
}
