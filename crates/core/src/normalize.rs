/// Phrase aliases applied after cleanup, in order.
pub const PHRASE_ALIASES: [(&str, &str); 2] = [
    ("natural language processing", "nlp"),
    ("electricity to power our homes", "electricity usage home"),
];

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the surface deduplication key for `text`.
///
/// Lower-cases, drops everything except ASCII letters, digits, whitespace and
/// `?`, collapses whitespace and applies [`PHRASE_ALIASES`]. Degenerate input
/// yields an empty key, which callers must not treat as an identity.
pub fn normalize_question(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let kept = lowered
        .chars()
        .filter(|ch| {
            ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() || *ch == '?'
        })
        .collect::<String>();

    let mut key = normalize_whitespace(&kept);
    for (phrase, alias) in PHRASE_ALIASES {
        if key.contains(phrase) {
            key = key.replace(phrase, alias);
        }
    }
    key
}
