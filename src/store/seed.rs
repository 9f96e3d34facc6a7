//! Default collection used when no snapshot exists yet.

use chrono::Utc;

use crate::model::{Content, Record, RecordId};

const SEED_QUOTES: &[(&str, &str)] = &[
    ("The only way to do great work is to love what you do.", "Work"),
    ("Innovation distinguishes between a leader and a follower.", "Leadership"),
    ("Stay hungry, stay foolish.", "Motivation"),
    (
        "Genius is one percent inspiration and ninety-nine percent perspiration.",
        "Work",
    ),
    (
        "The future belongs to those who believe in the beauty of their dreams.",
        "Dreams",
    ),
    (
        "Success is not final, failure is not fatal: it is the courage to continue that counts.",
        "Perseverance",
    ),
    ("The best way to predict the future is to create it.", "Future"),
    ("Believe you can and you're halfway there.", "Motivation"),
    ("It always seems impossible until it's done.", "Perseverance"),
    ("The mind is everything. What you think you become.", "Mindset"),
    ("Life is what happens when you're busy making other plans.", "Life"),
    (
        "The greatest glory in living lies not in never falling, but in rising every time we fall.",
        "Perseverance",
    ),
];

/// The built-in quotes.
///
/// Seeds ship with the application and are treated as already published:
/// they are marked synced and are never posted. They keep `seed-N` ids until a
/// content-equal remote record hands them a remote id.
#[must_use]
pub fn default_records() -> Vec<Record> {
    let now = Utc::now();
    SEED_QUOTES
        .iter()
        .enumerate()
        .map(|(i, (text, category))| Record {
            id: RecordId::Local(format!("seed-{}", i + 1)),
            content: Content::new(*text, *category),
            updated_at: now,
            synced: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seeds_are_synced_and_unique() {
        let seeds = default_records();
        assert_eq!(seeds.len(), SEED_QUOTES.len());
        assert!(seeds.iter().all(|r| r.synced && r.content.is_complete()));

        let contents: HashSet<_> = seeds.iter().map(|r| &r.content).collect();
        assert_eq!(contents.len(), seeds.len());
    }
}
