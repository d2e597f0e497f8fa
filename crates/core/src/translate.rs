//! Translation seam.
//!
//! The translation backend itself is external; this module only defines the
//! interface and how a whole file flows through it.

use crate::error::TranslateError;
use crate::subtitle::{Entry, SubtitleFile};

/// Translates one piece of text between two languages.
pub trait Translator {
    fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Builds a translated copy of `subtitle`.
///
/// Ids and timings are preserved. Each entry's lines are joined and
/// translated as one unit, producing a single translated line; entries
/// without text stay empty and are not sent to the backend.
pub fn translate_file<T>(
    subtitle: &SubtitleFile,
    translator: &T,
    from: &str,
    to: &str,
) -> Result<SubtitleFile, TranslateError>
where
    T: Translator + ?Sized,
{
    let mut entries = Vec::with_capacity(subtitle.len());
    for entry in &subtitle.entries {
        let lines = if entry.is_blank() {
            Vec::new()
        } else {
            let translated = translator
                .translate(&entry.text(), from, to)
                .map_err(|source| TranslateError {
                    id: entry.id,
                    source,
                })?;
            vec![translated]
        };
        entries.push(Entry {
            id: entry.id,
            start: entry.start,
            end: entry.end,
            lines,
        });
    }
    tracing::info!(entries = entries.len(), from, to, "translated subtitle");
    Ok(SubtitleFile::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{IndexedSubtitle, SubtitleSearch};
    use crate::subtitle::EntryId;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Word-by-word dictionary translator.
    struct Dictionary(HashMap<&'static str, &'static str>);

    impl Translator for Dictionary {
        fn translate(
            &self,
            text: &str,
            _from: &str,
            _to: &str,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            text.split_whitespace()
                .map(|w| {
                    self.0
                        .get(w.to_lowercase().as_str())
                        .copied()
                        .ok_or_else(|| format!("unknown word {w:?}").into())
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|words| words.join(" "))
        }
    }

    fn dictionary() -> Dictionary {
        Dictionary(HashMap::from([
            ("bonjour", "hello"),
            ("mon", "my"),
            ("ami", "friend"),
            ("au", "good"),
            ("revoir", "bye"),
        ]))
    }

    fn entry(id: u32, lines: &[&str]) -> Entry {
        Entry::new(
            id,
            Duration::from_secs(id as u64),
            Duration::from_secs(id as u64 + 1),
            lines.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_translate_preserves_ids_and_timing() {
        let file = SubtitleFile::new(vec![
            entry(1, &["Bonjour", "mon ami"]),
            entry(2, &[]),
            entry(3, &["Au revoir"]),
        ]);
        let translated = translate_file(&file, &dictionary(), "fr", "en").unwrap();
        assert_eq!(translated.len(), 3);
        assert_eq!(translated.entries[0].lines, vec!["hello my friend"]);
        assert!(translated.entries[1].lines.is_empty());
        assert_eq!(translated.entries[2].lines, vec!["good bye"]);
        for (a, b) in file.entries.iter().zip(&translated.entries) {
            assert_eq!((a.id, a.start, a.end), (b.id, b.start, b.end));
        }
        // Source untouched
        assert_eq!(file.entries[0].lines, vec!["Bonjour", "mon ami"]);
    }

    #[test]
    fn test_translate_reports_failing_entry() {
        let file = SubtitleFile::new(vec![entry(1, &["Bonjour"]), entry(5, &["Merci"])]);
        let err = translate_file(&file, &dictionary(), "fr", "en").unwrap_err();
        assert_eq!(err.id, EntryId(5));
        assert!(err.to_string().contains("Merci"));
    }

    #[test]
    fn test_translated_file_is_searchable() {
        let file = SubtitleFile::new(vec![entry(1, &["Bonjour mon ami"]), entry(2, &["Au revoir"])]);
        let translated = translate_file(&file, &dictionary(), "fr", "en").unwrap();
        let indexed = IndexedSubtitle::new(&translated).unwrap();
        assert_eq!(indexed.search("goodbye my friend").unwrap().unwrap().id, EntryId(1));
    }
}
