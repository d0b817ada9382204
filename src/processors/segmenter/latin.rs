//! 拉丁字母等非 CJK 文本的分段。

/// 一个分句不超过这个词数时整体保留。
const MAX_WORDS: usize = 5;

/// 超长分句按这个词数切块。
const CHUNK_WORDS: usize = 4;

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_clause_separator(c: char) -> bool {
    matches!(c, ',' | ';' | ':')
}

/// 先按句末标点、再按逗号分号冒号拆分，最后把过长的分句按词数切块。
///
/// 只在空白处切分，不会拆开单词。只剩一个词的尾块会并入前一块。
pub(super) fn split_latin(text: &str) -> Vec<String> {
    let mut segments = Vec::new();

    for sentence in text.split(is_sentence_terminator) {
        for clause in sentence.split(is_clause_separator) {
            let words: Vec<&str> = clause.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            if words.len() <= MAX_WORDS {
                segments.push(words.join(" "));
                continue;
            }

            let mut chunks: Vec<Vec<&str>> =
                words.chunks(CHUNK_WORDS).map(<[&str]>::to_vec).collect();
            if chunks.len() > 1
                && chunks.last().is_some_and(|tail| tail.len() == 1)
                && let Some(tail) = chunks.pop()
                && let Some(previous) = chunks.last_mut()
            {
                previous.extend(tail);
            }
            segments.extend(chunks.iter().map(|chunk| chunk.join(" ")));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_line_is_kept_whole() {
        assert_eq!(
            split_latin("Hello darkness my old friend"),
            vec!["Hello darkness my old friend"]
        );
    }

    #[test]
    fn test_split_on_punctuation() {
        assert_eq!(
            split_latin("Is this the real life? Is this just fantasy"),
            vec!["Is this the real life", "Is this just fantasy"]
        );
        assert_eq!(
            split_latin("Caught in a landslide, no escape from reality."),
            vec!["Caught in a landslide", "no escape from reality"]
        );
    }

    #[test]
    fn test_long_clause_is_chunked_without_splitting_words() {
        let segments =
            split_latin("I've been reading books of old the legends and the myths");
        assert_eq!(
            segments,
            vec!["I've been reading books", "of old the legends", "and the myths"]
        );
    }

    #[test]
    fn test_single_word_tail_is_merged() {
        let segments = split_latin("one two three four five six seven eight nine");
        assert_eq!(
            segments,
            vec!["one two three four", "five six seven eight nine"]
        );
        for segment in &segments {
            assert!(segment.split_whitespace().count() <= MAX_WORDS);
        }
    }

    #[test]
    fn test_only_punctuation_yields_nothing() {
        assert!(split_latin("... !!! ,,, ;").is_empty());
    }
}
