//! Cloze text helpers
//!
//! A cloze question marks blanks with bracketed tokens: `"A [cat] sat."`.
//! The token content doubles as the expected answer; the literal token
//! `[blank]` marks a blank with no answer yet.
//!
//! Tokens and `ClozeData::blanks` are matched by position: the n-th token
//! belongs to the n-th blank. Nothing forces the two counts to agree, so
//! every helper here tolerates surplus tokens and surplus blanks.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Blank, ClozeData, Question, QuestionKind};

/// Token content that means "no answer yet".
pub const EMPTY_BLANK_TOKEN: &str = "blank";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\[([^\]]+)\]").expect("valid cloze token regex"))
}

/// Contents of every `[token]` in `text`, in order.
pub fn tokens(text: &str) -> Vec<&str> {
    token_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Build blanks from the tokens in `text`. Ids are 1-based positions.
pub fn detect_blanks(text: &str) -> Vec<Blank> {
    tokens(text)
        .into_iter()
        .enumerate()
        .map(|(i, token)| Blank {
            id: i as u32 + 1,
            answer: if token == EMPTY_BLANK_TOKEN {
                String::new()
            } else {
                token.to_string()
            },
        })
        .collect()
}

/// Cloze data whose blanks are re-derived from `text`.
pub fn from_text(text: impl Into<String>) -> ClozeData {
    let text = text.into();
    let blanks = detect_blanks(&text);
    ClozeData { text, blanks }
}

/// Whether the token count matches the blank count.
pub fn is_consistent(data: &ClozeData) -> bool {
    tokens(&data.text).len() == data.blanks.len()
}

/// Ids of the cloze questions whose token count and blank count differ.
pub fn mismatched(questions: &[Question]) -> Vec<&str> {
    questions
        .iter()
        .filter(|q| matches!(&q.kind, QuestionKind::Cloze(data) if !is_consistent(data)))
        .map(|q| q.id.as_str())
        .collect()
}

/// Append a new blank with `answer` to the end of the text.
///
/// The new blank id is one past the largest existing id.
pub fn append_blank(data: &mut ClozeData, answer: &str) -> u32 {
    let id = data.blanks.iter().map(|b| b.id).max().unwrap_or(0) + 1;
    let token = if answer.is_empty() { EMPTY_BLANK_TOKEN } else { answer };

    if !data.text.is_empty() && !data.text.ends_with(' ') {
        data.text.push(' ');
    }
    data.text.push('[');
    data.text.push_str(token);
    data.text.push(']');

    data.blanks.push(Blank {
        id,
        answer: answer.to_string(),
    });
    id
}

/// Change the answer of blank `blank_id` and rewrite its token in the text.
///
/// Returns false when no blank has that id. If the blank's position has no
/// matching token (more blanks than tokens) only the answer is updated.
pub fn set_answer(data: &mut ClozeData, blank_id: u32, answer: &str) -> bool {
    let Some(position) = data.blanks.iter().position(|b| b.id == blank_id) else {
        return false;
    };
    data.blanks[position].answer = answer.to_string();

    let token = if answer.is_empty() { EMPTY_BLANK_TOKEN } else { answer };
    let mut index = 0;
    let rewritten = token_regex().replace_all(&data.text, |caps: &regex::Captures<'_>| {
        let current = index;
        index += 1;
        if current == position {
            format!("[{}]", token)
        } else {
            caps[0].to_string()
        }
    });
    data.text = rewritten.into_owned();
    true
}

/// Remove blank `blank_id` from the blanks list. The text is left alone.
pub fn remove_blank(data: &mut ClozeData, blank_id: u32) -> bool {
    let before = data.blanks.len();
    data.blanks.retain(|b| b.id != blank_id);
    data.blanks.len() != before
}

/// Text with each token replaced by `placeholder`, for rendering to a respondent.
pub fn mask(text: &str, placeholder: &str) -> String {
    token_regex().replace_all(text, placeholder).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_blanks() {
        let blanks = detect_blanks("The [cat] sat on the [blank].");
        assert_eq!(blanks.len(), 2);
        assert_eq!(blanks[0], Blank { id: 1, answer: "cat".into() });
        assert_eq!(blanks[1], Blank { id: 2, answer: String::new() });
    }

    #[test]
    fn test_set_answer_rewrites_matching_token() {
        let mut data = from_text("A [cat] sat on a [mat].");
        assert!(set_answer(&mut data, 2, "rug"));
        assert_eq!(data.text, "A [cat] sat on a [rug].");
        assert_eq!(data.blanks[1].answer, "rug");

        assert!(set_answer(&mut data, 1, ""));
        assert_eq!(data.text, "A [blank] sat on a [rug].");
    }

    #[test]
    fn test_set_answer_with_surplus_blanks() {
        let mut data = ClozeData {
            text: "Only [one] token.".into(),
            blanks: vec![Blank { id: 1, answer: "one".into() }, Blank { id: 2, answer: "two".into() }],
        };
        assert!(!is_consistent(&data));

        assert!(set_answer(&mut data, 2, "deux"));
        assert_eq!(data.text, "Only [one] token.");
        assert_eq!(data.blanks[1].answer, "deux");
    }

    #[test]
    fn test_set_answer_with_surplus_tokens() {
        let mut data = ClozeData {
            text: "[a] [b] [c]".into(),
            blanks: vec![Blank { id: 7, answer: "a".into() }],
        };
        assert!(set_answer(&mut data, 7, "x"));
        assert_eq!(data.text, "[x] [b] [c]");
        assert!(!set_answer(&mut data, 99, "nope"));
    }

    #[test]
    fn test_append_and_remove() {
        let mut data = from_text("Roses are [red].");
        let id = append_blank(&mut data, "blue");
        assert_eq!(id, 2);
        assert_eq!(data.text, "Roses are [red]. [blue]");
        assert!(is_consistent(&data));

        assert!(remove_blank(&mut data, 1));
        assert!(!remove_blank(&mut data, 1));
        assert_eq!(data.blanks.len(), 1);
    }

    #[test]
    fn test_mismatched_questions() {
        let questions = vec![
            Question {
                id: "q_1".into(),
                title: String::new(),
                image: None,
                kind: QuestionKind::Cloze(from_text("A [cat] sat.")),
            },
            Question {
                id: "q_2".into(),
                title: String::new(),
                image: None,
                kind: QuestionKind::Cloze(ClozeData { text: "[a] [b]".into(), blanks: Vec::new() }),
            },
        ];
        assert_eq!(mismatched(&questions), vec!["q_2"]);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("A [cat] sat.", "_____"), "A _____ sat.");
    }
}
