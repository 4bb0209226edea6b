//! Semantic-role payloads and clause extraction

use crate::clause::Clause;
use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive token span local to one sentence
pub type Span = (usize, usize);

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "his",
    "her", "its", "their", "our", "my", "your",
];

/// One predicate frame of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrlFrame {
    #[serde(default)]
    pub verb: String,
    #[serde(default)]
    pub description: String,
    /// One BIO tag per sentence token
    pub tags: Vec<String>,
}

/// Semantic roles for one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrlSentence {
    pub words: Vec<String>,
    #[serde(default)]
    pub verbs: Vec<SrlFrame>,
}

impl SrlSentence {
    /// Tags must line up with words
    ///
    /// # Errors
    /// [`PayloadError::LengthMismatch`] naming the offending frame.
    pub fn validate(&self, sent_index: usize) -> Result<(), PayloadError> {
        for (i, frame) in self.verbs.iter().enumerate() {
            if frame.tags.len() != self.words.len() {
                return Err(PayloadError::LengthMismatch {
                    context: format!("sentence {sent_index} frame {i} tags"),
                    expected: self.words.len(),
                    actual: frame.tags.len(),
                });
            }
        }
        Ok(())
    }
}

/// Parse the labeller response, with or without its `output` envelope.
///
/// # Errors
/// [`PayloadError`] when the body is not a list of `{words, verbs:[{tags}]}` or a frame's
/// tag count differs from the sentence's word count.
pub fn parse_srl(value: &Value) -> Result<Vec<SrlSentence>, PayloadError> {
    let body = value.get("output").unwrap_or(value);
    if !body.is_array() {
        return Err(PayloadError::missing("output", "semantic role response"));
    }
    let sentences: Vec<SrlSentence> = serde_json::from_value(body.clone())?;
    for (i, sentence) in sentences.iter().enumerate() {
        sentence.validate(i)?;
    }
    Ok(sentences)
}

/// Document offset of the first token of every sentence
#[must_use]
pub fn sentence_offsets(sentences: &[SrlSentence]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(sentences.len());
    let mut next = 0;
    for sentence in sentences {
        offsets.push(next);
        next += sentence.words.len();
    }
    offsets
}

fn widen(span: &mut Option<Span>, index: usize) {
    *span = Some(match *span {
        Some((begin, _)) => (begin, index),
        None => (index, index),
    });
}

/// Role spans of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpans {
    pub agent: Option<Span>,
    pub verb: Option<Span>,
    pub object: Option<Span>,
    pub adverbial: Option<Span>,
    /// First non-`O` tag, after adverbial trimming
    pub begin: usize,
    /// Last non-`O` tag, after adverbial trimming
    pub end: usize,
}

impl FrameSpans {
    /// Collect spans from BIO tags; `None` when every tag is `O`.
    ///
    /// An adverbial at the start of the frame is cut off the front; any other adverbial
    /// is cut off the back. Frames with only an adverbial keep their full extent.
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Option<Self> {
        let mut extent: Option<Span> = None;
        let mut agent = None;
        let mut verb = None;
        let mut object = None;
        let mut adverbial = None;
        for (index, tag) in tags.iter().enumerate() {
            if tag == "O" {
                continue;
            }
            widen(&mut extent, index);
            if tag.contains("ARG0") {
                widen(&mut agent, index);
            }
            if tag.contains("B-V") || tag.contains("I-V") {
                widen(&mut verb, index);
            }
            if tag.contains("ARG1") {
                widen(&mut object, index);
            }
            if tag.contains("ARGM-ADV") {
                widen(&mut adverbial, index);
            }
        }
        let (mut begin, mut end) = extent?;

        if let Some((adv_begin, _)) = adverbial {
            let core = [agent, verb, object];
            if adv_begin == begin {
                if let Some(start) = core.iter().flatten().map(|s| s.0).min() {
                    begin = start;
                }
            } else if let Some(stop) = core.iter().flatten().map(|s| s.1).max() {
                end = stop;
            }
        }

        Some(Self {
            agent,
            verb,
            object,
            adverbial,
            begin,
            end,
        })
    }

    /// Token count of the trimmed range
    #[must_use]
    pub fn width(&self) -> usize {
        self.end - self.begin + 1
    }

    fn overlaps(&self, span: Span) -> bool {
        self.begin <= span.1 && span.0 <= self.end
    }
}

/// Frames of one sentence whose ranges overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGroup {
    /// Range of the longest frame
    pub range: Span,
    /// Index (into the analysed frames) of the longest frame
    pub longest: usize,
    pub items: Vec<usize>,
}

/// Group overlapping frames; each group keeps the range of its longest member.
#[must_use]
pub fn group_frames(frames: &[FrameSpans]) -> Vec<FrameGroup> {
    let mut groups: Vec<FrameGroup> = Vec::new();
    for (index, frame) in frames.iter().enumerate() {
        let mut joined = false;
        for group in &mut groups {
            if frame.overlaps(group.range) {
                if frame.width() > group.range.1 - group.range.0 + 1 {
                    group.range = (frame.begin, frame.end);
                    group.longest = index;
                }
                group.items.push(index);
                joined = true;
            }
        }
        if !joined {
            groups.push(FrameGroup {
                range: (frame.begin, frame.end),
                longest: index,
                items: vec![index],
            });
        }
    }
    groups
}

/// Agent tokens without leading determiners
#[must_use]
pub fn swimlane_text(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .skip_while(|t| DETERMINERS.contains(&t.to_lowercase().as_str()))
        .cloned()
        .collect()
}

/// One clause per frame group of every sentence, in document order.
#[must_use]
pub fn extract_clauses(sentences: &[SrlSentence]) -> Vec<Clause> {
    let offsets = sentence_offsets(sentences);
    let mut clauses = Vec::new();
    for (sent_index, sentence) in sentences.iter().enumerate() {
        let frames: Vec<FrameSpans> = sentence
            .verbs
            .iter()
            .filter_map(|f| FrameSpans::from_tags(&f.tags))
            .collect();
        let offset = offsets[sent_index];

        for group in group_frames(&frames) {
            let (begin, end) = group.range;
            let Some(tokens) = sentence.words.get(begin..=end) else {
                tracing::warn!(sent_index, begin, end, "frame range outside sentence");
                continue;
            };
            let mut clause = Clause::new(sent_index, offset + begin, tokens.to_vec());

            let agent = std::iter::once(group.longest)
                .chain(group.items.iter().copied())
                .filter_map(|i| frames[i].agent)
                .find(|a| a.0 >= begin && a.1 <= end);
            if let Some((a_begin, a_end)) = agent {
                let lane = (a_begin - begin, a_end - begin);
                clause.sw_lane = Some(lane);
                clause.sw_lane_text = swimlane_text(&tokens[lane.0..=lane.1]);
            }
            clauses.push(clause);
        }
    }
    tracing::debug!(count = clauses.len(), "clauses extracted");
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tags(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn spans_follow_role_tags() {
        let f = FrameSpans::from_tags(&tags("B-ARG0 I-ARG0 B-V B-ARG1 I-ARG1 O")).unwrap();
        assert_eq!(f.agent, Some((0, 1)));
        assert_eq!(f.verb, Some((2, 2)));
        assert_eq!(f.object, Some((3, 4)));
        assert_eq!((f.begin, f.end), (0, 4));
        assert!(FrameSpans::from_tags(&tags("O O O")).is_none());
    }

    #[test]
    fn leading_adverbial_is_trimmed_from_the_front() {
        let f = FrameSpans::from_tags(&tags(
            "B-ARGM-ADV I-ARGM-ADV I-ARGM-ADV B-ARG1 I-ARG1 B-V",
        ))
        .unwrap();
        assert_eq!((f.begin, f.end), (3, 5));
    }

    #[test]
    fn trailing_adverbial_is_trimmed_from_the_back() {
        let f = FrameSpans::from_tags(&tags("B-ARG0 B-V B-ARG1 B-ARGM-ADV I-ARGM-ADV")).unwrap();
        assert_eq!((f.begin, f.end), (0, 2));
    }

    #[test]
    fn overlapping_frames_keep_the_longest() {
        let frames = vec![
            FrameSpans::from_tags(&tags("B-ARG0 B-V O O O")).unwrap(),
            FrameSpans::from_tags(&tags("B-ARG0 B-V B-ARG1 I-ARG1 O")).unwrap(),
            FrameSpans::from_tags(&tags("O O O O B-V")).unwrap(),
        ];
        let groups = group_frames(&frames);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].range, (0, 3));
        assert_eq!(groups[0].longest, 1);
        assert_eq!(groups[0].items, vec![0, 1]);
        assert_eq!(groups[1].range, (4, 4));
    }

    #[test]
    fn parse_rejects_tag_length_mismatch() {
        let value = json!({"output": [{"words": ["a", "b"], "verbs": [{"tags": ["O"]}]}]});
        assert!(matches!(
            parse_srl(&value),
            Err(PayloadError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(parse_srl(&json!({"output": 3})).is_err());
    }

    #[test]
    fn clauses_use_document_offsets_and_swimlanes() {
        let value = json!([
            {"words": ["The", "clerk", "checks", "it", "."],
             "verbs": [{"verb": "checks", "tags": ["B-ARG0", "I-ARG0", "B-V", "B-ARG1", "O"]}]},
            {"words": ["It", "is", "reserved", "."],
             "verbs": [{"verb": "reserved", "tags": ["B-ARG1", "O", "B-V", "O"]}]}
        ]);
        let sentences = parse_srl(&value).unwrap();
        let clauses = extract_clauses(&sentences);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].sw_lane, Some((0, 1)));
        assert_eq!(clauses[0].sw_lane_text, vec!["clerk".to_string()]);
        assert_eq!(clauses[1].sent_index, 1);
        assert_eq!(clauses[1].range(), 5..=7);
        assert_eq!(clauses[1].node_text_joined(), "It is reserved");
        assert!(clauses[1].sw_lane.is_none());
    }
}
