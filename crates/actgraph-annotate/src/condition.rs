//! Condition/action range extraction from adverbial and temporal argument frames

use crate::srl::{sentence_offsets, SrlSentence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CONDITION_ROLES: [&str; 2] = ["ARGM-ADV", "ARGM-TMP"];

/// Condition range of a sentence, in document offsets (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSpan {
    pub begin: usize,
    pub end: usize,
    /// Matched conditional indicator
    pub keyword: Option<String>,
}

/// Action range of a sentence, in document offsets (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpan {
    pub begin: usize,
    pub end: usize,
    /// Action precedes its condition in the sentence
    pub found_in_front: bool,
}

/// One condition/action pairing found in a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionAction {
    pub condition: Option<ConditionSpan>,
    pub action: Option<ActionSpan>,
}

/// Sentence index → condition/action pairings of that sentence
pub type ConditionActionIndex = BTreeMap<usize, Vec<ConditionAction>>;

#[derive(Debug)]
struct TaggedPart {
    found: Vec<usize>,
    other: Vec<usize>,
    keyword: Option<(String, Vec<usize>)>,
}

/// Finds condition frames by conditional indicator keywords.
#[derive(Debug, Clone)]
pub struct ConditionExtractor {
    indicators: Vec<Vec<String>>,
}

impl ConditionExtractor {
    #[must_use]
    pub fn new<S: AsRef<str>>(indicators: &[S]) -> Self {
        Self {
            indicators: indicators
                .iter()
                .map(|i| {
                    i.as_ref()
                        .split_whitespace()
                        .map(str::to_lowercase)
                        .collect::<Vec<_>>()
                })
                .filter(|i| !i.is_empty())
                .collect(),
        }
    }

    /// Longest indicator occurring as a contiguous token run inside `found`
    fn match_keyword(&self, words: &[String], found: &[usize]) -> Option<(String, Vec<usize>)> {
        let lowered: Vec<String> = found.iter().map(|i| words[*i].to_lowercase()).collect();
        let mut best: Option<(String, Vec<usize>)> = None;
        for indicator in &self.indicators {
            let Some(start) = lowered
                .windows(indicator.len())
                .position(|w| w == indicator.as_slice())
            else {
                continue;
            };
            if best.as_ref().is_some_and(|(_, pos)| pos.len() >= indicator.len()) {
                continue;
            }
            let positions = found[start..start + indicator.len()].to_vec();
            best = Some((indicator.join(" "), positions));
        }
        best
    }

    fn tagged_parts(&self, sentence: &SrlSentence) -> Vec<TaggedPart> {
        let mut parts = Vec::new();
        for frame in &sentence.verbs {
            for role in CONDITION_ROLES {
                let begin_tag = format!("B-{role}");
                if !frame.tags.iter().any(|t| *t == begin_tag) {
                    continue;
                }
                let found: Vec<usize> = frame
                    .tags
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.contains(role))
                    .map(|(i, _)| i)
                    .collect();
                let other: Vec<usize> = frame
                    .tags
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.as_str() != "O")
                    .map(|(i, _)| i)
                    .collect();
                let keyword = self.match_keyword(&sentence.words, &found);
                parts.push(TaggedPart {
                    found,
                    other,
                    keyword,
                });
            }
        }
        parts
    }

    /// Condition/action ranges of every sentence with a conditional argument frame.
    ///
    /// One tagged frame: the argument minus its keyword is the condition (the keyword
    /// itself when nothing else remains) and the rest of the frame is the action. Two
    /// tagged frames: the one with more labelled tokens supplies the action. Sentences
    /// with more tagged frames are skipped.
    #[must_use]
    pub fn extract(&self, sentences: &[SrlSentence]) -> ConditionActionIndex {
        let offsets = sentence_offsets(sentences);
        let mut index = ConditionActionIndex::new();
        for (sent_index, sentence) in sentences.iter().enumerate() {
            let parts = self.tagged_parts(sentence);
            let Some(first) = parts.first() else {
                continue;
            };
            let Some((keyword, keyword_pos)) = first.keyword.clone() else {
                continue;
            };

            let (condition_idx, action_idx) = match parts.len() {
                1 => {
                    let mut cond = minus(&first.found, &keyword_pos);
                    if cond.is_empty() {
                        cond = keyword_pos.clone();
                    }
                    (cond, minus(&first.other, &first.found))
                }
                2 => {
                    let (cond, act) = if parts[1].other.len() > parts[0].other.len() {
                        (&parts[0], &parts[1])
                    } else {
                        (&parts[1], &parts[0])
                    };
                    (minus(&cond.other, &cond.found), minus(&act.other, &act.found))
                }
                n => {
                    tracing::warn!(sent_index, frames = n, "too many conditional frames, sentence skipped");
                    continue;
                }
            };

            let offset = offsets[sent_index];
            let condition = bounds(&condition_idx).map(|(b, e)| ConditionSpan {
                begin: offset + b,
                end: offset + e,
                keyword: Some(keyword.clone()),
            });
            let action = bounds(&action_idx).map(|(b, e)| ActionSpan {
                begin: offset + b,
                end: offset + e,
                found_in_front: condition
                    .as_ref()
                    .is_some_and(|c| offset + b < c.begin),
            });
            tracing::debug!(sent_index, keyword = %keyword, "condition found");
            index
                .entry(sent_index)
                .or_default()
                .push(ConditionAction { condition, action });
        }
        index
    }
}

fn minus(from: &[usize], remove: &[usize]) -> Vec<usize> {
    from.iter().copied().filter(|i| !remove.contains(i)).collect()
}

fn bounds(indices: &[usize]) -> Option<(usize, usize)> {
    Some((*indices.iter().min()?, *indices.iter().max()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srl::SrlFrame;
    use pretty_assertions::assert_eq;

    fn sentence(words: &str, frames: &[&str]) -> SrlSentence {
        SrlSentence {
            words: words.split_whitespace().map(str::to_string).collect(),
            verbs: frames
                .iter()
                .map(|t| SrlFrame {
                    verb: String::new(),
                    description: String::new(),
                    tags: t.split_whitespace().map(str::to_string).collect(),
                })
                .collect(),
        }
    }

    fn extractor() -> ConditionExtractor {
        ConditionExtractor::new(&["if", "otherwise", "in case", "if not"])
    }

    #[test]
    fn single_frame_splits_condition_and_action() {
        let s = sentence(
            "If the part is available the order ships",
            &["B-ARGM-ADV I-ARGM-ADV I-ARGM-ADV I-ARGM-ADV I-ARGM-ADV B-ARG1 I-ARG1 B-V"],
        );
        let index = extractor().extract(&[s]);
        let entry = &index[&0][0];
        assert_eq!(
            entry.condition,
            Some(ConditionSpan {
                begin: 1,
                end: 4,
                keyword: Some("if".into())
            })
        );
        assert_eq!(
            entry.action,
            Some(ActionSpan {
                begin: 5,
                end: 7,
                found_in_front: false
            })
        );
    }

    #[test]
    fn bare_keyword_becomes_the_condition() {
        let s = sentence(
            "x . otherwise she takes it home",
            &["O O B-ARGM-ADV B-ARG0 B-V B-ARG1 B-ARGM-DIR"],
        );
        let index = extractor().extract(&[sentence("a b", &[]), s]);
        let entry = &index[&1][0];
        let cond = entry.condition.as_ref().unwrap();
        assert_eq!((cond.begin, cond.end), (4, 4));
        assert_eq!(cond.keyword.as_deref(), Some("otherwise"));
        let act = entry.action.as_ref().unwrap();
        assert_eq!((act.begin, act.end), (5, 8));
    }

    #[test]
    fn longest_indicator_wins() {
        let s = sentence(
            "if not approved reject it",
            &["B-ARGM-ADV I-ARGM-ADV I-ARGM-ADV B-V B-ARG1"],
        );
        let index = extractor().extract(&[s]);
        let cond = index[&0][0].condition.as_ref().unwrap();
        assert_eq!(cond.keyword.as_deref(), Some("if not"));
        assert_eq!((cond.begin, cond.end), (2, 2));
    }

    #[test]
    fn frames_without_indicator_are_ignored() {
        let s = sentence("after lunch we ship", &["B-ARGM-TMP I-ARGM-TMP B-ARG0 B-V"]);
        assert!(extractor().extract(&[s]).is_empty());
    }

    #[test]
    fn too_many_frames_skip_the_sentence() {
        let tags = "B-ARGM-ADV B-V O";
        let s = sentence("if go now", &[tags, tags, tags]);
        assert!(extractor().extract(&[s]).is_empty());
    }
}
