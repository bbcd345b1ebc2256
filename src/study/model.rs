use serde::{Deserialize, Serialize};

/// One curriculum segment of a generated study guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyUnit {
    pub unit: String,
    pub summary: String,
    /// Embed URL; only the first and last unit carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<AnswerOption>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub value: String,
    pub text: String,
}

impl Question {
    /// True when the answer names exactly one of the options.
    pub fn answer_is_unambiguous(&self) -> bool {
        let answer = self.answer.trim();
        self.options
            .iter()
            .filter(|option| option.value.trim() == answer)
            .count()
            == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(labels: &[&str], answer: &str) -> Question {
        Question {
            question: "Which?".into(),
            options: labels
                .iter()
                .map(|l| AnswerOption {
                    value: l.to_string(),
                    text: format!("Option {}", l),
                })
                .collect(),
            answer: answer.into(),
        }
    }

    #[test]
    fn answer_must_match_exactly_one_label() {
        assert!(question(&["A", "B", "C", "D"], "C").answer_is_unambiguous());
        assert!(question(&["A", "B"], " B ").answer_is_unambiguous());
        assert!(!question(&["A", "B"], "E").answer_is_unambiguous());
        assert!(!question(&["A", "A"], "A").answer_is_unambiguous());
        assert!(!question(&[], "A").answer_is_unambiguous());
    }

    #[test]
    fn absent_video_is_not_serialized() {
        let unit = StudyUnit {
            unit: "Intro".into(),
            summary: "Basics".into(),
            youtube: None,
            questions: vec![],
        };
        let value = serde_json::to_value(&unit).unwrap();
        assert!(value.get("youtube").is_none());
        assert_eq!(value["questions"], serde_json::json!([]));
    }
}
