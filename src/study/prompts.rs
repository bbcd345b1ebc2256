use crate::utils::content_guard::take_chars;

/// Characters of course content shown to the model when naming the lecture.
pub const TITLE_EXCERPT_CHARS: usize = 1500;

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

const GUIDE_SHAPE: &str = r#"[
  {
    "unit": "Unit title",
    "summary": "Short detailed summary of this unit...",
    "youtube": "https://www.youtube.com/embed/...",
    "questions": [
      {
        "question": "What is ...?",
        "options": [
          {"value": "A", "text": "Option A"},
          {"value": "B", "text": "Option B"},
          {"value": "C", "text": "Option C"},
          {"value": "D", "text": "Option D"}
        ],
        "answer": "C"
      }
    ]
  }
]"#;

pub fn title_prompt(full_text: &str) -> String {
    format!(
        "Given the following course content, generate a short and accurate title for it.\n\
         Only respond with the title as a plain string, with no extra words, quotes or formatting.\n\
         \n\
         Course Content:\n\
         {}\n",
        take_chars(full_text, TITLE_EXCERPT_CHARS)
    )
}

/// Strips whitespace and any quote characters wrapped around the model's title.
pub fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| QUOTE_CHARS.contains(&c) || c.is_whitespace())
        .to_string()
}

pub fn study_guide_prompt(full_text: &str, video_url: Option<&str>) -> String {
    let video_rule = match video_url {
        Some(url) => format!(
            "3. Only the first and final unit should include this YouTube video in a \"youtube\" field, \
             to help understand the overall lecture: {}\n",
            url
        ),
        None => "3. Do not include a \"youtube\" field in any unit.\n".to_string(),
    };

    format!(
        "You're an AI tutor. Analyze the following course content and generate:\n\
         \n\
         1. A well-detailed summary broken into units or subtopics.\n\
         2. For each unit, include at most 3 multiple-choice questions, each with 4 options and the correct answer. \
         The answer must be the \"value\" of exactly one option.\n\
         {}\
         4. Strictly generate valid JSON (no comments, no trailing commas) in the format:\n\
         \n\
         {}\n\
         \n\
         Here is the course content:\n\
         {}\n",
        video_rule, GUIDE_SHAPE, full_text
    )
}
