//! crates/vocab_core/src/prompts.rs
//!
//! The fixed prompt recipes behind every template.
//!
//! Text templates carry a system role, the JSON schema the model is asked to
//! follow (embedded in the user instruction), and the list of fields that schema
//! requires. The schema is a prompt contract only; nothing here enforces it.

/// A rendered text prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrompt {
    pub system: &'static str,
    pub user: String,
    pub required_fields: &'static [&'static str],
}

//=========================================================================================
// Word Lookup
//=========================================================================================

const WORD_INFO_SYSTEM: &str = r#"당신은 영어 교육 전문가입니다. 영어 단어에 대한 정확하고 풍부한 정보를 제공합니다.
모든 응답은 한국어로 작성하되, 영어 단어와 예문은 영어로 유지합니다."#;

const WORD_INFO_USER: &str = r#""{word}" 단어에 대한 상세 정보를 JSON 형식으로 제공해주세요.

다음 형식을 정확히 따라주세요:
{
  "word": "검색한 단어",
  "pronunciation": "발음 기호 (IPA)",
  "partOfSpeech": ["품사 배열"],
  "coreMeanings": [
    {
      "meaning": "핵심 의미 (한국어)",
      "partOfSpeech": "품사",
      "example": "예문 (영어)",
      "exampleTranslation": "예문 번역 (한국어)"
    }
  ],
  "additionalMeanings": [
    {
      "meaning": "부가적 의미",
      "partOfSpeech": "품사",
      "usage": "사용 맥락"
    }
  ],
  "idioms": [
    {
      "phrase": "숙어 표현",
      "meaning": "숙어 의미",
      "example": "숙어 예문"
    }
  ],
  "synonyms": [
    { "word": "유의어", "korean": "한국어 뜻" }
  ],
  "antonyms": [
    { "word": "반의어", "korean": "한국어 뜻" }
  ]
}

단어가 존재하지 않거나 찾을 수 없는 경우:
{
  "error": true,
  "message": "정보를 찾을 수 없습니다."
}"#;

pub fn word_info(word: &str) -> TextPrompt {
    TextPrompt {
        system: WORD_INFO_SYSTEM,
        user: fill(WORD_INFO_USER, &[("word", word)]),
        required_fields: &["word", "pronunciation", "coreMeanings"],
    }
}

//=========================================================================================
// Encyclopedia
//=========================================================================================

const ENCYCLOPEDIA_SYSTEM: &str = r#"당신은 언어학자이자 역사학자입니다. 단어에 대한 깊이 있고 풍부한 백과사전식 설명을 제공합니다.
학술적이면서도 읽기 쉬운 문체로 작성합니다."#;

const ENCYCLOPEDIA_USER: &str = r#""{word}" ({meaning}) 단어에 대한 백과사전식 상세 설명을 JSON 형식으로 작성해주세요.

분량: 각 섹션당 3-5문단

{
  "etymology": {
    "origin": "어원 설명 (언어적 기원, 변천 과정)",
    "rootWords": ["어근 단어들"],
    "languageOrigin": "기원 언어 (라틴어, 그리스어 등)"
  },
  "historicalContext": {
    "description": "역사적 맥락과 사례 (상세히)",
    "historicalExamples": [
      {
        "period": "시대",
        "event": "역사적 사건/사용 사례",
        "significance": "의미/중요성"
      }
    ]
  },
  "literaryUsage": {
    "description": "문학 작품에서의 사용",
    "examples": [
      {
        "work": "작품명",
        "author": "작가",
        "quote": "인용문 (영어)",
        "analysis": "분석/해설"
      }
    ]
  },
  "culturalSignificance": "문화적 의미와 현대적 용법",
  "interestingFacts": ["흥미로운 사실들"]
}"#;

pub fn encyclopedia(word: &str, meaning: &str) -> TextPrompt {
    TextPrompt {
        system: ENCYCLOPEDIA_SYSTEM,
        user: fill_word_meaning(ENCYCLOPEDIA_USER, word, meaning),
        required_fields: &[
            "etymology",
            "historicalContext",
            "literaryUsage",
            "culturalSignificance",
            "interestingFacts",
        ],
    }
}

//=========================================================================================
// Concept Tree
//=========================================================================================

const CONCEPT_TREE_SYSTEM: &str =
    "당신은 개념 분류 전문가입니다. 단어의 상위 개념과 하위 개념을 체계적으로 분류합니다.";

const CONCEPT_TREE_USER: &str = r#""{word}" ({meaning}) 단어의 개념 트리를 JSON 형식으로 작성해주세요.

모든 단어는 "English(한국어)" 형식으로 작성합니다.

{
  "word": "{word}",
  "superordinates": [
    {
      "level": 1,
      "concepts": ["상위 개념들 (가장 넓은 범주)"]
    },
    {
      "level": 2,
      "concepts": ["중간 상위 개념들"]
    }
  ],
  "subordinates": [
    {
      "level": 1,
      "concepts": ["직접 하위 개념들"]
    },
    {
      "level": 2,
      "concepts": ["더 세부적인 하위 개념들"]
    }
  ],
  "relatedConcepts": ["관련 개념들 (같은 레벨)"]
}"#;

pub fn concept_tree(word: &str, meaning: &str) -> TextPrompt {
    TextPrompt {
        system: CONCEPT_TREE_SYSTEM,
        user: fill_word_meaning(CONCEPT_TREE_USER, word, meaning),
        required_fields: &["word", "superordinates", "subordinates", "relatedConcepts"],
    }
}

//=========================================================================================
// Episode
//=========================================================================================

const EPISODE_SYSTEM: &str = r#"당신은 창의적인 이야기꾼입니다. 영어 단어를 쉽게 기억할 수 있도록 재미있고 기억에 남는 짧은 이야기를 만듭니다.
이야기는 단어의 의미와 연결되어 있어야 하며, 유머러스하거나 감동적이어야 합니다."#;

const EPISODE_USER: &str = r#""{word}" ({meaning}) 단어를 쉽게 기억할 수 있는 짧은 에피소드를 JSON 형식으로 작성해주세요.

{
  "title": "에피소드 제목",
  "story": "이야기 내용 (3-5문단, 재미있고 기억하기 쉽게)",
  "memoryTip": "기억법 팁 (단어와 이야기를 연결하는 방법)",
  "moralOrLesson": "교훈 또는 핵심 포인트"
}"#;

pub fn episode(word: &str, meaning: &str) -> TextPrompt {
    TextPrompt {
        system: EPISODE_SYSTEM,
        user: fill_word_meaning(EPISODE_USER, word, meaning),
        required_fields: &["title", "story", "memoryTip", "moralOrLesson"],
    }
}

//=========================================================================================
// Examples
//=========================================================================================

pub const DEFAULT_MEANING_TYPE: &str = "core";

const EXAMPLES_SYSTEM: &str = r#"당신은 영어 교육 전문가입니다. 현대적이고 실용적인 영어 예문을 생성합니다.
예문은 다양한 상황과 난이도를 포함해야 합니다."#;

const EXAMPLES_USER: &str = r#""{word}" 단어의 "{meaning}" 의미에 대한 5개의 예문을 JSON 형식으로 생성해주세요.

의미 유형: {meaningType} (core: 핵심 의미, additional: 부가 의미, idiom: 숙어)

{
  "examples": [
    {
      "id": 1,
      "sentence": "영어 예문 (검색 단어는 **bold**로 표시)",
      "translation": "한국어 번역",
      "difficulty": "easy|medium|hard",
      "context": "상황/맥락 (일상, 비즈니스, 학술 등)"
    }
  ]
}

예문 작성 규칙:
1. 현대적이고 자연스러운 표현 사용
2. 다양한 문장 구조와 시제 활용
3. 실제 대화나 글에서 사용할 수 있는 실용적인 문장
4. 검색 단어는 **단어** 형식으로 볼드 표시"#;

pub fn examples(word: &str, meaning_type: &str, meaning: &str) -> TextPrompt {
    TextPrompt {
        system: EXAMPLES_SYSTEM,
        user: fill(
            EXAMPLES_USER,
            &[("word", word), ("meaning", meaning), ("meaningType", meaning_type)],
        ),
        required_fields: &["examples"],
    }
}

//=========================================================================================
// Scenario
//=========================================================================================

const SCENARIO_SYSTEM: &str = "당신은 영어 회화 전문가입니다. 실제 상황에서 단어가 어떻게 사용되는지 보여주는 자연스러운 대화를 생성합니다.";

const SCENARIO_USER: &str = r#""{word}" ({meaning}) 단어가 사용되는 실제 대화 시나리오를 JSON 형식으로 생성해주세요.

{
  "scenario": {
    "title": "시나리오 제목",
    "setting": "상황 설명",
    "characters": ["등장인물"],
    "dialogue": [
      {
        "speaker": "화자",
        "line": "대사 (영어)",
        "translation": "번역 (한국어)",
        "note": "해설/설명 (선택적)"
      }
    ],
    "vocabularyHighlight": "대화에서 단어가 사용된 방식 설명"
  }
}"#;

pub fn scenario(word: &str, meaning: &str) -> TextPrompt {
    TextPrompt {
        system: SCENARIO_SYSTEM,
        user: fill_word_meaning(SCENARIO_USER, word, meaning),
        required_fields: &["scenario"],
    }
}

//=========================================================================================
// Quiz
//=========================================================================================

/// Number of fill-in-the-blank items a quiz asks for.
pub const QUIZ_ITEM_COUNT: usize = 5;

const QUIZ_SYSTEM: &str =
    "당신은 영어 테스트 출제 전문가입니다. 단어의 정확한 용법을 테스트하는 빈칸 채우기 퀴즈를 만듭니다.";

const QUIZ_USER: &str = r#""{word}" 단어에 대한 빈칸 채우기 퀴즈 {count}문제를 JSON 형식으로 생성해주세요.

단어의 의미들: {meanings}

{
  "quizzes": [
    {
      "id": 1,
      "question": "문장 (빈칸은 _____ 로 표시)",
      "answer": "정답",
      "hint": "힌트",
      "explanation": "해설",
      "difficulty": "easy|medium|hard"
    }
  ]
}"#;

pub fn quiz(word: &str, meanings: &[String]) -> TextPrompt {
    TextPrompt {
        system: QUIZ_SYSTEM,
        user: fill(
            QUIZ_USER,
            &[
                ("word", word),
                ("count", &QUIZ_ITEM_COUNT.to_string()),
                ("meanings", &meanings.join(", ")),
            ],
        ),
        required_fields: &["quizzes"],
    }
}

fn fill_word_meaning(template: &str, word: &str, meaning: &str) -> String {
    fill(template, &[("word", word), ("meaning", meaning)])
}

/// Substitutes `{name}` placeholders in a single pass. Substituted text is never
/// rescanned, and braces that are not a known placeholder are kept as is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let placeholder = values
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

//=========================================================================================
// Image Prompts
//=========================================================================================

/// Prompt for the headline image of a word. `is_complex` selects a labeled
/// diagram rendering; deciding it is up to the caller.
pub fn word_image(word: &str, meaning: &str, is_complex: bool) -> String {
    if is_complex {
        format!(
            "Educational diagram illustration of \"{word}\" ({meaning}).\n\
             Clean, detailed scientific diagram style with labeled parts.\n\
             Professional educational material aesthetic.\n\
             High quality, clear visualization with annotations in English.\n\
             White or light gray background."
        )
    } else {
        format!(
            "Beautiful, clear illustration representing the concept of \"{word}\" ({meaning}).\n\
             Modern, clean artistic style.\n\
             Visually intuitive representation of the meaning.\n\
             High quality, vibrant colors.\n\
             Suitable for educational vocabulary learning."
        )
    }
}

/// Cartoon illustration of one meaning, optionally anchored in a context.
pub fn illustration(word: &str, meaning: &str, context: &str) -> String {
    let scene = if context.trim().is_empty() {
        format!("\"{meaning}\"")
    } else {
        format!("\"{meaning}\" in context of {}", context.trim())
    };
    format!(
        "Cute cartoon illustration in Dr. Slump (Akira Toriyama) anime style.\n\
         Scene depicting: {scene}.\n\
         Featuring the word \"{word}\".\n\
         Playful, colorful, humorous style with big expressive eyes.\n\
         Simple clean background.\n\
         Kid-friendly, fun educational illustration."
    )
}

pub fn episode_image(title: &str, story_context: &str) -> String {
    format!(
        "Cute cartoon illustration in Dr. Slump (Akira Toriyama) anime style.\n\
         Scene for story titled: \"{title}\".\n\
         Story context: {story_context}\n\
         Playful, colorful illustration with cute characters.\n\
         Fun, memorable educational illustration.\n\
         Kid-friendly style."
    )
}
