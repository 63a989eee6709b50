//! Prompt templates for every model call.
//!
//! Cantonese is the target register for replies; voice notes are summarized
//! in formal written Chinese.

/// Pass 1 of transcription: verbatim colloquial Cantonese
pub const TRANSCRIBE_CANTONESE: &str = r#"這是一段廣東話（粵語）語音訊息。請仔細聆聽並逐字轉錄成廣東話書寫文字。

重要要求：
1. 使用廣東話專用字詞，例如：
   - 嘅（的）、唔（不）、係（是）、咁（這樣）、嗰（那）
   - 佢（他/她）、佢哋（他們）、我哋（我們）、你哋（你們）
   - 冇（沒有）、啲（一些）、嘢（東西）、咗（了）、緊（著）
   - 畀（給）、睇（看）、講（說）、諗（想）、喺（在）
   - 返（回）、嚟（來）、去、過嚟（過來）

2. 完整保留所有語氣詞和句末助詞：
   啦、囉、喎、吖、嘛、啊、呀、喇、咩、嘞、㗎、嚟、喺、噃、啩、嘎、咋、喂、哇、唉

3. 保持口語化表達，不要轉換成書面語

只輸出轉錄的廣東話文字，不要任何解釋或說明。"#;

/// Formal-register words and their colloquial replacements
pub const CANTONESE_SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("的", &["嘅"]),
    ("他/她", &["佢"]),
    ("他們/她們", &["佢哋"]),
    ("我們", &["我哋"]),
    ("你們", &["你哋"]),
    ("沒有", &["冇"]),
    ("不", &["唔"]),
    ("是", &["係"]),
    ("這/這個", &["呢個"]),
    ("那/那個", &["嗰個"]),
    ("什麼", &["咩", "乜嘢"]),
    ("東西", &["嘢"]),
    ("了", &["咗"]),
    ("著", &["緊"]),
    ("給", &["畀"]),
    ("看", &["睇"]),
    ("說", &["講"]),
    ("想", &["諗"]),
    ("知道", &["知"]),
    ("回去", &["返去"]),
    ("過來", &["過嚟"]),
    ("一些", &["啲"]),
    ("很/非常", &["好"]),
    ("這樣", &["咁"]),
    ("怎樣", &["點"]),
];

const DISCOURSE_PARTICLES: &str = "啦、囉、喎、吖、嘛、啊、呀、喇、咩、嘞、㗎、嚟、喺";

/// Pass 2 of transcription: lexical register correction only
pub fn correction_prompt(text: &str) -> String {
    let rules: String = CANTONESE_SUBSTITUTIONS
        .iter()
        .map(|(formal, colloquial)| {
            let targets: Vec<String> = colloquial.iter().map(|c| format!("「{}」", c)).collect();
            format!("- 「{}」→{}\n", formal, targets.join("/"))
        })
        .collect();

    format!(
        "請校正以下廣東話轉錄文字，確保使用正確的廣東話用字。\n\n\
         常見校正規則：\n{rules}\n\
         請保留所有語氣詞（{DISCOURSE_PARTICLES}等）。\n\
         只可以改用字，唔可以改變原文意思。\n\n\
         原文：\n{text}\n\n\
         只輸出校正後的廣東話文字，不要任何解釋："
    )
}

const JSON_REPLY_FORMAT: &str = "請用以下 JSON 格式回覆（只輸出 JSON，不要其他內容）：";

/// Summary in formal written Chinese plus a short title
pub fn formal_summary_prompt(text: &str) -> String {
    format!(
        "請根據以下內容，完成兩個任務：\n\n\
         1. 將內容改寫成書面語的摘要（保留重點，使用正式的書面語言）\n\
         2. 為這段內容取一個簡短的標題（10字以內）\n\n\
         原始內容：\n{text}\n\n\
         {JSON_REPLY_FORMAT}\n\
         {{\"title\": \"標題\", \"summary\": \"書面語摘要\"}}"
    )
}

const CANTONESE_STYLE_GUIDE: &str = "使用口語化的廣東話表達，例如：\n   \
     - 使用「嘅」而非「的」\n   \
     - 使用「係」而非「是」\n   \
     - 使用「唔」而非「不」\n   \
     - 使用「冇」而非「沒有」\n   \
     - 使用「佢」而非「他/她」\n   \
     - 使用「啲」而非「一些」\n   \
     - 保留適當的語氣詞如：啦、喎、㗎、嘅等";

/// Summary in colloquial Cantonese plus a short title
pub fn cantonese_summary_prompt(text: &str) -> String {
    format!(
        "請根據以下內容，完成兩個任務：\n\n\
         1. 將內容摘要成廣東話（粵語），{CANTONESE_STYLE_GUIDE}\n\n\
         2. 為這段內容取一個簡短的標題（10字以內，可用書面語）\n\n\
         原始內容：\n{text}\n\n\
         {JSON_REPLY_FORMAT}\n\
         {{\"title\": \"標題\", \"summary\": \"廣東話摘要\"}}"
    )
}

/// Translate foreign-language content, then summarize it in Cantonese
pub fn translate_summary_prompt(text: &str) -> String {
    format!(
        "以下內容唔係中文。請完成兩個任務：\n\n\
         1. 先理解並翻譯內容，然後摘要成廣東話（粵語），{CANTONESE_STYLE_GUIDE}\n\n\
         2. 用中文為這段內容取一個簡短的標題（10字以內，可用書面語）\n\n\
         原始內容：\n{text}\n\n\
         {JSON_REPLY_FORMAT}\n\
         {{\"title\": \"標題\", \"summary\": \"廣東話摘要\"}}"
    )
}

/// Describe an image as a regeneration prompt plus a short title
pub const IMAGE_UNDERSTANDING: &str = "請仔細觀察呢張圖片，完成兩個任務：\n\n\
     1. 用英文寫一段詳細嘅圖像生成提示詞（prompt），描述主體、構圖、光線、色調同風格，\
     令 AI 可以根據提示詞重新畫出相似嘅圖片\n\
     2. 為圖片取一個簡短的中文標題（10字以內）\n\n\
     請用以下 JSON 格式回覆（只輸出 JSON，不要其他內容）：\n\
     {\"prompt\": \"英文提示詞\", \"title\": \"標題\"}";

/// Visual styles used for regeneration
pub const STYLES: &[&str] = &[
    "Studio Ghibli anime",
    "watercolor painting",
    "Van Gogh post-impressionism",
    "Japanese ukiyo-e woodblock print",
    "pixel art",
    "cyberpunk neon",
    "Pixar 3D animation",
    "Chinese ink wash painting",
];

/// Rewrite a prompt into a new visual style, keeping subject and composition
pub fn style_transform_prompt(prompt: &str, style: &str) -> String {
    format!(
        "Rewrite the following image generation prompt so the picture is rendered in the \
         style of {style}.\n\n\
         Keep the subject, composition, pose and key objects exactly the same; change only \
         the visual style, medium, palette and texture.\n\n\
         Original prompt:\n{prompt}\n\n\
         Output only the rewritten prompt, with no explanation."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_prompt_lists_every_rule() {
        let prompt = correction_prompt("佢話");
        for (formal, _) in CANTONESE_SUBSTITUTIONS {
            assert!(prompt.contains(&format!("「{}」", formal)));
        }
        assert!(prompt.contains("原文：\n佢話"));
        assert!(prompt.contains("保留所有語氣詞"));
    }

    #[test]
    fn test_correction_rule_with_alternatives() {
        let prompt = correction_prompt("x");
        assert!(prompt.contains("- 「什麼」→「咩」/「乜嘢」\n"));
        assert!(prompt.contains("- 「的」→「嘅」\n"));
        assert!(CANTONESE_SUBSTITUTIONS.iter().all(|(_, targets)| !targets.is_empty()));
    }

    #[test]
    fn test_summary_prompts_request_json() {
        for prompt in [
            formal_summary_prompt("x"),
            cantonese_summary_prompt("x"),
            translate_summary_prompt("x"),
        ] {
            assert!(prompt.contains("{\"title\": \"標題\""));
        }
    }

    #[test]
    fn test_style_prompt() {
        let prompt = style_transform_prompt("a cat on a sofa", "pixel art");
        assert!(prompt.contains("pixel art"));
        assert!(prompt.contains("a cat on a sofa"));
    }
}
