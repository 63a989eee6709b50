//! Orchestrator Integration Tests
//!
//! Dispatch, persistence and the supplementary-step fallback policy,
//! exercised end to end against in-memory collaborators.

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_test::assert_ok;
use uuid::Uuid;

use common::*;
use notebridge::core::Capabilities;
use notebridge::{InboundItem, InboundPayload, NoteType};

fn image_item(id: u128) -> InboundItem {
    InboundItem::new(
        SENDER,
        InboundPayload::Image {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime: "image/jpeg".to_string(),
            file_name: "cat.jpg".to_string(),
        },
    )
    .with_id(Uuid::from_u128(id))
}

const IMAGE_DESCRIPTION: &str = r#"{"prompt": "a ginger cat asleep on a sofa", "title": "瞓覺貓"}"#;

#[tokio::test]
async fn test_article_end_to_end() {
    let model = ScriptedModel::new([summary_reply("天氣", "今日天氣好好呀")]);
    let store = RecordingStore::new();
    let orchestrator = assert_ok!(builder(model.clone(), store.clone()).build());

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, "/a 今日天氣好好"))
        .await;

    let notes = store.notes();
    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.note_type, NoteType::TextSummary);
    assert_eq!(note.note_type.label(), "文字摘要");
    assert_eq!(note.content, "今日天氣好好");
    assert_eq!(note.body, "今日天氣好好");
    assert_eq!(note.author_id, SENDER);

    assert!(outcome.reply.text.contains("天氣"));
    assert!(outcome.reply.text.contains("今日天氣好好呀"));
    assert_eq!(outcome.record_id.as_deref(), Some("page-1"));

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].text.contains("今日天氣好好"));
    assert!(!calls[0].has_media);
}

#[tokio::test]
async fn test_article_control_bytes_are_stripped() {
    let model = ScriptedModel::new([summary_reply("天氣", "今日天氣好好")]);
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone()).build().unwrap();

    orchestrator
        .handle(InboundItem::text(SENDER, "/a 今日\u{0}天氣\u{7}好好"))
        .await;

    let note = &store.notes()[0];
    assert_eq!(note.body, "今日天氣好好");
    assert_eq!(note.content, "今日天氣好好");
    assert!(!model.calls()[0].text.contains('\u{0}'));
}

#[tokio::test]
async fn test_article_of_control_bytes_only_is_missing() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, "/a \u{0}\u{7}"))
        .await;

    assert!(outcome.reply.text.contains("/a"));
    assert!(model.calls().is_empty());
    assert!(store.notes().is_empty());
}

#[tokio::test]
async fn test_long_article_content_is_previewed() {
    let article = "呢篇文章講緊香港嘅天氣同埋交通，".repeat(10);
    let model = ScriptedModel::new([summary_reply("長文", "摘要")]);
    let store = RecordingStore::new();
    let orchestrator = builder(model, store.clone()).build().unwrap();

    orchestrator
        .handle(InboundItem::text(SENDER, format!("/a {}", article)))
        .await;

    let note = &store.notes()[0];
    assert!(note.content.ends_with("......"));
    assert_eq!(note.content.chars().count(), 30 + 6);
    assert_eq!(note.body, article.trim());
    assert_eq!(note.body_chunks(1900).concat(), note.body);
}

#[tokio::test]
async fn test_unauthorized_sender_is_denied() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text("U-stranger", "/a 今日天氣好好"))
        .await;

    assert!(outcome.reply.text.contains("權限"));
    assert!(outcome.note.is_none());
    assert!(store.notes().is_empty());
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_authorization_capability_off_allows_anyone() {
    let model = ScriptedModel::new([summary_reply("T", "S")]);
    let store = RecordingStore::new();
    let orchestrator = notebridge::Orchestrator::builder()
        .model(model)
        .store(store.clone())
        .capabilities(Capabilities {
            authorization: false,
            ..Default::default()
        })
        .build()
        .unwrap();

    orchestrator
        .handle(InboundItem::text("anyone", "/a hello"))
        .await;

    assert_eq!(store.notes().len(), 1);
}

#[tokio::test]
async fn test_help_and_missing_article_do_not_persist() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone()).build().unwrap();

    let help = orchestrator.handle(InboundItem::text(SENDER, "你好")).await;
    assert!(help.reply.text.starts_with("收到！你話：「你好」"));

    let missing = orchestrator.handle(InboundItem::text(SENDER, "/a   ")).await;
    assert_eq!(missing.reply.text, "請在 /a 後面貼上文章內容");

    assert!(store.notes().is_empty());
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_model_output_becomes_error_reply() {
    let model = ScriptedModel::new(["Sure! Here's a lovely summary for you."]);
    let store = RecordingStore::new();
    let orchestrator = builder(model, store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, "/a 今日天氣好好"))
        .await;

    assert!(outcome.reply.text.starts_with("處理時發生錯誤："));
    assert!(outcome.reply.text.contains("Malformed model output"));
    assert!(outcome.note.is_none());
    assert!(store.notes().is_empty());
}

#[tokio::test]
async fn test_error_reply_is_bounded() {
    let model = ScriptedModel::failing(&"upstream exploded ".repeat(50));
    let store = RecordingStore::new();
    let orchestrator = builder(model, store).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, "/a 今日天氣好好"))
        .await;

    let detail = outcome
        .reply
        .text
        .strip_prefix("處理時發生錯誤：")
        .unwrap();
    assert!(detail.ends_with("......"));
    assert_eq!(detail.chars().count(), 200 + 6);
}

#[tokio::test]
async fn test_persistence_failure_is_reported() {
    let model = ScriptedModel::new([summary_reply("T", "S")]);
    let orchestrator = builder(model, RecordingStore::failing()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, "/a 今日天氣好好"))
        .await;

    assert!(outcome.reply.text.contains("database is read-only"));
    assert!(outcome.record_id.is_none());
}

#[tokio::test]
async fn test_enhancement_failure_still_saves_note() {
    let model = ScriptedModel::new([IMAGE_DESCRIPTION, "a ginger cat asleep on a sofa, pixel art"]);
    let store = RecordingStore::new();
    let storage = MemoryStorage::new();
    let orchestrator = builder(model, store.clone())
        .storage(storage.clone())
        .image_generator(Arc::new(FailingImageGenerator))
        .build()
        .unwrap();

    let outcome = orchestrator.handle(image_item(7)).await;

    let notes = store.notes();
    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.note_type, NoteType::ImageInspiration);
    assert_eq!(note.title, "瞓覺貓");
    assert_eq!(note.content, "a ginger cat asleep on a sofa");
    assert!(note.summary.is_empty());
    assert_eq!(note.attachments.len(), 1);
    assert_eq!(note.attachments[0].url, "https://storage.test/cat.jpg");

    assert!(outcome.reply.text.contains("風格轉換暫時未能完成"));
    assert!(!outcome.reply.text.contains(GENERATOR_ERROR));
    assert!(outcome.reply.image_url.is_none());

    assert_eq!(storage.uploads().len(), 1);
}

#[tokio::test]
async fn test_image_regeneration_success() {
    let model = ScriptedModel::new([IMAGE_DESCRIPTION, "a ginger cat asleep on a sofa, watercolor"]);
    let store = RecordingStore::new();
    let storage = MemoryStorage::new();
    let orchestrator = builder(model.clone(), store.clone())
        .storage(storage.clone())
        .image_generator(Arc::new(StaticImageGenerator))
        .image_model("test/image-model")
        .build()
        .unwrap();

    let item = image_item(1);
    let generated_name = format!("generated-{}.png", item.id);
    let outcome = orchestrator.handle(item).await;

    let uploads = storage.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].file_name, "cat.jpg");
    assert_eq!(uploads[1].file_name, generated_name);
    assert_eq!(uploads[1].mime, "image/png");

    let note = &store.notes()[0];
    assert_eq!(note.summary, "a ginger cat asleep on a sofa, watercolor");
    assert_eq!(note.attachments.len(), 2);

    assert_eq!(
        outcome.reply.image_url.as_deref(),
        Some(format!("https://storage.test/{}", generated_name).as_str())
    );
    assert!(outcome.reply.text.contains("🎨 風格："));

    let calls = model.calls();
    assert!(calls[0].has_media);
    assert!(calls[1].text.contains("a ginger cat asleep on a sofa"));
}

#[tokio::test]
async fn test_image_without_regeneration() {
    let model = ScriptedModel::new([IMAGE_DESCRIPTION]);
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone())
        .storage(MemoryStorage::new())
        .capabilities(Capabilities {
            image_regeneration: false,
            ..Default::default()
        })
        .build()
        .unwrap();

    let outcome = orchestrator.handle(image_item(2)).await;

    assert_eq!(model.calls().len(), 1);
    assert_eq!(store.notes().len(), 1);
    assert!(outcome.reply.text.contains("描述"));
}

#[tokio::test]
async fn test_style_rewrite_failure_keeps_original() {
    let model = ScriptedModel::with_results([Ok(IMAGE_DESCRIPTION), Err("rewrite model overloaded")]);
    let store = RecordingStore::new();
    let storage = MemoryStorage::new();
    let orchestrator = builder(model.clone(), store.clone())
        .storage(storage.clone())
        .image_generator(Arc::new(StaticImageGenerator))
        .build()
        .unwrap();

    let outcome = orchestrator.handle(image_item(11)).await;

    assert_eq!(model.calls().len(), 2);
    let note = &store.notes()[0];
    assert_eq!(note.content, "a ginger cat asleep on a sofa");
    assert!(note.summary.is_empty());
    assert_eq!(note.attachments.len(), 1);

    assert!(outcome.reply.text.contains("風格轉換暫時未能完成"));
    assert!(!outcome.reply.text.contains("rewrite model overloaded"));
    assert!(outcome.reply.image_url.is_none());
    assert_eq!(storage.uploads().len(), 1);
}

#[tokio::test]
async fn test_image_description_reply_is_previewed() {
    let prompt = "a ginger cat asleep on a sofa ".repeat(10);
    let description = json!({ "prompt": prompt.trim(), "title": "貓" }).to_string();
    let model = ScriptedModel::new([description]);
    let store = RecordingStore::new();
    let orchestrator = builder(model, store.clone())
        .storage(MemoryStorage::new())
        .capabilities(Capabilities {
            image_regeneration: false,
            ..Default::default()
        })
        .build()
        .unwrap();

    let outcome = orchestrator.handle(image_item(12)).await;

    assert_eq!(store.notes()[0].content, prompt.trim());
    let shown = outcome.reply.text.split("📝 描述：").nth(1).unwrap();
    assert!(shown.ends_with("......"));
    assert_eq!(shown.chars().count(), 100 + 6);
}

#[tokio::test]
async fn test_image_without_storage_fails() {
    let model = ScriptedModel::new([IMAGE_DESCRIPTION]);
    let store = RecordingStore::new();
    let orchestrator = builder(model, store.clone()).build().unwrap();

    let outcome = orchestrator.handle(image_item(3)).await;

    assert!(outcome.reply.text.contains("object storage"));
    assert!(store.notes().is_empty());
}

#[tokio::test]
async fn test_social_post() {
    let scraper = FakeScraper::new(vec![json!({
        "user": { "name": "Jane Doe" },
        "text": "Hello from the other side of the harbour"
    })]);
    let model = ScriptedModel::new([summary_reply("海港", "Jane 講佢喺海港對面")]);
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone())
        .scraper(scraper.clone())
        .build()
        .unwrap();

    let url = "https://www.facebook.com/jane/posts/123";
    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, format!("睇下 {}", url)))
        .await;

    assert_eq!(scraper.actors(), vec!["apify~facebook-posts-scraper"]);

    let note = &store.notes()[0];
    assert_eq!(note.note_type, NoteType::SocialPost);
    assert_eq!(note.source_url.as_deref(), Some(url));
    assert_eq!(note.body, "Hello from the other side of the harbour");
    assert!(outcome.reply.text.contains("海港"));

    // Non-CJK content goes through the translate-then-summarize prompt
    assert!(model.calls()[0].text.contains("唔係中文"));
}

#[tokio::test]
async fn test_empty_social_scrape_is_nothing_extracted() {
    let scraper = FakeScraper::new(Vec::new());
    let model = ScriptedModel::new(Vec::<String>::new());
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone())
        .scraper(scraper)
        .build()
        .unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, "https://www.threads.net/@jane/post/abc"))
        .await;

    assert!(outcome.reply.text.starts_with("處理時發生錯誤："));
    assert!(outcome.reply.text.contains("Nothing extracted"));
    assert!(model.calls().is_empty());
    assert!(store.notes().is_empty());
}

#[tokio::test]
async fn test_webpage_input_is_bounded_and_saved() {
    let body = format!(
        "<html><head><title>Long read</title></head><body><article><p>{}TAILMARK</p></article></body></html>",
        "x".repeat(10_000)
    );
    let url = serve_once(html_response("200 OK", &body)).await;

    let model = ScriptedModel::new([summary_reply("長文", "好長嘅網頁")]);
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::text(SENDER, format!("睇下 {}", url)))
        .await;

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].text.contains(&"x".repeat(100)));
    assert!(!calls[0].text.contains("TAILMARK"));

    let note = &store.notes()[0];
    assert_eq!(note.note_type, NoteType::WebSummary);
    assert_eq!(note.note_type.label(), "網頁摘要");
    assert_eq!(note.source_url.as_deref(), Some(url.as_str()));
    assert!(note.body.ends_with("TAILMARK"));
    assert_eq!(note.body.chars().count(), 10_000 + "TAILMARK".len());

    assert!(outcome.reply.text.contains("好長嘅網頁"));
    assert!(outcome.reply.text.contains(&format!("🔗 {}", url)));
}

#[tokio::test]
async fn test_unsupported_platform() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let store = RecordingStore::new();
    let orchestrator = builder(model, store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::new(
            SENDER,
            InboundPayload::UrlReference("https://www.instagram.com/p/abc/".to_string()),
        ))
        .await;

    assert!(outcome.reply.text.contains("Instagram"));
    assert!(store.notes().is_empty());
}

#[tokio::test]
async fn test_audio_two_pass_transcription() {
    let model = ScriptedModel::new([
        "我哋聽日去飲茶啦".to_string(),
        "我哋聽日去飲茶啦".to_string(),
        summary_reply("飲茶", "明日一同前往飲茶。"),
    ]);
    let store = RecordingStore::new();
    let orchestrator = builder(model.clone(), store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::new(
            SENDER,
            InboundPayload::Audio {
                bytes: vec![0, 1, 2, 3],
                mime: "audio/mp4".to_string(),
            },
        ))
        .await;

    let calls = model.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].has_media);
    assert!(calls[1].text.contains("原文：\n我哋聽日去飲茶啦"));

    let note = &store.notes()[0];
    assert_eq!(note.note_type, NoteType::Voice);
    assert_eq!(note.content, "我哋聽日去飲茶啦");
    assert_eq!(note.summary, "明日一同前往飲茶。");
    assert!(outcome.reply.text.contains("📝 摘要：明日一同前往飲茶。"));
}

#[tokio::test]
async fn test_empty_transcription_fails() {
    let model = ScriptedModel::new(["   "]);
    let store = RecordingStore::new();
    let orchestrator = builder(model, store.clone()).build().unwrap();

    let outcome = orchestrator
        .handle(InboundItem::new(
            SENDER,
            InboundPayload::Audio {
                bytes: vec![0],
                mime: "audio/mp4".to_string(),
            },
        ))
        .await;

    assert!(outcome.reply.text.contains("Nothing extracted"));
    assert!(store.notes().is_empty());
}
