//! Main orchestrator for inbound items.
//!
//! Authorizes the sender, classifies the payload, runs the matching
//! extractor and transform steps in order, persists at most one note and
//! always produces exactly one reply.
//!
//! Stylized image regeneration is the only supplementary step. Its failure
//! is logged and folded into the reply while the primary note is still saved.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{
    AllowAll, Authorizer, ImageGenerator, LanguageModel, NoteStore, ObjectStorage, ScrapeService,
};
use crate::domain::{
    Attachment, ExtractionResult, InboundItem, InboundPayload, Note, NoteType, Reply,
    StyleTransformJob, TransformResult,
};
use crate::ingest::sanitize::{self, truncate_preview};
use crate::ingest::social::{SocialActors, SocialExtractor};
use crate::ingest::transcriber;
use crate::ingest::webpage::WebpageExtractor;

use super::dispatch::{classify, Capabilities, Route};
use super::error::{PipelineError, PipelineResult};
use super::limits::IngestLimits;
use super::prompts::STYLES;
use super::transform::{SummaryRegister, TransformPipeline};

/// Default chat model for transcription, summaries and image understanding
pub const DEFAULT_TEXT_MODEL: &str = "google/gemini-2.5-flash";

/// Default image generation model
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";

const DENIED_REPLY: &str = "❌ 你未有權限使用呢個服務";
const MISSING_ARTICLE_REPLY: &str = "請在 /a 後面貼上文章內容";
const ERROR_REPLY_PREFIX: &str = "處理時發生錯誤：";
/// Characters of the image description echoed back in the reply
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

const DEFAULT_IMAGE_TITLE: &str = "圖片靈感";

fn help_reply(echo: &str) -> String {
    format!(
        "收到！你話：「{}」\n\n有咩可以幫到你？\n\n💡 小提示：\n\
         • 傳送語音 → 幫你轉成文字筆記\n\
         • 輸入 /a 加文章 → 幫你摘要成廣東話\n\
         • 貼上網址 → 幫你摘要網頁或貼文\n\
         • 傳送圖片 → 幫你記低靈感",
        echo
    )
}

/// Style for an item, stable for a given id
pub fn style_for(id: Uuid) -> &'static str {
    STYLES[(id.as_u128() % STYLES.len() as u128) as usize]
}

/// What handling one item produced
#[derive(Debug, Clone)]
pub struct Outcome {
    pub reply: Reply,

    /// The note handed to the store, if any
    pub note: Option<Note>,

    /// Record id returned by the store
    pub record_id: Option<String>,
}

impl Outcome {
    fn reply_only(reply: Reply) -> Self {
        Self {
            reply,
            note: None,
            record_id: None,
        }
    }

    fn saved(reply: Reply, note: Note, record_id: String) -> Self {
        Self {
            reply,
            note: Some(note),
            record_id: Some(record_id),
        }
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    model: Option<Arc<dyn LanguageModel>>,
    image_generator: Option<Arc<dyn ImageGenerator>>,
    store: Option<Arc<dyn NoteStore>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    scraper: Option<Arc<dyn ScrapeService>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    capabilities: Capabilities,
    limits: IngestLimits,
    text_model: String,
    image_model: String,
    actors: SocialActors,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            model: None,
            image_generator: None,
            store: None,
            storage: None,
            scraper: None,
            authorizer: None,
            capabilities: Capabilities::default(),
            limits: IngestLimits::default(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            actors: SocialActors::default(),
        }
    }
}

impl OrchestratorBuilder {
    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn image_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.image_generator = Some(generator);
        self
    }

    pub fn store(mut self, store: Arc<dyn NoteStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn scraper(mut self, scraper: Arc<dyn ScrapeService>) -> Self {
        self.scraper = Some(scraper);
        self
    }

    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn limits(mut self, limits: IngestLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn social_actors(mut self, actors: SocialActors) -> Self {
        self.actors = actors;
        self
    }

    /// Validate the wiring and build the orchestrator
    pub fn build(self) -> Result<Orchestrator> {
        let Some(model) = self.model else {
            bail!("A language model is required");
        };
        let Some(store) = self.store else {
            bail!("A note store is required");
        };

        let authorizer: Arc<dyn Authorizer> = match (self.authorizer, self.capabilities.authorization) {
            (Some(authorizer), _) => authorizer,
            (None, false) => Arc::new(AllowAll),
            (None, true) => bail!("Authorization is enabled but no authorizer was provided"),
        };

        if self.capabilities.social_scrape && self.scraper.is_none() {
            warn!("Social scraping is enabled without a scraping service");
        }
        if self.capabilities.image_regeneration && self.image_generator.is_none() {
            warn!("Image regeneration is enabled without an image generator");
        }

        let webpage = WebpageExtractor::new(self.limits.clone())?;
        let social = self
            .scraper
            .map(|scraper| SocialExtractor::new(scraper, self.actors.clone()));

        Ok(Orchestrator {
            transform: TransformPipeline::new(model, self.text_model),
            image_generator: self.image_generator,
            store,
            storage: self.storage,
            authorizer,
            webpage,
            social,
            capabilities: self.capabilities,
            limits: self.limits,
            image_model: self.image_model,
        })
    }
}

/// Inbound item orchestrator
pub struct Orchestrator {
    transform: TransformPipeline,
    image_generator: Option<Arc<dyn ImageGenerator>>,
    store: Arc<dyn NoteStore>,
    storage: Option<Arc<dyn ObjectStorage>>,
    authorizer: Arc<dyn Authorizer>,
    webpage: WebpageExtractor,
    social: Option<SocialExtractor>,
    capabilities: Capabilities,
    limits: IngestLimits,
    image_model: String,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn limits(&self) -> &IngestLimits {
        &self.limits
    }

    /// Handle one inbound item. Never fails: errors become the reply.
    #[instrument(skip(self, item), fields(item_id = %item.id, sender = %item.sender, kind = item.kind()))]
    pub async fn handle(&self, item: InboundItem) -> Outcome {
        match self.process(&item).await {
            Ok(outcome) => outcome,
            Err(e @ (PipelineError::Unauthorized | PipelineError::UnsupportedPlatform { .. })) => {
                warn!(error = %e, "Item rejected");
                Outcome::reply_only(self.error_reply(&e))
            }
            Err(e) => {
                error!(error = %e, "Item processing failed");
                Outcome::reply_only(self.error_reply(&e))
            }
        }
    }

    /// Reply text for a failed item
    pub fn error_reply(&self, error: &PipelineError) -> Reply {
        match error {
            PipelineError::Unauthorized => Reply::text(DENIED_REPLY),
            PipelineError::UnsupportedPlatform { platform } => {
                Reply::text(format!("⚠️ 暫時未支援 {} 連結", platform))
            }
            other => Reply::text(format!(
                "{}{}",
                ERROR_REPLY_PREFIX,
                truncate_preview(&other.to_string(), self.limits.error_preview_chars)
            )),
        }
    }

    async fn process(&self, item: &InboundItem) -> PipelineResult<Outcome> {
        if self.capabilities.authorization && !self.authorizer.is_authorized(&item.sender) {
            return Err(PipelineError::Unauthorized);
        }

        let route = classify(&item.payload, &self.capabilities);
        info!(route = route.label(), "Dispatching item");

        match route {
            Route::Help { echo } => Ok(Outcome::reply_only(Reply::text(help_reply(&echo)))),
            Route::MissingArticle => Ok(Outcome::reply_only(Reply::text(MISSING_ARTICLE_REPLY))),
            Route::Article(text) => {
                let extraction = sanitize::direct_text(&text);
                if extraction.content.is_empty() {
                    return Ok(Outcome::reply_only(Reply::text(MISSING_ARTICLE_REPLY)));
                }
                self.handle_article(item, extraction).await
            }
            Route::Webpage(url) => {
                let extraction = self.webpage.extract(&url).await?;
                self.handle_extraction(item, extraction, NoteType::WebSummary)
                    .await
            }
            Route::Social { url, platform } => {
                let social = self
                    .social
                    .as_ref()
                    .ok_or(PipelineError::MissingCollaborator("scraping service"))?;
                let extraction = social.extract(&url, platform).await?;
                self.handle_extraction(item, extraction, NoteType::SocialPost)
                    .await
            }
            Route::UnsupportedPlatform { platform, .. } => Err(PipelineError::UnsupportedPlatform {
                platform: platform.to_string(),
            }),
            Route::Audio => match &item.payload {
                InboundPayload::Audio { bytes, mime } => self.handle_audio(item, bytes, mime).await,
                _ => Err(PipelineError::nothing_extracted("audio payload")),
            },
            Route::Image { regenerate } => match &item.payload {
                InboundPayload::Image {
                    bytes,
                    mime,
                    file_name,
                } => {
                    self.handle_image(item, bytes, mime, file_name, regenerate)
                        .await
                }
                _ => Err(PipelineError::nothing_extracted("image payload")),
            },
        }
    }

    async fn persist(&self, note: &Note) -> PipelineResult<String> {
        let record_id = self
            .store
            .create(note)
            .await
            .map_err(PipelineError::persistence)?;
        info!(%record_id, note_type = %note.note_type, "Note saved");
        Ok(record_id)
    }

    /// `/a` article: Cantonese summary, preview as content, full text as body
    async fn handle_article(
        &self,
        item: &InboundItem,
        extraction: ExtractionResult,
    ) -> PipelineResult<Outcome> {
        let article = &extraction.content;
        debug!(preview = %truncate_preview(article, 100), "Summarizing article");
        let result = self
            .transform
            .summarize(article, SummaryRegister::Cantonese)
            .await?;

        let note = Note::new(
            &result.title,
            truncate_preview(article, self.limits.content_preview_chars),
            &result.summary,
            NoteType::TextSummary,
            &item.sender,
            item.received_at,
        )
        .with_body(article.as_str());

        let record_id = self.persist(&note).await?;
        let reply = Reply::text(format!(
            "✅ 已儲存\n\n📌 標題：{}\n\n📝 廣東話摘要：{}",
            result.title, result.summary
        ));
        Ok(Outcome::saved(reply, note, record_id))
    }

    /// Webpage or social post: translation-aware summary over bounded input
    async fn handle_extraction(
        &self,
        item: &InboundItem,
        extraction: ExtractionResult,
        note_type: NoteType,
    ) -> PipelineResult<Outcome> {
        let total_chars = extraction.content.chars().count();
        let input: String = extraction
            .content
            .chars()
            .take(self.limits.model_input_chars)
            .collect();
        if total_chars > self.limits.model_input_chars {
            debug!(
                total_chars,
                kept = self.limits.model_input_chars,
                "Truncated model input"
            );
        }

        let result = self
            .transform
            .summarize(&input, SummaryRegister::TranslationAware)
            .await?;

        let note = Note::new(
            &result.title,
            truncate_preview(&extraction.content, self.limits.content_preview_chars),
            &result.summary,
            note_type,
            &item.sender,
            item.received_at,
        )
        .with_body(&extraction.content)
        .with_source_url(extraction.source_url.clone());

        let record_id = self.persist(&note).await?;

        let mut text = format!(
            "✅ 已儲存\n\n📌 標題：{}\n\n📝 廣東話摘要：{}",
            result.title, result.summary
        );
        if let Some(ref url) = extraction.source_url {
            text.push_str(&format!("\n\n🔗 {}", url));
        }
        Ok(Outcome::saved(Reply::text(text), note, record_id))
    }

    /// Voice clip: two-pass transcript, formal summary
    async fn handle_audio(
        &self,
        item: &InboundItem,
        bytes: &[u8],
        mime: &str,
    ) -> PipelineResult<Outcome> {
        let transcript = transcriber::transcribe(&self.transform, bytes, mime)
            .await?
            .into_extraction();
        let result = self
            .transform
            .summarize(&transcript.content, SummaryRegister::Formal)
            .await?;

        let note = Note::new(
            &result.title,
            &transcript.content,
            &result.summary,
            NoteType::Voice,
            &item.sender,
            item.received_at,
        );

        let record_id = self.persist(&note).await?;
        let reply = Reply::text(format!(
            "✅ 已儲存\n\n📌 標題：{}\n\n📝 摘要：{}",
            result.title, result.summary
        ));
        Ok(Outcome::saved(reply, note, record_id))
    }

    /// Image: upload original, describe it, optionally regenerate in a new style
    async fn handle_image(
        &self,
        item: &InboundItem,
        bytes: &[u8],
        mime: &str,
        file_name: &str,
        regenerate: bool,
    ) -> PipelineResult<Outcome> {
        let storage = self
            .storage
            .as_ref()
            .ok_or(PipelineError::MissingCollaborator("object storage"))?;

        let original_url = storage
            .upload(bytes.to_vec(), file_name, mime)
            .await
            .map_err(PipelineError::storage)?;
        debug!(%original_url, "Original image uploaded");

        let described = self.transform.describe_image(bytes, mime).await?;
        let title = if described.title.is_empty() {
            DEFAULT_IMAGE_TITLE.to_string()
        } else {
            described.title.clone()
        };

        let mut job = StyleTransformJob::new(&described.prompt, style_for(item.id));
        if regenerate {
            if let Err(e) = self.enhance(item.id, storage.as_ref(), &mut job).await {
                warn!(error = %e, style = %job.chosen_style, "Style regeneration failed, keeping original");
                job.transformed_prompt = None;
                job.generated_image_ref = None;
            }
        }

        let result = TransformResult {
            title,
            summary: job.transformed_prompt.clone().unwrap_or_default(),
            style_variant: job.is_complete().then(|| job.chosen_style.clone()),
        };

        let mut note = Note::new(
            &result.title,
            &described.prompt,
            &result.summary,
            NoteType::ImageInspiration,
            &item.sender,
            item.received_at,
        )
        .with_attachment(Attachment::new(file_name, &original_url));
        if let Some(ref generated) = job.generated_image_ref {
            note = note.with_attachment(Attachment::new(
                format!("generated-{}.png", item.id),
                generated,
            ));
        }

        let record_id = self.persist(&note).await?;

        let reply = match (&result.style_variant, job.generated_image_ref) {
            (Some(style), Some(generated)) => Reply::text(format!(
                "✅ 已儲存\n\n📌 標題：{}\n\n🎨 風格：{}",
                result.title, style
            ))
            .with_image(generated),
            _ if regenerate => Reply::text(format!(
                "✅ 已儲存原圖\n\n📌 標題：{}\n\n⚠️ 風格轉換暫時未能完成，已保留原圖同描述",
                result.title
            )),
            _ => Reply::text(format!(
                "✅ 已儲存\n\n📌 標題：{}\n\n📝 描述：{}",
                result.title,
                truncate_preview(&described.prompt, DESCRIPTION_PREVIEW_CHARS)
            )),
        };
        Ok(Outcome::saved(reply, note, record_id))
    }

    /// Supplementary steps; every failure is an [`PipelineError::EnhancementFailure`]
    async fn enhance(
        &self,
        item_id: Uuid,
        storage: &dyn ObjectStorage,
        job: &mut StyleTransformJob,
    ) -> PipelineResult<()> {
        let generator = self
            .image_generator
            .as_ref()
            .ok_or_else(|| PipelineError::EnhancementFailure("no image generator".to_string()))?;

        let transformed = self
            .transform
            .transform_style(&job.original_prompt, &job.chosen_style)
            .await
            .map_err(|e| PipelineError::EnhancementFailure(e.to_string()))?;
        debug!(style = %job.chosen_style, "Prompt restyled");

        let image = generator
            .generate(&self.image_model, &transformed)
            .await
            .map_err(|e| PipelineError::EnhancementFailure(format!("{:#}", e)))?;
        job.transformed_prompt = Some(transformed);

        let url = storage
            .upload(image.bytes, &format!("generated-{}.png", item_id), &image.mime)
            .await
            .map_err(|e| PipelineError::EnhancementFailure(format!("{:#}", e)))?;
        job.generated_image_ref = Some(url);

        Ok(())
    }
}
