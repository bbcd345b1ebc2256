use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::assemble::assemble;
use super::error::AnalyzeError;
use super::extractor::DocumentExtractor;
use super::model::StudyUnit;
use super::prompts::{clean_title, study_guide_prompt, title_prompt};
use crate::utils::content_guard::safe_truncate_utf8;
use crate::utils::fetch::DocumentSource;
use crate::utils::gemini::{GenerationError, TextGenerator};
use crate::utils::youtube_search::VideoSearch;

/// Fetch → Extract → Title → Video → Generate → Assemble, one step at a time.
pub struct StudyGuidePipeline {
    source: Arc<dyn DocumentSource>,
    extractor: DocumentExtractor,
    generator: Arc<dyn TextGenerator>,
    videos: Arc<dyn VideoSearch>,
}

impl StudyGuidePipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: DocumentExtractor,
        generator: Arc<dyn TextGenerator>,
        videos: Arc<dyn VideoSearch>,
    ) -> Self {
        Self {
            source,
            extractor,
            generator,
            videos,
        }
    }

    pub async fn run(&self, file_url: &str) -> Result<Vec<StudyUnit>, AnalyzeError> {
        let started = Instant::now();

        let fetched = self.source.fetch(file_url).await?;
        // Held until the end of the request so any scratch copy outlives every step
        let document = self.extractor.extract(fetched).await?;
        if let Some(path) = document.scratch_path() {
            debug!(path = %path.display(), "Holding scratch copy until the request completes");
        }

        let raw_title = self.generator.generate(&title_prompt(&document.text)).await?;
        let title = clean_title(&raw_title);
        if title.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        info!(title = %title, "Generated lecture title");

        let video_url = self.videos.find_embed_url(&title).await?;
        match &video_url {
            Some(url) => info!(video = %url, "Found lecture video"),
            None => info!("No lecture video found; continuing without one"),
        }

        let prompt = study_guide_prompt(&document.text, video_url.as_deref());
        let raw_guide = self.generator.generate(&prompt).await?;

        let units = assemble(&raw_guide, video_url.as_deref()).map_err(|e| {
            warn!(
                preview = %safe_truncate_utf8(&raw_guide, 200, "..."),
                "Rejected model output: {}", e
            );
            e
        })?;

        info!(
            format = %document.format,
            units = units.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Study guide generated"
        );
        Ok(units)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::utils::fetch::{path_extension, DocumentSource, FetchError, FetchedDocument};
    use crate::utils::gemini::{GenerationError, TextGenerator};
    use crate::utils::youtube_search::{VideoLookupError, VideoSearch};

    /// Serves canned bytes keyed by URL and counts calls.
    #[derive(Default)]
    pub struct FakeSource {
        pub documents: HashMap<String, Vec<u8>>,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn with(url: &str, bytes: Vec<u8>) -> Self {
            let mut documents = HashMap::new();
            documents.insert(url.to_string(), bytes);
            Self {
                documents,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn fetch(&self, file_url: &str) -> Result<FetchedDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let url = url::Url::parse(file_url)?;
            let bytes = self
                .documents
                .get(file_url)
                .cloned()
                .ok_or(FetchError::Status(404))?;
            Ok(FetchedDocument {
                bytes,
                extension: path_extension(&url),
                content_type: None,
            })
        }
    }

    /// Replays scripted replies and records every prompt it was given.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::EmptyResponse))
        }
    }

    pub enum FakeVideos {
        Found(String),
        Nothing,
        Failing,
    }

    #[async_trait]
    impl VideoSearch for FakeVideos {
        async fn find_embed_url(&self, _query: &str) -> Result<Option<String>, VideoLookupError> {
            match self {
                FakeVideos::Found(url) => Ok(Some(url.clone())),
                FakeVideos::Nothing => Ok(None),
                FakeVideos::Failing => Err(VideoLookupError::Api {
                    status: 403,
                    reason: "Forbidden".into(),
                }),
            }
        }
    }
}
