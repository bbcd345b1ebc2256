use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::error::ApiErrorResponse;
use super::types::AnalyzeRequest;
use crate::study::error::AnalyzeError;
use crate::study::pipeline::StudyGuidePipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<StudyGuidePipeline>,
    pub expose_error_details: bool,
    pub port: u16,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/analyze-file-url", post(analyze_file_url_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Study guide server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> String {
    format!("Study guide server is running on port {}", state.port)
}

async fn analyze_file_url_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze_file_url", %request_id);

    async move {
        let file_url = match &payload {
            Ok(Json(request)) => request.file_url(),
            Err(rejection) => {
                warn!("Unreadable request body: {}", rejection);
                None
            }
        };
        let Some(file_url) = file_url else {
            return ApiErrorResponse::new(AnalyzeError::MissingFileUrl, state.expose_error_details)
                .into_response();
        };

        info!(url = %file_url, "Analyzing file");
        match state.pipeline.run(file_url).await {
            Ok(units) => (StatusCode::OK, Json(units)).into_response(),
            Err(e) => ApiErrorResponse::new(e, state.expose_error_details).into_response(),
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::extractor::DocumentExtractor;
    use crate::study::pipeline::fakes::{FakeSource, FakeVideos, ScriptedGenerator};
    use crate::utils::fetch::{DocumentSource, HttpDocumentSource};
    use crate::utils::gemini::GenerationError;
    use crate::utils::office::fixtures;
    use crate::utils::pdf::extract_text_from_pdf_mem;
    use crate::utils::test_http::serve;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tower::ServiceExt;

    const VIDEO: &str = "https://www.youtube.com/embed/abc123";

    fn state(
        source: Arc<dyn DocumentSource>,
        generator: Arc<ScriptedGenerator>,
        videos: FakeVideos,
        scratch: &Path,
    ) -> AppState {
        AppState {
            pipeline: Arc::new(StudyGuidePipeline::new(
                source,
                DocumentExtractor::new(scratch.to_path_buf()),
                generator,
                Arc::new(videos),
            )),
            expose_error_details: true,
            port: 3001,
        }
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/analyze-file-url")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn two_unit_guide() -> Value {
        json!([
            {
                "unit": "What is photosynthesis",
                "summary": "Plants turn light into chemical energy.",
                "youtube": VIDEO,
                "questions": [{
                    "question": "What do plants need for photosynthesis?",
                    "options": [
                        {"value": "A", "text": "Light"},
                        {"value": "B", "text": "Sound"},
                        {"value": "C", "text": "Magnetism"},
                        {"value": "D", "text": "Nothing"}
                    ],
                    "answer": "A"
                }]
            },
            {
                "unit": "Products",
                "summary": "Glucose and oxygen are produced.",
                "youtube": VIDEO,
                "questions": []
            }
        ])
    }

    fn pdf_with_text(text: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    async fn serve_document(path: &'static str, bytes: Vec<u8>) -> String {
        let app = Router::new().route(
            path,
            get(move || {
                let bytes = bytes.clone();
                async move { bytes }
            }),
        );
        format!("{}{}", serve(app).await, path)
    }

    #[tokio::test]
    async fn health_check_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(
            Arc::new(FakeSource::default()),
            Arc::new(ScriptedGenerator::default()),
            FakeVideos::Nothing,
            dir.path(),
        ));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Study guide server is running on port 3001");
    }

    #[tokio::test]
    async fn missing_file_url_makes_no_outbound_calls() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::default());
        let generator = Arc::new(ScriptedGenerator::default());
        let app = router(state(source.clone(), generator.clone(), FakeVideos::Nothing, dir.path()));

        for body in ["{}", r#"{"fileUrl": ""}"#, r#"{"fileUrl": 42}"#, "not json"] {
            let (status, json) = post_json(app.clone(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({"error": "Missing fileUrl in request body."}));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn unsupported_extension_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/notes.txt";
        let source = Arc::new(FakeSource::with(url, b"hello".to_vec()));
        let app = router(state(
            source.clone(),
            Arc::new(ScriptedGenerator::default()),
            FakeVideos::Nothing,
            dir.path(),
        ));

        let (status, json) = post_json(app, &json!({ "fileUrl": url }).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({"error": "Unsupported file type. Only PDF, DOCX, and PPTX are allowed."})
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn broken_pptx_gets_the_dedicated_message() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/deck.pptx";
        let app = router(state(
            Arc::new(FakeSource::with(url, b"corrupt".to_vec())),
            Arc::new(ScriptedGenerator::default()),
            FakeVideos::Nothing,
            dir.path(),
        ));

        let (status, json) = post_json(app, &json!({ "fileUrl": url }).to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({"error": "Failed to parse PPTX file."}));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn generic_failures_carry_details_unless_redacted() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/missing.pdf";
        let mut app_state = state(
            Arc::new(FakeSource::default()),
            Arc::new(ScriptedGenerator::default()),
            FakeVideos::Nothing,
            dir.path(),
        );

        let (status, json) =
            post_json(router(app_state.clone()), &json!({ "fileUrl": url }).to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json,
            json!({"error": "Could not process file.", "details": "Failed to fetch file. Status: 404"})
        );

        app_state.expose_error_details = false;
        let (_, json) = post_json(router(app_state), &json!({ "fileUrl": url }).to_string()).await;
        assert_eq!(json, json!({"error": "Could not process file."}));
    }

    #[tokio::test]
    async fn generation_failure_is_a_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://example.com/lecture.docx";
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(GenerationError::Blocked(
            "SAFETY".into(),
        ))]));
        let app = router(state(
            Arc::new(FakeSource::with(url, fixtures::docx(&["text"]))),
            generator,
            FakeVideos::Found(VIDEO.into()),
            dir.path(),
        ));

        let (status, json) = post_json(app, &json!({ "fileUrl": url }).to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Could not process file.");
        assert_eq!(
            json["details"],
            "Generative model blocked the prompt: SAFETY"
        );
    }

    #[tokio::test]
    async fn pdf_lecture_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = pdf_with_text("Photosynthesis is the process plants use to make food.");
        let extracted = extract_text_from_pdf_mem(&pdf).unwrap();
        let file_url = serve_document("/lecture.pdf", pdf).await;

        let source = HttpDocumentSource::new(Duration::from_secs(5), 1024 * 1024).unwrap();
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("\"Photosynthesis Basics\"".into()),
            Ok(format!("```json\n{}\n```", two_unit_guide())),
        ]));
        let app = router(state(
            Arc::new(source),
            generator.clone(),
            FakeVideos::Found(VIDEO.into()),
            dir.path(),
        ));

        let (status, json) = post_json(app, &json!({ "fileUrl": file_url }).to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, two_unit_guide());

        let prompts = generator.prompts();
        assert!(extracted.contains("Photosynthesis"));
        assert!(prompts[0].contains(extracted.trim()));
        assert!(prompts[1].contains(&extracted));
        assert!(prompts[1].contains(VIDEO));
    }
}
