//! Router-level tests against a temporary database and stub clients

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use studyforge_core::{DatabaseService, TursoStore};
use studyforge_server::clients::{
    ChatClient, ClientError, ObjectStorage, SpeechClient, SynthesizedAudio,
};
use studyforge_server::{create_router, AppState};

struct CannedChat(Option<String>);

#[async_trait]
impl ChatClient for CannedChat {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, ClientError> {
        match &self.0 {
            Some(reply) => Ok(format!("{} ({} chars reviewed)", reply, prompt.len())),
            None => Err(ClientError::NotConfigured {
                service: "chat completion",
            }),
        }
    }
}

#[derive(Default)]
struct FixedSpeech {
    languages: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechClient for FixedSpeech {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, ClientError> {
        self.languages.lock().unwrap().push(language.to_string());
        Ok(SynthesizedAudio {
            audio: text.as_bytes().to_vec(),
            mime_type: "audio/mpeg",
        })
    }
}

#[derive(Default)]
struct MemoryStorage {
    uploads: Mutex<Vec<(String, Vec<u8>, String)>>,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ClientError> {
        let url = format!("https://files.test/recordings/{}", filename);
        self.uploads
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes, content_type.to_string()));
        Ok(url)
    }
}

struct TestApp {
    router: Router,
    speech: Arc<FixedSpeech>,
    storage: Arc<MemoryStorage>,
    _temp_dir: TempDir,
}

async fn test_app(chat_reply: Option<&str>) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseService::new(temp_dir.path().join("test.db"))
        .await
        .unwrap();
    let store = Arc::new(TursoStore::new(Arc::new(db)));
    let speech = Arc::new(FixedSpeech::default());
    let storage = Arc::new(MemoryStorage::default());

    let state = AppState::new(
        store,
        Arc::new(CannedChat(chat_reply.map(str::to_string))),
        speech.clone(),
        storage.clone(),
    );
    let origins = vec!["http://localhost:5173".to_string()];

    TestApp {
        router: create_router(state, &origins),
        speech,
        storage,
        _temp_dir: temp_dir,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post(app: &TestApp, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app(None).await;

    let (status, body) = get(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_fetch_hierarchy() {
    let app = test_app(None).await;

    let (status, body) = post(&app, "/api/nodes", json!({ "name": "Math" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["node"]["path"], json!(["Math"]));

    for name in ["Geometry", "Algebra"] {
        let (status, _) = post(
            &app,
            "/api/nodes",
            json!({ "name": name, "parentPath": ["Math"] }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get(&app, "/api/nodes?path=%5B%22Math%22%5D").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node"]["name"], "Math");
    let names: Vec<&str> = body["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Algebra", "Geometry"]);

    let (status, body) = get(&app, "/api/nodes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["node"].is_null());
    assert_eq!(body["children"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_sibling_is_conflict() {
    let app = test_app(None).await;
    post(&app, "/api/nodes", json!({ "name": "Math" })).await;

    let (status, body) = post(&app, "/api/nodes", json!({ "name": "Math" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_missing_parent_is_not_found() {
    let app = test_app(None).await;

    let (status, body) = post(
        &app,
        "/api/nodes",
        json!({ "name": "Algebra", "parentPath": ["Nope"] }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let app = test_app(None).await;

    let (status, body) = post(&app, "/api/nodes", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = get(&app, "/api/nodes?path=not-json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/save-session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_notes_and_mastery() {
    let app = test_app(None).await;
    post(&app, "/api/nodes", json!({ "name": "English" })).await;
    post(
        &app,
        "/api/nodes",
        json!({ "name": "Travel", "parentPath": ["English"] }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/nodes/notes",
        json!({ "path": ["English", "Travel"], "notes": "Practice small talk" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node"]["notes"], "Practice small talk");

    let (status, _) = post(
        &app,
        "/api/nodes/notes",
        json!({ "path": ["English", "Travel"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mastery = json!({ "subject": "English", "lesson": "Travel", "topic": "Airports" });
    let (status, body) = post(&app, "/api/mastery", mastery.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"]["masteryCount"], 1);
    assert_eq!(body["topic"]["path"], json!(["English", "Travel", "Airports"]));

    let (_, body) = post(&app, "/api/mastery", mastery).await;
    assert_eq!(body["topic"]["masteryCount"], 2);

    let (status, _) = post(
        &app,
        "/api/mastery",
        json!({ "subject": "English", "lesson": "Cooking", "topic": "Knives" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_previous_sessions_are_summarized_per_topic() {
    let app = test_app(None).await;

    // Inserted oldest first; history is read newest first (80, 60, 100)
    for (topic, score) in [("Airports", 100), ("Hotels", 70), ("Airports", 60), ("Airports", 80)] {
        let (status, body) = post(
            &app,
            "/api/save-session",
            json!({
                "subject": "English",
                "lesson": "Travel",
                "topic": topic,
                "durationSeconds": 60,
                "wordCount": 100,
                "overallScore": score,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["session"]["topic"], topic);
    }

    let (status, body) = get(
        &app,
        "/api/get-previous-sessions?subject=English&lesson=Travel",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0]["topic"], "Airports");
    assert_eq!(topics[0]["sessionCount"], 3);
    assert_eq!(topics[0]["avgScore"], 85.0);
    assert_eq!(topics[1]["topic"], "Hotels");

    let (_, body) = get(&app, "/api/sessions?subject=English&lesson=Travel&limit=2").await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);

    let (status, _) = get(&app, "/api/get-previous-sessions?subject=English").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_out_of_range_score_is_rejected() {
    let app = test_app(None).await;

    let (status, _) = post(
        &app,
        "/api/save-session",
        json!({
            "subject": "English",
            "lesson": "Travel",
            "topic": "Airports",
            "overallScore": 140,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_update_logs_weight() {
    let app = test_app(None).await;

    let (status, body) = post(
        &app,
        "/api/profile",
        json!({ "userId": "u1", "displayName": "Sam", "weightKg": 72.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weightLogged"], true);

    let (_, body) = post(&app, "/api/profile", json!({ "userId": "u1", "goal": "5k" })).await;
    assert_eq!(body["profile"]["displayName"], "Sam");
    assert_eq!(body["profile"]["goal"], "5k");
    assert_eq!(body["weightLogged"], false);

    let (status, body) = get(&app, "/api/weight-log?userId=u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);

    let (status, _) = get(&app, "/api/profile?userId=someone-else").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_workouts_round_trip() {
    let app = test_app(None).await;

    let (status, _) = post(
        &app,
        "/api/workouts",
        json!({ "userId": "u1", "exercise": "Squat", "sets": 3, "reps": 5, "weightKg": 100.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post(
        &app,
        "/api/workouts",
        json!({ "userId": "u1", "exercise": "Squat", "sets": 0, "reps": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&app, "/api/workouts?userId=u1").await;
    let workouts = body["workouts"].as_array().unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0]["exercise"], "Squat");
}

#[tokio::test]
async fn test_speech_feedback_uses_chat_client() {
    let app = test_app(Some("Nice pacing")).await;

    let (status, body) = post(
        &app,
        "/api/speech-feedback",
        json!({ "topic": "Airports", "transcript": "I would like a window seat" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["feedback"].as_str().unwrap().starts_with("Nice pacing"));
}

#[tokio::test]
async fn test_client_failure_is_generic_500() {
    let app = test_app(None).await;

    let (status, body) = post(
        &app,
        "/api/speech-feedback",
        json!({ "topic": "Airports", "transcript": "Hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("chat completion"));
}

#[tokio::test]
async fn test_tts_returns_base64_audio() {
    let app = test_app(None).await;

    let (status, body) = post(&app, "/api/tts", json!({ "text": "hi" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["audioContent"], "aGk=");
    assert_eq!(body["mimeType"], "audio/mpeg");

    let (status, _) = post(&app, "/api/tts", json!({ "text": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_audio_sanitizes_filename() {
    let app = test_app(None).await;

    let (status, body) = post(
        &app,
        "/api/upload-audio",
        json!({ "filename": "../take one.webm", "data": "aGVsbG8=" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().ends_with("-take_one.webm"));

    {
        let uploads = app.storage.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, b"hello".to_vec());
        assert_eq!(uploads[0].2, "audio/webm");
    }

    let (status, _) = post(
        &app,
        "/api/upload-audio",
        json!({ "filename": "clip.webm", "data": "%%%not base64%%%" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tts_text_length_limit() {
    let app = test_app(None).await;

    let (status, _) = post(&app, "/api/tts", json!({ "text": "a".repeat(5000) })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/api/tts", json!({ "text": "a".repeat(5001) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_tts_language_defaults_to_en_us() {
    let app = test_app(None).await;

    post(&app, "/api/tts", json!({ "text": "hello" })).await;
    post(&app, "/api/tts", json!({ "text": "hola", "language": "es-ES" })).await;

    let languages = app.speech.languages.lock().unwrap().clone();
    assert_eq!(languages, vec!["en-US".to_string(), "es-ES".to_string()]);
}

#[tokio::test]
async fn test_upload_audio_accepts_data_url() {
    let app = test_app(None).await;

    let (status, _) = post(
        &app,
        "/api/upload-audio",
        json!({
            "filename": "clip.webm",
            "data": "data:audio/webm;base64,aGVsbG8=",
            "contentType": "audio/ogg",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uploads = app.storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, b"hello".to_vec());
    assert_eq!(uploads[0].2, "audio/ogg");
}

#[tokio::test]
async fn test_upload_audio_rejects_header_breaking_content_type() {
    let app = test_app(None).await;

    let (status, body) = post(
        &app,
        "/api/upload-audio",
        json!({
            "filename": "clip.webm",
            "data": "aGVsbG8=",
            "contentType": "audio/webm\r\nX-Evil: 1",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(app.storage.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_session_matches_history() {
    let app = test_app(None).await;

    let (status, saved) = post(
        &app,
        "/api/save-session",
        json!({ "subject": "English", "lesson": "Travel", "topic": "Airports" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, history) = get(&app, "/api/sessions?subject=English&lesson=Travel").await;
    assert_eq!(history["sessions"][0], saved["session"]);
}
