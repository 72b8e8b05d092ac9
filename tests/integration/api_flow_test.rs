use std::sync::Arc;

use futures::stream;
use roundtable_core::{
    init_database_with_path, AgentEvent, AgentEventStream, ConversationStore, SqliteStore,
    TurnOrchestrator, TurnRequest, TurnRunner, UrlExtractor,
};
use roundtable_server::http::{self, AppState};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scripted engine stand-in. Members whose name contains "broken" fail
/// their turn; everyone else streams one chunk and completes with
/// "<name> answer".
struct CannedRunner;

impl TurnRunner for CannedRunner {
    fn run_turn(&self, request: TurnRequest) -> AgentEventStream {
        let name = request.member.name;
        if name.contains("broken") {
            Box::pin(stream::iter(vec![AgentEvent::Error {
                message: format!("{name} exploded"),
            }]))
        } else {
            let text = format!("{name} answer");
            Box::pin(stream::iter(vec![
                AgentEvent::Chunk { text: text.clone() },
                AgentEvent::Done { text },
            ]))
        }
    }
}

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    dir: TempDir,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A directory that exists on this filesystem, for repoPath fields.
    fn repo_path(&self) -> String {
        self.dir.path().to_str().unwrap().to_string()
    }

    async fn create_room(&self, name: &str) -> i64 {
        let response = self
            .client
            .post(self.url("/api/rooms"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let room: serde_json::Value = response.json().await.unwrap();
        room["id"].as_i64().unwrap()
    }

    async fn create_member(&self, room_id: i64, name: &str) -> i64 {
        let response = self
            .client
            .post(self.url(&format!("/api/rooms/{room_id}/members")))
            .json(&serde_json::json!({ "name": name, "repoPath": self.repo_path() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let member: serde_json::Value = response.json().await.unwrap();
        member["id"].as_i64().unwrap()
    }
}

async fn spawn_app() -> TestApp {
    let dir = TempDir::new().expect("failed to create tempdir");
    let db_path = dir.path().join("roundtable-test.db");
    let db = init_database_with_path(db_path.to_str().unwrap())
        .await
        .expect("failed to initialize test database");

    let store: Arc<dyn ConversationStore> = Arc::new(SqliteStore::from_database(&db));
    let orchestrator = Arc::new(TurnOrchestrator::new(
        store.clone(),
        Arc::new(CannedRunner),
    ));
    let state = AppState {
        db: Arc::new(db),
        store,
        orchestrator,
        url_extractor: Arc::new(UrlExtractor::new().expect("failed to build url extractor")),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, http::router(state))
            .await
            .expect("test server crashed");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
        dir,
    }
}

/// Parses the `data:` frames of an SSE body. Keep-alive comment lines
/// have no `data:` prefix and are skipped.
fn parse_sse_events(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|payload| !payload.trim().is_empty())
        .map(|payload| serde_json::from_str(payload).expect("SSE frame should be JSON"))
        .collect()
}

fn event_types(events: &[serde_json::Value]) -> Vec<String> {
    events
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect()
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = spawn_app().await;

        let response = app.client.get(app.url("/api/health")).send().await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }
}

mod room_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_room_lifecycle() {
        let app = spawn_app().await;

        let response = app
            .client
            .post(app.url("/api/rooms"))
            .json(&serde_json::json!({ "name": "  Planning  " }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let room: serde_json::Value = response.json().await.unwrap();
        assert_eq!(room["name"], "Planning", "name should be stored trimmed");
        let room_id = room["id"].as_i64().unwrap();

        let listed: serde_json::Value = app
            .client
            .get(app.url("/api/rooms"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let fetched: serde_json::Value = app
            .client
            .get(app.url(&format!("/api/rooms/{room_id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fetched["id"], room_id);

        let deleted: serde_json::Value = app
            .client
            .delete(app.url(&format!("/api/rooms/{room_id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deleted["success"], true);

        let after = app
            .client
            .get(app.url(&format!("/api/rooms/{room_id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(after.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_name() {
        let app = spawn_app().await;

        for body in [
            serde_json::json!({ "name": "   " }),
            serde_json::json!({}),
        ] {
            let response = app
                .client
                .post(app.url("/api/rooms"))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 400);
            let error: serde_json::Value = response.json().await.unwrap();
            assert!(
                error["error"]
                    .as_str()
                    .unwrap()
                    .contains("Room name is required"),
                "unexpected error body: {error}"
            );
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_room_returns_404() {
        let app = spawn_app().await;

        let response = app
            .client
            .delete(app.url("/api/rooms/9999"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}

mod member_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_member_and_list() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;

        let response = app
            .client
            .post(app.url(&format!("/api/rooms/{room_id}/members")))
            .json(&serde_json::json!({ "name": "alpha", "repoPath": app.repo_path() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let member: serde_json::Value = response.json().await.unwrap();
        assert_eq!(member["name"], "alpha");
        assert_eq!(member["roomId"], room_id);
        assert_eq!(member["engine"], "claude");
        assert_eq!(member["sortOrder"], 0);

        let listed: serde_json::Value = app
            .client
            .get(app.url(&format!("/api/rooms/{room_id}/members")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let members = listed.as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["name"], "alpha");
    }

    #[tokio::test]
    async fn test_create_member_validations() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let post = |body: serde_json::Value| {
            let url = app.url(&format!("/api/rooms/{room_id}/members"));
            let client = app.client.clone();
            async move { client.post(url).json(&body).send().await.unwrap() }
        };

        let cases = [
            (
                serde_json::json!({ "repoPath": app.repo_path() }),
                "Agent name is required",
            ),
            (serde_json::json!({ "name": "alpha" }), "Repository path is required"),
            (
                serde_json::json!({ "name": "alpha", "repoPath": "/no/such/dir/here" }),
                "Repository path does not exist",
            ),
            (
                serde_json::json!({
                    "name": "alpha",
                    "repoPath": app.repo_path(),
                    "engine": "cursor"
                }),
                "Unknown engine",
            ),
        ];

        for (body, expected) in cases {
            let response = post(body).await;
            assert_eq!(response.status().as_u16(), 400);
            let error: serde_json::Value = response.json().await.unwrap();
            assert!(
                error["error"].as_str().unwrap().contains(expected),
                "expected '{expected}' in {error}"
            );
        }
    }

    #[tokio::test]
    async fn test_member_context_becomes_manual_source() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;

        let response = app
            .client
            .post(app.url(&format!("/api/rooms/{room_id}/members")))
            .json(&serde_json::json!({
                "name": "alpha",
                "repoPath": app.repo_path(),
                "context": "Knows the deploy scripts"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let member: serde_json::Value = response.json().await.unwrap();
        let member_id = member["id"].as_i64().unwrap();
        assert_eq!(member["context"], "Knows the deploy scripts");

        let sources: serde_json::Value = app
            .client
            .get(app.url(&format!(
                "/api/rooms/{room_id}/members/{member_id}/context-sources"
            )))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let sources = sources.as_array().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0]["type"], "manual");
        assert_eq!(sources[0]["title"], "Manual context");
        assert_eq!(sources[0]["content"], "Knows the deploy scripts");
    }

    #[tokio::test]
    async fn test_reorder_members_changes_listing_order() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let alpha = app.create_member(room_id, "alpha").await;
        let beta = app.create_member(room_id, "beta").await;
        let gamma = app.create_member(room_id, "gamma").await;

        let response = app
            .client
            .post(app.url(&format!("/api/rooms/{room_id}/members/reorder")))
            .json(&serde_json::json!({ "orderedIds": [gamma, alpha, beta] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);

        let listed: serde_json::Value = app
            .client
            .get(app.url(&format!("/api/rooms/{room_id}/members")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["gamma", "alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_delete_member() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let response = app
            .client
            .delete(app.url(&format!("/api/rooms/{room_id}/members/{member_id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);

        let listed: serde_json::Value = app
            .client
            .get(app.url(&format!("/api/rooms/{room_id}/members")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(listed.as_array().unwrap().is_empty());
    }
}

mod context_source_endpoint_tests {
    use super::*;

    fn sources_url(app: &TestApp, room_id: i64, member_id: i64) -> String {
        app.url(&format!(
            "/api/rooms/{room_id}/members/{member_id}/context-sources"
        ))
    }

    /// One-page PDF drawing `text` in a built-in font. An empty `text`
    /// produces a page with no text operations, like a scanned document.
    fn sample_pdf(text: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]
        };

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
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
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

    #[tokio::test]
    async fn test_manual_source_lifecycle() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({
                "type": "manual",
                "title": "Ops notes",
                "content": "Deploy with make ship"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let source: serde_json::Value = response.json().await.unwrap();
        assert_eq!(source["type"], "manual");
        assert_eq!(source["title"], "Ops notes");
        assert_eq!(source["content"], "Deploy with make ship");
        let source_id = source["id"].as_i64().unwrap();

        // Title falls back when omitted.
        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({ "type": "manual", "content": "extra notes" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let untitled: serde_json::Value = response.json().await.unwrap();
        assert_eq!(untitled["title"], "Manual context");

        let response = app
            .client
            .delete(app.url(&format!(
                "/api/rooms/{room_id}/members/{member_id}/context-sources/{source_id}"
            )))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let listed: serde_json::Value = app
            .client
            .get(sources_url(&app, room_id, member_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_source_requires_content() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({ "type": "manual", "title": "empty" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().contains("Content is required"));
    }

    #[tokio::test]
    async fn test_invalid_source_type_rejected() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({ "type": "carrier-pigeon", "content": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().contains("Invalid source type"));
    }

    #[tokio::test]
    async fn test_notion_source_requires_url() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({ "type": "notion" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("Notion page URL is required")
        );
    }

    #[tokio::test]
    async fn test_notion_source_requires_api_key() {
        if std::env::var("NOTION_API_KEY").is_ok() {
            // The handler would fall back to the real key and make a live
            // call, so the missing-key path cannot be asserted here.
            return;
        }

        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({
                "type": "notion",
                "url": "https://www.notion.so/team/Runbook-0123456789abcdef0123456789abcdef"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("Notion API key is required")
        );
    }

    #[tokio::test]
    async fn test_url_source_extracts_page() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let server = MockServer::start().await;
        let html = r#"<html>
            <head><title>Team Docs</title></head>
            <body><main><h1>Team Docs</h1><p>Deploy with make ship.</p></main></body>
        </html>"#;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        let page_url = format!("{}/docs", server.uri());

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({ "type": "url", "url": page_url }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let source: serde_json::Value = response.json().await.unwrap();
        assert_eq!(source["type"], "url");
        assert_eq!(source["title"], "Team Docs");
        assert_eq!(source["sourceUrl"], page_url);
        assert!(
            source["content"]
                .as_str()
                .unwrap()
                .contains("Deploy with make ship.")
        );
    }

    #[tokio::test]
    async fn test_url_source_reports_fetch_failure() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .json(&serde_json::json!({
                "type": "url",
                "url": format!("{}/gone", server.uri())
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().contains("Failed to fetch URL"));
    }

    #[tokio::test]
    async fn test_text_file_upload() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(b"release checklist:\n- tag the build\n".to_vec())
                    .file_name("notes.txt"),
            )
            .text("type", "text_file");

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let source: serde_json::Value = response.json().await.unwrap();
        assert_eq!(source["type"], "text_file");
        assert_eq!(source["title"], "notes.txt");
        assert_eq!(source["fileName"], "notes.txt");
        assert!(
            source["content"]
                .as_str()
                .unwrap()
                .contains("release checklist")
        );
    }

    #[tokio::test]
    async fn test_pdf_file_upload() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(sample_pdf("Quarterly budget review"))
                    .file_name("budget.pdf"),
            )
            .text("type", "pdf");

        let response = app
            .client
            .post(sources_url(&app, room_id, member_id))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let source: serde_json::Value = response.json().await.unwrap();
        assert_eq!(source["type"], "pdf");
        assert_eq!(source["title"], "budget.pdf");
        assert_eq!(source["fileName"], "budget.pdf");
        assert!(
            source["content"]
                .as_str()
                .unwrap()
                .contains("Quarterly budget review")
        );
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let member_id = app.create_member(room_id, "alpha").await;
        let url = sources_url(&app, room_id, member_id);

        // Missing file part.
        let form = reqwest::multipart::Form::new().text("type", "text_file");
        let response = app
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().contains("No file provided"));

        // Unrecognized upload type.
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(b"MZ".to_vec()).file_name("tool.exe"),
            )
            .text("type", "exe");
        let response = app
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().contains("Invalid file type"));

        // Whitespace-only file decodes to nothing.
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(b"   \n\t  ".to_vec()).file_name("blank.txt"),
            )
            .text("type", "text_file");
        let response = app
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("No text content could be extracted")
        );

        // Corrupt PDF that will not parse.
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(b"%PDF-1.4 garbage".to_vec())
                    .file_name("doc.pdf"),
            )
            .text("type", "pdf");
        let response = app
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("Failed to extract text from PDF")
        );

        // PDF with no text layer is rejected like an empty text file.
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(sample_pdf("")).file_name("scan.pdf"),
            )
            .text("type", "pdf");
        let response = app
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("No text content could be extracted")
        );
    }
}

mod chat_flow_tests {
    use super::*;

    async fn post_chat(app: &TestApp, room_id: i64, body: serde_json::Value) -> reqwest::Response {
        app.client
            .post(app.url(&format!("/api/rooms/{room_id}/chat")))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn fetch_messages(app: &TestApp, room_id: i64) -> Vec<serde_json::Value> {
        let listed: serde_json::Value = app
            .client
            .get(app.url(&format!("/api/rooms/{room_id}/messages")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        listed.as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_chat_streams_all_members_in_order() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let alpha = app.create_member(room_id, "alpha").await;
        let beta = app.create_member(room_id, "beta").await;

        let response = post_chat(
            &app,
            room_id,
            serde_json::json!({ "content": "  hello table  " }),
        )
        .await;
        assert_eq!(response.status().as_u16(), 200);
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(
            content_type.starts_with("text/event-stream"),
            "unexpected content type: {content_type}"
        );

        let body = response.text().await.unwrap();
        let events = parse_sse_events(&body);
        assert_eq!(
            event_types(&events),
            vec!["start", "chunk", "done", "start", "chunk", "done"]
        );
        assert_eq!(events[0]["memberId"], alpha);
        assert_eq!(events[0]["memberName"], "alpha");
        assert_eq!(events[1]["content"], "alpha answer");
        assert_eq!(events[3]["memberId"], beta);
        assert_eq!(events[4]["content"], "beta answer");

        let messages = fetch_messages(&app, room_id).await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "hello table");
        assert!(messages[0]["memberName"].is_null());
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["memberId"], alpha);
        assert_eq!(messages[1]["content"], "alpha answer");
        assert_eq!(messages[1]["memberName"], "alpha");
        assert_eq!(messages[2]["memberId"], beta);
    }

    #[tokio::test]
    async fn test_chat_requires_content() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        app.create_member(room_id, "alpha").await;

        let response = post_chat(&app, room_id, serde_json::json!({ "content": "   " })).await;
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("Message content is required")
        );
    }

    #[tokio::test]
    async fn test_chat_requires_members() {
        let app = spawn_app().await;
        let room_id = app.create_room("empty room").await;

        let response = post_chat(&app, room_id, serde_json::json!({ "content": "anyone?" })).await;
        assert_eq!(response.status().as_u16(), 400);
        let error: serde_json::Value = response.json().await.unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .contains("No agents available in this room")
        );

        // The rejected message must not appear in the transcript.
        assert!(fetch_messages(&app, room_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_unknown_target_rejected() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        app.create_member(room_id, "alpha").await;

        let response = post_chat(
            &app,
            room_id,
            serde_json::json!({ "content": "hi", "targetMemberId": 9999 }),
        )
        .await;
        assert_eq!(response.status().as_u16(), 400);

        assert!(fetch_messages(&app, room_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_mention_targets_single_member() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let alpha = app.create_member(room_id, "alpha").await;
        app.create_member(room_id, "beta").await;

        let response = post_chat(
            &app,
            room_id,
            serde_json::json!({ "content": "@alpha what do you think?" }),
        )
        .await;
        let body = response.text().await.unwrap();
        let events = parse_sse_events(&body);

        assert_eq!(event_types(&events), vec!["start", "chunk", "done"]);
        assert_eq!(events[0]["memberId"], alpha);

        let messages = fetch_messages(&app, room_id).await;
        assert_eq!(messages.len(), 2, "user message plus alpha's answer");
        assert_eq!(messages[1]["memberId"], alpha);
    }

    #[tokio::test]
    async fn test_explicit_target_overrides_mention() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        app.create_member(room_id, "alpha").await;
        let beta = app.create_member(room_id, "beta").await;

        let response = post_chat(
            &app,
            room_id,
            serde_json::json!({ "content": "@alpha ping", "targetMemberId": beta }),
        )
        .await;
        let body = response.text().await.unwrap();
        let events = parse_sse_events(&body);

        assert_eq!(event_types(&events), vec!["start", "chunk", "done"]);
        assert_eq!(events[0]["memberId"], beta);
    }

    #[tokio::test]
    async fn test_member_failure_does_not_stop_round() {
        let app = spawn_app().await;
        let room_id = app.create_room("room").await;
        let alpha = app.create_member(room_id, "alpha").await;
        let broken = app.create_member(room_id, "broken-bot").await;
        let gamma = app.create_member(room_id, "gamma").await;

        let response = post_chat(&app, room_id, serde_json::json!({ "content": "report" })).await;
        let body = response.text().await.unwrap();
        let events = parse_sse_events(&body);

        assert_eq!(
            event_types(&events),
            vec!["start", "chunk", "done", "start", "error", "start", "chunk", "done"]
        );
        assert_eq!(events[3]["memberId"], broken);
        assert_eq!(events[4]["error"], "broken-bot exploded");
        assert_eq!(events[5]["memberId"], gamma);

        let messages = fetch_messages(&app, room_id).await;
        assert_eq!(messages.len(), 3, "user message plus two surviving answers");
        assert_eq!(messages[1]["memberId"], alpha);
        assert_eq!(messages[2]["memberId"], gamma);
    }
}
