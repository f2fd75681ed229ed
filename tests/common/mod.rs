#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use clozer::api::AppState;
use clozer::clients::{ChatWebhook, Email, Mailer};
use clozer::config::Config;
use clozer::state::SharedState;
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const BOUNDARY: &str = "clozer-test-boundary";

/// Captures outbound notifications instead of sending them.
#[derive(Default)]
pub struct Recorder {
    pub emails: Mutex<Vec<Email>>,
    pub messages: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl Mailer for Recorder {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        self.emails.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatWebhook for Recorder {
    async fn post(&self, text: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

impl Recorder {
    pub fn subjects(&self) -> Vec<String> {
        self.emails
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.subject.clone())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub recorder: Arc<Recorder>,
    pub root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let root = std::env::temp_dir().join(format!("clozer-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();

        let mut config = Config::default();
        config.general.database_path = format!("sqlite:{}", root.join("clozer.db").display());
        config.images.root = root.join("images").display().to_string();
        config.images.target_width = 64;
        config.notifications.send_emails = true;
        config.notifications.webhook_url = "http://chat.invalid/hook".to_string();
        config.observability.metrics_enabled = false;
        customize(&mut config);

        let recorder = Arc::new(Recorder::default());
        let shared = SharedState::with_clients(
            config,
            recorder.clone() as Arc<dyn Mailer>,
            recorder.clone() as Arc<dyn ChatWebhook>,
        )
        .await
        .expect("Failed to create shared state");

        let state = clozer::api::create_app_state(Arc::new(shared), None);
        let router = clozer::api::router(state.clone());

        Self {
            router,
            state,
            recorder,
            root,
        }
    }

    pub fn images_root(&self) -> PathBuf {
        self.root.join("images")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let (status, _, bytes) = self.send(request).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request_json(Method::GET, uri, None, None).await
    }

    /// Registers a user and returns its internal id.
    pub async fn signup(&self, facebook_id: &str, nome: &str, email: &str) -> i32 {
        let (status, body) = self
            .request_json(
                Method::POST,
                "/api/v1/usuario",
                Some(serde_json::json!({
                    "facebook_id": facebook_id,
                    "nome": nome,
                    "email": email,
                    "cidade": "Recife",
                    "estado": "PE",
                    "telefone": "81999990000",
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        first_entry(&body)["id"].as_i64().unwrap() as i32
    }

    /// Returns `(access_token, refresh_token)`.
    pub async fn login(&self, facebook_id: &str) -> (String, String) {
        let (status, body) = self
            .request_json(
                Method::POST,
                "/api/v1/login",
                Some(serde_json::json!({ "facebook_id": facebook_id })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_anuncio(
        &self,
        token: &str,
        fields: &[(&str, &str)],
        images: &[Vec<u8>],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/anuncio")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, images)))
            .unwrap();

        let (status, _, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Creates a listing and returns its id.
    pub async fn create_vehicle(
        &self,
        token: &str,
        marca: &str,
        modelo: &str,
        ano: &str,
        cor: &str,
    ) -> i32 {
        let titulo = format!("{marca} {modelo}");
        let (status, body) = self
            .create_anuncio(
                token,
                &[
                    ("titulo", &titulo),
                    ("descricao", "Bem conservado"),
                    ("valor", "45000"),
                    ("marca", marca),
                    ("modelo", modelo),
                    ("ano", ano),
                    ("cor", cor),
                    ("cidade_veiculo", "Recife"),
                    ("estado_veiculo", "PE"),
                ],
                &[],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        first_entry(&body)["id"].as_i64().unwrap() as i32
    }

    pub async fn approve(&self, anuncio_id: i32) {
        self.state
            .anuncios()
            .moderate(clozer::domain::AnuncioId::new(anuncio_id), true)
            .await
            .unwrap();
    }
}

/// Value of the single `{"<id>": {...}}` entry.
pub fn first_entry(body: &Value) -> &Value {
    body.as_object()
        .and_then(|o| o.values().next())
        .unwrap_or_else(|| panic!("expected keyed object, got {body}"))
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 255) as u8, (y % 255) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn multipart_body(fields: &[(&str, &str)], images: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (index, bytes) in images.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"imagens\"; filename=\"foto{index}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
