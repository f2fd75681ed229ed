mod common;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use common::{TestApp, first_entry, png};
use sea_orm::{ConnectionTrait, DbBackend, Statement};

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn page(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Logs in as the seeded moderator and returns the session cookie.
async fn admin_session(app: &TestApp) -> String {
    let (status, headers, _) = app
        .send(form("/admin/login", "username=admin&password=password", None))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin");

    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie")
        .to_string()
}

async fn dashboard(app: &TestApp, cookie: &str) -> String {
    let (status, _, body) = app.send(page("/admin", Some(cookie))).await;
    assert_eq!(status, StatusCode::OK);
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_admin_requires_login() {
    let app = TestApp::new().await;

    let (status, headers, _) = app.send(page("/admin", None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/login");

    let (status, headers, _) = app
        .send(form("/admin/busca/atualizar", "", None))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/login");

    let (status, headers, _) = app
        .send(form("/admin/login", "username=admin&password=wrong", None))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/login");

    let (status, _, body) = app.send(page("/admin/login", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("name=\"password\""));
}

#[tokio::test]
async fn test_admin_dashboard_and_logout() {
    let app = TestApp::new().await;
    app.signup("1001", "Maria <b>", "maria@example.com").await;
    let (token, _) = app.login("1001").await;
    app.create_vehicle(&token, "Toyota", "Corolla", "2015", "Prata").await;

    let cookie = admin_session(&app).await;
    let html = dashboard(&app, &cookie).await;
    assert!(html.contains("Maria &lt;b&gt;"));
    assert!(html.contains("Toyota Corolla 2015 Prata"));
    assert!(html.contains("R$ 45.000,00"));

    let (status, headers, _) = app.send(form("/admin/logout", "", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin/login");

    let (status, _, _) = app.send(page("/admin", Some(&cookie))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_moderation() {
    let app = TestApp::new().await;
    app.signup("1001", "Maria", "maria@example.com").await;
    let (token, _) = app.login("1001").await;
    let aid = app.create_vehicle(&token, "Fiat", "Uno", "2010", "Branco").await;
    let cookie = admin_session(&app).await;

    let (status, headers, _) = app
        .send(form(
            &format!("/admin/anuncios/{aid}/moderacao"),
            "decisao=aprovar",
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin");

    let stored = app.state.store().anuncios().get(aid).await.unwrap().unwrap();
    assert!(stored.aprovado);
    assert!(stored.aprovado_em.is_some());
    assert!(app.recorder.subjects().contains(&"Anuncio Aprovado".to_string()));

    let html = dashboard(&app, &cookie).await;
    assert!(html.contains(&format!("Anuncio {aid} aprovado")));
    // Flash messages are shown once
    let html = dashboard(&app, &cookie).await;
    assert!(!html.contains(&format!("Anuncio {aid} aprovado")));

    app.send(form(
        &format!("/admin/anuncios/{aid}/moderacao"),
        "decisao=reprovar",
        Some(&cookie),
    ))
    .await;
    let stored = app.state.store().anuncios().get(aid).await.unwrap().unwrap();
    assert!(!stored.aprovado);
    assert!(app.recorder.subjects().contains(&"Anuncio Reprovado".to_string()));

    app.send(form(
        &format!("/admin/anuncios/{aid}/moderacao"),
        "decisao=talvez",
        Some(&cookie),
    ))
    .await;
    let html = dashboard(&app, &cookie).await;
    assert!(html.contains("Decisao invalida: talvez"));

    app.send(form("/admin/anuncios/9999/moderacao", "decisao=aprovar", Some(&cookie)))
        .await;
    let html = dashboard(&app, &cookie).await;
    assert!(html.contains("Anuncio de id 9999 nao existe"));
}

#[tokio::test]
async fn test_admin_edit_keeps_approval_and_unchecks_flags() {
    let app = TestApp::new().await;
    app.signup("1001", "Maria", "maria@example.com").await;
    let (token, _) = app.login("1001").await;
    let (_, body) = app
        .create_anuncio(
            &token,
            &[("titulo", "Gol"), ("marca", "VW"), ("modelo", "Gol"), ("troca", "on")],
            &[],
        )
        .await;
    let aid = first_entry(&body)["id"].as_i64().unwrap() as i32;
    app.approve(aid).await;
    let cookie = admin_session(&app).await;

    let (status, _, body) = app
        .send(page(&format!("/admin/anuncios/{aid}"), Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("name=\"troca\" value=\"on\" checked"));

    let (status, _, _) = app
        .send(form(
            &format!("/admin/anuncios/{aid}"),
            "titulo=Gol+Quadrado&valor=15000&ano=1994&cor=Azul",
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let stored = app.state.store().anuncios().get(aid).await.unwrap().unwrap();
    assert_eq!(stored.titulo, "Gol Quadrado");
    assert_eq!(stored.valor, 15000);
    assert!(!stored.troca);
    assert!(stored.aprovado);
    assert_eq!(stored.query_busca, "VW Gol 1994 Azul");

    let (_, body) = app.get("/api/v1/busca?query=gol%20azul").await;
    assert_eq!(body["anuncios"].as_array().unwrap().len(), 1);

    app.send(form(&format!("/admin/anuncios/{aid}"), "valor=caro", Some(&cookie)))
        .await;
    let html = dashboard(&app, &cookie).await;
    assert!(html.contains("Campo valor deve ser numerico"));
}

#[tokio::test]
async fn test_admin_user_edit_and_delete() {
    let app = TestApp::new().await;
    let uid = app.signup("1001", "Maria", "maria@example.com").await;
    let (token, _) = app.login("1001").await;
    let (_, body) = app
        .create_anuncio(&token, &[("titulo", "Gol")], &[png(20, 20)])
        .await;
    let aid = first_entry(&body)["id"].as_i64().unwrap() as i32;
    let cookie = admin_session(&app).await;

    let (status, _, body) = app
        .send(page(&format!("/admin/usuarios/{uid}"), Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("value=\"Maria\""));

    app.send(form(
        &format!("/admin/usuarios/{uid}"),
        "nome=Maria+Souza&tipo=Garagem&email=",
        Some(&cookie),
    ))
    .await;
    let usuario = app.state.store().usuarios().get(uid).await.unwrap().unwrap();
    assert_eq!(usuario.nome, "Maria Souza");
    assert_eq!(usuario.tipo, "Garagem");
    assert_eq!(usuario.email, "maria@example.com");

    let user_dir = app.images_root().join(uid.to_string());
    assert!(user_dir.exists());

    let (status, headers, _) = app
        .send(form(&format!("/admin/usuarios/{uid}/excluir"), "", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin");

    assert!(app.state.store().usuarios().get(uid).await.unwrap().is_none());
    assert!(app.state.store().anuncios().get(aid).await.unwrap().is_none());
    assert!(app.state.store().imagens().list_for_anuncio(aid).await.unwrap().is_empty());
    assert!(!user_dir.exists());
}

#[tokio::test]
async fn test_admin_delete_listing_ignores_owner() {
    let app = TestApp::new().await;
    let uid = app.signup("1001", "Maria", "maria@example.com").await;
    let (token, _) = app.login("1001").await;
    let (_, body) = app
        .create_anuncio(&token, &[("titulo", "Gol")], &[png(20, 20)])
        .await;
    let aid = first_entry(&body)["id"].as_i64().unwrap() as i32;
    let cookie = admin_session(&app).await;

    app.send(form(&format!("/admin/anuncios/{aid}/excluir"), "", Some(&cookie)))
        .await;

    assert!(app.state.store().anuncios().get(aid).await.unwrap().is_none());
    let dir = app.images_root().join(uid.to_string()).join(aid.to_string());
    assert!(!dir.exists());
    let html = dashboard(&app, &cookie).await;
    assert!(html.contains(&format!("Anuncio {aid} excluido")));
}

#[tokio::test]
async fn test_admin_bulk_search_refresh() {
    let app = TestApp::new().await;
    app.signup("1001", "Maria", "maria@example.com").await;
    let (token, _) = app.login("1001").await;
    let aid = app.create_vehicle(&token, "Honda", "Civic", "2019", "Cinza").await;
    app.approve(aid).await;

    // Simulate stale data written outside the application
    let conn = &app.state.store().conn;
    conn.execute(Statement::from_string(
        DbBackend::Sqlite,
        format!("UPDATE anuncio SET query_busca = '' WHERE id = {aid}"),
    ))
    .await
    .unwrap();
    conn.execute(Statement::from_string(
        DbBackend::Sqlite,
        format!("DELETE FROM anuncio_busca WHERE anuncio_id = {aid}"),
    ))
    .await
    .unwrap();

    let (_, body) = app.get("/api/v1/busca?query=civic").await;
    assert!(body["anuncios"].as_array().unwrap().is_empty());

    let cookie = admin_session(&app).await;
    let (status, _, _) = app
        .send(form("/admin/busca/atualizar", "", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let html = dashboard(&app, &cookie).await;
    assert!(html.contains("Texto de busca atualizado em 1 anuncios"));

    let stored = app.state.store().anuncios().get(aid).await.unwrap().unwrap();
    assert_eq!(stored.query_busca, "Honda Civic 2019 Cinza");

    let (_, body) = app.get("/api/v1/busca?query=civic%20cinza").await;
    assert_eq!(body["anuncios"].as_array().unwrap().len(), 1);

    // Searches show up in the dashboard log
    let html = dashboard(&app, &cookie).await;
    assert!(html.contains("&quot;civic&quot;") || html.contains("\"civic\""));
}
