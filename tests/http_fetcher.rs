//! HttpFetcher against a local server

#![cfg(feature = "http")]

use adgallery::renderer::{
    CreativeFetcher, CreativeRef, HttpFetcher, MemorySurfaceFactory, RenderState, Renderer,
};
use adgallery::RendererConfig;
use std::sync::Arc;
use tiny_http::{Header, Response, Server};

/// Start a server for the test's lifetime and return its base URL
fn start_test_server() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = match request.url() {
                "/campaigns/c1/index.html" => Response::from_string(
                    r#"<!DOCTYPE html>
<html>
<head><title>Spring</title></head>
<body><img src="logo.png"><script src="anim.js"></script></body>
</html>"#,
                )
                .with_header("Content-Type: text/html; charset=utf-8".parse::<Header>().unwrap()),
                "/campaigns/c1/logo.png" => Response::from_data(b"\x89PNG\r\n\x1a\nfake".to_vec())
                    .with_header("Content-Type: image/png".parse::<Header>().unwrap()),
                "/campaigns/c1/empty.png" => Response::from_data(Vec::new()),
                "/campaigns/c1/soft404.png" => Response::from_string(
                    "<!DOCTYPE html><html><body><h1>Not found</h1></body></html>",
                )
                .with_header("Content-Type: text/html; charset=utf-8".parse::<Header>().unwrap()),
                "/campaigns/c1/mislabeled.png" => Response::from_string("<html>Not found</html>")
                    .with_header("Content-Type: image/png".parse::<Header>().unwrap()),
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    format!("http://{}", addr)
}

fn renderer(base: &str) -> (Renderer, MemorySurfaceFactory) {
    let config = RendererConfig {
        host_origin: format!("{}/dashboard", base),
        timeout_ms: 5000,
        ..Default::default()
    };
    let fetcher = Arc::new(HttpFetcher::new(&config).expect("fetcher"));
    let factory = MemorySurfaceFactory::new();
    let r = Renderer::new(config, fetcher, Arc::new(factory.clone())).expect("renderer");
    (r, factory)
}

#[tokio::test]
async fn test_fetch_document_and_inject_base() {
    let base = start_test_server();
    let (r, _) = renderer(&base);

    let state = r
        .mount(CreativeRef::new(format!("{}/campaigns/c1/index.html", base), "300x250"))
        .await;
    assert_eq!(state, Some(RenderState::Ready));

    let content = r.content().unwrap();
    let expected = format!(r#"<head><base href="{}/campaigns/c1/"><title>Spring</title>"#, base);
    assert!(content.contains(&expected), "unexpected content: {}", content);
}

#[tokio::test]
async fn test_relative_address_uses_host_origin() {
    let base = start_test_server();
    let (r, _) = renderer(&base);

    let state = r
        .mount(CreativeRef::new("/campaigns/c1/logo.png", "300x250"))
        .await;
    assert_eq!(state, Some(RenderState::Ready));
    assert!(r.content().unwrap().contains(r#"<img src="logo.png""#));
}

#[tokio::test]
async fn test_missing_creative_fails_quietly() {
    let base = start_test_server();
    let (r, factory) = renderer(&base);

    let state = r
        .mount(CreativeRef::new(format!("{}/campaigns/c1/gone.html", base), "300x250"))
        .await;
    assert_eq!(state, Some(RenderState::Failed));
    assert_eq!(r.content(), None);
    assert_eq!(factory.last().unwrap().snapshot().loads, 0);
}

#[tokio::test]
async fn test_html_served_for_an_image_fails_and_stays_blank() {
    let base = start_test_server();
    let (r, factory) = renderer(&base);

    for path in ["soft404.png", "mislabeled.png"] {
        let state = r
            .mount(CreativeRef::new(format!("{}/campaigns/c1/{}", base, path), "300x250"))
            .await;
        assert_eq!(state, Some(RenderState::Failed), "{path}");
        assert_eq!(r.content(), None);
        assert_eq!(factory.last().unwrap().snapshot().loads, 0);
    }
}

#[tokio::test]
async fn test_preload_rejects_empty_images() {
    let base = start_test_server();
    let config = RendererConfig {
        host_origin: base.clone(),
        ..Default::default()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();
    assert!(fetcher
        .preload_image(&format!("{}/campaigns/c1/logo.png", base))
        .await
        .is_ok());
    assert!(fetcher
        .preload_image(&format!("{}/campaigns/c1/empty.png", base))
        .await
        .is_err());
    assert!(fetcher
        .fetch_document(&format!("{}/nowhere.html", base))
        .await
        .is_err());
}
