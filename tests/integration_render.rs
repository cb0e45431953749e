//! Integration tests for the rendering pipeline

#![cfg(feature = "cdp")]

use nirnay::inspect::inspect;
use nirnay::{resolve, AsyncRenderer, EngineInstallation, Error, Preset, RenderConfig, Renderer};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();
static SLOW_CSS_HITS: AtomicUsize = AtomicUsize::new(0);
static LATE_FETCH_HITS: AtomicUsize = AtomicUsize::new(0);

/// Start a test server with deliberately slow resources
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for request in server.incoming_requests() {
                // Answer each request on its own thread so slow responses don't queue.
                std::thread::spawn(move || {
                    let path = request.url().to_string();
                    let response = match path.as_str() {
                        "/slow.css" => {
                            SLOW_CSS_HITS.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(800));
                            Response::from_string("body { background: rgb(10, 20, 30); }").with_header(
                                "Content-Type: text/css".parse::<tiny_http::Header>().unwrap(),
                            )
                        }
                        "/late.json" => {
                            LATE_FETCH_HITS.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_secs(2));
                            Response::from_string(r#"{"caption":"arrived"}"#)
                                .with_header("Content-Type: application/json".parse::<tiny_http::Header>().unwrap())
                                .with_header("Access-Control-Allow-Origin: *".parse::<tiny_http::Header>().unwrap())
                        }
                        "/stall.png" => {
                            std::thread::sleep(Duration::from_secs(5));
                            Response::from_string("").with_status_code(404)
                        }
                        _ => Response::from_string("Not Found").with_status_code(404),
                    };
                    let _ = request.respond(response);
                });
            }
        });
        // Give the server time to start
        std::thread::sleep(Duration::from_millis(100));
    });

    "http://127.0.0.1:18090".to_string()
}

fn renderer(temp_root: &Path, timeout_ms: u64) -> Renderer {
    let config = RenderConfig {
        temp_root: Some(temp_root.to_path_buf()),
        timeout_ms,
        ..Default::default()
    };
    let installation = EngineInstallation::ensure(&config).expect("Chrome must be installed");
    Renderer::new(installation, config).expect("Failed to create renderer")
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_a4_render() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);
    let profile = resolve(Preset::Document);

    let pdf = renderer.render("<h1>Title</h1>", profile).expect("Failed to render");
    assert!(pdf.as_bytes().starts_with(b"%PDF-"));

    let summary = inspect(pdf.as_bytes()).expect("Failed to inspect PDF");
    assert_eq!(summary.page_count, 1);
    assert!(summary.matches(&profile.page_geometry), "page size {:?}", summary.page_size_pt);
    assert_eq!(entries(tmp.path()), 0);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_poster_render() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);
    let profile = resolve(Preset::Poster);

    let pdf = renderer
        .render("<h1>Open day</h1><p>Saturday, 10am</p>", profile)
        .expect("Failed to render");

    let summary = inspect(pdf.as_bytes()).expect("Failed to inspect PDF");
    assert!(summary.matches(&profile.page_geometry), "page size {:?}", summary.page_size_pt);
    assert!((summary.page_size_pt.0 - 900.0).abs() < 2.0);
    assert!((summary.page_size_pt.1 - 1125.0).abs() < 2.0);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_slides_one_page_per_section() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);
    let profile = resolve(Preset::Slide);

    let pdf = renderer
        .render("<section><h1>One</h1></section><section><h1>Two</h1></section>", profile)
        .expect("Failed to render");

    let summary = inspect(pdf.as_bytes()).expect("Failed to inspect PDF");
    assert_eq!(summary.page_count, 2);
    assert!(summary.matches(&profile.page_geometry), "page size {:?}", summary.page_size_pt);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_repeated_renders_are_independent() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);
    let profile = resolve(Preset::Document);
    let fragment = "<h2>Minutes</h2><ul><li>one</li><li>two</li></ul>";

    let first = inspect(renderer.render(fragment, profile).unwrap().as_bytes()).unwrap();
    let second = inspect(renderer.render(fragment, profile).unwrap().as_bytes()).unwrap();

    assert_eq!(first.page_count, second.page_count);
    assert_eq!(first.page_size_pt, second.page_size_pt);
    assert_eq!(entries(tmp.path()), 0);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_waits_for_fetch_started_after_load() {
    let base = start_test_server();
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);

    let before = LATE_FETCH_HITS.load(Ordering::SeqCst);
    let started = Instant::now();
    let fragment = format!(
        r#"<p id="caption">pending</p>
<script>
window.addEventListener('load', function() {{
  setTimeout(function() {{
    fetch('{}/late.json')
      .then(function(r) {{ return r.json(); }})
      .then(function(d) {{ document.getElementById('caption').textContent = d.caption; }});
  }}, 50);
}});
</script>"#,
        base
    );
    renderer.render(&fragment, resolve(Preset::Document)).expect("Failed to render");

    assert_eq!(LATE_FETCH_HITS.load(Ordering::SeqCst), before + 1);
    assert!(started.elapsed() >= Duration::from_secs(2), "printed before the fetch settled");
    assert_eq!(entries(tmp.path()), 0);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_print_respects_caller_deadline() {
    let base = start_test_server();
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);

    let started = Instant::now();
    let deadline = started + Duration::from_millis(1500);
    let fragment = format!(r#"<img src="{}/stall.png"><p>never idle in time</p>"#, base);
    let res = renderer.render_with_deadline(&fragment, resolve(Preset::Document), deadline);

    assert!(matches!(res, Err(Error::Timeout(_))), "{:?}", res.map(|p| p.len()));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(entries(tmp.path()), 0);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_waits_for_network_idle() {
    let base = start_test_server();
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);

    let before = SLOW_CSS_HITS.load(Ordering::SeqCst);
    let started = Instant::now();
    let fragment = format!(r#"<link rel="stylesheet" href="{}/slow.css"><p>styled</p>"#, base);
    renderer.render(&fragment, resolve(Preset::Poster)).expect("Failed to render");

    assert!(SLOW_CSS_HITS.load(Ordering::SeqCst) > before);
    assert!(started.elapsed() >= Duration::from_millis(800));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_timeout_cleans_up() {
    let base = start_test_server();
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 1000);

    let fragment = format!(r#"<img src="{}/stall.png">"#, base);
    let err = renderer
        .render(&fragment, resolve(Preset::Document))
        .expect_err("render should time out");

    assert!(err.is_engine_failure(), "unexpected error: {}", err);
    assert_eq!(entries(tmp.path()), 0);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_preview_matches_print() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = renderer(tmp.path(), 30000);

    let doc = renderer.preview("<h1>Preview</h1>", resolve(Preset::Slide)).unwrap();
    let pdf = renderer.render_document(&doc).expect("Failed to render");

    let summary = inspect(pdf.as_bytes()).unwrap();
    assert!(summary.matches(&doc.profile().page_geometry));
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_async_deadline() {
    let base = start_test_server();
    let tmp = tempfile::tempdir().unwrap();
    let renderer = AsyncRenderer::new(renderer(tmp.path(), 30000));

    let fragment = format!(r#"<img src="{}/stall.png">"#, base);
    let started = Instant::now();
    let err = renderer
        .render(&fragment, resolve(Preset::Document), Some(Duration::from_millis(1500)))
        .await
        .expect_err("render should hit the deadline");

    assert!(matches!(err, Error::Timeout(_)), "unexpected error: {}", err);
    assert!(started.elapsed() < Duration::from_secs(5));

    // The worker finishes on its own deadline and removes its workspace.
    let waited = Instant::now();
    while entries(tmp.path()) > 0 && waited.elapsed() < Duration::from_secs(10) {
        std::thread::sleep(Duration::from_millis(100));
    }
    assert_eq!(entries(tmp.path()), 0);
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_async_render() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = AsyncRenderer::new(renderer(tmp.path(), 30000));

    let pdf = renderer
        .render("<h1>async</h1>", resolve(Preset::Document), None)
        .await
        .expect("Failed to render");
    assert_eq!(pdf.file_name(), "nirnay_output.pdf");
    assert_eq!(pdf.mime_type(), "application/pdf");
    assert!(inspect(pdf.as_bytes()).unwrap().page_count >= 1);
}
