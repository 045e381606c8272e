use std::net::TcpListener;
use std::time::Duration;

use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use tempfile::tempdir;

use image_saver_core::fetch::{build_client, FetchError, HttpFetcher, ImageFetcher};
use image_saver_core::source::{HttpImageSource, ImageSource, SourceError};
use image_saver_core::{Config, ImageRecord, ImageSaver, Outcome};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::with_timeout(Duration::from_secs(5)).unwrap()
}

#[test]
fn test_fetcher_returns_body_bytes() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/a.jpg");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body(b"\xff\xd8\xff\xe0jpeg bytes".to_vec());
    });

    let image = fetcher().fetch(&server.url("/a.jpg")).unwrap();

    mock.assert();
    assert_eq!(image.as_bytes(), b"\xff\xd8\xff\xe0jpeg bytes");
}

#[test]
fn test_fetcher_reports_non_success_status() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone.jpg");
        then.status(404);
    });

    let err = fetcher().fetch(&server.url("/gone.jpg")).unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[test]
fn test_fetcher_rejects_empty_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/empty.jpg");
        then.status(200);
    });

    let err = fetcher().fetch(&server.url("/empty.jpg")).unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody { .. }));
}

#[test]
fn test_fetcher_rejects_unparseable_url() {
    let err = fetcher().fetch("not a url").unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

#[test]
fn test_fetcher_times_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow.jpg");
        then.status(200)
            .body("late")
            .delay(Duration::from_secs(3));
    });

    let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();
    let err = fetcher.fetch(&server.url("/slow.jpg")).unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
}

#[test]
fn test_source_parses_records_and_ignores_extra_fields() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/images/search");
        then.status(200).json_body(json!([
            { "id": "abc", "url": "https://cdn.example/abc.jpg", "width": 640, "height": 480 },
            { "id": "def", "url": "https://cdn.example/def.jpg" }
        ]));
    });

    let client = build_client(Duration::from_secs(5)).unwrap();
    let source = HttpImageSource::new(client, server.url("/v1/images/search"));
    let records = source.images().unwrap();

    assert_eq!(
        records,
        vec![
            ImageRecord::new("abc", "https://cdn.example/abc.jpg"),
            ImageRecord::new("def", "https://cdn.example/def.jpg"),
        ]
    );
}

#[test]
fn test_source_errors() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/empty");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/garbage");
        then.status(200).body("<html>oops</html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/down");
        then.status(503);
    });

    let client = build_client(Duration::from_secs(5)).unwrap();
    let images = |path: &str| HttpImageSource::new(client.clone(), server.url(path)).images();

    assert!(matches!(images("/empty"), Err(SourceError::Empty)));
    assert!(matches!(images("/garbage"), Err(SourceError::Malformed { .. })));
    assert!(matches!(
        images("/down"),
        Err(SourceError::Status { status: 503, .. })
    ));
}

#[test]
fn test_image_saver_runs_full_pipeline() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let image_url = server.url("/images/cat.jpg");
    server.mock(|when, then| {
        when.method(GET).path("/v1/images/search");
        then.status(200)
            .json_body(json!([{ "id": "cat1", "url": image_url }]));
    });
    let image_mock = server.mock(|when, then| {
        when.method(GET).path("/images/cat.jpg");
        then.status(200).body(b"meow bytes".to_vec());
    });

    let temp_dir = tempdir().unwrap();
    let store_dir = temp_dir.path().join("data");
    let config = Config {
        store_dir: store_dir.clone(),
        source_url: server.url("/v1/images/search"),
        fetch_timeout_secs: 5,
        ..Default::default()
    };
    let saver = ImageSaver::new(&config).unwrap();

    let first = saver.run();
    assert!(matches!(first, Outcome::Saved(_)), "got {:?}", first);

    let second = saver.run();
    assert!(matches!(second, Outcome::Duplicate { .. }), "got {:?}", second);

    image_mock.assert_hits(2);
    assert_eq!(std::fs::read_dir(&store_dir).unwrap().count(), 1);
    assert_eq!(saver.store().artifacts().unwrap().len(), 1);
}

#[test]
fn test_image_saver_reports_empty_source() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/images/search");
        then.status(200).json_body(json!([]));
    });

    let temp_dir = tempdir().unwrap();
    let config = Config {
        store_dir: temp_dir.path().join("data"),
        source_url: server.url("/v1/images/search"),
        ..Default::default()
    };

    let outcome = ImageSaver::new(&config).unwrap().run();
    assert!(matches!(outcome, Outcome::EmptySource));
    assert_eq!(outcome.to_string(), "No images found in response");
}

#[test]
fn test_image_saver_reports_unavailable_store() {
    let temp_dir = tempdir().unwrap();
    let blocker = temp_dir.path().join("data");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let config = Config {
        store_dir: blocker,
        ..Default::default()
    };
    let saver = ImageSaver::new(&config).unwrap();

    let outcome = saver.save(&ImageRecord::new("1", "http://127.0.0.1:9/never.jpg"));
    assert!(matches!(outcome, Outcome::StorageError(ref e) if e.is_unavailable()));
}
