//! End-to-end album runs against mock sites.

mod support;

use std::sync::Arc;
use std::time::Duration;

use albumdl_core::download::{Concurrency, DownloadStats};
use albumdl_core::pipeline::{AlbumError, AlbumJob, run_album};
use albumdl_core::sites::{ImgCredit, Imgur, PutMega};
use chrono::NaiveDate;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn imgcredit_listing(range: std::ops::Range<usize>, next: Option<&str>) -> String {
    let items: String = range
        .map(|n| format!(r#"<a class="image-container" href="/image/{n}">{n}</a>"#))
        .collect();
    let pagination = next.map_or_else(String::new, |href| {
        format!(r#"<li class="pagination-next"><a href="{href}">Next</a></li>"#)
    });
    format!("<html><body>{items}<ul>{pagination}</ul></body></html>")
}

async fn mount_imgcredit_album(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/album/cats/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(imgcredit_listing(
            1..6,
            Some("?sort=title_asc&page=2"),
        )))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/album/cats/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(imgcredit_listing(6..9, None)))
        .mount(server)
        .await;

    for n in 1..9 {
        Mock::given(method("GET"))
            .and(path(format!("/image/{n}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<div class="header"><a class="btn btn-download default" href="/images/cat-{n}.jpg">Download</a></div>"#
            )))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path_regex(r"^/images/cat-\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"meow".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_imgcredit_album_downloads_every_image() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_imgcredit_album(&server).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("nested").join("cats");

    let job = AlbumJob {
        album_url: Url::parse(&format!("{}/album/cats", server.uri())).unwrap(),
        destination: destination.clone(),
        timeout: Duration::from_secs(30),
        concurrency: Concurrency::from_limit(3),
    };
    let stats = Arc::new(DownloadStats::new());
    let summary = run_album(Arc::new(ImgCredit::new().unwrap()), &job, Arc::clone(&stats))
        .await
        .unwrap();

    assert_eq!(summary.destination, destination);
    assert_eq!(summary.discovered, 8);
    assert_eq!(summary.completed, 8);
    assert_eq!(summary.failed, 0);
    for n in 1..9 {
        let file = destination.join(format!("cat-{n}.jpg"));
        assert_eq!(std::fs::read(&file).unwrap(), b"meow", "missing {file:?}");
    }
    assert_eq!(stats.finished(), 8);
}

#[tokio::test]
async fn test_putmega_album_lands_in_dated_folder_at_full_resolution() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/album/beach"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="content-listing-tabs">
                 <div class="list-item-image fixed-size">
                   <a class="image-container" href="/image/w1"><img src="/images/wave.md.jpg"></a>
                 </div>
                 <div class="list-item-image fixed-size">
                   <a class="image-container" href="/image/s2"><img src="/images/sand.th.png"></a>
                 </div>
               </div>
               <div class="sidebar"><a class="image-container"><img src="/images/ad.md.jpg"></a></div>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/wave.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"wave".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/sand.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"sand".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let date = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();
    let job = AlbumJob::new(
        Url::parse(&format!("{}/album/beach", server.uri())).unwrap(),
        temp_dir.path(),
    );
    let summary = run_album(
        Arc::new(PutMega::new().unwrap().with_date(date)),
        &job,
        Arc::new(DownloadStats::new()),
    )
    .await
    .unwrap();

    let dated = temp_dir.path().join("2021-12-31");
    assert_eq!(summary.destination, dated);
    assert_eq!(summary.completed, 2);
    assert_eq!(std::fs::read(dated.join("wave.jpg")).unwrap(), b"wave");
    assert_eq!(std::fs::read(dated.join("sand.png")).unwrap(), b"sand");
}

#[tokio::test]
async fn test_imgur_album_downloads_direct_links() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/3/album/XyZ/images"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"data":[{{"id":"a","link":"{0}/i/a.jpg"}},{{"id":"b","link":"{0}/i/b.gif"}}],"success":true,"status":200}}"#,
            server.uri()
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/i/[ab]\.(jpg|gif)$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pixels".to_vec()))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let imgur = Imgur::new("cafe1234")
        .unwrap()
        .with_api_base(&Url::parse(&server.uri()).unwrap())
        .unwrap();
    let job = AlbumJob::new(Url::parse("https://imgur.com/a/XyZ").unwrap(), temp_dir.path());
    let summary = run_album(Arc::new(imgur), &job, Arc::new(DownloadStats::new()))
        .await
        .unwrap();

    assert_eq!(summary.completed, 2);
    assert!(temp_dir.path().join("a.jpg").exists());
    assert!(temp_dir.path().join("b.gif").exists());
}

#[tokio::test]
async fn test_empty_album_still_creates_folder() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/album/empty/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("empty");

    let job = AlbumJob::new(
        Url::parse(&format!("{}/album/empty", server.uri())).unwrap(),
        &destination,
    );
    let summary = run_album(
        Arc::new(ImgCredit::new().unwrap()),
        &job,
        Arc::new(DownloadStats::new()),
    )
    .await
    .unwrap();

    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.completed, 0);
    assert!(destination.is_dir());
}

#[tokio::test]
async fn test_album_run_times_out() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/album/slow/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(imgcredit_listing(1..2, None))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let mut job = AlbumJob::new(
        Url::parse(&format!("{}/album/slow", server.uri())).unwrap(),
        temp_dir.path(),
    );
    job.timeout = Duration::from_millis(300);

    let err = run_album(
        Arc::new(ImgCredit::new().unwrap()),
        &job,
        Arc::new(DownloadStats::new()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AlbumError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_destination_occupied_by_file_is_fatal() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let occupied = temp_dir.path().join("taken");
    std::fs::write(&occupied, b"not a folder").unwrap();

    let job = AlbumJob::new(
        Url::parse("http://127.0.0.1:9/album/any").unwrap(),
        &occupied,
    );
    let err = run_album(
        Arc::new(ImgCredit::new().unwrap()),
        &job,
        Arc::new(DownloadStats::new()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AlbumError::Folder(_)), "got {err:?}");
}
