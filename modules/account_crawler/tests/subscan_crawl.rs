use harbour_common::NetworkId;
use harbour_module_account_crawler::{CrawlError, CrawlerConfig, Crawler, SubscanClient};
use harbour_test_utils::{pages, sample_accounts, subscan_body};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> CrawlerConfig {
    CrawlerConfig {
        endpoint: server.uri(),
        api_key: "integration-key".to_string(),
        request_interval_ms: 0,
        ..CrawlerConfig::default()
    }
}

#[tokio::test]
async fn crawls_every_page_over_http() {
    let server = MockServer::start().await;
    let accounts = sample_accounts(250, NetworkId::DATAHIGHWAY);

    for (page, list) in pages(&accounts, 100).into_iter().enumerate() {
        Mock::given(method("POST"))
            .and(path("/api/scan/accounts"))
            .and(header("X-API-Key", "integration-key"))
            .and(body_partial_json(json!({ "page": page, "row": 100, "order": "asc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(subscan_body(250, &list)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = config_for(&server);
    let crawler = Crawler::new(SubscanClient::new(&config).unwrap(), config.rows_per_page).unwrap();
    let state = crawler.crawl_all().await.unwrap();

    assert_eq!(state.accounts(), accounts.as_slice());
    assert_eq!(state.pages_seen().len(), 3);
}

#[tokio::test]
async fn aborts_on_server_error() {
    let server = MockServer::start().await;
    let accounts = sample_accounts(150, NetworkId::DATAHIGHWAY);
    let chunks = pages(&accounts, 100);

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "page": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscan_body(150, &chunks[0])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "page": 1 })))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let crawler = Crawler::new(SubscanClient::new(&config).unwrap(), config.rows_per_page).unwrap();
    let err = crawler.crawl_all().await.unwrap_err();

    assert!(matches!(err, CrawlError::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn aborts_when_pagination_repeats_an_account() {
    let server = MockServer::start().await;
    let accounts = sample_accounts(200, NetworkId::DATAHIGHWAY);
    let mut chunks = pages(&accounts, 100);
    // Shifted ordering on the remote side: page 1 starts with the last entry of page 0
    chunks[1][0] = chunks[0][99].clone();

    for (page, list) in chunks.into_iter().enumerate() {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "page": page })))
            .respond_with(ResponseTemplate::new(200).set_body_json(subscan_body(200, &list)))
            .mount(&server)
            .await;
    }

    let config = config_for(&server);
    let crawler = Crawler::new(SubscanClient::new(&config).unwrap(), config.rows_per_page).unwrap();
    let err = crawler.crawl_all().await.unwrap_err();

    assert!(matches!(
        err,
        CrawlError::DuplicateAccount { ref address, page: 1 } if *address == accounts[99].address
    ));
}
