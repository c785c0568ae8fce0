//! Polling Fetcher Integration Tests
//!
//! Exercises the REST snapshot client and the polling loops against a
//! mock HTTP provider.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_sync::{
    EventSink, Interval, MarketEvent, MarketStore, MarketSyncService, PollKinds, PollingConfig,
    PollingFetcher, RestClient, RestConfig, SnapshotSource, StaticSnapshots, TickerSnapshot,
};

struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: MarketEvent) {}
}

fn make_client(base_url: &str) -> RestClient {
    RestClient::new(RestConfig::new(base_url)).unwrap()
}

fn make_fetcher(store: Arc<MarketStore>, client: RestClient, cadence: Duration) -> Arc<PollingFetcher> {
    let sync = Arc::new(MarketSyncService::new(store, Arc::new(NullSink)));
    Arc::new(PollingFetcher::new(
        PollingConfig {
            ticker_interval: cadence,
            order_book_interval: cadence,
            candle_interval: cadence,
            candle_timeframe: Interval::OneHour,
            kline_limit: 10,
        },
        Arc::new(client),
        Arc::new(StaticSnapshots::new()),
        sync,
    ))
}

fn stale_ticker(symbol: &str, price: i64) -> TickerSnapshot {
    TickerSnapshot {
        symbol: symbol.to_string(),
        price: Decimal::from(price),
        change: Decimal::ZERO,
        change_percent: Decimal::ZERO,
        high_24h: Decimal::from(price),
        low_24h: Decimal::from(price),
        volume_24h: Decimal::from(1_000),
        last_update: Utc::now() - chrono::Duration::seconds(60),
    }
}

#[tokio::test]
async fn ticker_endpoint_parses_numeric_strings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .and(query_param("symbol", "BTCUSD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lastPrice": "109250.50",
            "priceChange": "1250.50",
            "priceChangePercent": "1.16",
            "highPrice": "110100.00",
            "lowPrice": "108200.00",
            "volume": "41000000000"
        })))
        .mount(&server)
        .await;

    let client = make_client(&server.uri());
    let snapshot = client.ticker("BTC/USD").await.unwrap();

    assert_eq!(snapshot.symbol, "BTC/USD");
    assert_eq!(snapshot.price, Decimal::from_str_exact("109250.50").unwrap());
    assert_eq!(
        snapshot.change_percent,
        Decimal::from_str_exact("1.16").unwrap()
    );
}

#[tokio::test]
async fn depth_endpoint_returns_normalized_book() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/depth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bids": [["109200.00", "0.5"], ["109210.00", "1.2"]],
            "asks": [["109260.00", "0.8"], ["109250.00", "0.3"]]
        })))
        .mount(&server)
        .await;

    let client = make_client(&server.uri());
    let book = client.order_book("BTC/USD").await.unwrap();

    assert_eq!(
        book.best_bid().unwrap().price,
        Decimal::from_str_exact("109210.00").unwrap()
    );
    assert_eq!(
        book.best_ask().unwrap().price,
        Decimal::from_str_exact("109250.00").unwrap()
    );
}

#[tokio::test]
async fn kline_endpoint_translates_interval_vocabulary() {
    let server = MockServer::start().await;
    // The provider must be asked for "60m", never "1h".
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("interval", "60m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1_756_500_000_000_i64, "109000.0", "109500.0", "108800.0", "109250.0", "1200.5"],
            [1_756_503_600_000_i64, "109250.0", "109400.0", "109100.0", "109300.0", "900.2"]
        ])))
        .mount(&server)
        .await;

    let client = make_client(&server.uri());
    let points = client.candles("BTC/USD", Interval::OneHour, 10).await.unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].open_time, 1_756_500_000_000);
    assert_eq!(
        points[1].close,
        Decimal::from_str_exact("109300.0").unwrap()
    );
}

#[tokio::test]
async fn provider_failure_keeps_last_known_value_and_cadence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2..)
        .mount(&server)
        .await;

    let store = Arc::new(MarketStore::default());
    store.apply_ticker_batch(vec![stale_ticker("BTC/USD", 123_456)]);

    let fetcher = make_fetcher(
        Arc::clone(&store),
        make_client(&server.uri()),
        Duration::from_millis(50),
    );
    fetcher.start(
        "BTC/USD",
        PollKinds {
            ticker: true,
            order_book: false,
            candles: false,
        },
    );

    // Several failed ticks pass; the stored value must survive and the
    // timer must keep firing (asserted by the mock's expectation).
    tokio::time::sleep(Duration::from_millis(250)).await;
    fetcher.stop_all();

    assert_eq!(
        store.ticker("BTC/USD").unwrap().price,
        Decimal::from(123_456)
    );
}

#[tokio::test]
async fn cold_start_against_dead_provider_serves_static_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MarketStore::default());
    let fetcher = make_fetcher(
        Arc::clone(&store),
        make_client(&server.uri()),
        Duration::from_millis(50),
    );
    fetcher.start("ETH/USD", PollKinds::all());

    tokio::time::sleep(Duration::from_millis(250)).await;
    fetcher.stop_all();

    // Fallback values appear exactly once and then stick.
    assert_eq!(store.ticker("ETH/USD").unwrap().price, Decimal::from(4_400));
    assert!(store.order_book("ETH/USD").is_some());
    assert!(store.candles("ETH/USD", Interval::OneHour).is_some());
}

#[tokio::test]
async fn fresh_poll_overwrites_stale_stored_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lastPrice": "200000",
            "priceChange": "0",
            "priceChangePercent": "0",
            "highPrice": "200000",
            "lowPrice": "200000",
            "volume": "1"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MarketStore::default());
    store.apply_ticker_batch(vec![stale_ticker("BTC/USD", 123_456)]);

    let fetcher = make_fetcher(
        Arc::clone(&store),
        make_client(&server.uri()),
        Duration::from_millis(50),
    );
    fetcher.start(
        "BTC/USD",
        PollKinds {
            ticker: true,
            order_book: false,
            candles: false,
        },
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    fetcher.stop_all();

    assert_eq!(
        store.ticker("BTC/USD").unwrap().price,
        Decimal::from(200_000)
    );
}
