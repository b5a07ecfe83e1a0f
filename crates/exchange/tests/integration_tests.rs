use matchbook_clock::SystemClock;
use matchbook_exchange::{
    BookError, Exchange, ExchangeConfig, ExchangeError, MarketConfig, OrderRequest, Price,
    Quantity, RetryPolicy, Side,
};
use matchbook_store::{FaultyStore, InMemoryStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

fn exchange() -> Exchange<InMemoryStore, SystemClock> {
    let _ = env_logger::builder().is_test(true).try_init();
    Exchange::new(InMemoryStore::new(), SystemClock::new(), RetryPolicy::default())
}

#[tokio::test]
async fn test_open_book_is_idempotent() {
    let exchange = exchange();
    let book = exchange.open_book("btc", "usd", Price::from(dec!(0.01))).unwrap();
    book.submit_order(OrderRequest::ask(dec!(1), dec!(960), "Alice"))
        .await
        .unwrap();

    let again = exchange.open_book("BTC", "USD", Price::from(dec!(0.5))).unwrap();
    assert_eq!(again.tick_size(), Price::from(dec!(0.01)));
    assert_eq!(again.best_ask().await.unwrap(), Price::from(dec!(960)));
    assert_eq!(exchange.pairs().len(), 1);
    assert!(exchange.book("BTC", "USD").is_some());
    assert!(exchange.book("ETH", "USD").is_none());
}

#[tokio::test]
async fn test_open_book_validates_input() {
    let exchange = exchange();
    assert!(matches!(
        exchange.open_book("BTC", "BTC", Price::from(dec!(1))),
        Err(ExchangeError::InvalidPair { .. })
    ));
    assert!(matches!(
        exchange.open_book("BTC-X", "USD", Price::from(dec!(1))),
        Err(ExchangeError::InvalidPair { .. })
    ));
    assert_eq!(
        exchange
            .open_book("BTC", "USD", Price::ZERO)
            .err()
            .unwrap(),
        ExchangeError::InvalidTickSize(Price::ZERO)
    );
}

#[tokio::test]
async fn test_from_config_opens_markets() {
    let config = ExchangeConfig::default()
        .with_market(MarketConfig::new("BTC", "USDT", dec!(0.5)))
        .with_market(MarketConfig::new("ETH", "USDT", dec!(0.01)));
    let exchange = Exchange::from_config(InMemoryStore::new(), SystemClock::new(), &config).unwrap();

    let btc = exchange.book("BTC", "USDT").unwrap();
    assert_eq!(btc.tick_size(), Price::from(dec!(0.5)));
    assert_eq!(btc.clip_price(Price::from(dec!(960.7))), Some(Price::from(dec!(960.5))));
    assert_eq!(exchange.pairs().len(), 2);
}

#[tokio::test]
async fn test_pairs_are_isolated() {
    let exchange = exchange();
    let btc = exchange.open_book("BTC", "USD", Price::from(dec!(1))).unwrap();
    let eth = exchange.open_book("ETH", "USD", Price::from(dec!(1))).unwrap();

    let ask = btc
        .submit_order(OrderRequest::ask(dec!(1), dec!(100), "Alice"))
        .await
        .unwrap()
        .resting
        .unwrap();
    let result = eth
        .submit_order(OrderRequest::bid(dec!(1), dec!(100), "Bob"))
        .await
        .unwrap();

    assert!(result.trades.is_empty());
    // Each pair counts its own ids
    assert_eq!(ask.order_id.value(), 1);
    assert_eq!(result.resting.unwrap().order_id.value(), 1);
    assert_eq!(btc.best_bid().await.unwrap(), Price::ZERO);
    assert_eq!(eth.best_ask().await.unwrap(), Price::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_keep_book_consistent() {
    let exchange = exchange();
    let book = exchange.open_book("BTC", "USD", Price::from(dec!(1))).unwrap();

    let mut tasks = Vec::new();
    for i in 0..200u32 {
        let book = book.clone();
        tasks.push(tokio::spawn(async move {
            let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
            let price = Decimal::from(95 + (i * 7) % 11);
            let qty = Decimal::from(1 + i % 5);
            let request = OrderRequest::new(side, qty, price, format!("trader-{}", i % 8));
            let result = book.submit_order(request.clone()).await.unwrap();
            (request, result)
        }));
    }

    let mut ids = HashSet::new();
    let mut submitted = Quantity::ZERO;
    let mut traded = Quantity::ZERO;
    let mut trade_count = 0;
    for task in tasks {
        let (request, result) = task.await.unwrap();
        let resting = result.resting.as_ref().map_or(Quantity::ZERO, |o| o.quantity);
        assert_eq!(result.traded_quantity() + resting, request.quantity);
        if let Some(order) = &result.resting {
            assert!(ids.insert(order.order_id));
        }
        submitted += request.quantity;
        traded += result.traded_quantity();
        trade_count += result.trades.len();
    }

    let (bid, ask) = book.top_of_book().await.unwrap();
    assert!(bid.is_zero() || ask.is_zero() || bid < ask);

    // Each traded unit left one taker and one maker; the rest still rests
    let mut resting = Quantity::ZERO;
    for side in [Side::Bid, Side::Ask] {
        for entry in book.snapshot(side, usize::MAX, false).await.unwrap() {
            assert!(entry.quantity.is_positive());
            resting += entry.quantity;
        }
    }
    assert_eq!(traded + traded + resting, submitted);
    assert_eq!(book.recent_trades(usize::MAX).await.unwrap().len(), trade_count);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_racing_a_match_has_one_winner() {
    let exchange = exchange();
    let book = exchange.open_book("BTC", "USD", Price::from(dec!(1))).unwrap();

    for _ in 0..20 {
        let ask = book
            .submit_order(OrderRequest::ask(dec!(1), dec!(100), "maker"))
            .await
            .unwrap()
            .resting
            .unwrap();

        let canceller = book.clone();
        let cancel = tokio::spawn(async move { canceller.cancel_order(Side::Ask, ask.order_id).await });
        let taker = book.clone();
        let take = tokio::spawn(async move {
            taker
                .submit_order(OrderRequest::bid(dec!(1), dec!(100), "taker"))
                .await
        });

        let cancelled = cancel.await.unwrap();
        let taken = take.await.unwrap().unwrap();
        match cancelled {
            Ok(order) => {
                assert_eq!(order.order_id, ask.order_id);
                assert!(taken.trades.is_empty());
                // The taker rested instead; clear it for the next round
                let bid = taken.resting.unwrap();
                book.cancel_order(Side::Bid, bid.order_id).await.unwrap();
            }
            Err(BookError::NotFound { .. }) => {
                assert_eq!(taken.trades.len(), 1);
                assert_eq!(taken.trades[0].ask_side_order_id, Some(ask.order_id));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert_eq!(book.level_count(Side::Ask).await.unwrap(), 0);
        assert_eq!(book.level_count(Side::Bid).await.unwrap(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_pairs_progress_in_parallel() {
    let exchange = Arc::new(exchange());
    let mut tasks = Vec::new();
    for base in ["BTC", "ETH", "SOL", "XRP"] {
        let book = exchange.open_book(base, "USD", Price::from(dec!(1))).unwrap();
        tasks.push(tokio::spawn(async move {
            for i in 0..25 {
                book.submit_order(OrderRequest::ask(dec!(1), Decimal::from(100 + i), "maker"))
                    .await
                    .unwrap();
            }
            book.submit_order(OrderRequest::bid(dec!(25), dec!(200), "taker"))
                .await
                .unwrap()
        }));
    }

    for task in tasks {
        let result = task.await.unwrap();
        assert_eq!(result.trades.len(), 25);
        assert!(result.is_fully_filled());
    }
}

#[tokio::test]
async fn test_transient_outage_is_absorbed_by_retries() {
    let policy = RetryPolicy {
        timeout_ms: 100,
        max_attempts: 4,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    };
    let exchange = Exchange::new(
        FaultyStore::new(InMemoryStore::new()),
        SystemClock::new(),
        policy,
    );
    let book = exchange.open_book("BTC", "USD", Price::from(dec!(1))).unwrap();
    book.submit_order(OrderRequest::ask(dec!(2), dec!(100), "Alice"))
        .await
        .unwrap();

    exchange.store().fail_op("commit", 2);
    let result = book
        .submit_order(OrderRequest::bid(dec!(1), dec!(100), "Bob"))
        .await
        .unwrap();
    assert_eq!(result.trades.len(), 1);
    assert_eq!(exchange.store().calls("commit"), 4);
    assert_eq!(book.recent_trades(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_errors_are_not_retried() {
    let exchange = Exchange::new(
        FaultyStore::new(InMemoryStore::new()),
        SystemClock::new(),
        RetryPolicy::default(),
    );
    let book = exchange.open_book("BTC", "USD", Price::from(dec!(1))).unwrap();

    let err = book
        .submit_order(OrderRequest::bid(dec!(-1), dec!(100), "Bob"))
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert_eq!(exchange.store().calls("commit"), 0);
    assert_eq!(exchange.store().calls("zrange"), 0);
}
