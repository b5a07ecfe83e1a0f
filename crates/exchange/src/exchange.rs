use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{info, warn};
use matchbook_core::{Price, TradingPair};
use matchbook_matching::OrderBook;
use matchbook_ports::{Clock, Storage};
use matchbook_store::{RetryPolicy, RetryingStore};
use std::sync::Arc;

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, Result};
use crate::handle::BookHandle;

/// Registry of order books sharing one backing store and one clock.
///
/// Each trading pair gets its own book behind its own lock; calls on
/// different pairs run in parallel.
pub struct Exchange<S, C: Clock> {
    store: Arc<RetryingStore<S>>,
    clock: Arc<C>,
    books: DashMap<TradingPair, BookHandle<S, C>>,
}

impl<S: Storage, C: Clock> Exchange<S, C> {
    /// Every storage call of every book goes through `policy`
    pub fn new(store: S, clock: C, policy: RetryPolicy) -> Self {
        Self {
            store: Arc::new(RetryingStore::new(store, policy)),
            clock: Arc::new(clock),
            books: DashMap::new(),
        }
    }

    /// Build an exchange and open every configured market
    pub fn from_config(store: S, clock: C, config: &ExchangeConfig) -> Result<Self> {
        config.validate()?;
        let exchange = Self::new(store, clock, config.retry);
        for market in &config.markets {
            exchange.open_book(
                &market.base_asset,
                &market.quote_asset,
                Price::from(market.tick_size),
            )?;
        }
        Ok(exchange)
    }

    /// Open the book of `base/quote`, or return it if already open.
    ///
    /// Books keep their state in the backing store, so opening a pair the
    /// store already holds resumes that book.
    pub fn open_book(&self, base: &str, quote: &str, tick_size: Price) -> Result<BookHandle<S, C>> {
        let pair = TradingPair::new(base, quote).map_err(|reason| ExchangeError::InvalidPair {
            base: base.to_string(),
            quote: quote.to_string(),
            reason,
        })?;
        if !tick_size.is_positive() {
            return Err(ExchangeError::InvalidTickSize(tick_size));
        }

        let handle = match self.books.entry(pair) {
            Entry::Occupied(entry) => {
                let handle = entry.get().clone();
                if handle.tick_size() != tick_size {
                    warn!(
                        "pair={} already open with tick_size={}, ignoring tick_size={}",
                        handle.pair(),
                        handle.tick_size(),
                        tick_size
                    );
                }
                handle
            }
            Entry::Vacant(entry) => {
                let book = OrderBook::new(
                    entry.key().clone(),
                    tick_size,
                    self.store.clone(),
                    self.clock.clone(),
                );
                info!("pair={} tick_size={} book opened", entry.key(), tick_size);
                entry.insert(BookHandle::new(book)).value().clone()
            }
        };
        Ok(handle)
    }

    /// An already opened book
    pub fn book(&self, base: &str, quote: &str) -> Option<BookHandle<S, C>> {
        let pair = TradingPair::new(base, quote).ok()?;
        self.books.get(&pair).map(|entry| entry.value().clone())
    }

    /// Pairs with an open book, sorted
    pub fn pairs(&self) -> Vec<TradingPair> {
        let mut pairs: Vec<TradingPair> = self.books.iter().map(|e| e.key().clone()).collect();
        pairs.sort_by_key(|pair| pair.to_string());
        pairs
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.store.policy()
    }

    /// The backing store below the retry layer
    pub fn store(&self) -> &S {
        self.store.inner()
    }
}
