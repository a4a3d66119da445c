//! Runs the client without a configured backend: local-fallback login,
//! local-first mutations, and a restart that resumes from the cache.
//!
//! ```sh
//! cargo run --example offline_demo
//! ```

use larder_model::{Order, OrderStatus};
use larder_store::{CacheStore, MemoryCache};
use larder_sync::{MockBackend, NullUi, RemoteBackend, SyncClient, SyncConfig, UiSink};
use serde_json::json;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cache = Arc::new(MemoryCache::new());

    {
        let client = SyncClient::new(
            SyncConfig::offline(),
            Arc::new(MockBackend::new()) as Arc<dyn RemoteBackend>,
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            Arc::new(NullUi) as Arc<dyn UiSink>,
        );
        client.init();

        let session = match client.login("buyer@cc.com", "buyer123") {
            Ok(session) => session,
            Err(e) => {
                eprintln!("login failed: {e}");
                return;
            }
        };
        println!("logged in as {} ({})", session.name, session.role);

        if let Err(e) = client.place_order(Order {
            id: "demo-1".into(),
            invoice_number: "INV-demo-1".into(),
            items: json!([{"id": "flour", "qty": 2}]),
            subtotal: 10.0,
            vat: 2.0,
            total: 12.0,
            unit: session.unit.clone().unwrap_or_default(),
            user_name: session.name.clone(),
            user_id: String::new(),
            date: "2025-06-01".into(),
            tax_week: 23,
            status: OrderStatus::Pending,
            completed_at: None,
        }) {
            eprintln!("order failed: {e}");
        }
    }

    // A fresh client over the same cache picks up session and data.
    let client = SyncClient::new(
        SyncConfig::offline(),
        Arc::new(MockBackend::new()) as Arc<dyn RemoteBackend>,
        cache as Arc<dyn CacheStore>,
        Arc::new(NullUi) as Arc<dyn UiSink>,
    );
    match client.resume() {
        Some(session) => println!("resumed session for {}", session.email),
        None => println!("no session to resume"),
    }
    client.state().with_collections(|c| {
        println!("restored {} order(s) from the cache", c.orders.len());
    });
}
