//! In-process stand-ins for the WebUI and its ReActor extension.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use sdapi_worker::clients::{FaceSwapClient, GenerationClient, RetryingClient};
use sdapi_worker::core::config::RetryPolicy;
use sdapi_worker::worker::Worker;
use serde_json::Value;
use url::Url;

/// Shared counters and captured request bodies for a mock route.
#[derive(Clone, Default)]
pub struct Recorder {
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    /// Records `body` and returns the zero-based index of this call.
    pub fn record(&self, body: Value) -> usize {
        self.bodies.lock().unwrap().push(body);
        self.hits.fetch_add(1, Ordering::SeqCst)
    }

    pub fn hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

pub async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

pub fn fast_policy(max_retries: usize) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_factor: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

pub fn generation_client(base: &Url, policy: RetryPolicy) -> GenerationClient {
    let http = RetryingClient::new(policy).unwrap();
    GenerationClient::new(http, base.clone(), Duration::from_secs(5))
}

pub fn faceswap_client(base: &Url) -> FaceSwapClient {
    FaceSwapClient::new(reqwest::Client::new(), base.join("/reactor/image").unwrap())
}

pub fn worker(base: &Url, include_diagnostics: bool) -> Worker {
    Worker::from_parts(
        generation_client(base, fast_policy(3)),
        faceswap_client(base),
        include_diagnostics,
    )
}
