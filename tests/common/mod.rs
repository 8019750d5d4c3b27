#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use cosmicmind_lib::extractor::{Endpoints, Resolver, ResolverConfig};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A local base URL with nothing listening on it.
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Resolver whose upstream APIs all live under `base`.
pub fn resolver_for(base: &str) -> Resolver {
    Resolver::new(config_for(base)).unwrap()
}

pub fn config_for(base: &str) -> ResolverConfig {
    ResolverConfig {
        timeout: Duration::from_secs(5),
        endpoints: Endpoints {
            twitter_api: format!("{}/fx", base),
            oembed_api: format!("{}/oembed", base),
            youtube_api: format!("{}/yt/v3", base),
        },
        proxy: None,
        system_proxy: false,
        ..ResolverConfig::default()
    }
}

/// Same as [`resolver_for`], but every request is sent through `base` as an
/// HTTP proxy, so third-party page URLs like `http://x.com/...` land on the
/// mock server too.
pub fn proxied_resolver_for(base: &str) -> Resolver {
    Resolver::new(ResolverConfig {
        proxy: Some(base.to_string()),
        ..config_for(base)
    })
    .unwrap()
}

pub fn page(title: &str, extra_head: &str) -> String {
    format!(
        "<!doctype html><html><head><title>{}</title>{}</head><body><p>hi</p></body></html>",
        title, extra_head
    )
}
