//! JSON HTTP API: the read side of the reading store.
//!
//! | Route     | Method | Body                                  |
//! |-----------|--------|---------------------------------------|
//! | `/simple` | GET    | headline readings (`build_simple_view`) |
//! | `/all`    | GET    | every reading (`build_full_view`)      |
//!
//! Routing lives in [`HttpApi::handle`], a pure function of method, path
//! and one store snapshot, so it is tested on the host.  On ESP-IDF the
//! routes are registered on `EspHttpServer`, whose handlers run on the
//! `httpd` task, never on a poller thread.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`HttpServer::start`] binds `EspHttpServer`.
//! - **all other targets**: no socket is opened; the simulation loop calls
//!   [`HttpApi::handle`] directly.

use std::sync::Arc;

use log::{debug, error};

use crate::app::store::{ReadingSnapshot, ReadingStore};
use crate::app::view::{self, ReadingEntry};
use crate::config::Variant;

pub const SIMPLE_ROUTE: &str = "/simple";
pub const ALL_ROUTE: &str = "/all";
pub const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Other,
}

/// A fully rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn json(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: JSON_CONTENT_TYPE,
            body,
        }
    }

    fn text(status: u16, msg: &str) -> Self {
        Self {
            status,
            content_type: TEXT_CONTENT_TYPE,
            body: msg.as_bytes().to_vec(),
        }
    }
}

/// Read-only handlers over a shared [`ReadingStore`].
#[derive(Clone)]
pub struct HttpApi {
    store: Arc<ReadingStore>,
    variant: Variant,
}

impl HttpApi {
    pub fn new(store: Arc<ReadingStore>, variant: Variant) -> Self {
        Self { store, variant }
    }

    /// Answer one request.  Takes exactly one store snapshot.
    pub fn handle(&self, method: Method, uri: &str) -> HttpResponse {
        let path = uri.split_once('?').map_or(uri, |(p, _)| p);

        let build: fn(&ReadingSnapshot, Variant) -> Vec<ReadingEntry> = match path {
            SIMPLE_ROUTE => view::build_simple_view,
            ALL_ROUTE => view::build_full_view,
            _ => return HttpResponse::text(404, "not found"),
        };
        if method != Method::Get {
            return HttpResponse::text(405, "method not allowed");
        }

        let snap = self.store.snapshot();
        match view::render_json(&build(&snap, self.variant)) {
            Ok(body) => {
                debug!("HTTP: {} -> {} bytes", path, body.len());
                HttpResponse::json(body)
            }
            Err(e) => {
                error!("HTTP: {} render failed: {}", path, e);
                HttpResponse::text(500, "internal error")
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF server binding
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp_impl::HttpServer;

#[cfg(target_os = "espidf")]
mod esp_impl {
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;
    use log::info;

    use super::{ALL_ROUTE, HttpApi, Method, SIMPLE_ROUTE};
    use crate::error::{Error, Result};

    /// Owns the running `EspHttpServer`; dropping it stops the server.
    pub struct HttpServer {
        _server: EspHttpServer<'static>,
    }

    impl HttpServer {
        pub fn start(api: HttpApi, port: u16) -> Result<Self> {
            let config = Configuration {
                http_port: port,
                ..Default::default()
            };
            let mut server = EspHttpServer::new(&config).map_err(|e| {
                log::error!("HTTP: server start failed ({})", e);
                Error::Init("HTTP server")
            })?;

            for route in [SIMPLE_ROUTE, ALL_ROUTE] {
                let api = api.clone();
                server
                    .fn_handler::<anyhow::Error, _>(
                        route,
                        esp_idf_svc::http::Method::Get,
                        move |req| {
                            let resp = api.handle(Method::Get, req.uri());
                            req.into_response(
                                resp.status,
                                None,
                                &[("Content-Type", resp.content_type)],
                            )?
                            .write_all(&resp.body)?;
                            Ok(())
                        },
                    )
                    .map_err(|_| Error::Init("HTTP route registration"))?;
            }

            info!("HTTP: serving {} and {} on port {}", SIMPLE_ROUTE, ALL_ROUTE, port);
            Ok(Self { _server: server })
        }
    }
}
