use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::app::Application;
use crate::context::RequestContext;
use crate::error::{DispatchError, RoutingMiss};
use crate::ids::RequestId;
use crate::response::{normalize, Content, Response};
use crate::server::ResponseSink;

/// Status code for requests that cannot be routed
const ROUTING_MISS_STATUS: u8 = 4;

fn routing_miss(miss: &RoutingMiss) -> Response {
    Response::new(Content::default(), miss.to_string(), ROUTING_MISS_STATUS)
}

/// Runtime entry point bound to one [`Application`]
///
/// Produced by [`Application::bind`]. A dispatcher is a borrowed view: it is
/// `Copy` and can be shared between threads freely.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    app: &'a Application,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(app: &'a Application) -> Self {
        Self { app }
    }

    /// The application being served
    pub fn app(&self) -> &'a Application {
        self.app
    }

    /// Resolve one request to a response without writing it anywhere
    ///
    /// Routing misses become status 4 responses. Handler failures, malformed
    /// replies and unbound endpoints are returned as errors; teardown has run
    /// by the time any of them is returned.
    pub fn respond(
        &self,
        host: &str,
        path: &str,
        data: Vec<u8>,
    ) -> Result<Response, DispatchError> {
        self.dispatch(RequestId::new(), host, path, data)
    }

    /// Resolve one request and write the response to `sink`
    ///
    /// The status line is always written; the body only for the success
    /// family.
    pub fn handle_request<S: ResponseSink + ?Sized>(
        &self,
        host: &str,
        path: &str,
        data: Vec<u8>,
        sink: &mut S,
    ) -> Result<(), DispatchError> {
        let request_id = RequestId::new();
        let response = self.dispatch(request_id, host, path, data)?;

        if let Err(e) = response.send(sink) {
            error!(
                request_id = %request_id,
                status = response.status(),
                error = %e,
                "Failed to write response"
            );
            return Err(DispatchError::Io(e));
        }

        info!(
            request_id = %request_id,
            status = response.status(),
            meta = %response.meta(),
            body_bytes = response.body().len(),
            "Response sent"
        );
        Ok(())
    }

    fn dispatch(
        &self,
        request_id: RequestId,
        host: &str,
        path: &str,
        data: Vec<u8>,
    ) -> Result<Response, DispatchError> {
        let start = Instant::now();
        let bound = self.app.config().host.as_str();

        // D1: Host check, before any routing
        if host != bound {
            let miss = RoutingMiss::HostMismatch {
                requested: host.to_string(),
                bound: bound.to_string(),
            };
            warn!(
                request_id = %request_id,
                host = %host,
                bound_host = %bound,
                "Request for foreign host rejected"
            );
            return Ok(routing_miss(&miss));
        }

        // D2: Route match; the route table is not consulted on a miss
        let Some(route_match) = self.app.router().route(host, path) else {
            let miss = RoutingMiss::NotFound {
                path: path.to_string(),
            };
            info!(
                request_id = %request_id,
                path = %path,
                "No route for path"
            );
            return Ok(routing_miss(&miss));
        };
        let endpoint = &route_match.endpoint;

        // D3: Handler lookup
        let Some(handler) = self.app.route_table().get(endpoint) else {
            error!(
                request_id = %request_id,
                endpoint = %endpoint,
                available_handlers = self.app.route_table().len(),
                "Handler not found - CRITICAL"
            );
            return Err(DispatchError::UnboundEndpoint {
                endpoint: endpoint.to_string(),
            });
        };

        // D4: Context bound
        let mut ctx = RequestContext::with_request_id(self.app, request_id, host, path, data);
        debug!(
            request_id = %request_id,
            endpoint = %endpoint,
            has_data = ctx.has_data(),
            "Request context bound"
        );

        // D5: Handler invoked
        let handler_start = Instant::now();
        let result = handler.call(&mut ctx, &route_match.params);
        let handler_latency = handler_start.elapsed();

        // D6: Teardown runs before the outcome is inspected
        ctx.teardown();
        drop(ctx);

        let reply = match result {
            Ok(reply) => reply,
            Err(source) => {
                error!(
                    request_id = %request_id,
                    endpoint = %endpoint,
                    latency_ms = handler_latency.as_millis() as u64,
                    error = %source,
                    "Handler failed"
                );
                return Err(DispatchError::Handler {
                    endpoint: endpoint.to_string(),
                    source,
                });
            }
        };

        // D7: Normalize the reply
        let response = normalize(reply).map_err(|e| {
            error!(
                request_id = %request_id,
                endpoint = %endpoint,
                error = %e,
                "Handler reply rejected"
            );
            DispatchError::ResponseShape(e)
        })?;

        info!(
            request_id = %request_id,
            endpoint = %endpoint,
            status = response.status(),
            handler_latency_ms = handler_latency.as_millis() as u64,
            total_latency_ms = start.elapsed().as_millis() as u64,
            "Request handled"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Handler;
    use crate::router::Params;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn app() -> Application {
        let mut app = Application::for_host("a.example").unwrap();
        app.route(
            "/hello/<name>",
            Handler::named("hello", |_: &mut RequestContext<'_>, p: &Params| {
                Ok(format!("hi {}", p.get("name").unwrap_or_default()))
            }),
        )
        .unwrap();
        app
    }

    #[test]
    fn test_success() {
        let app = app();
        let r = app.bind().unwrap().respond("a.example", "/hello/world", Vec::new()).unwrap();
        assert_eq!(r.status(), 2);
        assert_eq!(r.meta(), "text/gemini");
        assert_eq!(r.body(), b"hi world");
    }

    #[test]
    fn test_host_mismatch_skips_routing() {
        let app = app();
        let d = app.bind().unwrap();
        for path in ["/hello/world", "/missing"] {
            let r = d.respond("b.example", path, Vec::new()).unwrap();
            assert_eq!(r.status(), 4);
            assert!(r.meta().contains("b.example"));
            assert!(r.meta().contains("a.example"));
        }
    }

    #[test]
    fn test_handler_error_after_teardown() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&torn_down);
        let mut app = Application::for_host("a.example").unwrap();
        app.route(
            "/fail",
            Handler::named("fail", move |ctx: &mut RequestContext<'_>, _: &Params| {
                let counter = Arc::clone(&counter);
                ctx.register_teardown(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                Err::<String, _>(anyhow::anyhow!("boom"))
            }),
        )
        .unwrap();

        let err = app.bind().unwrap().respond("a.example", "/fail", Vec::new()).unwrap_err();
        assert!(matches!(err, DispatchError::Handler { ref endpoint, .. } if endpoint == "fail"));
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }
}
