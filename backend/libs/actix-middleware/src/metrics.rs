//! Request metrics middleware
//!
//! Times every request and hands method, route pattern, status and latency
//! to the service's own recorder, so each service keeps its metric names.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::time::{Duration, Instant};

/// `(method, path pattern, status, elapsed)`
pub type ObserveFn = fn(&str, &str, u16, Duration);

#[derive(Clone, Copy)]
pub struct MetricsMiddleware {
    observe: ObserveFn,
}

impl MetricsMiddleware {
    pub fn new(observe: ObserveFn) -> Self {
        Self { observe }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service,
            observe: self.observe,
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: S,
    observe: ObserveFn,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        // route pattern keeps label cardinality bounded
        let path = req
            .match_pattern()
            .unwrap_or_else(|| req.path().to_string());
        let start = Instant::now();
        let observe = self.observe;

        let fut = self.service.call(req);
        Box::pin(async move {
            let result = fut.await;
            let status = match &result {
                Ok(res) => res.status().as_u16(),
                Err(e) => e.as_response_error().status_code().as_u16(),
            };
            observe(&method, &path, status, start.elapsed());
            result
        })
    }
}
