//! Per-address request throttle middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};

use authgate_infra::{RequestThrottle, ThrottleDecision};

use super::client_ip::extract_client_ip;
use super::error::AppError;

/// Throttle middleware factory. `None` passes every request through.
pub struct ThrottleMiddleware {
    throttle: Option<Arc<RequestThrottle>>,
}

impl ThrottleMiddleware {
    pub fn new(throttle: Option<Arc<RequestThrottle>>) -> Self {
        Self { throttle }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ThrottleMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ThrottleMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ThrottleMiddlewareService {
            service,
            throttle: self.throttle.clone(),
        }))
    }
}

pub struct ThrottleMiddlewareService<S> {
    service: S,
    throttle: Option<Arc<RequestThrottle>>,
}

impl<S, B> Service<ServiceRequest> for ThrottleMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let decision = self.throttle.as_ref().map(|throttle| {
            let address = extract_client_ip(req.request());
            // governor's keyed check is synchronous, so no executor hop is needed
            (throttle.check(&address), address)
        });

        match decision {
            Some((ThrottleDecision::Throttled { retry_after }, address)) => {
                let retry_after =
                    (retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)).max(1);
                tracing::warn!(ip = %address, retry_after, "Request throttled");

                let response = AppError::Throttled { retry_after }.error_response();
                let srv_response = req.into_response(response);

                Box::pin(async move { Ok(srv_response.map_into_right_body()) })
            }
            Some((ThrottleDecision::Allowed, _)) | None => {
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
        }
    }
}
