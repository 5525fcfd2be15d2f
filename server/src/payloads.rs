use actix_web::HttpResponse;
pub use common::payloads::*;
use serde::Serialize;

pub trait ToHttpResponse {
    /// Wraps an ErrorablePayload in an HttpResponse.
    /// Failures travel in the body as `success: false`, so the status is
    /// 200 OK either way.
    fn to_response(self) -> HttpResponse;
}

impl<T: Serialize> ToHttpResponse for ErrorablePayload<T> {
    fn to_response(self) -> HttpResponse {
        if let ErrorablePayload::Err(e) = &self {
            log::error!("request failed: {e}");
        }
        HttpResponse::Ok().json(self)
    }
}
