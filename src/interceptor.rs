//! Request and response interceptors.
//!
//! Interceptors are append-only: they run in registration order and cannot be
//! removed once added.

use crate::request::RequestDescriptor;
use crate::response::Response;
use parking_lot::RwLock;
use std::sync::Arc;

/// Runs on every request descriptor right before it is sent.
pub type RequestInterceptor = Arc<dyn Fn(&mut RequestDescriptor) + Send + Sync>;

/// Runs on every successful response before it is returned.
pub type ResponseInterceptor = Arc<dyn Fn(&mut Response) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Interceptors {
    request: RwLock<Vec<RequestInterceptor>>,
    response: RwLock<Vec<ResponseInterceptor>>,
}

impl Interceptors {
    pub(crate) fn add_request(&self, interceptor: RequestInterceptor) {
        self.request.write().push(interceptor);
    }

    pub(crate) fn add_response(&self, interceptor: ResponseInterceptor) {
        self.response.write().push(interceptor);
    }

    pub(crate) fn apply_request(&self, descriptor: &mut RequestDescriptor) {
        // Snapshot so an interceptor can register another one without deadlocking.
        let interceptors = self.request.read().clone();
        for interceptor in interceptors {
            interceptor(descriptor);
        }
    }

    pub(crate) fn apply_response(&self, response: &mut Response) {
        let interceptors = self.response.read().clone();
        for interceptor in interceptors {
            interceptor(response);
        }
    }

    pub(crate) fn len(&self) -> (usize, usize) {
        (self.request.read().len(), self.response.read().len())
    }
}
