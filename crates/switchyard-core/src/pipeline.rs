//! Minimal handler pipeline.
//!
//! Threads a request/response pair through an ordered list of handlers.
//! Each handler either calls [`Next::run`] to dispatch to the remaining
//! handlers or returns without doing so, which ends the request.

use std::sync::Arc;

use async_trait::async_trait;

use switchyard_types::errors::SwitchyardError;
use switchyard_types::rpc::{JsonRpcRequest, JsonRpcResponse};

/// A single stage of the pipeline.
#[async_trait]
pub trait RpcHandler: Send + Sync {
    /// Handle the request, optionally delegating to the rest of the pipeline.
    ///
    /// Returning `Err` ends the request; the pipeline serializes the error
    /// into the response.
    async fn handle(
        &self,
        request: &mut JsonRpcRequest,
        response: &mut JsonRpcResponse,
        next: Next<'_>,
    ) -> Result<(), SwitchyardError>;
}

/// The handlers remaining after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn RpcHandler>],
}

impl<'a> Next<'a> {
    /// A continuation with no handlers left.
    pub fn empty() -> Next<'static> {
        Next { rest: &[] }
    }

    /// Dispatch to the remaining handlers and wait for them to complete.
    pub async fn run(
        self,
        request: &mut JsonRpcRequest,
        response: &mut JsonRpcResponse,
    ) -> Result<(), SwitchyardError> {
        match self.rest.split_first() {
            Some((handler, rest)) => handler.handle(request, response, Next { rest }).await,
            None => Ok(()),
        }
    }
}

/// Ordered handler list that produces one response per request.
#[derive(Default, Clone)]
pub struct Pipeline {
    handlers: Vec<Arc<dyn RpcHandler>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the end of the pipeline.
    pub fn with(mut self, handler: Arc<dyn RpcHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Run `request` through every handler and return its response.
    ///
    /// A handler error replaces any result. A request no handler answered
    /// gets a method-not-found error.
    pub async fn handle(&self, mut request: JsonRpcRequest) -> JsonRpcResponse {
        let mut response = JsonRpcResponse::for_request(&request);
        let next = Next {
            rest: &self.handlers,
        };

        if let Err(e) = next.run(&mut request, &mut response).await {
            tracing::debug!(method = %request.method, error = %e, "handler failed");
            response.result = None;
            response.error = Some(e.to_rpc_error());
        }

        if !response.is_settled() {
            response.error =
                Some(SwitchyardError::MethodNotFound(request.method.clone()).to_rpc_error());
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use switchyard_types::errors::{INTERNAL_ERROR, METHOD_NOT_FOUND};

    struct Recorder {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
        forward: bool,
    }

    #[async_trait]
    impl RpcHandler for Recorder {
        async fn handle(
            &self,
            request: &mut JsonRpcRequest,
            response: &mut JsonRpcResponse,
            next: Next<'_>,
        ) -> Result<(), SwitchyardError> {
            self.calls.lock().unwrap().push(self.name);
            if self.forward {
                next.run(request, response).await
            } else {
                response.result = Some(serde_json::json!(self.name));
                Ok(())
            }
        }
    }

    struct Failing;

    #[async_trait]
    impl RpcHandler for Failing {
        async fn handle(
            &self,
            _request: &mut JsonRpcRequest,
            response: &mut JsonRpcResponse,
            _next: Next<'_>,
        ) -> Result<(), SwitchyardError> {
            response.result = Some(serde_json::json!("partial"));
            Err(SwitchyardError::Internal("boom".to_string()))
        }
    }

    fn recorder(
        name: &'static str,
        calls: &Arc<Mutex<Vec<&'static str>>>,
        forward: bool,
    ) -> Arc<dyn RpcHandler> {
        Arc::new(Recorder {
            name,
            calls: Arc::clone(calls),
            forward,
        })
    }

    #[tokio::test]
    async fn test_handlers_run_in_order_until_one_ends() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .with(recorder("first", &calls, true))
            .with(recorder("second", &calls, false))
            .with(recorder("third", &calls, false));

        let response = pipeline
            .handle(JsonRpcRequest::new(1, "eth_chainId"))
            .await;

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(response.result, Some(serde_json::json!("second")));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_unanswered_request_is_method_not_found() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new().with(recorder("only", &calls, true));

        let response = pipeline.handle(JsonRpcRequest::new(1, "eth_foo")).await;

        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handler_error_replaces_result() {
        let pipeline = Pipeline::new().with(Arc::new(Failing));

        let response = pipeline.handle(JsonRpcRequest::new(9, "eth_foo")).await;

        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert_eq!(error.message, "internal error: boom");
        assert_eq!(response.id, serde_json::json!(9));
    }

    #[tokio::test]
    async fn test_empty_next_is_a_no_op() {
        let mut request = JsonRpcRequest::new(1, "eth_chainId");
        let mut response = JsonRpcResponse::for_request(&request);
        Next::empty().run(&mut request, &mut response).await.unwrap();
        assert!(!response.is_settled());
    }
}
