//! Network-switch middleware.
//!
//! Installed as one handler in the pipeline. For every request it:
//! 1. Rejects requests lacking an origin or a network client id
//! 2. Passes everything straight through when queueing is disabled
//! 3. Classifies the method; bypass methods go straight to the next handler
//! 4. Submits confirmation and switch requests to the admission queue, where
//!    the admitted job compares the request's chain with the selected one,
//!    asks the user to approve a switch if they differ, performs the switch,
//!    and only then dispatches downstream
//!
//! A failure inside an admitted job is written into that request's response
//! and never reaches the queue or any other request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use switchyard_types::approval::ApprovalRequest;
use switchyard_types::config::QueueConfig;
use switchyard_types::errors::SwitchyardError;
use switchyard_types::network::{BuiltInNetwork, ChainId, NetworkClientId, Origin};
use switchyard_types::rpc::{JsonRpcRequest, JsonRpcResponse, MethodClass};
use switchyard_types::traits::*;

use crate::classifier::MethodClassifier;
use crate::pipeline::{Next, RpcHandler};
use crate::queue::RequestQueue;

/// Collaborators required by the middleware.
pub struct NetworkSwitchDeps {
    /// Resolves network clients and the selected chain.
    pub directory: Arc<dyn NetworkDirectory>,
    /// Asks the user to approve a network switch.
    pub approvals: Arc<dyn ApprovalChannel>,
    /// Performs the switch and updates the origin mapping.
    pub actuator: Arc<dyn NetworkSwitchActuator>,
    /// Whether admission control is active.
    pub queueing: Arc<dyn QueueingToggle>,
}

/// Pipeline handler gating confirmation-requiring requests on the right network.
pub struct NetworkSwitchMiddleware {
    queue: Arc<RequestQueue>,
    classifier: MethodClassifier,
    directory: Arc<dyn NetworkDirectory>,
    approvals: Arc<dyn ApprovalChannel>,
    actuator: Arc<dyn NetworkSwitchActuator>,
    queueing: Arc<dyn QueueingToggle>,
}

impl NetworkSwitchMiddleware {
    /// Create a middleware admitting through `queue`.
    ///
    /// Share one queue between every middleware instance that must be
    /// serialized against the others.
    pub fn new(
        queue: Arc<RequestQueue>,
        classifier: MethodClassifier,
        deps: NetworkSwitchDeps,
    ) -> Self {
        Self {
            queue,
            classifier,
            directory: deps.directory,
            approvals: deps.approvals,
            actuator: deps.actuator,
            queueing: deps.queueing,
        }
    }

    /// Create a middleware classifying methods per `config`.
    pub fn from_config(
        queue: Arc<RequestQueue>,
        config: &QueueConfig,
        deps: NetworkSwitchDeps,
    ) -> Self {
        Self::new(queue, MethodClassifier::from_config(config), deps)
    }

    /// The admission queue this middleware submits to.
    pub fn queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    /// Body of an admitted job.
    async fn run_admitted(
        &self,
        class: MethodClass,
        origin: &Origin,
        network_client_id: &NetworkClientId,
        request: &mut JsonRpcRequest,
        response: &mut JsonRpcResponse,
        next: Next<'_>,
    ) -> Result<(), SwitchyardError> {
        // A switch request changes the network itself; checking first would
        // prompt twice.
        if class == MethodClass::RequiresConfirmation {
            self.ensure_network(origin, network_client_id).await?;
        }
        next.run(request, response).await
    }

    /// Make the request's network the selected one, with user approval.
    async fn ensure_network(
        &self,
        origin: &Origin,
        network_client_id: &NetworkClientId,
    ) -> Result<(), SwitchyardError> {
        let built_in = BuiltInNetwork::from_client_id(network_client_id);
        let target = self.target_chain_id(built_in, network_client_id).await?;
        let current = self.directory.selected_chain_id().await?;

        if target == current {
            debug!(%origin, chain_id = %current, "request already on selected network");
            return Ok(());
        }

        debug!(
            %origin,
            from = %current,
            to = %target,
            network_client_id = %network_client_id,
            "requesting network switch approval"
        );
        let approval = ApprovalRequest::switch_chain(
            origin.clone(),
            current,
            target,
            network_client_id.clone(),
        );
        if let Err(e) = self.approvals.request_approval(approval).await {
            warn!(%origin, error = %e, "network switch not approved");
            return Err(e);
        }

        let switched = match built_in {
            Some(network) => self.actuator.switch_to_built_in(network).await,
            None => self.actuator.switch_to_custom(network_client_id).await,
        };
        if let Err(e) = switched {
            warn!(%origin, network_client_id = %network_client_id, error = %e, "network switch failed");
            return Err(e);
        }

        if let Err(e) = self
            .actuator
            .set_network_client_for_origin(origin, network_client_id)
            .await
        {
            warn!(%origin, network_client_id = %network_client_id, error = %e, "failed to record origin network");
            return Err(e);
        }

        info!(
            %origin,
            from = %current,
            to = %target,
            network_client_id = %network_client_id,
            "switched network"
        );
        Ok(())
    }

    async fn target_chain_id(
        &self,
        built_in: Option<BuiltInNetwork>,
        network_client_id: &NetworkClientId,
    ) -> Result<ChainId, SwitchyardError> {
        if let Some(network) = built_in {
            return Ok(network.chain_id());
        }
        match self.directory.client_config(network_client_id).await {
            Ok(config) => Ok(config.chain_id),
            Err(e) => {
                warn!(network_client_id = %network_client_id, error = %e, "network client lookup failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl RpcHandler for NetworkSwitchMiddleware {
    async fn handle(
        &self,
        request: &mut JsonRpcRequest,
        response: &mut JsonRpcResponse,
        next: Next<'_>,
    ) -> Result<(), SwitchyardError> {
        let origin = request.origin.clone().ok_or(SwitchyardError::MissingOrigin)?;
        let network_client_id = request
            .network_client_id
            .clone()
            .ok_or(SwitchyardError::MissingNetworkClientId)?;

        if !self.queueing.is_queueing_enabled() {
            return next.run(request, response).await;
        }

        let class = self.classifier.classify(&request.method);
        if !class.is_queued() {
            debug!(method = %request.method, %origin, "bypassing admission queue");
            return next.run(request, response).await;
        }

        debug!(method = %request.method, %origin, ?class, "enqueueing request");
        // Nothing in the job runs until the queue admits it.
        let job = self.run_admitted(class, &origin, &network_client_id, request, response, next);
        let outcome = self.queue.enqueue(move || job).await;

        if let Err(e) = outcome {
            response.result = None;
            response.error = Some(e.to_rpc_error());
        }
        Ok(())
    }
}
