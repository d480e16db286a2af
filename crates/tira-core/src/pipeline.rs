//! Admin action pipeline: authorize, validate, guard, execute, report.
//!
//! Every entry point runs the same stages in the same order. A denial
//! stops before validation, so callers without permission learn nothing
//! about the payload or the resources it names.

use std::sync::Arc;
use std::time::Instant;

use tira_state::{
    Entity, EntityLookup, GroupDirectory, ModelReloader, ProvisioningStore, ReloadScope, VmRecord,
};
use tracing::Instrument;

use crate::authz::{Actor, ActorSource, PermissionEvaluator, PolicyTable, Verdict};
use crate::config::Deployment;
use crate::error::{AdminError, AdminResult};
use crate::guard;
use crate::metrics::METRICS;
use crate::obs::{self, ActionSpan};
use crate::provisioning::Provisioner;
use crate::report::{report, Provisioned, ResultEnvelope};
use crate::request::{AdminRequest, ValidatedRequest};

/// Entry point for admin actions.
pub struct AdminService {
    evaluator: PermissionEvaluator,
    provisioner: Provisioner,
    lookup: Arc<dyn EntityLookup>,
    reloader: Arc<dyn ModelReloader>,
    groups: Arc<dyn GroupDirectory>,
    deployment: Deployment,
}

impl AdminService {
    pub fn new(
        lookup: Arc<dyn EntityLookup>,
        store: Arc<dyn ProvisioningStore>,
        reloader: Arc<dyn ModelReloader>,
        groups: Arc<dyn GroupDirectory>,
    ) -> Self {
        Self {
            evaluator: PermissionEvaluator::default(),
            provisioner: Provisioner::new(Arc::clone(&lookup), store),
            lookup,
            reloader,
            groups,
            deployment: Deployment::default(),
        }
    }

    /// Build a service whose collaborators are all backed by one registry.
    pub fn from_registry<R>(registry: Arc<R>) -> Self
    where
        R: EntityLookup + ProvisioningStore + ModelReloader + GroupDirectory + 'static,
    {
        Self::new(registry.clone(), registry.clone(), registry.clone(), registry)
    }

    pub fn with_policy(mut self, table: PolicyTable) -> Self {
        self.evaluator = PermissionEvaluator::new(table);
        self
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.deployment = deployment;
        self
    }

    /// Run `request` on behalf of whoever `source` identifies.
    pub async fn handle(&self, source: &dyn ActorSource, request: AdminRequest) -> ResultEnvelope {
        let actor = source.current_actor();
        self.dispatch(&actor, request).await
    }

    /// Run `request` on behalf of `actor` and report the outcome.
    pub async fn dispatch(&self, actor: &Actor, request: AdminRequest) -> ResultEnvelope {
        let action = request.action();
        let span = ActionSpan::new(action, actor.role);
        let started = Instant::now();
        METRICS.inc_dispatched();

        let envelope = async {
            obs::emit_action_dispatched(action, request.resource_id());
            report(self.run(actor, request).await)
        }
        .instrument(span.span())
        .await;

        let _entered = span.span().entered();
        obs::emit_action_finished(
            action,
            envelope.status.as_str(),
            started.elapsed().as_millis() as u64,
        );
        envelope
    }

    async fn run(&self, actor: &Actor, request: AdminRequest) -> AdminResult<Provisioned> {
        let action = request.action();
        if let Verdict::Denied(reason) =
            self.evaluator.authorize(actor, action, request.resource_id())
        {
            METRICS.inc_denied();
            obs::emit_action_denied(action, actor.role, &reason);
            return Err(AdminError::AuthorizationDenied);
        }

        let outcome = self.validated(request).await;
        if let Err(err) = &outcome {
            match err.stage() {
                "validation" | "precheck" => obs::emit_precheck_failed(err.stage(), err),
                stage => obs::emit_action_failed(action, stage, err),
            }
        }
        outcome
    }

    async fn validated(&self, request: AdminRequest) -> AdminResult<Provisioned> {
        let request = request.validate()?;
        let resolved = match request.guarded_resource() {
            Some((kind, id)) => Some(guard::resolve(self.lookup.as_ref(), kind, id).await?),
            None => None,
        };
        self.execute(request, resolved).await
    }

    async fn execute(
        &self,
        request: ValidatedRequest,
        resolved: Option<Entity>,
    ) -> AdminResult<Provisioned> {
        match request {
            ValidatedRequest::ReloadData => {
                self.reload(ReloadScope::All).await?;
                if self.deployment == Deployment::Legacy {
                    self.reload(ReloadScope::LegacyUsers).await?;
                }
                Ok(reloaded("Model data was reloaded successfully"))
            }
            ValidatedRequest::ReloadVms => {
                self.reload(ReloadScope::Vms).await?;
                Ok(reloaded("VM data was reloaded successfully"))
            }
            ValidatedRequest::ReloadDatasets => {
                self.reload(ReloadScope::Datasets).await?;
                Ok(reloaded("Dataset data was reloaded successfully"))
            }
            ValidatedRequest::ReloadTasks => {
                self.reload(ReloadScope::Tasks).await?;
                Ok(reloaded("Task data was reloaded successfully"))
            }
            ValidatedRequest::ReloadRuns { vm_id } => {
                let message = format!("Runs data was reloaded for {vm_id} successfully");
                self.reload(ReloadScope::Runs { vm_id }).await?;
                Ok(reloaded(message))
            }
            ValidatedRequest::CreateTask(request) => self.provisioner.create_task(request).await,
            ValidatedRequest::AddDataset(request) => {
                self.provisioner.provision_dataset_bundle(request).await
            }
            ValidatedRequest::CreateGroup { vm_id } => {
                let vm = match resolved {
                    Some(Entity::Vm(vm)) => vm,
                    _ => {
                        return Err(AdminError::Store {
                            stage: "precheck".to_string(),
                            message: format!("{vm_id} did not resolve to a VM"),
                        })
                    }
                };
                self.create_group(&vm).await
            }
        }
    }

    async fn reload(&self, scope: ReloadScope) -> AdminResult<()> {
        self.reloader
            .reload(scope)
            .await
            .map_err(|e| AdminError::Store {
                stage: "reload".to_string(),
                message: format!("reload failed: {e}"),
            })
    }

    async fn create_group(&self, vm: &VmRecord) -> AdminResult<Provisioned> {
        let invite = self
            .groups
            .create_group(vm)
            .await
            .map_err(|e| AdminError::Creation {
                stage: "create_group".to_string(),
                message: format!("failed to create group for VM {}: {e}", vm.vm_id),
            })?;

        METRICS.inc_created();
        obs::emit_entity_created("group", &invite.group_name);
        let message = format!(
            "Invite Mail: Please use this link to create your login for TIRA: {}. \
             After login to TIRA, you can find the credentials and usage examples for \
             your dedicated virtual machine {} here: https://www.tira.io/g/{}",
            invite.invite_link, vm.vm_id, invite.group_name
        );
        Ok(Provisioned {
            created: vec![invite.group_name],
            message,
        })
    }
}

fn reloaded(message: impl Into<String>) -> Provisioned {
    Provisioned {
        created: Vec::new(),
        message: message.into(),
    }
}
