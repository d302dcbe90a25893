// ── Cross-connect composition ──
//
// Builds named connections between generic endpoints in strict steps,
// each applied to every planned connection before the next begins:
//
//   1. create both endpoints and confirm them
//   2. set endpoint flags
//   3. assign the endpoint command
//   4. bind the endpoints into a connection
//   5. confirm the connection (optional)
//
// Steps 2 to 4 have no observable sub-state on the controller, so the
// builder waits a fixed `step_delay` after each.

use std::time::Duration;

use lfctl_api::RemoteClient;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::command::post_command;
use crate::command::requests::{
    AddCxRequest, DEFAULT_TEST_MGR, RmCxRequest, SetCxStateRequest, SetEndpFlagRequest,
    SetGenCmdRequest,
};
use crate::eid::Eid;
use crate::error::CoreError;
use crate::inventory;
use crate::lifecycle::{EntityRequest, GenericEndpointSpec, LifecycleController, ManagedEntity};
use crate::model::RunState;
use crate::poll::{Convergence, PollPolicy, wait_until};

pub const DEFAULT_NAME_PREFIX: &str = "generic";

// ── Endpoint commands ───────────────────────────────────────────────

/// What a generic endpoint runs once its connection starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericCommand {
    Lfping { interval: u32, dest: String },
    Generic { command: String },
    Speedtest,
    Iperf3 { dest: String },
    Lfcurl { dest: String, file_output: String, loop_count: u32 },
}

impl GenericCommand {
    /// Command line bound to `port`.
    pub fn render(&self, port: &str) -> Result<String, CoreError> {
        match self {
            Self::Lfping { interval, dest } => {
                require("dest", dest)?;
                if *interval == 0 {
                    return Err(invalid("interval", "must be greater than zero"));
                }
                Ok(format!("lfping  -i {interval} -I {port} {dest}"))
            }
            Self::Generic { command } => {
                require("command", command)?;
                Ok(command.clone())
            }
            Self::Speedtest => Ok(format!("vrf_exec.bash {port} speedtest-cli --json --share")),
            Self::Iperf3 { dest } => {
                require("dest", dest)?;
                Ok(format!(
                    "iperf3 --forceflush --format k --precision 4 -c {dest} -t 60 --tos 0 -b 1K \
                     --bind_dev {port} -i 1 --pidfile /tmp/lf_helper_iperf3_test.pid"
                ))
            }
            Self::Lfcurl {
                dest,
                file_output,
                loop_count,
            } => {
                require("file_output", file_output)?;
                Ok(format!(
                    "./scripts/lf_curl.sh  -p {port} -i AUTO -o {file_output} -n {loop_count} -d {dest}"
                ))
            }
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> CoreError {
    CoreError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Plans ───────────────────────────────────────────────────────────

/// Where the receiving endpoint comes from.
#[derive(Debug, Clone)]
pub enum RxEndpoint {
    /// Created by the controller alongside the transmitting endpoint.
    Companion(String),
    /// Created explicitly, like the transmitting endpoint.
    Explicit(GenericEndpointSpec),
}

impl RxEndpoint {
    pub fn name(&self) -> &str {
        match self {
            Self::Companion(name) => name,
            Self::Explicit(spec) => &spec.name,
        }
    }
}

/// One connection to build.
#[derive(Debug, Clone)]
pub struct CrossConnectPlan {
    pub alias: String,
    pub tx: GenericEndpointSpec,
    pub rx: RxEndpoint,
    pub command: GenericCommand,
}

impl CrossConnectPlan {
    /// The conventional generic layout for `port`: `{prefix}-{port}` sends,
    /// its `D_` companion receives, the connection is `CX_{prefix}-{port}`.
    pub fn generic(prefix: &str, port: &Eid, command: GenericCommand) -> Self {
        let tx = format!("{prefix}-{}", port.port);
        Self {
            alias: format!("CX_{tx}"),
            rx: RxEndpoint::Companion(format!("D_{tx}")),
            tx: GenericEndpointSpec {
                name: tx,
                port: port.clone(),
            },
            command,
        }
    }
}

/// What happens to the endpoints when a connection is torn down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RemovalPolicy {
    /// Remove and confirm both endpoints after the connection.
    #[default]
    CascadeEndpoints,
    /// Leave the endpoints for explicit removal or the phantom reaper.
    ConnectionOnly,
}

#[derive(Debug, Clone)]
pub struct CrossConnectPolicy {
    pub test_mgr: String,
    pub step_delay: Duration,
    /// Flags set on each transmitting endpoint in step 2.
    pub endpoint_flags: Vec<(String, u8)>,
    /// Bounded wait for step 5; `None` skips the confirmation.
    pub confirm: Option<PollPolicy>,
}

impl Default for CrossConnectPolicy {
    fn default() -> Self {
        Self {
            test_mgr: DEFAULT_TEST_MGR.into(),
            step_delay: Duration::from_millis(500),
            endpoint_flags: vec![("ClearPortOnStart".into(), 1)],
            confirm: Some(PollPolicy::default()),
        }
    }
}

/// A connection the builder created or adopted.
#[derive(Debug, Clone, Serialize)]
pub struct CrossConnection {
    pub alias: String,
    pub tx_endpoint: String,
    pub rx_endpoint: String,
    pub run_state: RunState,
    /// Endpoints known to the lifecycle, removed on a cascading teardown.
    #[serde(skip)]
    pub endpoints: Vec<ManagedEntity>,
}

// ── Builder ─────────────────────────────────────────────────────────

pub struct CrossConnectBuilder<'a, C> {
    lifecycle: &'a mut LifecycleController<C>,
    policy: CrossConnectPolicy,
}

impl<'a, C: RemoteClient> CrossConnectBuilder<'a, C> {
    pub fn new(lifecycle: &'a mut LifecycleController<C>, policy: CrossConnectPolicy) -> Self {
        Self { lifecycle, policy }
    }

    async fn settle(&self, step: &str) {
        debug!(step, delay = ?self.policy.step_delay, "waiting for step to settle");
        sleep(self.policy.step_delay).await;
    }

    /// Build every planned connection. Returns them Stopped.
    ///
    /// Commands are validated before anything is posted. A failure part way
    /// leaves already-created entities in place.
    pub async fn build(&mut self, plans: &[CrossConnectPlan]) -> Result<Vec<CrossConnection>, CoreError> {
        let commands = plans
            .iter()
            .map(|plan| plan.command.render(&plan.tx.port.port))
            .collect::<Result<Vec<_>, _>>()?;

        // 1. endpoints
        let mut endpoints = Vec::with_capacity(plans.len());
        for plan in plans {
            let tx = self
                .lifecycle
                .create(&EntityRequest::GenericEndpoint(plan.tx.clone()))
                .await?;
            let rx = match &plan.rx {
                RxEndpoint::Companion(name) => {
                    self.lifecycle.expect_endpoint(name.clone(), plan.tx.port.clone())
                }
                RxEndpoint::Explicit(spec) => {
                    self.lifecycle
                        .create(&EntityRequest::GenericEndpoint(spec.clone()))
                        .await?
                }
            };
            endpoints.push([tx, rx]);
        }
        for pair in &mut endpoints {
            for endpoint in pair.iter_mut() {
                self.lifecycle.await_presence(endpoint).await?;
            }
        }
        info!(count = plans.len(), "endpoints confirmed");

        // 2. endpoint flags
        let client = self.lifecycle.client();
        for plan in plans {
            for (flag, val) in &self.policy.endpoint_flags {
                let body = SetEndpFlagRequest {
                    name: plan.tx.name.clone(),
                    flag: flag.clone(),
                    val: *val,
                };
                post_command(client, &body).await?;
            }
        }
        self.settle("set_endp_flag").await;

        // 3. commands
        let client = self.lifecycle.client();
        for (plan, command) in plans.iter().zip(&commands) {
            let body = SetGenCmdRequest {
                name: plan.tx.name.clone(),
                command: command.clone(),
            };
            post_command(client, &body).await?;
        }
        self.settle("set_gen_cmd").await;

        // 4. connections
        let client = self.lifecycle.client();
        for plan in plans {
            let body = AddCxRequest {
                alias: plan.alias.clone(),
                test_mgr: self.policy.test_mgr.clone(),
                tx_endp: plan.tx.name.clone(),
                rx_endp: plan.rx.name().to_owned(),
            };
            post_command(client, &body).await?;
        }
        self.settle("add_cx").await;

        // 5. confirmation
        if let Some(confirm) = self.policy.confirm {
            for plan in plans {
                self.await_cx(&plan.alias, confirm).await?;
            }
        }

        let built: Vec<CrossConnection> = plans
            .iter()
            .zip(endpoints)
            .map(|(plan, pair)| CrossConnection {
                alias: plan.alias.clone(),
                tx_endpoint: plan.tx.name.clone(),
                rx_endpoint: plan.rx.name().to_owned(),
                run_state: RunState::Stopped,
                endpoints: pair.into(),
            })
            .collect();
        info!(count = built.len(), "cross-connects built");
        Ok(built)
    }

    async fn cx_present(&self, alias: &str) -> Result<Option<()>, CoreError> {
        Ok(inventory::fetch_cross_connect(self.lifecycle.client(), alias)
            .await?
            .map(|_| ()))
    }

    async fn cx_absent(&self, alias: &str) -> Result<Option<()>, CoreError> {
        Ok(self.cx_present(alias).await?.is_none().then_some(()))
    }

    async fn await_cx(&self, alias: &str, policy: PollPolicy) -> Result<(), CoreError> {
        match wait_until(policy, || self.cx_present(alias)).await? {
            Convergence::Reached { elapsed, .. } => {
                debug!(alias, ?elapsed, "cross-connect confirmed");
                Ok(())
            }
            Convergence::Expired { elapsed } => {
                warn!(alias, ?elapsed, "cross-connect never appeared");
                Err(CoreError::CreationTimeout {
                    entity: format!("cross-connect {alias}"),
                    elapsed,
                })
            }
        }
    }

    /// Take over an existing connection. Endpoints the controller no
    /// longer reports are left out of the cascade.
    pub async fn adopt(
        &self,
        alias: &str,
        tx_endpoint: &str,
        rx_endpoint: &str,
    ) -> Result<Option<CrossConnection>, CoreError> {
        let Some(record) = inventory::fetch_cross_connect(self.lifecycle.client(), alias).await? else {
            return Ok(None);
        };
        let mut endpoints = Vec::new();
        for name in [tx_endpoint, rx_endpoint] {
            endpoints.extend(self.lifecycle.adopt_endpoint(name).await?);
        }
        Ok(Some(CrossConnection {
            alias: alias.to_owned(),
            tx_endpoint: tx_endpoint.to_owned(),
            rx_endpoint: rx_endpoint.to_owned(),
            run_state: record.run_state().unwrap_or(RunState::Stopped),
            endpoints,
        }))
    }

    // ── Run state ───────────────────────────────────────────────────

    pub async fn set_state(&self, alias: &str, state: RunState) -> Result<(), CoreError> {
        let body = SetCxStateRequest {
            test_mgr: self.policy.test_mgr.clone(),
            cx_name: alias.to_owned(),
            cx_state: state,
        };
        post_command(self.lifecycle.client(), &body).await?;
        info!(alias, %state, "cross-connect state requested");
        Ok(())
    }

    /// Start a connection. Starting a running connection is harmless.
    pub async fn start(&self, alias: &str) -> Result<(), CoreError> {
        self.set_state(alias, RunState::Running).await
    }

    pub async fn stop(&self, alias: &str) -> Result<(), CoreError> {
        self.set_state(alias, RunState::Stopped).await
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Remove the connection, confirm it is gone, then apply `policy`
    /// to its endpoints.
    pub async fn teardown(
        &mut self,
        connection: &mut CrossConnection,
        policy: RemovalPolicy,
    ) -> Result<(), CoreError> {
        let body = RmCxRequest {
            test_mgr: self.policy.test_mgr.clone(),
            cx_name: connection.alias.clone(),
        };
        post_command(self.lifecycle.client(), &body).await?;

        let remove = self.lifecycle.policy().remove;
        match wait_until(remove, || self.cx_absent(&connection.alias)).await? {
            Convergence::Reached { .. } => info!(alias = %connection.alias, "cross-connect removed"),
            Convergence::Expired { elapsed } => {
                return Err(CoreError::StillPresent {
                    entity: format!("cross-connect {}", connection.alias),
                    elapsed,
                });
            }
        }

        if policy == RemovalPolicy::ConnectionOnly {
            debug!(alias = %connection.alias, "leaving endpoints in place");
            return Ok(());
        }
        for endpoint in &mut connection.endpoints {
            self.lifecycle.remove(endpoint).await?;
        }
        for endpoint in &mut connection.endpoints {
            self.lifecycle.await_absence(endpoint).await?;
        }
        Ok(())
    }
}
