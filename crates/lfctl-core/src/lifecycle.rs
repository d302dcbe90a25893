// ── Entity lifecycle orchestration ──
//
// Drives one controller-side entity through
// create → confirm → configure → admin up/down → remove → confirm gone.
// Every command is optimistic; every confirmation is a bounded poll.
// Nothing here is retried automatically.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use lfctl_api::RemoteClient;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::command::post_command;
use crate::command::requests::{
    AddGenEndpRequest, AddMonitorRequest, AddStaRequest, AddVapRequest, MAC_PATTERN,
    RmEndpRequest, RmVlanRequest, SNIFF_DUMPCAP, SNIFF_NO_DISPLAY, SetPortRequest,
    SetWifiRadioRequest, SniffPortRequest,
};
use crate::eid::{Eid, ResourceId, StationSlot};
use crate::error::CoreError;
use crate::flags::{FlagComposer, Namespace, PortPreset};
use crate::inventory;
use crate::model::{AdminState, EndpointRecord, EntityKind, PortRecord, PresenceState, Security};
use crate::poll::{Convergence, PollPolicy, wait_until};

/// Report timer the port helpers request on every `set_port`.
pub const DEFAULT_REPORT_TIMER_MS: u32 = 1500;

// ── States ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Requested,
    Pending,
    Configured,
    AdminUp,
    AdminDown,
    Disappearing,
    Gone,
}

/// How the controller identifies an entity the lifecycle manages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Handle {
    Port(Eid),
    Endpoint(String),
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(eid) => write!(f, "{eid}"),
            Self::Endpoint(name) => f.write_str(name),
        }
    }
}

// ── Policy ──────────────────────────────────────────────────────────

/// Bounded-wait settings for each confirmation.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    pub create: PollPolicy,
    pub remove: PollPolicy,
    pub admin: PollPolicy,
    /// Query the controller for a name before creating it.
    pub preflight: bool,
    pub report_timer: Option<u32>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        let interval = Duration::from_millis(500);
        Self {
            create: PollPolicy::new(interval, Duration::from_secs(60)),
            remove: PollPolicy::new(interval, Duration::from_secs(30)),
            admin: PollPolicy::new(interval, Duration::from_secs(30)),
            preflight: true,
            report_timer: Some(DEFAULT_REPORT_TIMER_MS),
        }
    }
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StationSpec {
    pub eid: Eid,
    pub radio: String,
    pub ssid: String,
    pub security: Security,
    pub passwd: Option<SecretString>,
    /// 802.11 mode index; 0 lets the controller choose.
    pub mode: u32,
    /// Extra `station_flags` symbols.
    pub extra_flags: Vec<String>,
    pub create_admin_down: bool,
}

impl StationSpec {
    pub fn new(slot: StationSlot, ssid: impl Into<String>) -> Self {
        Self {
            eid: slot.eid,
            radio: slot.radio,
            ssid: ssid.into(),
            security: Security::Open,
            passwd: None,
            mode: 0,
            extra_flags: Vec::new(),
            create_admin_down: true,
        }
    }

    #[must_use]
    pub fn with_security(mut self, security: Security, passwd: Option<SecretString>) -> Self {
        self.security = security;
        self.passwd = passwd;
        self
    }
}

#[derive(Debug, Clone)]
pub struct VapSpec {
    pub eid: Eid,
    pub radio: String,
    pub ssid: String,
    pub passwd: Option<SecretString>,
}

/// A monitor port on `radio`, optionally retuning the radio first.
#[derive(Debug, Clone)]
pub struct MonitorSpec {
    pub eid: Eid,
    pub radio: String,
    pub channel: Option<u32>,
    /// MHz.
    pub frequency: Option<u32>,
    pub country: Option<u32>,
    /// `add_monitor` flag symbols.
    pub flags: BTreeSet<String>,
}

impl MonitorSpec {
    pub fn new(eid: Eid, radio: impl Into<String>) -> Self {
        Self {
            eid,
            radio: radio.into(),
            channel: None,
            frequency: None,
            country: None,
            flags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn on_channel(mut self, channel: Option<u32>, frequency: Option<u32>) -> Self {
        self.channel = channel;
        self.frequency = frequency;
        self
    }

    /// Turn one `add_monitor` flag on or off before creation.
    ///
    /// Names are checked against the flag table when the monitor is
    /// created.
    pub fn set_flag(&mut self, name: impl Into<String>, enabled: bool) {
        let name = name.into();
        if enabled {
            self.flags.insert(name);
        } else {
            self.flags.remove(&name);
        }
    }

    fn radio_settings(&self) -> Option<SetWifiRadioRequest> {
        if self.channel.is_none() && self.frequency.is_none() && self.country.is_none() {
            return None;
        }
        Some(SetWifiRadioRequest {
            shelf: self.eid.shelf,
            resource: self.eid.resource,
            radio: self.radio.clone(),
            channel: self.channel,
            frequency: self.frequency,
            country: self.country,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GenericEndpointSpec {
    pub name: String,
    /// Port the endpoint runs its command on.
    pub port: Eid,
}

/// Something to create on the controller.
#[derive(Debug, Clone)]
pub enum EntityRequest {
    Station(StationSpec),
    VirtualAp(VapSpec),
    Monitor(MonitorSpec),
    GenericEndpoint(GenericEndpointSpec),
    CrossConnect { alias: String },
    Resource(ResourceId),
}

impl EntityRequest {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Station(_) => EntityKind::Station,
            Self::VirtualAp(_) => EntityKind::VirtualAp,
            Self::Monitor(_) => EntityKind::Monitor,
            Self::GenericEndpoint(_) => EntityKind::GenericEndpoint,
            Self::CrossConnect { .. } => EntityKind::CrossConnect,
            Self::Resource(_) => EntityKind::Resource,
        }
    }
}

/// The creation command chosen for a request.
enum Creation {
    Station(AddStaRequest),
    VirtualAp(AddVapRequest),
    Monitor {
        radio: Option<SetWifiRadioRequest>,
        monitor: AddMonitorRequest,
    },
    GenericEndpoint(AddGenEndpRequest),
}

impl Creation {
    async fn post<C: RemoteClient>(&self, client: &C) -> Result<(), CoreError> {
        match self {
            Self::Station(req) => post_command(client, req).await?,
            Self::VirtualAp(req) => post_command(client, req).await?,
            Self::Monitor { radio, monitor } => {
                if let Some(radio) = radio {
                    post_command(client, radio).await?;
                }
                post_command(client, monitor).await?
            }
            Self::GenericEndpoint(req) => post_command(client, req).await?,
        };
        Ok(())
    }
}

// ── Managed entity ──────────────────────────────────────────────────

/// Local view of one controller-side entity and where it is in its lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct ManagedEntity {
    pub kind: EntityKind,
    pub eid: Eid,
    pub alias: String,
    pub state: LifecycleState,
    /// `None` for entities without an admin state (endpoints).
    pub admin_state: Option<AdminState>,
    pub presence: PresenceState,
    pub current_flags: u64,
    pub interest_flags: u64,
}

impl ManagedEntity {
    fn requested(kind: EntityKind, eid: Eid, alias: String, admin_state: Option<AdminState>) -> Self {
        Self {
            kind,
            eid,
            alias,
            state: LifecycleState::Requested,
            admin_state,
            presence: PresenceState::Absent,
            current_flags: 0,
            interest_flags: 0,
        }
    }

    pub fn handle(&self) -> Handle {
        if self.kind.is_port() {
            Handle::Port(self.eid.clone())
        } else {
            Handle::Endpoint(self.alias.clone())
        }
    }

    fn transition(&mut self, to: LifecycleState) {
        debug!(entity = %self, from = %self.state, %to, "lifecycle transition");
        self.state = to;
    }

    fn expect(&self, allowed: &[LifecycleState], action: &'static str) -> Result<(), CoreError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                entity: self.to_string(),
                state: self.state,
                action,
            })
        }
    }

    fn expect_port(&self, action: &str) -> Result<(), CoreError> {
        if self.kind.is_port() {
            Ok(())
        } else {
            Err(CoreError::Unsupported {
                operation: format!("{action} on {self}"),
            })
        }
    }

    fn absorb(&mut self, observed: &Observation) {
        match observed {
            Observation::Port(record) => {
                self.eid = record.eid.clone();
                self.alias.clone_from(&record.alias);
                self.admin_state = Some(record.admin_state());
                self.presence = PresenceState::of(Some(record.phantom));
            }
            Observation::Endpoint(record) => {
                self.presence = PresenceState::of(Some(record.phantom));
            }
        }
    }
}

impl fmt::Display for ManagedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.handle())
    }
}

const LIVE: &[LifecycleState] = &[
    LifecycleState::Configured,
    LifecycleState::AdminUp,
    LifecycleState::AdminDown,
];

/// A record the controller returned for a handle.
#[derive(Debug, Clone)]
pub enum Observation {
    Port(PortRecord),
    Endpoint(EndpointRecord),
}

impl Observation {
    pub fn phantom(&self) -> bool {
        match self {
            Self::Port(record) => record.phantom,
            Self::Endpoint(record) => record.phantom,
        }
    }
}

// ── Port changes ────────────────────────────────────────────────────

/// A `set_port` reconfiguration expressed in flag symbols.
#[derive(Debug, Clone, Default)]
pub struct PortChanges {
    pub set: Vec<String>,
    pub clear: Vec<String>,
    /// Extra `interest_flags` beyond the ones implied by the other fields.
    pub interest: Vec<String>,
    pub command: Vec<String>,
    pub dhcp: Option<bool>,
    pub report_timer: Option<u32>,
}

// ── Controller ──────────────────────────────────────────────────────

/// Sequential lifecycle driver over a [`RemoteClient`].
///
/// Tracks names whose removal was requested but never confirmed, and
/// refuses to create them again until the controller lets them go.
pub struct LifecycleController<C> {
    client: C,
    flags: FlagComposer,
    policy: LifecyclePolicy,
    pending_removal: BTreeSet<Handle>,
}

impl<C: RemoteClient> LifecycleController<C> {
    pub fn new(client: C, flags: FlagComposer, policy: LifecyclePolicy) -> Self {
        Self {
            client,
            flags,
            policy,
            pending_removal: BTreeSet::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn flags(&self) -> &FlagComposer {
        &self.flags
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Whether a removal of `handle` was issued but never confirmed.
    pub fn is_pending_removal(&self, handle: &Handle) -> bool {
        self.pending_removal.contains(handle)
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Issue the creation command. Requested → Pending.
    ///
    /// Fails with `StaleName` when the name's removal was never confirmed
    /// or, with preflight on, when the controller still reports it.
    pub async fn create(&self, request: &EntityRequest) -> Result<ManagedEntity, CoreError> {
        let (mut entity, creation) = self.plan(request)?;
        self.guard_reuse(&entity).await?;

        creation.post(&self.client).await?;
        info!(entity = %entity, "creation requested");
        entity.transition(LifecycleState::Pending);
        Ok(entity)
    }

    fn plan(&self, request: &EntityRequest) -> Result<(ManagedEntity, Creation), CoreError> {
        match request {
            EntityRequest::Station(spec) => {
                let key = secret_key(spec.security, spec.passwd.as_ref())?;
                let mut names: Vec<&str> = spec.extra_flags.iter().map(String::as_str).collect();
                names.extend(spec.security.station_flag());
                if spec.create_admin_down {
                    names.push("create_admin_down");
                }
                let flags = self.flags.compose(Namespace::StationFlags, names)?;
                require_non_empty("ssid", &spec.ssid)?;
                let admin = AdminState::from_down(spec.create_admin_down);
                let entity = ManagedEntity::requested(
                    EntityKind::Station,
                    spec.eid.clone(),
                    spec.eid.port.clone(),
                    Some(admin),
                );
                let body = AddStaRequest {
                    shelf: spec.eid.shelf,
                    resource: spec.eid.resource,
                    radio: spec.radio.clone(),
                    sta_name: spec.eid.port.clone(),
                    ssid: spec.ssid.clone(),
                    key,
                    mac: MAC_PATTERN.into(),
                    mode: spec.mode,
                    rate: "DEFAULT".into(),
                    flags,
                    flags_mask: flags,
                };
                Ok((entity, Creation::Station(body)))
            }
            EntityRequest::VirtualAp(spec) => {
                require_non_empty("ssid", &spec.ssid)?;
                let entity = ManagedEntity::requested(
                    EntityKind::VirtualAp,
                    spec.eid.clone(),
                    spec.eid.port.clone(),
                    Some(AdminState::Up),
                );
                let body = AddVapRequest {
                    shelf: spec.eid.shelf,
                    resource: spec.eid.resource,
                    radio: spec.radio.clone(),
                    ap_name: spec.eid.port.clone(),
                    ssid: spec.ssid.clone(),
                    key: spec.passwd.as_ref().map(|p| p.expose_secret().to_owned()),
                    mac: MAC_PATTERN.into(),
                    flags: 0,
                    flags_mask: 0,
                };
                Ok((entity, Creation::VirtualAp(body)))
            }
            EntityRequest::Monitor(spec) => {
                require_non_empty("radio", &spec.radio)?;
                let flags = self.flags.compose(Namespace::MonitorFlags, &spec.flags)?;
                let entity = ManagedEntity::requested(
                    EntityKind::Monitor,
                    spec.eid.clone(),
                    spec.eid.port.clone(),
                    Some(AdminState::Up),
                );
                // Every known bit is masked, so unset flags are cleared.
                let monitor = AddMonitorRequest {
                    shelf: spec.eid.shelf,
                    resource: spec.eid.resource,
                    radio: spec.radio.clone(),
                    ap_name: spec.eid.port.clone(),
                    flags,
                    flags_mask: self.flags.known_bits(Namespace::MonitorFlags),
                };
                let creation = Creation::Monitor {
                    radio: spec.radio_settings(),
                    monitor,
                };
                Ok((entity, creation))
            }
            EntityRequest::GenericEndpoint(spec) => {
                require_non_empty("endpoint name", &spec.name)?;
                let entity = ManagedEntity::requested(
                    EntityKind::GenericEndpoint,
                    spec.port.clone(),
                    spec.name.clone(),
                    None,
                );
                let body = AddGenEndpRequest {
                    alias: spec.name.clone(),
                    shelf: spec.port.shelf,
                    resource: spec.port.resource,
                    port: spec.port.port.clone(),
                    endp_type: "gen_generic".into(),
                };
                Ok((entity, Creation::GenericEndpoint(body)))
            }
            EntityRequest::CrossConnect { alias } => Err(CoreError::Unsupported {
                operation: format!("create cross-connect {alias} outside the cross-connect builder"),
            }),
            EntityRequest::Resource(id) => Err(CoreError::Unsupported {
                operation: format!("create resource {id}"),
            }),
        }
    }

    async fn guard_reuse(&self, entity: &ManagedEntity) -> Result<(), CoreError> {
        let handle = entity.handle();
        if self.pending_removal.contains(&handle) {
            return Err(CoreError::StaleName {
                name: handle.to_string(),
                reason: "its removal was never confirmed".into(),
            });
        }
        if self.policy.preflight {
            if let Some(observed) = self.observe(&handle).await? {
                let reason = if observed.phantom() {
                    "the controller still lists it as phantom"
                } else {
                    "the controller still reports it"
                };
                return Err(CoreError::StaleName {
                    name: handle.to_string(),
                    reason: reason.into(),
                });
            }
        }
        Ok(())
    }

    /// Track an entity the controller creates on its own (for example the
    /// companion endpoint of a generic endpoint). Starts in Pending.
    pub fn expect_endpoint(&self, name: impl Into<String>, port: Eid) -> ManagedEntity {
        let mut entity =
            ManagedEntity::requested(EntityKind::GenericEndpoint, port, name.into(), None);
        entity.transition(LifecycleState::Pending);
        entity
    }

    /// Take over an existing port. `None` if the controller does not know it.
    pub async fn adopt_port(
        &self,
        kind: EntityKind,
        eid: &Eid,
    ) -> Result<Option<ManagedEntity>, CoreError> {
        let Some(record) = inventory::fetch_port(&self.client, eid).await? else {
            return Ok(None);
        };
        let mut entity = ManagedEntity::requested(kind, eid.clone(), record.alias.clone(), None);
        entity.absorb(&Observation::Port(record));
        entity.state = LifecycleState::Configured;
        Ok(Some(entity))
    }

    /// Take over an existing generic endpoint.
    pub async fn adopt_endpoint(&self, name: &str) -> Result<Option<ManagedEntity>, CoreError> {
        let Some(record) = inventory::fetch_generic_endpoint(&self.client, name).await? else {
            return Ok(None);
        };
        let port = record
            .eid
            .as_deref()
            .and_then(|eid| Eid::parse(eid).ok())
            .unwrap_or_else(|| Eid::new(1, 1, name));
        let mut entity =
            ManagedEntity::requested(EntityKind::GenericEndpoint, port, name.to_owned(), None);
        entity.absorb(&Observation::Endpoint(record));
        entity.state = LifecycleState::Configured;
        Ok(Some(entity))
    }

    // ── Confirmation ────────────────────────────────────────────────

    /// One presence check.
    pub async fn observe(&self, handle: &Handle) -> Result<Option<Observation>, CoreError> {
        Ok(match handle {
            Handle::Port(eid) => inventory::fetch_port(&self.client, eid)
                .await?
                .map(Observation::Port),
            Handle::Endpoint(name) => inventory::fetch_generic_endpoint(&self.client, name)
                .await?
                .map(Observation::Endpoint),
        })
    }

    async fn observe_absent(&self, handle: &Handle) -> Result<Option<()>, CoreError> {
        Ok(self.observe(handle).await?.is_none().then_some(()))
    }

    async fn observe_admin(
        &self,
        eid: &Eid,
        target: AdminState,
    ) -> Result<Option<PortRecord>, CoreError> {
        Ok(inventory::fetch_port(&self.client, eid)
            .await?
            .filter(|record| record.admin_state() == target))
    }

    /// Pending → Configured on the first record the controller returns.
    ///
    /// Never re-posts the creation command.
    pub async fn await_presence(&self, entity: &mut ManagedEntity) -> Result<(), CoreError> {
        entity.expect(&[LifecycleState::Pending], "await presence of")?;
        let handle = entity.handle();
        match wait_until(self.policy.create, || self.observe(&handle)).await? {
            Convergence::Reached { value, elapsed } => {
                entity.absorb(&value);
                entity.transition(LifecycleState::Configured);
                info!(entity = %entity, ?elapsed, "entity confirmed");
                Ok(())
            }
            Convergence::Expired { elapsed } => {
                warn!(entity = %entity, ?elapsed, "entity never appeared");
                Err(CoreError::CreationTimeout {
                    entity: entity.to_string(),
                    elapsed,
                })
            }
        }
    }

    /// Poll the port's `down` field until it matches `target`.
    pub async fn await_admin_state(
        &self,
        entity: &mut ManagedEntity,
        target: AdminState,
    ) -> Result<(), CoreError> {
        entity.expect_port("await admin state")?;
        entity.expect(LIVE, "await admin state of")?;
        let eid = entity.eid.clone();
        match wait_until(self.policy.admin, || self.observe_admin(&eid, target)).await? {
            Convergence::Reached { elapsed, .. } => {
                entity.admin_state = Some(target);
                debug!(entity = %entity, %target, ?elapsed, "admin state confirmed");
                Ok(())
            }
            Convergence::Expired { elapsed } => Err(CoreError::ConvergenceTimeout {
                entity: entity.to_string(),
                target: format!("admin {target}"),
                elapsed,
            }),
        }
    }

    /// Disappearing → Gone on the first check that finds nothing.
    ///
    /// On expiry the name stays blocked for reuse.
    pub async fn await_absence(&mut self, entity: &mut ManagedEntity) -> Result<(), CoreError> {
        entity.expect(&[LifecycleState::Disappearing], "await absence of")?;
        let handle = entity.handle();
        match wait_until(self.policy.remove, || self.observe_absent(&handle)).await? {
            Convergence::Reached { elapsed, .. } => {
                self.pending_removal.remove(&handle);
                entity.presence = PresenceState::Absent;
                entity.transition(LifecycleState::Gone);
                info!(entity = %entity, ?elapsed, "entity gone");
                Ok(())
            }
            Convergence::Expired { elapsed } => {
                warn!(entity = %entity, ?elapsed, "entity still present");
                Err(CoreError::StillPresent {
                    entity: entity.to_string(),
                    elapsed,
                })
            }
        }
    }

    /// Wait for `entity` to reach `target`.
    pub async fn await_state(
        &mut self,
        entity: &mut ManagedEntity,
        target: LifecycleState,
    ) -> Result<(), CoreError> {
        match target {
            LifecycleState::Configured => self.await_presence(entity).await,
            LifecycleState::AdminUp => self.await_admin_state(entity, AdminState::Up).await,
            LifecycleState::AdminDown => self.await_admin_state(entity, AdminState::Down).await,
            LifecycleState::Gone => self.await_absence(entity).await,
            LifecycleState::Requested | LifecycleState::Pending | LifecycleState::Disappearing => {
                Err(CoreError::InvalidTransition {
                    entity: entity.to_string(),
                    state: entity.state,
                    action: "wait for a transient state on",
                })
            }
        }
    }

    // ── Configuration ───────────────────────────────────────────────

    /// Post a `set_port` built from flag symbols.
    pub async fn configure(
        &self,
        entity: &mut ManagedEntity,
        changes: &PortChanges,
    ) -> Result<(), CoreError> {
        entity.expect_port("configure")?;
        entity.expect(LIVE, "configure")?;

        let f = &self.flags;
        let mut set = f.compose(Namespace::CurrentFlags, &changes.set)?;
        let mut clear = f.compose(Namespace::CurrentFlags, &changes.clear)?;
        let mut interest = f.compose(Namespace::InterestFlags, &changes.interest)?;
        if set | clear != 0 {
            interest |= f.compose(Namespace::InterestFlags, ["current_flags"])?;
        }
        if let Some(dhcp) = changes.dhcp {
            let use_dhcp = f.compose(Namespace::CurrentFlags, ["use_dhcp"])?;
            if dhcp {
                set |= use_dhcp;
            } else {
                clear |= use_dhcp;
            }
            interest |= f.compose(Namespace::InterestFlags, ["current_flags", "dhcp"])?;
        }
        let report_timer = changes.report_timer.or(self.policy.report_timer);
        if changes.report_timer.is_some() {
            interest |= f.compose(Namespace::InterestFlags, ["rpt_timer"])?;
        }
        let cmd_flags = f.compose(Namespace::CommandFlags, &changes.command)?;
        if cmd_flags != 0 {
            interest |= f.compose(Namespace::InterestFlags, ["command_flags"])?;
        }

        let current = (entity.current_flags | set) & !clear;
        self.post_set_port(entity, current, interest, cmd_flags, report_timer)
            .await?;
        entity.current_flags = current;
        entity.interest_flags = interest;
        Ok(())
    }

    /// Optimistically bring the port up. Confirm with [`Self::await_admin_state`].
    pub async fn admin_up(&self, entity: &mut ManagedEntity) -> Result<(), CoreError> {
        self.set_admin(entity, AdminState::Up).await
    }

    /// Optimistically take the port down.
    pub async fn admin_down(&self, entity: &mut ManagedEntity) -> Result<(), CoreError> {
        self.set_admin(entity, AdminState::Down).await
    }

    async fn set_admin(&self, entity: &mut ManagedEntity, target: AdminState) -> Result<(), CoreError> {
        entity.expect_port("change admin state")?;
        entity.expect(LIVE, "change admin state of")?;

        let preset = match target {
            AdminState::Up => PortPreset::AdminUp,
            AdminState::Down => PortPreset::AdminDown,
        };
        let flags = self.flags.preset(preset)?;
        let if_down = self.flags.compose(Namespace::CurrentFlags, ["if_down"])?;
        let current = (entity.current_flags & !if_down) | flags.current;

        self.post_set_port(entity, current, flags.interest, 0, self.policy.report_timer)
            .await?;
        entity.current_flags = current;
        entity.interest_flags = flags.interest;
        entity.admin_state = Some(target);
        entity.transition(match target {
            AdminState::Up => LifecycleState::AdminUp,
            AdminState::Down => LifecycleState::AdminDown,
        });
        Ok(())
    }

    async fn post_set_port(
        &self,
        entity: &ManagedEntity,
        current: u64,
        interest: u64,
        cmd_flags: u64,
        report_timer: Option<u32>,
    ) -> Result<(), CoreError> {
        let body = SetPortRequest {
            shelf: entity.eid.shelf,
            resource: entity.eid.resource,
            port: entity.eid.port.clone(),
            current_flags: Some(current),
            interest,
            cmd_flags: (cmd_flags != 0).then_some(cmd_flags),
            report_timer,
        };
        debug!(entity = %entity, current = format_args!("{current:#x}"), interest = format_args!("{interest:#x}"), "set_port");
        post_command(&self.client, &body).await?;
        Ok(())
    }

    // ── Capture ─────────────────────────────────────────────────────

    /// Start a packet capture on a confirmed monitor.
    ///
    /// The controller writes `pcap_name` on the monitor's resource and
    /// stops after `duration`, rounded up to whole seconds.
    pub async fn start_sniff(
        &self,
        entity: &ManagedEntity,
        duration: Duration,
        pcap_name: &str,
    ) -> Result<(), CoreError> {
        if entity.kind != EntityKind::Monitor {
            return Err(CoreError::Unsupported {
                operation: format!("capture on {entity}"),
            });
        }
        entity.expect(&[LifecycleState::Configured, LifecycleState::AdminUp], "capture on")?;
        require_non_empty("pcap name", pcap_name)?;
        if duration.is_zero() {
            return Err(CoreError::Validation {
                field: "duration".into(),
                reason: "must be at least one second".into(),
            });
        }

        let seconds = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        let body = SniffPortRequest {
            shelf: entity.eid.shelf,
            resource: entity.eid.resource,
            port: entity.eid.port.clone(),
            display: SNIFF_NO_DISPLAY.into(),
            flags: SNIFF_DUMPCAP,
            outfile: pcap_name.to_owned(),
            duration: seconds,
        };
        post_command(&self.client, &body).await?;
        info!(entity = %entity, seconds, pcap_name, "capture started");
        Ok(())
    }

    // ── Removal ─────────────────────────────────────────────────────

    /// Issue the removal command. → Disappearing.
    ///
    /// Calling again on a Disappearing entity re-issues the command.
    pub async fn remove(&mut self, entity: &mut ManagedEntity) -> Result<(), CoreError> {
        entity.expect(
            &[
                LifecycleState::Pending,
                LifecycleState::Configured,
                LifecycleState::AdminUp,
                LifecycleState::AdminDown,
                LifecycleState::Disappearing,
            ],
            "remove",
        )?;

        match entity.handle() {
            Handle::Port(eid) => {
                post_command(
                    &self.client,
                    &RmVlanRequest {
                        shelf: eid.shelf,
                        resource: eid.resource,
                        port: eid.port.clone(),
                    },
                )
                .await?;
            }
            Handle::Endpoint(name) => {
                post_command(&self.client, &RmEndpRequest { endp_name: name }).await?;
            }
        }
        self.pending_removal.insert(entity.handle());
        info!(entity = %entity, "removal requested");
        entity.transition(LifecycleState::Disappearing);
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

fn secret_key(security: Security, passwd: Option<&SecretString>) -> Result<Option<String>, CoreError> {
    match (security, passwd) {
        (Security::Open, _) => Ok(None),
        (_, Some(secret)) if !secret.expose_secret().is_empty() => {
            Ok(Some(secret.expose_secret().to_owned()))
        }
        (other, _) => Err(CoreError::Validation {
            field: "passwd".into(),
            reason: format!("{other} security requires a passphrase"),
        }),
    }
}
