//! Entity lifecycle orchestration for the traffic-generator controller.
//!
//! The controller applies every command asynchronously and reports state
//! only through queries, so this crate drives remote entities by issuing
//! optimistic commands and confirming them with bounded polls:
//!
//! - **[`eid`]**: entity identifiers (`shelf.resource.port`), generated
//!   station name series, and name patterns.
//! - **[`flags`]**: validated symbol-to-bit tables for the `set_port` and
//!   `add_sta` masks, plus the common `set_port` presets.
//! - **[`LifecycleController`]**: create → confirm → configure → admin
//!   up/down → remove → confirm gone for stations, virtual APs, monitors
//!   and generic endpoints. Refuses to reuse names whose removal was never
//!   confirmed.
//! - **[`CrossConnectBuilder`]**: strictly ordered construction of
//!   connections between generic endpoints, with start/stop and teardown.
//! - **[`PhantomReaper`]**: per-category sweeps of controller inventory
//!   for records the controller marks phantom.
//!
//! Everything is generic over [`lfctl_api::RemoteClient`] and runs
//! sequentially; the only suspension points are bounded waits.

pub mod command;
pub mod cross_connect;
pub mod eid;
pub mod error;
pub mod flags;
pub mod inventory;
pub mod lifecycle;
pub mod model;
pub mod poll;
pub mod reaper;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cross_connect::{
    CrossConnectBuilder, CrossConnectPlan, CrossConnectPolicy, CrossConnection, GenericCommand,
    RemovalPolicy, RxEndpoint,
};
pub use eid::{Eid, NamePattern, NameSeries, ResourceId, StationSlot, generate_series, match_pattern};
pub use error::CoreError;
pub use flags::{FLAG_TABLE_VERSION, FlagComposer, Namespace, PortFlags, PortPreset};
pub use lifecycle::{
    EntityRequest, GenericEndpointSpec, Handle, LifecycleController, LifecyclePolicy,
    LifecycleState, ManagedEntity, MonitorSpec, PortChanges, StationSpec, VapSpec,
};
pub use model::{
    AdminState, CrossConnectRecord, EndpointRecord, EntityKind, EventRecord, PhantomRecord,
    PortRecord, PresenceState, ResourceRecord, RunState, Security,
};
pub use poll::{Convergence, PollPolicy};
pub use reaper::{PhantomReaper, SWEEP_ORDER, SweepCategory, SweepReport};
