// ── Domain model ──
//
// Entity enums plus typed views of the controller's inventory records.
// The controller answers with loosely shaped JSON: single records arrive
// under a singular key (`interface`, `endpoint`, `resource`), collections
// as lists of single-key maps or as one map keyed by name. Everything is
// normalized here so callers only see typed records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::warn;

use crate::eid::{Eid, ResourceId};
use crate::error::CoreError;

// ── Entity enums ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Station,
    VirtualAp,
    Monitor,
    GenericEndpoint,
    CrossConnect,
    Resource,
}

impl EntityKind {
    /// Whether the entity lives in the port table (and is removed with `rm_vlan`).
    pub fn is_port(self) -> bool {
        matches!(self, Self::Station | Self::VirtualAp | Self::Monitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdminState {
    Up,
    Down,
}

impl AdminState {
    pub fn from_down(down: bool) -> Self {
        if down { Self::Down } else { Self::Up }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Absent,
    Phantom,
    Present,
}

impl PresenceState {
    pub fn of(phantom: Option<bool>) -> Self {
        match phantom {
            None => Self::Absent,
            Some(true) => Self::Phantom,
            Some(false) => Self::Present,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Stopped,
    Running,
}

/// Station security modes understood by `add_sta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    #[default]
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
}

impl Security {
    /// The `station_flags` symbol enabling this mode, if any.
    pub fn station_flag(self) -> Option<&'static str> {
        match self {
            Self::Open => None,
            Self::Wep => Some("wep_enable"),
            Self::Wpa => Some("wpa_enable"),
            Self::Wpa2 => Some("wpa2_enable"),
            Self::Wpa3 => Some("use-wpa3"),
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// A port-table row: station, virtual AP, monitor, or wired port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortRecord {
    pub eid: Eid,
    pub alias: String,
    pub down: bool,
    pub phantom: bool,
    pub port_type: Option<String>,
    pub device: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
}

impl PortRecord {
    pub fn admin_state(&self) -> AdminState {
        AdminState::from_down(self.down)
    }
}

/// Port fields requested on every port query.
pub const PORT_FIELDS: &str = "alias,down,phantom,port type,device,ip,mac,port";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PortFields {
    alias: Option<String>,
    down: bool,
    phantom: bool,
    #[serde(rename = "port type")]
    port_type: Option<String>,
    device: Option<String>,
    ip: Option<String>,
    mac: Option<String>,
    port: Option<String>,
}

impl PortFields {
    fn into_record(self, eid: Eid) -> PortRecord {
        PortRecord {
            alias: self.alias.unwrap_or_else(|| eid.port.clone()),
            eid,
            down: self.down,
            phantom: self.phantom,
            port_type: self.port_type,
            device: self.device,
            ip: self.ip,
            mac: self.mac,
        }
    }
}

/// A generic (command-running) endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointRecord {
    pub name: String,
    pub eid: Option<String>,
    pub command: Option<String>,
    pub status: Option<String>,
    pub phantom: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndpointFields {
    name: Option<String>,
    eid: Option<String>,
    command: Option<String>,
    status: Option<String>,
    phantom: bool,
}

/// A connection between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossConnectRecord {
    pub name: String,
    pub state: String,
    pub cx_type: Option<String>,
    pub phantom: bool,
}

impl CrossConnectRecord {
    pub fn run_state(&self) -> Option<RunState> {
        self.state.parse().ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossConnectFields {
    state: String,
    #[serde(rename = "type")]
    cx_type: Option<String>,
    phantom: bool,
}

/// Keys the controller mixes into `/cx` answers beside real connections.
const CX_ENVELOPE_KEYS: &[&str] = &["handler", "uri", "warnings", "empty", "errors"];

/// A controller resource (a managed host).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    #[serde(serialize_with = "display_string")]
    pub id: ResourceId,
    pub hostname: Option<String>,
    pub phantom: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceFields {
    hostname: Option<String>,
    phantom: bool,
}

/// An entry from the controller event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "time-stamp")]
    pub time_stamp: Option<String>,
    #[serde(default, rename = "entity id")]
    pub entity: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, rename = "event description")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

fn display_string<T: fmt::Display, S: serde::Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

// ── Phantom records ─────────────────────────────────────────────────

/// Identity of an inventory entry the controller reports as phantom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhantomRecord {
    Port(Eid),
    CrossConnect(String),
    GenericEndpoint(String),
    /// Layer-4 (URL) endpoint; its connection is `CX_<name>`.
    Layer4(String),
    Layer3Endpoint(String),
    Resource(ResourceId),
}

impl fmt::Display for PhantomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(eid) => write!(f, "port {eid}"),
            Self::CrossConnect(name) => write!(f, "cross-connect {name}"),
            Self::GenericEndpoint(name) => write!(f, "endpoint {name}"),
            Self::Layer4(name) => write!(f, "layer-4 endpoint {name}"),
            Self::Layer3Endpoint(name) => write!(f, "layer-3 endpoint {name}"),
            Self::Resource(id) => write!(f, "resource {id}"),
        }
    }
}

impl Serialize for PhantomRecord {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

// ── Inventory parsing ───────────────────────────────────────────────

/// Flatten the controller's keyed-record shapes into `(key, record)` pairs.
///
/// Accepts a list of single-key maps or one map keyed by name.
fn keyed_entries(value: &Value) -> Vec<(&str, &Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        _ => Vec::new(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(context: &str, value: &Value) -> Result<T, CoreError> {
    T::deserialize(value).map_err(|e| CoreError::malformed(context, e.to_string()))
}

/// Parse a single-port answer (`{"interface": {...}}`).
pub fn parse_port(eid: &Eid, body: &Value) -> Result<Option<PortRecord>, CoreError> {
    let Some(fields) = body.get("interface").filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let fields: PortFields = decode(&eid.to_string(), fields)?;
    Ok(Some(fields.into_record(eid.clone())))
}

/// Parse `/port/all`.
pub fn parse_port_inventory(body: &Value) -> Result<Vec<PortRecord>, CoreError> {
    let mut records = Vec::new();
    if let Some(list) = body.get("interfaces") {
        for (key, fields) in keyed_entries(list) {
            let Ok(eid) = Eid::parse_port_key(key) else {
                warn!(key, "skipping port with unparseable key");
                continue;
            };
            let fields: PortFields = decode(key, fields)?;
            records.push(fields.into_record(eid));
        }
    } else if let Some(single) = body.get("interface").filter(|v| v.is_object()) {
        let fields: PortFields = decode("interface", single)?;
        let eid = single_port_eid(&fields)?;
        records.push(fields.into_record(eid));
    }
    records.sort_by(|a, b| a.eid.cmp(&b.eid));
    Ok(records)
}

/// A lone `interface` record carries its numeric id in `port` and its
/// name in `alias`.
fn single_port_eid(fields: &PortFields) -> Result<Eid, CoreError> {
    let (Some(port), Some(alias)) = (&fields.port, &fields.alias) else {
        return Err(CoreError::malformed(
            "interface",
            "single port record lacks port or alias",
        ));
    };
    let numeric = Eid::parse(port)?;
    Ok(numeric.sibling(alias.clone()))
}

/// Parse an endpoint answer from `/generic`, `/layer4` or `/endp`.
///
/// Collections arrive under `endpoints`, or under `endpoint` as a list
/// of single-key maps. A phantom shows either as the `phantom` flag or
/// in the status text.
pub fn parse_endpoints(body: &Value) -> Result<Vec<EndpointRecord>, CoreError> {
    let entries = match (body.get("endpoints"), body.get("endpoint")) {
        (Some(list), _) => keyed_entries(list),
        (None, Some(single)) => match single {
            // A single endpoint is either a bare record or `{name: record}`.
            Value::Object(map) if map.contains_key("name") => vec![("", single)],
            _ => keyed_entries(single),
        },
        (None, None) => Vec::new(),
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let fields: EndpointFields = decode("endpoint", value)?;
            let name = fields
                .name
                .filter(|n| !n.is_empty())
                .or_else(|| (!key.is_empty()).then(|| key.to_owned()))
                .ok_or_else(|| CoreError::malformed("endpoint", "record has no name"))?;
            Ok(EndpointRecord {
                name,
                eid: fields.eid,
                command: fields.command,
                phantom: fields.phantom
                    || fields
                        .status
                        .as_deref()
                        .is_some_and(|st| st.to_ascii_uppercase().contains("PHANTOM")),
                status: fields.status,
            })
        })
        .collect()
}

/// Parse a `/cx` answer: a top-level map keyed by connection name.
pub fn parse_cross_connects(body: &Value) -> Result<Vec<CrossConnectRecord>, CoreError> {
    let Some(map) = body.as_object() else {
        return Ok(Vec::new());
    };
    let mut records = Vec::new();
    for (name, value) in map {
        if CX_ENVELOPE_KEYS.contains(&name.as_str()) || !value.is_object() {
            continue;
        }
        let fields: CrossConnectFields = decode(name, value)?;
        records.push(CrossConnectRecord {
            phantom: fields.phantom || fields.state.contains("PHANTOM"),
            name: name.clone(),
            state: fields.state,
            cx_type: fields.cx_type,
        });
    }
    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

/// Parse `/resource/all`.
pub fn parse_resources(body: &Value) -> Result<Vec<ResourceRecord>, CoreError> {
    let entries = match (body.get("resources"), body.get("resource")) {
        (Some(list), _) => keyed_entries(list),
        (None, Some(single)) => keyed_entries(single),
        (None, None) => Vec::new(),
    };
    let mut records = Vec::new();
    for (key, value) in entries {
        let Ok(id) = key.parse::<ResourceId>() else {
            warn!(key, "skipping resource with unparseable key");
            continue;
        };
        let fields: ResourceFields = decode(key, value)?;
        records.push(ResourceRecord {
            id,
            hostname: fields.hostname,
            phantom: fields.phantom,
        });
    }
    records.sort_by_key(|r| r.id);
    Ok(records)
}

/// Parse `/events/all`.
pub fn parse_events(body: &Value) -> Result<Vec<EventRecord>, CoreError> {
    let Some(list) = body.get("events") else {
        return Ok(Vec::new());
    };
    keyed_entries(list)
        .into_iter()
        .map(|(id, value)| {
            let mut event: EventRecord = decode("event", value)?;
            if event.id.is_empty() {
                id.clone_into(&mut event.id);
            }
            Ok(event)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn port_inventory_from_list_of_single_key_maps() {
        let body = json!({
            "handler": "x",
            "interfaces": [
                { "1.1.sta0001": { "alias": "sta0001", "down": true, "phantom": false } },
                { "1.1.sta0000": { "alias": "sta0000", "down": false, "phantom": true, "port type": "WIFI-STA" } },
                { "not-an-eid": { "alias": "junk" } }
            ]
        });
        let ports = parse_port_inventory(&body).unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].eid, Eid::new(1, 1, "sta0000"));
        assert!(ports[0].phantom);
        assert_eq!(ports[0].port_type.as_deref(), Some("WIFI-STA"));
        assert_eq!(ports[1].admin_state(), AdminState::Down);
    }

    #[test]
    fn port_inventory_keeps_vlan_ports() {
        let body = json!({
            "interfaces": [
                { "1.1.eth1": { "alias": "eth1" } },
                { "1.1.eth1.100": { "alias": "eth1.100", "phantom": true, "port type": "802.1Q VLAN" } }
            ]
        });
        let ports = parse_port_inventory(&body).unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[1].eid, Eid::new(1, 1, "eth1.100"));
        assert_eq!(ports[1].alias, "eth1.100");
        assert!(ports[1].phantom);
    }

    #[test]
    fn port_inventory_with_single_interface() {
        let body = json!({ "interface": { "alias": "eth1", "port": "1.2.3", "down": false } });
        let ports = parse_port_inventory(&body).unwrap();
        assert_eq!(ports[0].eid.to_string(), "1.2.eth1");
    }

    #[test]
    fn single_port_absent_without_interface_key() {
        let eid = Eid::new(1, 1, "sta0000");
        assert!(parse_port(&eid, &json!({ "handler": "x" })).unwrap().is_none());
        let present = parse_port(&eid, &json!({ "interface": { "down": true } })).unwrap().unwrap();
        assert_eq!(present.alias, "sta0000");
        assert!(present.down);
    }

    #[test]
    fn cross_connects_skip_envelope_and_detect_phantom_state() {
        let body = json!({
            "handler": "candela.lanforge.HttpCx",
            "uri": "cx/all",
            "warnings": ["x"],
            "CX_generic-sta0000": { "state": "Run", "type": "GEN" },
            "CX_old": { "state": "PHANTOM" },
            "CX_flagged": { "state": "Stopped", "phantom": true }
        });
        let cxs = parse_cross_connects(&body).unwrap();
        let phantom: Vec<&str> = cxs.iter().filter(|c| c.phantom).map(|c| c.name.as_str()).collect();
        assert_eq!(cxs.len(), 3);
        assert_eq!(phantom, ["CX_flagged", "CX_old"]);
    }

    #[test]
    fn endpoints_single_and_list() {
        let list = json!({ "endpoints": [ { "generic-sta0000": { "name": "generic-sta0000", "phantom": true } } ] });
        let endps = parse_endpoints(&list).unwrap();
        assert_eq!(endps[0].name, "generic-sta0000");
        assert!(endps[0].phantom);

        let single = json!({ "endpoint": { "name": "D_generic-sta0000", "command": "lfping" } });
        let endps = parse_endpoints(&single).unwrap();
        assert_eq!(endps[0].command.as_deref(), Some("lfping"));

        let keyed = json!({ "endpoint": { "generic-sta0001": { "status": "Stopped" } } });
        assert_eq!(parse_endpoints(&keyed).unwrap()[0].name, "generic-sta0001");
    }

    #[test]
    fn layer4_and_layer3_lists_flag_phantoms_by_status() {
        let layer4 = json!({
            "handler": "x",
            "endpoint": [
                { "l4-sta0000": { "name": "l4-sta0000", "status": "PHANTOM" } },
                { "l4-sta0001": { "name": "l4-sta0001", "status": "Stopped" } }
            ]
        });
        let endps = parse_endpoints(&layer4).unwrap();
        assert_eq!(endps.len(), 2);
        assert!(endps[0].phantom);
        assert!(!endps[1].phantom);

        let layer3 = json!({ "endpoint": [ { "udp-A": { "status": "Phantom" } } ] });
        let endps = parse_endpoints(&layer3).unwrap();
        assert_eq!(endps[0].name, "udp-A");
        assert!(endps[0].phantom);
    }

    #[test]
    fn resources_keyed_by_shelf_resource() {
        let body = json!({
            "resources": [
                { "1.2": { "hostname": "lf2", "phantom": true } },
                { "1.1": { "hostname": "lf1", "phantom": false } }
            ]
        });
        let resources = parse_resources(&body).unwrap();
        assert_eq!(resources[0].id, ResourceId { shelf: 1, resource: 1 });
        assert!(resources[1].phantom);
    }

    #[test]
    fn events_take_id_from_key() {
        let body = json!({
            "events": [ { "1234": { "event": "Link-Up", "entity id": "1.1.sta0000", "time-stamp": "t" } } ]
        });
        let events = parse_events(&body).unwrap();
        assert_eq!(events[0].id, "1234");
        assert_eq!(events[0].entity.as_deref(), Some("1.1.sta0000"));
    }

    #[test]
    fn presence_and_security_mapping() {
        assert_eq!(PresenceState::of(None), PresenceState::Absent);
        assert_eq!(PresenceState::of(Some(true)), PresenceState::Phantom);
        assert_eq!("WPA2".parse::<Security>().unwrap(), Security::Wpa2);
        assert_eq!(Security::Open.station_flag(), None);
        assert_eq!(RunState::Running.to_string(), "RUNNING");
    }
}
