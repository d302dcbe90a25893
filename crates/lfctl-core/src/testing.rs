// In-memory controller for orchestration tests.
//
// Models the controller's asynchronous apply: created entities become
// visible after `create_delay`, removed ones vanish after `remove_delay`
// (or never, when removals are sticky), admin changes land after
// `admin_delay`. Runs on tokio's clock so paused-time tests are exact.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use lfctl_api::{Error, Query, RemoteClient};
use serde_json::{Map, Value, json};
use tokio::time::Instant;

use crate::eid::{Eid, ResourceId};

#[derive(Debug, Clone)]
struct Lifespan {
    visible_at: Instant,
    gone_at: Option<Instant>,
}

impl Lifespan {
    fn starting(at: Instant) -> Self {
        Self {
            visible_at: at,
            gone_at: None,
        }
    }

    fn visible(&self, now: Instant) -> bool {
        now >= self.visible_at && self.gone_at.is_none_or(|gone| now < gone)
    }
}

#[derive(Debug, Clone)]
struct FakePort {
    life: Lifespan,
    down: bool,
    phantom: bool,
    pending_down: Option<(bool, Instant)>,
}

impl FakePort {
    fn down_at(&self, now: Instant) -> bool {
        match self.pending_down {
            Some((down, at)) if now >= at => down,
            _ => self.down,
        }
    }
}

#[derive(Debug, Clone)]
struct FakeEndpoint {
    life: Lifespan,
    phantom: bool,
    command: Option<String>,
}

#[derive(Debug, Clone)]
struct FakeCx {
    life: Lifespan,
    state: String,
}

#[derive(Debug, Default)]
struct State {
    ports: BTreeMap<Eid, FakePort>,
    endpoints: BTreeMap<String, FakeEndpoint>,
    cxs: BTreeMap<String, FakeCx>,
    layer4: BTreeMap<String, FakeEndpoint>,
    layer3: BTreeMap<String, FakeEndpoint>,
    resources: BTreeMap<ResourceId, (bool, Option<Instant>)>,
    posts: Vec<(String, Value)>,
    rejected: BTreeSet<String>,
}

/// Scripted stand-in for the controller.
#[derive(Debug, Default)]
pub struct FakeController {
    create_delay: Duration,
    remove_delay: Option<Duration>,
    admin_delay: Duration,
    auto_companion: bool,
    state: Mutex<State>,
}

impl FakeController {
    pub fn new() -> Self {
        Self {
            create_delay: Duration::from_secs(1),
            remove_delay: Some(Duration::from_secs(1)),
            admin_delay: Duration::ZERO,
            auto_companion: true,
            state: Mutex::default(),
        }
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    /// Removed entities never disappear; they linger as phantoms.
    pub fn with_sticky_removals(mut self) -> Self {
        self.remove_delay = None;
        self
    }

    pub fn with_admin_delay(mut self, delay: Duration) -> Self {
        self.admin_delay = delay;
        self
    }

    /// Do not create the `D_` companion on `add_gen_endp`.
    pub fn without_companion(mut self) -> Self {
        self.auto_companion = false;
        self
    }

    // ── Seeding ─────────────────────────────────────────────────────

    pub fn seed_port(&self, eid: &str, phantom: bool) {
        let eid = Eid::parse_port_key(eid).unwrap();
        self.state.lock().unwrap().ports.insert(
            eid,
            FakePort {
                life: Lifespan::starting(Instant::now()),
                down: true,
                phantom,
                pending_down: None,
            },
        );
    }

    pub fn seed_endpoint(&self, name: &str, phantom: bool) {
        self.state.lock().unwrap().endpoints.insert(
            name.to_owned(),
            FakeEndpoint {
                life: Lifespan::starting(Instant::now()),
                phantom,
                command: None,
            },
        );
    }

    pub fn seed_cx(&self, name: &str, state: &str) {
        self.state.lock().unwrap().cxs.insert(
            name.to_owned(),
            FakeCx {
                life: Lifespan::starting(Instant::now()),
                state: state.to_owned(),
            },
        );
    }

    /// A layer-4 endpoint plus its running `CX_` connection.
    pub fn seed_layer4(&self, name: &str, phantom: bool) {
        self.state.lock().unwrap().layer4.insert(
            name.to_owned(),
            FakeEndpoint {
                life: Lifespan::starting(Instant::now()),
                phantom,
                command: None,
            },
        );
        self.seed_cx(&format!("CX_{name}"), "Run");
    }

    pub fn seed_layer3(&self, name: &str, phantom: bool) {
        self.state.lock().unwrap().layer3.insert(
            name.to_owned(),
            FakeEndpoint {
                life: Lifespan::starting(Instant::now()),
                phantom,
                command: None,
            },
        );
    }

    pub fn seed_resource(&self, id: &str, phantom: bool) {
        let id: ResourceId = id.parse().unwrap();
        self.state.lock().unwrap().resources.insert(id, (phantom, None));
    }

    /// Make every post of `command` fail with HTTP 500.
    pub fn reject(&self, command: &str) {
        self.state.lock().unwrap().rejected.insert(command.to_owned());
    }

    // ── Inspection ──────────────────────────────────────────────────

    /// Names of every command posted, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().posts.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }

    /// Bodies of every post of `command`, in order.
    pub fn bodies(&self, command: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|(c, _)| c == command)
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub fn endpoint_command(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().endpoints.get(name)?.command.clone()
    }

    // ── Request handling ────────────────────────────────────────────

    fn query(&self, path: &str) -> Option<Value> {
        let now = Instant::now();
        let state = self.state.lock().unwrap();
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            ["port", "all"] => {
                let interfaces: Vec<Value> = state
                    .ports
                    .iter()
                    .filter(|(_, p)| p.life.visible(now))
                    .map(|(eid, p)| json!({ eid.to_string(): port_json(eid, p, now) }))
                    .collect();
                Some(json!({ "handler": "fake", "interfaces": interfaces }))
            }
            ["port", shelf, resource, name] => {
                let eid = Eid::parse_port_key(&format!("{shelf}.{resource}.{name}")).ok()?;
                let port = state.ports.get(&eid).filter(|p| p.life.visible(now))?;
                Some(json!({ "handler": "fake", "interface": port_json(&eid, port, now) }))
            }
            ["cx", "all"] => {
                let mut map = Map::new();
                map.insert("handler".into(), json!("fake"));
                map.insert("uri".into(), json!("cx/all"));
                for (name, cx) in state.cxs.iter().filter(|(_, c)| c.life.visible(now)) {
                    map.insert(name.clone(), json!({ "name": name, "state": cx.state }));
                }
                Some(Value::Object(map))
            }
            ["cx", name] => {
                let cx = state.cxs.get(*name).filter(|c| c.life.visible(now))?;
                Some(json!({ "handler": "fake", (*name): { "state": cx.state } }))
            }
            ["generic", "all"] => {
                let endpoints: Vec<Value> = state
                    .endpoints
                    .iter()
                    .filter(|(_, e)| e.life.visible(now))
                    .map(|(name, e)| json!({ name.clone(): endpoint_json(name, e) }))
                    .collect();
                Some(json!({ "endpoints": endpoints }))
            }
            ["generic", name] => {
                let endpoint = state.endpoints.get(*name).filter(|e| e.life.visible(now))?;
                Some(json!({ "endpoint": endpoint_json(name, endpoint) }))
            }
            ["layer4", "all"] => Some(json!({
                "handler": "fake",
                "endpoint": status_entries(&state.layer4, now),
            })),
            ["endp", "all"] => Some(json!({
                "handler": "fake",
                "endpoint": status_entries(&state.layer3, now),
            })),
            ["resource", "all"] => {
                let resources: Vec<Value> = state
                    .resources
                    .iter()
                    .filter(|(_, (_, gone))| gone.is_none_or(|g| now < g))
                    .map(|(id, (phantom, _))| json!({ id.to_string(): { "phantom": phantom } }))
                    .collect();
                Some(json!({ "resources": resources }))
            }
            ["events", "all"] => Some(json!({ "events": [] })),
            _ => None,
        }
    }

    fn command(&self, path: &str, body: &Value) -> Result<Value, Error> {
        let now = Instant::now();
        let name = path.trim_start_matches("/cli-json/").to_owned();
        let mut state = self.state.lock().unwrap();
        state.posts.push((name.clone(), body.clone()));
        if state.rejected.contains(&name) {
            return Err(Error::RemoteCall {
                status_code: 500,
                body: format!("{name} rejected"),
            });
        }

        let text = |key: &str| body[key].as_str().unwrap_or_default().to_owned();
        let number = |key: &str| u32::try_from(body[key].as_u64().unwrap_or(1)).unwrap();
        let port_eid = |name_key: &str| Eid::new(number("shelf"), number("resource"), text(name_key));
        let visible_at = now + self.create_delay;
        let gone_at = self.remove_delay.map(|d| now + d);

        match name.as_str() {
            "add_sta" | "add_vap" | "add_monitor" => {
                let key = if name == "add_sta" { "sta_name" } else { "ap_name" };
                let down = name == "add_sta"
                    && body["flags"].as_u64().unwrap_or(0) & 0x10_0000_0000 != 0;
                state.ports.insert(
                    port_eid(key),
                    FakePort {
                        life: Lifespan::starting(visible_at),
                        down,
                        phantom: false,
                        pending_down: None,
                    },
                );
            }
            "set_port" => {
                let at = now + self.admin_delay;
                if let Some(port) = state.ports.get_mut(&port_eid("port")) {
                    if body["interest"].as_u64().unwrap_or(0) & 0x80_0000 != 0 {
                        let down = body["current_flags"].as_u64().unwrap_or(0) & 0x1 != 0;
                        port.pending_down = Some((down, at));
                    }
                }
            }
            "rm_vlan" => {
                if let Some(port) = state.ports.get_mut(&port_eid("port")) {
                    port.life.gone_at = gone_at.or(Some(now + Duration::from_secs(86_400 * 365)));
                    if gone_at.is_none() {
                        port.phantom = true;
                    }
                }
            }
            "add_gen_endp" => {
                let alias = text("alias");
                let mut names = vec![alias.clone()];
                if self.auto_companion {
                    names.push(format!("D_{alias}"));
                }
                for endp in names {
                    state.endpoints.insert(
                        endp,
                        FakeEndpoint {
                            life: Lifespan::starting(visible_at),
                            phantom: false,
                            command: None,
                        },
                    );
                }
            }
            "set_gen_cmd" => {
                if let Some(endp) = state.endpoints.get_mut(&text("name")) {
                    endp.command = Some(text("command"));
                }
            }
            "rm_endp" => {
                let endp_name = text("endp_name");
                let State {
                    endpoints,
                    layer4,
                    layer3,
                    ..
                } = &mut *state;
                for table in [endpoints, layer4, layer3] {
                    if let Some(endp) = table.get_mut(&endp_name) {
                        endp.life.gone_at =
                            gone_at.or(Some(now + Duration::from_secs(86_400 * 365)));
                    }
                }
            }
            "add_cx" => {
                state.cxs.insert(
                    text("alias"),
                    FakeCx {
                        life: Lifespan::starting(visible_at),
                        state: "STOPPED".into(),
                    },
                );
            }
            "set_cx_state" => {
                if let Some(cx) = state.cxs.get_mut(&text("cx_name")) {
                    cx.state = text("cx_state");
                }
            }
            "rm_cx" => {
                if let Some(cx) = state.cxs.get_mut(&text("cx_name")) {
                    cx.life.gone_at = gone_at.or(Some(now + Duration::from_secs(86_400 * 365)));
                }
            }
            "rm_resource" => {
                let id = ResourceId {
                    shelf: number("shelf"),
                    resource: number("resource"),
                };
                if let Some(entry) = state.resources.get_mut(&id) {
                    entry.1 = Some(now);
                }
            }
            _ => {}
        }
        Ok(json!({ "LAST": { "response": "OK" } }))
    }
}

fn port_json(eid: &Eid, port: &FakePort, now: Instant) -> Value {
    json!({
        "alias": eid.port,
        "down": port.down_at(now),
        "phantom": port.phantom,
        "port": format!("{}.{}.{}", eid.shelf, eid.resource, 7),
    })
}

fn endpoint_json(name: &str, endpoint: &FakeEndpoint) -> Value {
    json!({ "name": name, "phantom": endpoint.phantom, "command": endpoint.command })
}

/// Layer-4 and layer-3 lists report phantoms only through `status`.
fn status_entries(table: &BTreeMap<String, FakeEndpoint>, now: Instant) -> Vec<Value> {
    table
        .iter()
        .filter(|(_, e)| e.life.visible(now))
        .map(|(name, e)| {
            let status = if e.phantom { "PHANTOM" } else { "Run" };
            json!({ name.clone(): { "name": name, "status": status } })
        })
        .collect()
}

impl RemoteClient for FakeController {
    async fn get(&self, path: &str, _query: Query<'_>) -> Result<Option<Value>, Error> {
        Ok(self.query(path))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.command(path, body)
    }
}
