// ── Inventory queries ──
//
// Typed wrappers over the controller's query paths. `None` means the
// controller does not know the entity.

use lfctl_api::RemoteClient;
use tracing::trace;

use crate::eid::Eid;
use crate::error::CoreError;
use crate::model::{
    self, CrossConnectRecord, EndpointRecord, EventRecord, PORT_FIELDS, PortRecord,
    ResourceRecord,
};

pub async fn fetch_port<C: RemoteClient>(
    client: &C,
    eid: &Eid,
) -> Result<Option<PortRecord>, CoreError> {
    let Some(body) = client.get(&eid.port_path(), &[("fields", PORT_FIELDS)]).await? else {
        return Ok(None);
    };
    let record = model::parse_port(eid, &body)?;
    trace!(%eid, found = record.is_some(), "port lookup");
    Ok(record)
}

pub async fn list_ports<C: RemoteClient>(client: &C) -> Result<Vec<PortRecord>, CoreError> {
    match client.get("/port/all", &[("fields", PORT_FIELDS)]).await? {
        Some(body) => model::parse_port_inventory(&body),
        None => Ok(Vec::new()),
    }
}

pub async fn fetch_cross_connect<C: RemoteClient>(
    client: &C,
    name: &str,
) -> Result<Option<CrossConnectRecord>, CoreError> {
    let Some(body) = client.get(&format!("/cx/{name}"), &[]).await? else {
        return Ok(None);
    };
    let record = model::parse_cross_connects(&body)?
        .into_iter()
        .find(|cx| cx.name == name);
    trace!(name, found = record.is_some(), "cross-connect lookup");
    Ok(record)
}

pub async fn list_cross_connects<C: RemoteClient>(
    client: &C,
) -> Result<Vec<CrossConnectRecord>, CoreError> {
    match client.get("/cx/all", &[]).await? {
        Some(body) => model::parse_cross_connects(&body),
        None => Ok(Vec::new()),
    }
}

pub async fn fetch_generic_endpoint<C: RemoteClient>(
    client: &C,
    name: &str,
) -> Result<Option<EndpointRecord>, CoreError> {
    let Some(body) = client.get(&format!("/generic/{name}"), &[]).await? else {
        return Ok(None);
    };
    let record = model::parse_endpoints(&body)?
        .into_iter()
        .find(|endp| endp.name == name);
    trace!(name, found = record.is_some(), "endpoint lookup");
    Ok(record)
}

pub async fn list_generic_endpoints<C: RemoteClient>(
    client: &C,
) -> Result<Vec<EndpointRecord>, CoreError> {
    match client.get("/generic/all", &[]).await? {
        Some(body) => model::parse_endpoints(&body),
        None => Ok(Vec::new()),
    }
}

/// Layer-4 (URL fetch) endpoints from `/layer4/all`.
pub async fn list_layer4_endpoints<C: RemoteClient>(
    client: &C,
) -> Result<Vec<EndpointRecord>, CoreError> {
    match client.get("/layer4/all", &[]).await? {
        Some(body) => model::parse_endpoints(&body),
        None => Ok(Vec::new()),
    }
}

/// Layer-3 traffic endpoints from `/endp/all`.
pub async fn list_layer3_endpoints<C: RemoteClient>(
    client: &C,
) -> Result<Vec<EndpointRecord>, CoreError> {
    match client.get("/endp/all", &[]).await? {
        Some(body) => model::parse_endpoints(&body),
        None => Ok(Vec::new()),
    }
}

pub async fn list_resources<C: RemoteClient>(
    client: &C,
) -> Result<Vec<ResourceRecord>, CoreError> {
    match client.get("/resource/all", &[]).await? {
        Some(body) => model::parse_resources(&body),
        None => Ok(Vec::new()),
    }
}

pub async fn list_events<C: RemoteClient>(client: &C) -> Result<Vec<EventRecord>, CoreError> {
    match client.get("/events/all", &[]).await? {
        Some(body) => model::parse_events(&body),
        None => Ok(Vec::new()),
    }
}
