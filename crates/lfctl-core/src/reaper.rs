// ── Phantom sweeping ──
//
// The controller keeps records for entities whose backing device or
// process vanished and marks them phantom. A sweep lists one inventory
// category, removes every phantom in it with one command each, and
// reports what it did. Categories never cascade into each other.

use lfctl_api::RemoteClient;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info, warn};

use crate::command::post_command;
use crate::command::requests::{
    DEFAULT_TEST_MGR, RmCxRequest, RmEndpRequest, RmResourceRequest, RmVlanRequest,
};
use crate::error::CoreError;
use crate::inventory;
use crate::model::PhantomRecord;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SweepCategory {
    CrossConnects,
    /// Layer-4 endpoints together with their `CX_` connections.
    #[strum(serialize = "layer4")]
    #[serde(rename = "layer4")]
    Layer4,
    GenericEndpoints,
    #[strum(serialize = "layer3-endpoints")]
    #[serde(rename = "layer3-endpoints")]
    Layer3Endpoints,
    Ports,
    Resources,
}

/// Order used by [`PhantomReaper::sweep_all`]: connections before the
/// endpoints they bind, endpoints before the ports they run on.
pub const SWEEP_ORDER: [SweepCategory; 6] = [
    SweepCategory::CrossConnects,
    SweepCategory::Layer4,
    SweepCategory::GenericEndpoints,
    SweepCategory::Layer3Endpoints,
    SweepCategory::Ports,
    SweepCategory::Resources,
];

/// Outcome of sweeping one category.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub category: SweepCategory,
    /// Records inspected.
    pub scanned: usize,
    pub removed: Vec<PhantomRecord>,
    /// Phantoms whose removal command failed, with the error text.
    pub failed: Vec<(PhantomRecord, String)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.failed.is_empty()
    }
}

pub struct PhantomReaper<'a, C> {
    client: &'a C,
    test_mgr: String,
}

impl<'a, C: RemoteClient> PhantomReaper<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            test_mgr: DEFAULT_TEST_MGR.into(),
        }
    }

    #[must_use]
    pub fn with_test_mgr(mut self, test_mgr: impl Into<String>) -> Self {
        self.test_mgr = test_mgr.into();
        self
    }

    /// List the phantoms in `category` without removing anything.
    ///
    /// Returns the number of records inspected alongside the phantoms.
    pub async fn scan(&self, category: SweepCategory) -> Result<(usize, Vec<PhantomRecord>), CoreError> {
        let client = self.client;
        let (scanned, phantoms): (usize, Vec<PhantomRecord>) = match category {
            SweepCategory::Ports => {
                let ports = inventory::list_ports(client).await?;
                let phantoms = ports
                    .iter()
                    .filter(|p| p.phantom)
                    .map(|p| PhantomRecord::Port(p.eid.clone()))
                    .collect();
                (ports.len(), phantoms)
            }
            SweepCategory::CrossConnects => {
                let cxs = inventory::list_cross_connects(client).await?;
                let phantoms = cxs
                    .iter()
                    .filter(|c| c.phantom)
                    .map(|c| PhantomRecord::CrossConnect(c.name.clone()))
                    .collect();
                (cxs.len(), phantoms)
            }
            SweepCategory::GenericEndpoints => {
                let endps = inventory::list_generic_endpoints(client).await?;
                let phantoms = endps
                    .iter()
                    .filter(|e| e.phantom)
                    .map(|e| PhantomRecord::GenericEndpoint(e.name.clone()))
                    .collect();
                (endps.len(), phantoms)
            }
            SweepCategory::Layer4 => {
                let endps = inventory::list_layer4_endpoints(client).await?;
                let phantoms = endps
                    .iter()
                    .filter(|e| e.phantom)
                    .map(|e| PhantomRecord::Layer4(e.name.clone()))
                    .collect();
                (endps.len(), phantoms)
            }
            SweepCategory::Layer3Endpoints => {
                let endps = inventory::list_layer3_endpoints(client).await?;
                let phantoms = endps
                    .iter()
                    .filter(|e| e.phantom)
                    .map(|e| PhantomRecord::Layer3Endpoint(e.name.clone()))
                    .collect();
                (endps.len(), phantoms)
            }
            SweepCategory::Resources => {
                let resources = inventory::list_resources(client).await?;
                let phantoms = resources
                    .iter()
                    .filter(|r| r.phantom)
                    .map(|r| PhantomRecord::Resource(r.id))
                    .collect();
                (resources.len(), phantoms)
            }
        };
        debug!(%category, scanned, phantoms = phantoms.len(), "inventory scanned");
        Ok((scanned, phantoms))
    }

    /// Remove every phantom in `category`.
    ///
    /// A failed removal is recorded and the sweep carries on; only a
    /// failed inventory query aborts it.
    pub async fn sweep(&self, category: SweepCategory) -> Result<SweepReport, CoreError> {
        let (scanned, phantoms) = self.scan(category).await?;
        let mut report = SweepReport {
            category,
            scanned,
            removed: Vec::new(),
            failed: Vec::new(),
        };
        for record in phantoms {
            match self.remove(&record).await {
                Ok(()) => {
                    info!(%record, "phantom removed");
                    report.removed.push(record);
                }
                Err(e) => {
                    warn!(%record, error = %e, "phantom removal failed");
                    report.failed.push((record, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Sweep every category in [`SWEEP_ORDER`].
    pub async fn sweep_all(&self) -> Result<Vec<SweepReport>, CoreError> {
        let mut reports = Vec::with_capacity(SWEEP_ORDER.len());
        for category in SWEEP_ORDER {
            reports.push(self.sweep(category).await?);
        }
        Ok(reports)
    }

    async fn remove(&self, record: &PhantomRecord) -> Result<(), CoreError> {
        match record {
            PhantomRecord::Port(eid) => {
                let body = RmVlanRequest {
                    shelf: eid.shelf,
                    resource: eid.resource,
                    port: eid.port.clone(),
                };
                post_command(self.client, &body).await?;
            }
            PhantomRecord::CrossConnect(name) => {
                let body = RmCxRequest {
                    test_mgr: self.test_mgr.clone(),
                    cx_name: name.clone(),
                };
                post_command(self.client, &body).await?;
            }
            PhantomRecord::GenericEndpoint(name) | PhantomRecord::Layer3Endpoint(name) => {
                let body = RmEndpRequest {
                    endp_name: name.clone(),
                };
                post_command(self.client, &body).await?;
            }
            PhantomRecord::Layer4(name) => {
                let cx = RmCxRequest {
                    test_mgr: self.test_mgr.clone(),
                    cx_name: format!("CX_{name}"),
                };
                post_command(self.client, &cx).await?;
                let endp = RmEndpRequest {
                    endp_name: name.clone(),
                };
                post_command(self.client, &endp).await?;
            }
            PhantomRecord::Resource(id) => {
                let body = RmResourceRequest {
                    shelf: id.shelf,
                    resource: id.resource,
                };
                post_command(self.client, &body).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::eid::Eid;
    use crate::testing::FakeController;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn seeded() -> FakeController {
        let fake = FakeController::new();
        fake.seed_port("1.1.sta0000", true);
        fake.seed_port("1.1.sta0001", false);
        fake.seed_cx("CX_generic-sta0000", "PHANTOM");
        fake.seed_cx("CX_generic-sta0001", "STOPPED");
        fake.seed_endpoint("generic-sta0000", true);
        fake.seed_resource("1.2", true);
        fake.seed_resource("1.1", false);
        fake.seed_layer4("l4-sta0000", true);
        fake.seed_layer4("l4-sta0001", false);
        fake.seed_layer3("udp-sta0000-A", true);
        fake
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_phantoms() {
        let fake = seeded();
        let report = PhantomReaper::new(&fake).sweep(SweepCategory::Ports).await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.removed, [PhantomRecord::Port(Eid::new(1, 1, "sta0000"))]);
        assert_eq!(fake.bodies("rm_vlan")[0]["port"], "sta0000");
    }

    #[tokio::test(start_paused = true)]
    async fn second_sweep_after_removal_posts_nothing() {
        let fake = seeded();
        let reaper = PhantomReaper::new(&fake);
        let first = reaper.sweep(SweepCategory::CrossConnects).await.unwrap();
        assert_eq!(first.removed.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = reaper.sweep(SweepCategory::CrossConnects).await.unwrap();
        assert!(second.is_clean());
        assert_eq!(fake.count("rm_cx"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_all_runs_categories_in_order() {
        let fake = seeded();
        let reports = PhantomReaper::new(&fake).sweep_all().await.unwrap();
        let categories: Vec<SweepCategory> = reports.iter().map(|r| r.category).collect();
        assert_eq!(categories, SWEEP_ORDER);
        assert_eq!(
            fake.commands(),
            ["rm_cx", "rm_cx", "rm_endp", "rm_endp", "rm_endp", "rm_vlan", "rm_resource"]
        );
        let endps: Vec<Value> = fake.bodies("rm_endp").iter().map(|b| b["endp_name"].clone()).collect();
        assert_eq!(endps, [json!("l4-sta0000"), json!("generic-sta0000"), json!("udp-sta0000-A")]);
        assert_eq!(fake.bodies("rm_resource")[0]["resource"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn layer4_sweep_removes_connection_then_endpoint() {
        let fake = seeded();
        let report = PhantomReaper::new(&fake).sweep(SweepCategory::Layer4).await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.removed, [PhantomRecord::Layer4("l4-sta0000".into())]);
        assert_eq!(fake.commands(), ["rm_cx", "rm_endp"]);
        assert_eq!(fake.bodies("rm_cx")[0]["cx_name"], "CX_l4-sta0000");
        assert_eq!(fake.bodies("rm_endp")[0]["endp_name"], "l4-sta0000");

        tokio::time::sleep(Duration::from_secs(2)).await;
        let again = PhantomReaper::new(&fake).sweep(SweepCategory::Layer4).await.unwrap();
        assert!(again.is_clean());
        assert_eq!(again.scanned, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn layer3_sweep_removes_phantom_endpoints() {
        let fake = seeded();
        fake.seed_layer3("udp-sta0001-A", false);
        let report = PhantomReaper::new(&fake)
            .sweep(SweepCategory::Layer3Endpoints)
            .await
            .unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.removed, [PhantomRecord::Layer3Endpoint("udp-sta0000-A".into())]);
        assert_eq!(fake.commands(), ["rm_endp"]);
        assert_eq!(fake.bodies("rm_endp")[0]["endp_name"], "udp-sta0000-A");
    }

    #[tokio::test(start_paused = true)]
    async fn vlan_phantoms_are_removed_by_full_port_name() {
        let fake = FakeController::new();
        fake.seed_port("1.1.eth1.100", true);
        let report = PhantomReaper::new(&fake).sweep(SweepCategory::Ports).await.unwrap();
        assert_eq!(report.removed, [PhantomRecord::Port(Eid::new(1, 1, "eth1.100"))]);
        assert_eq!(fake.bodies("rm_vlan")[0]["port"], "eth1.100");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_removal_is_reported_not_fatal() {
        let fake = seeded();
        fake.seed_port("1.1.sta0002", true);
        fake.reject("rm_vlan");
        let report = PhantomReaper::new(&fake).sweep(SweepCategory::Ports).await.unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(fake.count("rm_vlan"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_inventory_issues_no_removals() {
        let fake = FakeController::new();
        fake.seed_port("1.1.eth1", false);
        let reports = PhantomReaper::new(&fake).sweep_all().await.unwrap();
        assert!(reports.iter().all(SweepReport::is_clean));
        assert!(fake.commands().is_empty());
    }

    #[test]
    fn categories_parse_from_kebab_case() {
        assert_eq!(
            "generic-endpoints".parse::<SweepCategory>().unwrap(),
            SweepCategory::GenericEndpoints
        );
        assert_eq!("layer4".parse::<SweepCategory>().unwrap(), SweepCategory::Layer4);
        assert_eq!(
            "layer3-endpoints".parse::<SweepCategory>().unwrap(),
            SweepCategory::Layer3Endpoints
        );
        assert_eq!(SweepCategory::Layer3Endpoints.to_string(), "layer3-endpoints");
    }
}
