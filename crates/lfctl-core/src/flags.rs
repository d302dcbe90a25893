// ── Flag namespaces and composition ──
//
// The controller encodes port and station options as 64-bit masks. Each
// namespace maps symbolic names to single bits; tables are append-only and
// bits are never renumbered.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::error::CoreError;

/// Bumped whenever a table below gains a symbol.
pub const FLAG_TABLE_VERSION: u32 = 4;

/// Symbol to bit mapping for one namespace.
pub type FlagTable = &'static [(&'static str, u64)];

/// Independent flag namespaces. A name is only meaningful inside its own.
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// `set_port` current_flags: the desired port state bits.
    CurrentFlags,
    /// `set_port` interest: which fields of the request the controller applies.
    InterestFlags,
    /// `set_port` cmd_flags.
    CommandFlags,
    /// `add_sta` flags.
    StationFlags,
    /// `add_monitor` flags.
    MonitorFlags,
}

impl Namespace {
    /// The built-in table for this namespace.
    pub fn builtin_table(self) -> FlagTable {
        match self {
            Self::CurrentFlags => CURRENT_FLAGS,
            Self::InterestFlags => INTEREST_FLAGS,
            Self::CommandFlags => COMMAND_FLAGS,
            Self::StationFlags => STATION_FLAGS,
            Self::MonitorFlags => MONITOR_FLAGS,
        }
    }
}

// ── Built-in tables ─────────────────────────────────────────────────

pub const CURRENT_FLAGS: FlagTable = &[
    ("if_down", 0x1),
    ("fixed_10bt_hd", 0x2),
    ("fixed_10bt_fd", 0x4),
    ("fixed_100bt_hd", 0x8),
    ("fixed_100bt_fd", 0x10),
    ("auto_neg", 0x100),
    ("adv_10bt_hd", 0x10_0000),
    ("adv_10bt_fd", 0x20_0000),
    ("adv_100bt_hd", 0x40_0000),
    ("adv_100bt_fd", 0x80_0000),
    ("adv_flow_ctl", 0x800_0000),
    ("promisc", 0x1000_0000),
    ("use_dhcp", 0x8000_0000),
    ("adv_10g_hd", 0x4_0000_0000),
    ("adv_10g_fd", 0x8_0000_0000),
    ("tso_enabled", 0x10_0000_0000),
    ("lro_enabled", 0x20_0000_0000),
    ("gro_enabled", 0x40_0000_0000),
    ("ufo_enabled", 0x80_0000_0000),
    ("gso_enabled", 0x100_0000_0000),
    ("use_dhcpv6", 0x200_0000_0000),
    ("rxfcs", 0x400_0000_0000),
    ("no_dhcp_rel", 0x800_0000_0000),
    ("staged_ifup", 0x1000_0000_0000),
    ("http_enabled", 0x2000_0000_0000),
    ("ftp_enabled", 0x4000_0000_0000),
    ("aux_mgt", 0x8000_0000_0000),
    ("no_dhcp_restart", 0x1_0000_0000_0000),
    ("ignore_dhcp", 0x2_0000_0000_0000),
    ("no_ifup_post", 0x4_0000_0000_0000),
    ("radius_enabled", 0x20_0000_0000_0000),
    ("ipsec_client", 0x40_0000_0000_0000),
    ("ipsec_concentrator", 0x80_0000_0000_0000),
    ("service_dns", 0x100_0000_0000_0000),
];

pub const INTEREST_FLAGS: FlagTable = &[
    ("command_flags", 0x1),
    ("current_flags", 0x2),
    ("ip_address", 0x4),
    ("ip_Mask", 0x8),
    ("ip_gateway", 0x10),
    ("mac_address", 0x20),
    ("supported_flags", 0x40),
    ("link_speed", 0x80),
    ("mtu", 0x100),
    ("tx_queue_len", 0x200),
    ("promisc_mode", 0x400),
    ("alias", 0x1000),
    ("rx_all", 0x2000),
    ("dhcp", 0x4000),
    ("rpt_timer", 0x8000),
    ("bridge", 0x1_0000),
    ("ipv6_addrs", 0x2_0000),
    ("bypass", 0x4_0000),
    ("gen_offload", 0x8_0000),
    ("cpu_mask", 0x10_0000),
    ("port_type", 0x20_0000),
    ("ifdown", 0x80_0000),
    ("dhcpv6", 0x100_0000),
    ("rxfcs", 0x200_0000),
    ("dhcp_rls", 0x400_0000),
    ("svc_httpd", 0x800_0000),
    ("svc_ftpd", 0x1000_0000),
    ("aux_mgt", 0x2000_0000),
    ("no_dhcp_conn", 0x4000_0000),
    ("no_apply_dhcp", 0x8000_0000),
    ("skip_ifup_roam", 0x1_0000_0000),
];

pub const COMMAND_FLAGS: FlagTable = &[
    ("reset_transceiver", 0x1),
    ("restart_link_neg", 0x2),
    ("force_MII_probe", 0x4),
    ("no_hw_probe", 0x8),
    ("probe_wifi", 0x10),
    ("new_gw_probe", 0x20),
    ("new_gw_probe_dev", 0x40),
    ("from_user", 0x80),
    ("skip_port_bounce", 0x100),
    ("from_dhcp", 0x200),
    ("abort_if_scripts", 0x400),
    ("use_pre_ifdown", 0x800),
];

pub const STATION_FLAGS: FlagTable = &[
    ("wpa_enable", 0x10),
    ("custom_conf", 0x20),
    ("wep_enable", 0x200),
    ("wpa2_enable", 0x400),
    ("ht40_disable", 0x800),
    ("scan_ssid", 0x1000),
    ("passive_scan", 0x2000),
    ("disable_sgi", 0x4000),
    ("lf_sta_migrate", 0x8000),
    ("verbose", 0x1_0000),
    ("80211u_enable", 0x2_0000),
    ("80211u_auto", 0x4_0000),
    ("80211u_gw", 0x8_0000),
    ("80211u_additional", 0x10_0000),
    ("80211u_e911", 0x20_0000),
    ("80211u_e911_unauth", 0x40_0000),
    ("hs20_enable", 0x80_0000),
    ("disable_gdaf", 0x100_0000),
    ("8021x_radius", 0x200_0000),
    ("80211r_pmska_cache", 0x400_0000),
    ("disable_ht80", 0x800_0000),
    ("ibss_mode", 0x2000_0000),
    ("osen_enable", 0x4000_0000),
    ("disable_roam", 0x8000_0000),
    ("ht160_enable", 0x1_0000_0000),
    ("disable_fast_reauth", 0x2_0000_0000),
    ("mesh_mode", 0x4_0000_0000),
    ("power_save_enable", 0x8_0000_0000),
    ("create_admin_down", 0x10_0000_0000),
    ("wds-mode", 0x20_0000_0000),
    ("no-supp-op-class-ie", 0x40_0000_0000),
    ("txo-enable", 0x80_0000_0000),
    ("use-wpa3", 0x100_0000_0000),
    ("use-bss-transition", 0x800_0000_0000),
    ("disable-twt", 0x1000_0000_0000),
];

pub const MONITOR_FLAGS: FlagTable = &[
    ("disable_ht40", 0x800),
    ("disable_ht80", 0x800_0000),
    ("ht160_enable", 0x1_0000_0000),
];

// ── Composer ────────────────────────────────────────────────────────

/// Validated flag tables, keyed by namespace.
///
/// Construction rejects tables where a value is not a single bit or where
/// two symbols share a bit or a name. After that, composition is total
/// over known names.
#[derive(Debug, Clone)]
pub struct FlagComposer {
    tables: HashMap<Namespace, BTreeMap<&'static str, u64>>,
}

static STANDARD: LazyLock<Result<FlagComposer, TableDefect>> = LazyLock::new(|| {
    let composer = FlagComposer::validate(Namespace::iter().map(|ns| (ns, ns.builtin_table())));
    if composer.is_ok() {
        debug!(version = FLAG_TABLE_VERSION, "flag tables validated");
    }
    composer
});

#[derive(Debug, Clone)]
struct TableDefect {
    namespace: Namespace,
    reason: String,
}

impl From<TableDefect> for CoreError {
    fn from(defect: TableDefect) -> Self {
        CoreError::FlagTable {
            namespace: defect.namespace,
            reason: defect.reason,
        }
    }
}

impl FlagComposer {
    /// Build a composer from explicit tables.
    pub fn new(tables: impl IntoIterator<Item = (Namespace, FlagTable)>) -> Result<Self, CoreError> {
        Ok(Self::validate(tables)?)
    }

    /// The built-in tables, validated once per process.
    pub fn standard() -> Result<&'static Self, CoreError> {
        STANDARD.as_ref().map_err(|defect| defect.clone().into())
    }

    fn validate(
        tables: impl IntoIterator<Item = (Namespace, FlagTable)>,
    ) -> Result<Self, TableDefect> {
        let mut validated = HashMap::new();
        for (namespace, table) in tables {
            let defect = |reason: String| TableDefect { namespace, reason };
            let mut by_name = BTreeMap::new();
            let mut seen_bits = 0u64;
            for &(name, value) in table {
                if !value.is_power_of_two() {
                    return Err(defect(format!("{name} = {value:#x} is not a single bit")));
                }
                if seen_bits & value != 0 {
                    return Err(defect(format!("{name} reuses bit {value:#x}")));
                }
                if by_name.insert(name, value).is_some() {
                    return Err(defect(format!("{name} is defined twice")));
                }
                seen_bits |= value;
            }
            validated.insert(namespace, by_name);
        }
        Ok(Self { tables: validated })
    }

    fn lookup(&self, namespace: Namespace, name: &str) -> Result<u64, CoreError> {
        self.tables
            .get(&namespace)
            .and_then(|table| table.get(name))
            .copied()
            .ok_or_else(|| CoreError::UnknownFlag {
                namespace,
                flag: name.to_owned(),
            })
    }

    /// OR together the bits for `names`.
    ///
    /// Fails on the first name the namespace does not define.
    pub fn compose<S: AsRef<str>>(
        &self,
        namespace: Namespace,
        names: impl IntoIterator<Item = S>,
    ) -> Result<u64, CoreError> {
        names
            .into_iter()
            .try_fold(0, |acc, name| Ok(acc | self.lookup(namespace, name.as_ref())?))
    }

    /// Clear the bits for `names` from `current`.
    pub fn clear<S: AsRef<str>>(
        &self,
        namespace: Namespace,
        current: u64,
        names: impl IntoIterator<Item = S>,
    ) -> Result<u64, CoreError> {
        Ok(current & !self.compose(namespace, names)?)
    }

    /// Names of every defined bit set in `value`. Undefined bits are dropped.
    pub fn decompose(&self, namespace: Namespace, value: u64) -> BTreeSet<&'static str> {
        self.tables
            .get(&namespace)
            .into_iter()
            .flatten()
            .filter(|&(_, bit)| value & bit != 0)
            .map(|(&name, _)| name)
            .collect()
    }

    /// Every bit the namespace defines.
    pub fn known_bits(&self, namespace: Namespace) -> u64 {
        self.tables
            .get(&namespace)
            .map_or(0, |table| table.values().fold(0, |acc, bit| acc | bit))
    }

    /// Bits set in `value` that the namespace does not define.
    pub fn unknown_bits(&self, namespace: Namespace, value: u64) -> u64 {
        value & !self.known_bits(namespace)
    }

    /// The current/interest pair for a `set_port` preset.
    pub fn preset(&self, preset: PortPreset) -> Result<PortFlags, CoreError> {
        let (current, interest): (&[&str], &[&str]) = match preset {
            PortPreset::AdminUp => (&[], &["current_flags", "ifdown"]),
            PortPreset::AdminDown => (&["if_down"], &["current_flags", "ifdown"]),
            PortPreset::DhcpUp => (&["use_dhcp"], DHCP_INTEREST),
            PortPreset::DhcpDown => (&["if_down", "use_dhcp"], DHCP_INTEREST),
        };
        Ok(PortFlags {
            current: self.compose(Namespace::CurrentFlags, current)?,
            interest: self.compose(Namespace::InterestFlags, interest)?,
        })
    }
}

const DHCP_INTEREST: &[&str] = &["current_flags", "dhcp", "dhcp_rls", "ifdown"];

// ── set_port presets ────────────────────────────────────────────────

/// Common `set_port` state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PortPreset {
    AdminUp,
    AdminDown,
    DhcpUp,
    DhcpDown,
}

/// A current_flags / interest pair ready for a `set_port` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortFlags {
    pub current: u64,
    pub interest: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn composer() -> &'static FlagComposer {
        FlagComposer::standard().unwrap()
    }

    #[test]
    fn builtin_tables_validate() {
        for ns in Namespace::iter() {
            assert!(!ns.builtin_table().is_empty(), "{ns} table is empty");
        }
        assert!(FlagComposer::standard().is_ok());
    }

    #[test]
    fn compose_station_defaults() {
        let flags = composer()
            .compose(Namespace::StationFlags, ["create_admin_down", "wpa2_enable"])
            .unwrap();
        assert_eq!(flags, 68_719_477_760);
    }

    #[test]
    fn compose_empty_is_zero() {
        let none: [&str; 0] = [];
        assert_eq!(composer().compose(Namespace::CurrentFlags, none).unwrap(), 0);
    }

    #[test]
    fn unknown_flag_names_first_offender() {
        let err = composer()
            .compose(Namespace::CurrentFlags, ["if_down", "bogus", "also_bogus"])
            .unwrap_err();
        match err {
            CoreError::UnknownFlag { namespace, flag } => {
                assert_eq!(namespace, Namespace::CurrentFlags);
                assert_eq!(flag, "bogus");
            }
            other => panic!("expected UnknownFlag, got: {other:?}"),
        }
    }

    #[test]
    fn names_do_not_cross_namespaces() {
        assert!(composer().compose(Namespace::InterestFlags, ["if_down"]).is_err());
        assert!(composer().compose(Namespace::CurrentFlags, ["ifdown"]).is_err());
    }

    #[test]
    fn decompose_inverts_compose() {
        let names = ["use_dhcp", "if_down", "service_dns"];
        let value = composer().compose(Namespace::CurrentFlags, names).unwrap();
        let back = composer().decompose(Namespace::CurrentFlags, value);
        assert_eq!(back, names.into_iter().collect::<BTreeSet<_>>());
        assert_eq!(composer().compose(Namespace::CurrentFlags, &back).unwrap(), value);
    }

    #[test]
    fn decompose_drops_undefined_bits() {
        let value = 0x1 | 0x20;
        let names = composer().decompose(Namespace::CurrentFlags, value);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), ["if_down"]);
        assert_eq!(composer().unknown_bits(Namespace::CurrentFlags, value), 0x20);
    }

    #[test]
    fn monitor_flags_have_their_own_namespace() {
        let c = composer();
        let flags = c
            .compose(Namespace::MonitorFlags, ["disable_ht40", "ht160_enable"])
            .unwrap();
        assert_eq!(flags, 0x1_0000_0800);
        assert_eq!(c.known_bits(Namespace::MonitorFlags), 0x1_0800_0800);
        assert!(c.compose(Namespace::MonitorFlags, ["create_admin_down"]).is_err());
        assert_eq!("monitor_flags".parse::<Namespace>().unwrap(), Namespace::MonitorFlags);
    }

    #[test]
    fn clear_removes_only_named_bits() {
        let c = composer();
        let current = c
            .compose(Namespace::CurrentFlags, ["if_down", "use_dhcp"])
            .unwrap();
        let cleared = c.clear(Namespace::CurrentFlags, current, ["if_down"]).unwrap();
        assert_eq!(cleared, 0x8000_0000);
    }

    #[test]
    fn presets_match_port_helper_values() {
        let c = composer();
        let up = c.preset(PortPreset::AdminUp).unwrap();
        assert_eq!(up, PortFlags { current: 0, interest: 8_388_610 });
        let down = c.preset(PortPreset::AdminDown).unwrap();
        assert_eq!(down, PortFlags { current: 1, interest: 8_388_610 });
        let dhcp_up = c.preset(PortPreset::DhcpUp).unwrap();
        assert_eq!(dhcp_up, PortFlags { current: 2_147_483_648, interest: 75_513_858 });
        let dhcp_down = c.preset(PortPreset::DhcpDown).unwrap();
        assert_eq!(dhcp_down.current, 2_147_483_649);
    }

    #[test]
    fn rejects_multi_bit_values() {
        let both: FlagTable = &[("both", 0x3)];
        let err = FlagComposer::new([(Namespace::CommandFlags, both)]).unwrap_err();
        assert!(matches!(err, CoreError::FlagTable { namespace: Namespace::CommandFlags, .. }));
    }

    #[test]
    fn rejects_shared_bits_and_duplicate_names() {
        let shared: FlagTable = &[("a", 0x4), ("b", 0x4)];
        assert!(FlagComposer::new([(Namespace::CurrentFlags, shared)]).is_err());
        let duplicate: FlagTable = &[("a", 0x4), ("a", 0x8)];
        assert!(FlagComposer::new([(Namespace::CurrentFlags, duplicate)]).is_err());
    }

    #[test]
    fn namespace_parses_from_snake_case() {
        assert_eq!("station_flags".parse::<Namespace>().unwrap(), Namespace::StationFlags);
        assert_eq!(Namespace::InterestFlags.to_string(), "interest_flags");
    }
}
