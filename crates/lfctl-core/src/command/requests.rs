// ── Typed command bodies ──
//
// One struct per `/cli-json/{name}` command the orchestration layer posts.
// Bodies are flat JSON objects; optional fields are omitted, not nulled.

use serde::Serialize;

use super::CliCommand;
use crate::model::RunState;

/// Test manager every connection is registered with unless told otherwise.
pub const DEFAULT_TEST_MGR: &str = "default_tm";

/// MAC template asking the controller to pick a station address.
pub const MAC_PATTERN: &str = "xx:xx:xx:xx:*:xx";

// ── Ports ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AddStaRequest {
    pub shelf: u32,
    pub resource: u32,
    pub radio: String,
    pub sta_name: String,
    pub ssid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub mac: String,
    pub mode: u32,
    pub rate: String,
    pub flags: u64,
    pub flags_mask: u64,
}

impl CliCommand for AddStaRequest {
    const NAME: &'static str = "add_sta";
}

#[derive(Debug, Clone, Serialize)]
pub struct AddVapRequest {
    pub shelf: u32,
    pub resource: u32,
    pub radio: String,
    pub ap_name: String,
    pub ssid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub mac: String,
    pub flags: u64,
    pub flags_mask: u64,
}

impl CliCommand for AddVapRequest {
    const NAME: &'static str = "add_vap";
}

#[derive(Debug, Clone, Serialize)]
pub struct AddMonitorRequest {
    pub shelf: u32,
    pub resource: u32,
    pub radio: String,
    pub ap_name: String,
    pub flags: u64,
    pub flags_mask: u64,
}

impl CliCommand for AddMonitorRequest {
    const NAME: &'static str = "add_monitor";
}

/// Radio settings applied before a monitor is added on it.
#[derive(Debug, Clone, Serialize)]
pub struct SetWifiRadioRequest {
    pub shelf: u32,
    pub resource: u32,
    pub radio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<u32>,
}

impl CliCommand for SetWifiRadioRequest {
    const NAME: &'static str = "set_wifi_radio";
}

/// `sniff_port` flag: capture headless with dumpcap.
pub const SNIFF_DUMPCAP: u32 = 0x2;

/// `display` value for a capture with no X display.
pub const SNIFF_NO_DISPLAY: &str = "NA";

#[derive(Debug, Clone, Serialize)]
pub struct SniffPortRequest {
    pub shelf: u32,
    pub resource: u32,
    pub port: String,
    pub display: String,
    pub flags: u32,
    pub outfile: String,
    /// Capture length in seconds.
    pub duration: u64,
}

impl CliCommand for SniffPortRequest {
    const NAME: &'static str = "sniff_port";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetPortRequest {
    pub shelf: u32,
    pub resource: u32,
    pub port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_flags: Option<u64>,
    pub interest: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd_flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_timer: Option<u32>,
}

impl CliCommand for SetPortRequest {
    const NAME: &'static str = "set_port";
}

#[derive(Debug, Clone, Serialize)]
pub struct RmVlanRequest {
    pub shelf: u32,
    pub resource: u32,
    pub port: String,
}

impl CliCommand for RmVlanRequest {
    const NAME: &'static str = "rm_vlan";
}

// ── Generic endpoints ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AddGenEndpRequest {
    pub alias: String,
    pub shelf: u32,
    pub resource: u32,
    pub port: String,
    #[serde(rename = "type")]
    pub endp_type: String,
}

impl CliCommand for AddGenEndpRequest {
    const NAME: &'static str = "add_gen_endp";
}

#[derive(Debug, Clone, Serialize)]
pub struct SetEndpFlagRequest {
    pub name: String,
    pub flag: String,
    pub val: u8,
}

impl CliCommand for SetEndpFlagRequest {
    const NAME: &'static str = "set_endp_flag";
}

#[derive(Debug, Clone, Serialize)]
pub struct SetGenCmdRequest {
    pub name: String,
    pub command: String,
}

impl CliCommand for SetGenCmdRequest {
    const NAME: &'static str = "set_gen_cmd";
}

#[derive(Debug, Clone, Serialize)]
pub struct RmEndpRequest {
    pub endp_name: String,
}

impl CliCommand for RmEndpRequest {
    const NAME: &'static str = "rm_endp";
}

// ── Cross-connects ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AddCxRequest {
    pub alias: String,
    pub test_mgr: String,
    pub tx_endp: String,
    pub rx_endp: String,
}

impl CliCommand for AddCxRequest {
    const NAME: &'static str = "add_cx";
}

#[derive(Debug, Clone, Serialize)]
pub struct SetCxStateRequest {
    pub test_mgr: String,
    pub cx_name: String,
    pub cx_state: RunState,
}

impl CliCommand for SetCxStateRequest {
    const NAME: &'static str = "set_cx_state";
}

#[derive(Debug, Clone, Serialize)]
pub struct RmCxRequest {
    pub test_mgr: String,
    pub cx_name: String,
}

impl CliCommand for RmCxRequest {
    const NAME: &'static str = "rm_cx";
}

// ── Resources ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RmResourceRequest {
    pub shelf: u32,
    pub resource: u32,
}

impl CliCommand for RmResourceRequest {
    const NAME: &'static str = "rm_resource";
}
