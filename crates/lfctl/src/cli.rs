//! Clap derive structures for the `lfctl` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use clap::{Args, Parser, Subcommand, ValueEnum};

use lfctl_core::{Namespace, Security, SweepCategory};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lfctl -- drive traffic-generator entities from the command line
#[derive(Debug, Parser)]
#[command(
    name = "lfctl",
    version,
    about = "Create, confirm and tear down traffic-generator entities",
    long_about = "Orchestrates stations, virtual APs, monitors and generic traffic\n\
        endpoints on a traffic-generator controller through its JSON API.\n\n\
        Every command is confirmed by polling the controller until the change\n\
        shows up or a bounded wait runs out.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "LFCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Manager host or URL (overrides profile)
    #[arg(long, short = 'm', env = "LFCTL_MGR", global = true)]
    pub mgr: Option<String>,

    /// Manager JSON API port (overrides profile)
    #[arg(long = "mgr_port", alias = "mgr-port", env = "LFCTL_MGR_PORT", global = true)]
    pub mgr_port: Option<u16>,

    /// Resource hosting the radios (overrides profile)
    #[arg(long, env = "LFCTL_RESOURCE", global = true)]
    pub resource: Option<u32>,

    /// Output format (defaults to the config file's choice, then table)
    #[arg(long, short = 'o', env = "LFCTL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Debug logging (same as -vv)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LFCTL_INSECURE", global = true)]
    pub insecure: bool,
}

impl GlobalOpts {
    /// Effective verbosity: `--debug` counts as `-vv`.
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, toggle and remove WiFi stations
    #[command(alias = "sta")]
    Stations(StationsArgs),

    /// Create virtual access points
    #[command(alias = "vap")]
    Vaps(VapsArgs),

    /// Create monitor ports
    #[command(alias = "mon")]
    Monitors(MonitorsArgs),

    /// Inspect and remove ports
    Ports(PortsArgs),

    /// Build, run and tear down generic traffic connections
    #[command(alias = "gen")]
    Generic(GenericArgs),

    /// Find and remove phantom records
    Phantom(PhantomArgs),

    /// Compose and decompose flag masks (offline)
    Flags(FlagsArgs),

    /// Parse entity ids and generate name series (offline)
    Eid(EidArgs),

    /// View controller events
    Events(EventsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Argument Groups ───────────────────────────────────────────

/// Which station names to operate on.
#[derive(Debug, Clone, Args)]
pub struct StationSelection {
    /// Number of stations in the generated series
    #[arg(long = "num_stations", alias = "num-stations", default_value = "1")]
    pub num_stations: u32,

    /// First id of the generated series
    #[arg(long = "start_id", alias = "start-id", default_value = "0")]
    pub start_id: u32,

    /// Name prefix of the generated series
    #[arg(long = "sta_prefix", alias = "sta-prefix", default_value = "sta")]
    pub sta_prefix: String,

    /// Explicit station names, replacing the generated series
    #[arg(long = "sta_name", alias = "sta-name", num_args = 1..)]
    pub sta_name: Vec<String>,
}

/// WiFi network credentials.
#[derive(Debug, Clone, Args)]
pub struct WifiOpts {
    /// Radio port, e.g. wiphy0 (overrides profile)
    #[arg(long)]
    pub radio: Option<String>,

    /// SSID to associate with (overrides profile)
    #[arg(long)]
    pub ssid: Option<String>,

    /// Security mode (overrides profile)
    #[arg(long, value_parser = parse_security)]
    pub security: Option<Security>,

    /// Passphrase (overrides profile and LFCTL_PASSWD)
    #[arg(long)]
    pub passwd: Option<String>,
}

/// Confirmation behavior for commands that wait on the controller.
#[derive(Debug, Clone, Args)]
pub struct WaitOpts {
    /// Return as soon as commands are posted, without confirming
    #[arg(long)]
    pub no_wait: bool,
}

fn parse_security(s: &str) -> Result<Security, String> {
    s.parse::<Security>()
        .map_err(|_| format!("expected open, wep, wpa, wpa2 or wpa3, got '{s}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StationsArgs {
    #[command(subcommand)]
    pub command: StationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StationsCommand {
    /// Create stations, confirm them, and bring them up
    Create {
        #[command(flatten)]
        select: StationSelection,

        #[command(flatten)]
        wifi: WifiOpts,

        /// Leave the stations admin-down after creation
        #[arg(long)]
        admin_down: bool,

        /// Use a static configuration instead of DHCP
        #[arg(long)]
        no_dhcp: bool,

        #[command(flatten)]
        wait: WaitOpts,
    },

    /// Remove stations and confirm they are gone
    #[command(alias = "rm")]
    Remove {
        #[command(flatten)]
        select: StationSelection,

        #[command(flatten)]
        wait: WaitOpts,
    },

    /// Admin-up existing stations
    Up {
        #[command(flatten)]
        select: StationSelection,

        #[command(flatten)]
        wait: WaitOpts,
    },

    /// Admin-down existing stations
    Down {
        #[command(flatten)]
        select: StationSelection,

        #[command(flatten)]
        wait: WaitOpts,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VAPS / MONITORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VapsArgs {
    #[command(subcommand)]
    pub command: VapsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VapsCommand {
    /// Create a virtual AP and confirm it
    Create {
        /// Port name of the new AP
        #[arg(default_value = "vap0000")]
        name: String,

        #[command(flatten)]
        wifi: WifiOpts,

        #[command(flatten)]
        wait: WaitOpts,
    },
}

#[derive(Debug, Args)]
pub struct MonitorsArgs {
    #[command(subcommand)]
    pub command: MonitorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MonitorsCommand {
    /// Create a monitor port and confirm it
    Create {
        /// Port name of the monitor
        #[arg(default_value = "moni0")]
        name: String,

        /// Radio port to monitor (overrides profile)
        #[arg(long)]
        radio: Option<String>,

        /// Tune the radio to this channel first
        #[arg(long)]
        channel: Option<u32>,

        /// Tune the radio to this frequency (MHz) first
        #[arg(long)]
        frequency: Option<u32>,

        /// Regulatory country code to set on the radio
        #[arg(long)]
        country: Option<u32>,

        /// add_monitor flag to enable (repeatable), e.g. disable_ht80
        #[arg(long = "flag")]
        flags: Vec<String>,

        #[command(flatten)]
        wait: WaitOpts,
    },

    /// Capture packets on an existing monitor
    Sniff {
        /// Monitor port name or EID
        name: String,

        /// Capture length, e.g. 30s or 5m
        #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
        duration: std::time::Duration,

        /// Capture file written on the monitor's resource
        #[arg(long = "pcap")]
        pcap_name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PORTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PortsArgs {
    #[command(subcommand)]
    pub command: PortsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortsCommand {
    /// List ports, optionally filtered by a name pattern
    #[command(alias = "ls")]
    List {
        /// Name pattern: `sta+`, `sta*`, `sta[0..10]` or an exact name
        pattern: Option<String>,
    },

    /// Remove every port matching a pattern and confirm it is gone
    #[command(alias = "rm")]
    Remove {
        /// Name pattern: `sta+`, `sta*`, `sta[0..10]` or an exact name
        pattern: String,

        #[command(flatten)]
        wait: WaitOpts,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GENERIC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GenericArgs {
    #[command(subcommand)]
    pub command: GenericCommandArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GenericKind {
    Lfping,
    Generic,
    Speedtest,
    Iperf3,
    Lfcurl,
}

#[derive(Debug, Subcommand)]
pub enum GenericCommandArgs {
    /// List cross-connects known to the controller
    #[command(alias = "ls")]
    List,

    /// Build one generic connection per port
    Create {
        /// Ports the endpoints run on (EIDs, e.g. 1.1.sta0000)
        #[arg(long = "port", required = true, num_args = 1..)]
        ports: Vec<String>,

        /// Kind of traffic command
        #[arg(long = "type", value_enum)]
        kind: GenericKind,

        /// Destination for lfping, iperf3 and lfcurl
        #[arg(long)]
        dest: Option<String>,

        /// Ping interval in seconds (lfping)
        #[arg(long, default_value = "1")]
        interval: u32,

        /// Command line to run (generic)
        #[arg(long)]
        cmd: Option<String>,

        /// Output file for fetched content (lfcurl)
        #[arg(long = "file_output", alias = "file-output")]
        file_output: Option<String>,

        /// Number of fetches (lfcurl)
        #[arg(long = "loop_count", alias = "loop-count", default_value = "1")]
        loop_count: u32,

        /// Endpoint name prefix
        #[arg(long, default_value = lfctl_core::cross_connect::DEFAULT_NAME_PREFIX)]
        prefix: String,

        /// Start the connections once built
        #[arg(long)]
        start: bool,
    },

    /// Start connections
    Start {
        /// Connection aliases, e.g. CX_generic-sta0000
        #[arg(required = true)]
        aliases: Vec<String>,
    },

    /// Stop connections
    Stop {
        #[arg(required = true)]
        aliases: Vec<String>,
    },

    /// Remove connections, confirm they are gone, and remove their endpoints
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true)]
        aliases: Vec<String>,

        /// Leave the endpoints in place
        #[arg(long, conflicts_with = "cascade")]
        connection_only: bool,

        /// Remove the endpoints too (overrides the config default)
        #[arg(long)]
        cascade: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PHANTOM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PhantomArgs {
    #[command(subcommand)]
    pub command: PhantomCommand,
}

#[derive(Debug, Subcommand)]
pub enum PhantomCommand {
    /// List phantom records without removing them
    #[command(alias = "ls")]
    List {
        /// Categories to scan (default: all)
        #[arg(long = "category", value_parser = parse_category)]
        categories: Vec<SweepCategory>,
    },

    /// Remove phantom records
    Sweep {
        /// Categories to sweep, in the given order (default: all)
        #[arg(long = "category", value_parser = parse_category)]
        categories: Vec<SweepCategory>,
    },
}

fn parse_category(s: &str) -> Result<SweepCategory, String> {
    s.parse::<SweepCategory>().map_err(|_| {
        let known: Vec<String> = lfctl_core::SWEEP_ORDER.iter().map(ToString::to_string).collect();
        format!("expected one of {}, got '{s}'", known.join(", "))
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FLAGS / EID
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FlagsArgs {
    #[command(subcommand)]
    pub command: FlagsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FlagsCommand {
    /// OR flag names into a mask
    Compose {
        /// current_flags, interest_flags, command_flags, station_flags or monitor_flags
        #[arg(value_parser = parse_namespace)]
        namespace: Namespace,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Split a mask into flag names
    Decompose {
        #[arg(value_parser = parse_namespace)]
        namespace: Namespace,

        /// Decimal or 0x-prefixed hexadecimal mask
        value: String,
    },
}

fn parse_namespace(s: &str) -> Result<Namespace, String> {
    s.parse::<Namespace>().map_err(|_| {
        format!(
            "expected current_flags, interest_flags, command_flags, station_flags or monitor_flags, got '{s}'"
        )
    })
}

#[derive(Debug, Args)]
pub struct EidArgs {
    #[command(subcommand)]
    pub command: EidCommand,
}

#[derive(Debug, Subcommand)]
pub enum EidCommand {
    /// Parse entity ids into their parts
    Parse {
        #[arg(required = true)]
        eids: Vec<String>,
    },

    /// Print a generated station name series
    Series {
        #[command(flatten)]
        select: StationSelection,

        /// Radio the stations attach to (EID or bare port name)
        #[arg(long)]
        radio: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EVENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List recent controller events
    #[command(alias = "ls")]
    List {
        /// Show at most this many events, newest last
        #[arg(long, short = 'l', default_value = "50")]
        limit: usize,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
