// ── Entity identifiers and name series ──
//
// Every port, radio and endpoint on the controller is addressed by an EID
// of the form `shelf.resource.port`. Station names are generated from a
// prefix and a zero-padded counter, and selected again later by pattern.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Shelf number assumed when an EID omits it.
pub const DEFAULT_SHELF: u32 = 1;

/// Padding base used by most station series (`sta0000`, `sta0001`, ...).
pub const DEFAULT_PADDING: u32 = 10_000;

// ── Eid ─────────────────────────────────────────────────────────────

/// Canonical identifier for a controller-side port or named object.
///
/// Ordered by `(shelf, resource, port)` so iteration over collections of
/// EIDs is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Eid {
    pub shelf: u32,
    pub resource: u32,
    pub port: String,
}

impl Eid {
    pub fn new(shelf: u32, resource: u32, port: impl Into<String>) -> Self {
        Self {
            shelf,
            resource,
            port: port.into(),
        }
    }

    /// Parse `shelf.resource.port` or `resource.port`.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let segments: Vec<&str> = text.split('.').collect();
        match segments.as_slice() {
            [resource, port] => Ok(Self::new(
                DEFAULT_SHELF,
                numeric_segment(text, "resource", resource)?,
                port_segment(text, port)?,
            )),
            [shelf, resource, port] => Ok(Self::new(
                numeric_segment(text, "shelf", shelf)?,
                numeric_segment(text, "resource", resource)?,
                port_segment(text, port)?,
            )),
            _ => Err(CoreError::MalformedEid {
                input: text.to_owned(),
                reason: format!(
                    "expected 2 or 3 dot-separated segments, found {}",
                    segments.len()
                ),
            }),
        }
    }

    /// Parse a port key from the controller's inventory.
    ///
    /// The port name is everything after the resource, so VLAN and
    /// MAC-VLAN names such as `1.1.eth1.100` keep their dots. Keys with
    /// fewer than three segments fall back to [`Eid::parse`].
    pub fn parse_port_key(key: &str) -> Result<Self, CoreError> {
        match key.splitn(3, '.').collect::<Vec<_>>().as_slice() {
            [shelf, resource, port] => Ok(Self::new(
                numeric_segment(key, "shelf", shelf)?,
                numeric_segment(key, "resource", resource)?,
                port_segment(key, port)?,
            )),
            _ => Self::parse(key),
        }
    }

    /// Same shelf and resource, different port name.
    pub fn sibling(&self, port: impl Into<String>) -> Self {
        Self::new(self.shelf, self.resource, port)
    }

    /// Query path for this port: `/port/{shelf}/{resource}/{port}`.
    pub fn port_path(&self) -> String {
        format!("/port/{}/{}/{}", self.shelf, self.resource, self.port)
    }
}

fn numeric_segment(input: &str, field: &str, segment: &str) -> Result<u32, CoreError> {
    segment.parse().map_err(|_| CoreError::MalformedEid {
        input: input.to_owned(),
        reason: format!("{field} segment '{segment}' is not a number"),
    })
}

fn port_segment(input: &str, segment: &str) -> Result<String, CoreError> {
    if segment.is_empty() {
        return Err(CoreError::MalformedEid {
            input: input.to_owned(),
            reason: "port segment is empty".into(),
        });
    }
    Ok(segment.to_owned())
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shelf, self.resource, self.port)
    }
}

impl FromStr for Eid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Eid {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Eid> for String {
    fn from(eid: Eid) -> Self {
        eid.to_string()
    }
}

// ── ResourceId ──────────────────────────────────────────────────────

/// `shelf.resource` key used by the resource inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub shelf: u32,
    pub resource: u32,
}

impl FromStr for ResourceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('.').collect::<Vec<_>>().as_slice() {
            [shelf, resource] => Ok(Self {
                shelf: numeric_segment(s, "shelf", shelf)?,
                resource: numeric_segment(s, "resource", resource)?,
            }),
            _ => Err(CoreError::MalformedEid {
                input: s.to_owned(),
                reason: "expected shelf.resource".into(),
            }),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.shelf, self.resource)
    }
}

// ── Name series ─────────────────────────────────────────────────────

/// A finite, restartable series of generated port names.
///
/// Each name is `prefix` followed by the decimal form of `padding + i`
/// with its leading digit dropped, so `padding = 10000` yields four-digit
/// zero-padded numbers. Iterating twice yields the same names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSeries {
    prefix: String,
    numbers: RangeInclusive<u64>,
}

/// Build the series `prefix{padding+start_id}..prefix{padding+end_id}`.
///
/// `end_id < start_id` yields an empty series.
pub fn generate_series(prefix: &str, start_id: u32, end_id: u32, padding: u32) -> NameSeries {
    let base = u64::from(padding);
    NameSeries {
        prefix: prefix.to_owned(),
        numbers: (base + u64::from(start_id))..=(base + u64::from(end_id)),
    }
}

impl NameSeries {
    pub fn iter(&self) -> NameIter<'_> {
        NameIter {
            prefix: &self.prefix,
            numbers: self.numbers.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Pin every name in the series to the shelf/resource of `radio`.
    pub fn on_radio<'a>(&'a self, radio: &'a Eid) -> impl Iterator<Item = StationSlot> + 'a {
        self.iter().map(move |name| StationSlot {
            eid: radio.sibling(name),
            radio: radio.port.clone(),
        })
    }
}

impl<'a> IntoIterator for &'a NameSeries {
    type Item = String;
    type IntoIter = NameIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`NameSeries`].
#[derive(Debug, Clone)]
pub struct NameIter<'a> {
    prefix: &'a str,
    numbers: RangeInclusive<u64>,
}

impl Iterator for NameIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.numbers.next()?;
        let digits: String = n.to_string().chars().skip(1).collect();
        Some(format!("{}{digits}", self.prefix))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.numbers.size_hint()
    }
}

impl ExactSizeIterator for NameIter<'_> {}

/// A generated station name bound to the radio it will be created on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSlot {
    pub eid: Eid,
    pub radio: String,
}

// ── Name patterns ───────────────────────────────────────────────────

/// Port-name selection pattern.
///
/// `Prefix` (`sta+`) and `Wildcard` (`sta*`) currently match identically:
/// both select every name starting with the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Prefix(String),
    Wildcard(String),
    Range { prefix: String, start: u64, end: u64 },
    Exact(String),
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Self {
        if let Some(prefix) = trailing_marker(pattern, '+') {
            return Self::Prefix(prefix.to_owned());
        }
        if let Some(prefix) = trailing_marker(pattern, '*') {
            return Self::Wildcard(prefix.to_owned());
        }
        if let Some((prefix, start, end)) = parse_range(pattern) {
            return Self::Range {
                prefix: prefix.to_owned(),
                start,
                end,
            };
        }
        Self::Exact(pattern.to_owned())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) | Self::Wildcard(prefix) => name.starts_with(prefix.as_str()),
            Self::Range { prefix, start, end } => name
                .strip_prefix(prefix.as_str())
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse::<u64>().ok())
                .is_some_and(|n| (*start..=*end).contains(&n)),
            Self::Exact(exact) => name == exact,
        }
    }
}

/// `prefix` of `prefix<marker>` when the prefix is non-empty and free of
/// the marker itself.
fn trailing_marker(pattern: &str, marker: char) -> Option<&str> {
    pattern
        .strip_suffix(marker)
        .filter(|prefix| !prefix.is_empty() && !prefix.contains(marker))
}

/// Split `prefix[start..end]` into its parts.
fn parse_range(pattern: &str) -> Option<(&str, u64, u64)> {
    let body = pattern.strip_suffix(']')?;
    let (prefix, bounds) = body.split_once('[')?;
    if prefix.is_empty() {
        return None;
    }
    let (start, end) = bounds.split_once("..")?;
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(start) || !is_digits(end) {
        return None;
    }
    Some((prefix, start.parse().ok()?, end.parse().ok()?))
}

/// Test a port name against a selection pattern.
///
/// Names outside the pattern's family are rejected, never an error.
pub fn match_pattern(name: &str, pattern: &str) -> bool {
    NamePattern::parse(pattern).matches(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_segments() {
        let eid = Eid::parse("1.2.sta0001").unwrap();
        assert_eq!(eid, Eid::new(1, 2, "sta0001"));
    }

    #[test]
    fn parse_two_segments_defaults_shelf() {
        let eid: Eid = "3.wiphy0".parse().unwrap();
        assert_eq!(eid, Eid::new(DEFAULT_SHELF, 3, "wiphy0"));
    }

    #[test]
    fn format_round_trips_up_to_shelf_normalization() {
        let cases = [
            ("1.1.sta0000", "1.1.sta0000"),
            ("2.7.wlan0", "2.7.wlan0"),
            ("1.eth1", "1.1.eth1"),
            ("4.vap3", "1.4.vap3"),
        ];
        for (input, expected) in cases {
            assert_eq!(Eid::parse(input).unwrap().to_string(), expected, "{input}");
        }
    }

    #[test]
    fn rejects_wrong_segment_counts() {
        for bad in ["sta0000", "1.1.1.sta0000", ""] {
            assert!(
                matches!(Eid::parse(bad), Err(CoreError::MalformedEid { .. })),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn inventory_keys_keep_dotted_port_names() {
        let vlan = Eid::parse_port_key("1.1.eth1.100").unwrap();
        assert_eq!(vlan, Eid::new(1, 1, "eth1.100"));
        assert_eq!(vlan.port_path(), "/port/1/1/eth1.100");
        assert_eq!(Eid::parse_port_key("1.2.sta0000").unwrap(), Eid::new(1, 2, "sta0000"));
        assert_eq!(Eid::parse_port_key("3.wiphy0").unwrap(), Eid::new(1, 3, "wiphy0"));
        assert!(Eid::parse_port_key("1.x.eth1.100").is_err());
        assert!(Eid::parse_port_key("not-an-eid").is_err());
    }

    #[test]
    fn rejects_empty_port_and_non_numeric_ids() {
        assert!(Eid::parse("1.1.").is_err());
        assert!(Eid::parse("x.1.sta0").is_err());
        assert!(Eid::parse("1.y.sta0").is_err());
    }

    #[test]
    fn ordering_is_shelf_resource_port() {
        let mut eids = vec![
            Eid::new(1, 2, "sta0000"),
            Eid::new(1, 1, "sta0001"),
            Eid::new(1, 1, "sta0000"),
        ];
        eids.sort();
        assert_eq!(
            eids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["1.1.sta0000", "1.1.sta0001", "1.2.sta0000"]
        );
    }

    #[test]
    fn eid_serializes_as_string() {
        let eid = Eid::new(1, 1, "sta0000");
        let json = serde_json::to_string(&eid).unwrap();
        assert_eq!(json, "\"1.1.sta0000\"");
        let back: Eid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, eid);
    }

    #[test]
    fn resource_id_parses_two_segments() {
        let id: ResourceId = "1.3".parse().unwrap();
        assert_eq!(id, ResourceId { shelf: 1, resource: 3 });
        assert!("1.3.eth0".parse::<ResourceId>().is_err());
    }

    #[test]
    fn series_with_default_padding() {
        let names: Vec<String> = generate_series("sta", 0, 2, DEFAULT_PADDING).iter().collect();
        assert_eq!(names, ["sta0000", "sta0001", "sta0002"]);
    }

    #[test]
    fn series_with_reversed_bounds_is_empty() {
        let series = generate_series("sta", 5, 2, DEFAULT_PADDING);
        assert!(series.is_empty());
        assert_eq!(series.iter().count(), 0);
    }

    #[test]
    fn series_is_restartable() {
        let series = generate_series("wlan", 8, 11, 100);
        let first: Vec<String> = series.iter().collect();
        let second: Vec<String> = (&series).into_iter().collect();
        assert_eq!(first, ["wlan08", "wlan09", "wlan10", "wlan11"]);
        assert_eq!(first, second);
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn series_pins_names_to_radio() {
        let radio = Eid::parse("1.2.wiphy1").unwrap();
        let series = generate_series("sta", 0, 1, DEFAULT_PADDING);
        let slots: Vec<StationSlot> = series.on_radio(&radio).collect();
        assert_eq!(slots[0].eid, Eid::new(1, 2, "sta0000"));
        assert_eq!(slots[1].eid.to_string(), "1.2.sta0001");
        assert!(slots.iter().all(|s| s.radio == "wiphy1"));
    }

    #[test]
    fn range_pattern_matches_trailing_digits() {
        assert!(match_pattern("sta0005", "sta[0000..0009]"));
        assert!(!match_pattern("sta0015", "sta[0000..0009]"));
        assert!(!match_pattern("wlan0005", "sta[0000..0009]"));
        assert!(!match_pattern("sta", "sta[0000..0009]"));
        assert!(!match_pattern("sta00x5", "sta[0000..0009]"));
    }

    #[test]
    fn plus_and_star_are_both_prefix_matches() {
        for pattern in ["sta+", "sta*"] {
            assert!(match_pattern("sta0000", pattern));
            assert!(match_pattern("sta", pattern));
            assert!(!match_pattern("wlan0", pattern));
        }
        assert_eq!(
            NamePattern::parse("sta*").matches("stax"),
            NamePattern::parse("sta+").matches("stax")
        );
    }

    #[test]
    fn plain_names_match_exactly() {
        assert_eq!(NamePattern::parse("eth1"), NamePattern::Exact("eth1".into()));
        assert!(match_pattern("eth1", "eth1"));
        assert!(!match_pattern("eth10", "eth1"));
        // Lone markers carry no prefix, so they only match themselves.
        assert!(!match_pattern("sta0", "+"));
    }
}
