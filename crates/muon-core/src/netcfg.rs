//! Subnet and DHCP range editing.
//!
//! The base IP and DHCP bounds share octets 1–3; only the last octets
//! differ. [`SubnetEditor`] holds the per-field text states the form
//! binds to, clamps each edit to its field's range, and recomposes the
//! full `(base_ip, dhcp_start, dhcp_end)` triple on every change —
//! there is no commit-on-blur, every keystroke is live.

use std::fmt;

pub const DEFAULT_BASE_IP: [u8; 4] = [192, 168, 8, 1];
pub const DEFAULT_DHCP_START: u8 = 100;
pub const DEFAULT_DHCP_END: u8 = 200;

// ── Validated configuration ─────────────────────────────────────────

/// A /24 subnet plan: base IP plus DHCP last-octet bounds.
///
/// Start/end ordering is deliberately NOT validated here — the backend
/// owns that check and reports its own error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetConfig {
    pub octets: [u8; 4],
    pub dhcp_start: u8,
    pub dhcp_end: u8,
}

impl Default for SubnetConfig {
    fn default() -> Self {
        Self {
            octets: DEFAULT_BASE_IP,
            dhcp_start: DEFAULT_DHCP_START,
            dhcp_end: DEFAULT_DHCP_END,
        }
    }
}

impl SubnetConfig {
    /// Rebuild from the backend's stored `ip_address` and `dhcp_range`
    /// (`"start,end,lease"`). Any unparseable part falls back to its
    /// default rather than failing — stored settings are advisory.
    pub fn from_stored(ip_address: Option<&str>, dhcp_range: Option<&str>) -> Self {
        let mut config = Self::default();

        if let Some(parsed) = ip_address.and_then(parse_ipv4_octets) {
            config.octets = parsed;
        }

        if let Some(range) = dhcp_range {
            let mut parts = range.split(',');
            let start = parts.next().and_then(parse_ipv4_octets).map(|o| o[3]);
            let end = parts.next().and_then(parse_ipv4_octets).map(|o| o[3]);
            if let Some(start) = start {
                config.dhcp_start = start;
            }
            if let Some(end) = end {
                config.dhcp_end = end;
            }
        }

        config
    }

    pub fn base_ip(&self) -> String {
        let [a, b, c, d] = self.octets;
        format!("{a}.{b}.{c}.{d}")
    }

    fn host(&self, last: u8) -> String {
        let [a, b, c, _] = self.octets;
        format!("{a}.{b}.{c}.{last}")
    }

    pub fn dhcp_start_addr(&self) -> String {
        self.host(self.dhcp_start)
    }

    pub fn dhcp_end_addr(&self) -> String {
        self.host(self.dhcp_end)
    }

    pub fn triple(&self) -> SubnetTriple {
        SubnetTriple {
            base_ip: self.base_ip(),
            dhcp_start: self.dhcp_start_addr(),
            dhcp_end: self.dhcp_end_addr(),
        }
    }
}

fn parse_ipv4_octets(s: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = s.trim().split('.');
    for slot in &mut octets {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

/// The recomposed address triple emitted on every edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetTriple {
    pub base_ip: String,
    pub dhcp_start: String,
    pub dhcp_end: String,
}

impl fmt::Display for SubnetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (DHCP {}-{})",
            self.base_ip, self.dhcp_start, self.dhcp_end
        )
    }
}

// ── Field ranges ────────────────────────────────────────────────────

/// Which editable field an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetField {
    /// Base-IP octets 1–3: full 0..=255.
    Octet(usize),
    /// Base-IP last octet: host range 1..=254.
    LastOctet,
    /// DHCP bound last octets: host range 1..=254, start/end independent.
    RangeStart,
    RangeEnd,
}

impl SubnetField {
    fn bounds(self) -> (u16, u16) {
        match self {
            Self::Octet(_) => (0, 255),
            Self::LastOctet | Self::RangeStart | Self::RangeEnd => (1, 254),
        }
    }
}

// ── Editor ──────────────────────────────────────────────────────────

/// Controlled-input editing model over a [`SubnetConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetEditor {
    config: SubnetConfig,
}

impl SubnetEditor {
    pub fn new(config: SubnetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> SubnetConfig {
        self.config
    }

    pub fn triple(&self) -> SubnetTriple {
        self.config.triple()
    }

    /// Current text value of a field (what the form displays).
    pub fn field_text(&self, field: SubnetField) -> String {
        match field {
            SubnetField::Octet(i) => self.config.octets[i.min(2)].to_string(),
            SubnetField::LastOctet => self.config.octets[3].to_string(),
            SubnetField::RangeStart => self.config.dhcp_start.to_string(),
            SubnetField::RangeEnd => self.config.dhcp_end.to_string(),
        }
    }

    /// Apply one edit. Input must be 0–3 ASCII digits (anything else is
    /// rejected outright, leaving state untouched); the parsed value is
    /// clamped to the field's range, empty input reads as zero before
    /// clamping. Returns the recomposed triple on acceptance.
    pub fn set_field(&mut self, field: SubnetField, input: &str) -> Option<SubnetTriple> {
        let value = sanitize(input, field)?;
        match field {
            SubnetField::Octet(i) if i < 3 => self.config.octets[i] = value,
            SubnetField::Octet(_) | SubnetField::LastOctet => self.config.octets[3] = value,
            SubnetField::RangeStart => self.config.dhcp_start = value,
            SubnetField::RangeEnd => self.config.dhcp_end = value,
        }
        Some(self.triple())
    }
}

/// Digits-only check, then clamp into the field's range.
fn sanitize(input: &str, field: SubnetField) -> Option<u8> {
    if input.len() > 3 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let raw: u16 = input.parse().unwrap_or(0);
    let (min, max) = field.bounds();
    #[allow(clippy::cast_possible_truncation)]
    Some(raw.clamp(min, max) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn network_octets_clamp_to_full_range() {
        let mut editor = SubnetEditor::new(SubnetConfig::default());
        let triple = editor.set_field(SubnetField::Octet(0), "999").expect("accepted");
        assert_eq!(triple.base_ip, "255.168.8.1");

        let triple = editor.set_field(SubnetField::Octet(1), "0").expect("accepted");
        assert_eq!(triple.base_ip, "255.0.8.1");
    }

    #[test]
    fn host_fields_clamp_to_1_254() {
        let mut editor = SubnetEditor::new(SubnetConfig::default());
        let triple = editor.set_field(SubnetField::LastOctet, "0").expect("accepted");
        assert_eq!(triple.base_ip, "192.168.8.1");

        let triple = editor.set_field(SubnetField::LastOctet, "255").expect("accepted");
        assert_eq!(triple.base_ip, "192.168.8.254");

        let triple = editor.set_field(SubnetField::RangeStart, "300").expect("accepted");
        assert_eq!(triple.dhcp_start, "192.168.8.254");
    }

    #[test]
    fn non_numeric_input_is_rejected_without_state_change() {
        let mut editor = SubnetEditor::new(SubnetConfig::default());
        assert!(editor.set_field(SubnetField::Octet(0), "19a").is_none());
        assert!(editor.set_field(SubnetField::RangeEnd, "2000").is_none());
        assert_eq!(editor.triple().base_ip, "192.168.8.1");
        assert_eq!(editor.config().dhcp_end, 200);
    }

    #[test]
    fn empty_input_reads_as_zero_then_clamps() {
        let mut editor = SubnetEditor::new(SubnetConfig::default());
        let triple = editor.set_field(SubnetField::Octet(2), "").expect("accepted");
        assert_eq!(triple.base_ip, "192.168.0.1");

        // Host fields clamp the zero up to 1.
        let triple = editor.set_field(SubnetField::RangeStart, "").expect("accepted");
        assert_eq!(triple.dhcp_start, "192.168.0.1");
    }

    #[test]
    fn dhcp_bounds_share_network_octets_with_base_ip() {
        let mut editor = SubnetEditor::new(SubnetConfig::default());
        let triple = editor.set_field(SubnetField::Octet(2), "42").expect("accepted");
        assert_eq!(triple.base_ip, "192.168.42.1");
        assert_eq!(triple.dhcp_start, "192.168.42.100");
        assert_eq!(triple.dhcp_end, "192.168.42.200");
    }

    #[test]
    fn start_end_ordering_is_not_enforced() {
        let mut editor = SubnetEditor::new(SubnetConfig::default());
        editor.set_field(SubnetField::RangeStart, "210").expect("accepted");
        let triple = editor.triple();
        // 210 > 200: accepted locally, the backend is the one to reject it.
        assert_eq!(triple.dhcp_start, "192.168.8.210");
        assert_eq!(triple.dhcp_end, "192.168.8.200");
    }

    #[test]
    fn stored_settings_roundtrip() {
        let config = SubnetConfig::from_stored(
            Some("10.0.5.1"),
            Some("10.0.5.50,10.0.5.99,12h"),
        );
        assert_eq!(config.base_ip(), "10.0.5.1");
        assert_eq!(config.dhcp_start_addr(), "10.0.5.50");
        assert_eq!(config.dhcp_end_addr(), "10.0.5.99");
    }

    #[test]
    fn malformed_stored_settings_fall_back_to_defaults() {
        let config = SubnetConfig::from_stored(Some("not-an-ip"), Some("garbage"));
        assert_eq!(config, SubnetConfig::default());

        let partial = SubnetConfig::from_stored(None, Some("192.168.8.77,bogus,12h"));
        assert_eq!(partial.dhcp_start, 77);
        assert_eq!(partial.dhcp_end, DEFAULT_DHCP_END);
    }
}
