//! Vendor Resolution
//!
//! Resolves a manufacturer string from the hardware address OUI prefix
//! when the sensor did not already report one. The built-in table only
//! carries prefixes that matter to threat signatures; everything else
//! resolves to "Unknown".

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::logic::device::VENDOR_UNKNOWN;

/// Colon-separated MAC-48, already upper-cased by sanitization
static MAC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-F]{2}(:[0-9A-F]{2}){5}$").expect("static MAC pattern"));

/// OUI prefix (first three octets) -> manufacturer
static OUI_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Drone manufacturers
        ("60:60:1F", "DJI Technology Co."),
        ("48:1C:B9", "DJI Technology Co."),
        ("34:D2:62", "DJI Technology Co."),
        ("90:3A:E6", "Parrot SA"),
        ("A0:14:3D", "Parrot SA"),
        // Pentest / attack hardware
        ("00:13:37", "Hak5 LLC"),
        ("02:CA:FF", "Hak5 LLC"),
        // Long-range Wi-Fi
        ("00:C0:CA", "Alfa Network Inc."),
        ("4C:5E:0C", "MikroTik"),
        ("64:D1:54", "MikroTik"),
        // BLE tracker tags
        ("E4:5F:01", "Tile, Inc."),
        ("D0:03:4B", "Apple, Inc."),
        ("F0:D1:A9", "Apple, Inc."),
        ("AC:5F:3E", "Samsung Electronics"),
        ("C8:69:CD", "Chipolo d.o.o."),
    ])
});

/// Resolve the vendor for a sighting.
///
/// A sensor-reported vendor always wins; otherwise the OUI prefix is
/// looked up for MAC-shaped identifiers. Randomized (locally administered)
/// addresses carry no registered OUI and fall through to "Unknown".
pub fn resolve(id: &str, reported: Option<&str>) -> String {
    if let Some(v) = reported {
        let v = v.trim();
        if !v.is_empty() {
            return v.to_string();
        }
    }

    if MAC_RE.is_match(id) {
        if let Some(vendor) = OUI_TABLE.get(&id[..8]) {
            return (*vendor).to_string();
        }
    }

    VENDOR_UNKNOWN.to_string()
}

/// Whether the vendor string carries real fingerprint information
pub fn is_resolved(vendor: &str) -> bool {
    !vendor.is_empty() && vendor != VENDOR_UNKNOWN
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_vendor_wins() {
        assert_eq!(
            resolve("60:60:1F:AA:BB:CC", Some("Custom Corp")),
            "Custom Corp"
        );
    }

    #[test]
    fn test_oui_lookup() {
        assert_eq!(resolve("60:60:1F:AA:BB:CC", None), "DJI Technology Co.");
        assert_eq!(resolve("E4:5F:01:00:11:22", None), "Tile, Inc.");
    }

    #[test]
    fn test_unknown_prefix_is_unresolved() {
        assert_eq!(resolve("DE:AD:BE:EF:00:01", None), VENDOR_UNKNOWN);
    }

    #[test]
    fn test_non_mac_id_is_unresolved() {
        assert_eq!(resolve("not-a-mac", None), VENDOR_UNKNOWN);
    }

    #[test]
    fn test_blank_reported_vendor_falls_through() {
        assert_eq!(resolve("4C:5E:0C:11:22:33", Some("  ")), "MikroTik");
    }

    #[test]
    fn test_is_resolved() {
        assert!(is_resolved("DJI Technology Co."));
        assert!(!is_resolved(VENDOR_UNKNOWN));
        assert!(!is_resolved(""));
    }
}
