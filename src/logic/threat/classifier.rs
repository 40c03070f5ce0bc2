//! Threat Classifier
//!
//! Pure signature lookup: vendor, advertised name, signal, radio class in;
//! threat level out. Deterministic priority order, first match wins, no
//! accumulation. Never inspects time, position, or any other behavioral
//! state - that is the escalation engine's job.

use super::rules::{self, SignatureThresholds, HIGH_THREAT_VENDORS, TRACKER_TAG_VENDORS};
use super::types::ThreatLevel;
use crate::logic::device::{DeviceClass, VENDOR_UNKNOWN};

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify a device's static signature
pub fn classify(
    vendor: &str,
    display_name: Option<&str>,
    signal_dbm: i32,
    device_class: DeviceClass,
) -> ThreatLevel {
    classify_with_thresholds(
        vendor,
        display_name,
        signal_dbm,
        device_class,
        &SignatureThresholds::default(),
    )
}

/// Classification with custom thresholds
pub fn classify_with_thresholds(
    vendor: &str,
    display_name: Option<&str>,
    signal_dbm: i32,
    device_class: DeviceClass,
    thresholds: &SignatureThresholds,
) -> ThreatLevel {
    // 1. Known surveillance hardware vendor
    if rules::vendor_in_list(vendor, HIGH_THREAT_VENDORS) {
        return ThreatLevel::High;
    }

    // 2. BLE tracker tag
    if device_class == DeviceClass::BluetoothLe
        && vendor != VENDOR_UNKNOWN
        && rules::vendor_in_list(vendor, TRACKER_TAG_VENDORS)
    {
        return ThreatLevel::Suspicious;
    }

    // 3. Hidden network at close range
    if display_name.is_none() && signal_dbm > thresholds.hidden_strong_signal_dbm {
        return ThreatLevel::Suspicious;
    }

    ThreatLevel::Unknown
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_vendor_is_high() {
        let level = classify("DJI Technology Co.", Some("Mavic-RC"), -80, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::High);
    }

    #[test]
    fn test_pentest_hardware_is_high() {
        let level = classify("Hak5 LLC", None, -90, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::High);
    }

    #[test]
    fn test_vendor_match_is_case_insensitive() {
        let level = classify("MIKROTIK", Some("office-link"), -75, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::High);
    }

    #[test]
    fn test_ble_tracker_tag_is_suspicious() {
        let level = classify("Tile, Inc.", None, -85, DeviceClass::BluetoothLe);
        assert_eq!(level, ThreatLevel::Suspicious);
    }

    #[test]
    fn test_tracker_vendor_on_wifi_radio_is_not_flagged() {
        // Apple laptop on Wi-Fi with a visible SSID: rule 2 requires BLE
        let level = classify(
            "Apple, Inc.",
            Some("MacBook Hotspot"),
            -70,
            DeviceClass::ClientStation,
        );
        assert_eq!(level, ThreatLevel::Unknown);
    }

    #[test]
    fn test_hidden_strong_network_is_suspicious() {
        let level = classify(VENDOR_UNKNOWN, None, -45, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::Suspicious);
    }

    #[test]
    fn test_hidden_weak_network_is_unknown() {
        let level = classify(VENDOR_UNKNOWN, None, -65, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::Unknown);
    }

    #[test]
    fn test_visible_strong_network_is_unknown() {
        let level = classify(VENDOR_UNKNOWN, Some("CoffeeShopWifi"), -40, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::Unknown);
    }

    #[test]
    fn test_first_match_wins_over_later_rules() {
        // DJI + hidden + strong: rule 1 fires, not rule 3
        let level = classify("DJI", None, -40, DeviceClass::AccessPoint);
        assert_eq!(level, ThreatLevel::High);
    }

    #[test]
    fn test_custom_threshold_widens_hidden_rule() {
        let t = SignatureThresholds::high_sensitivity();
        let level = classify_with_thresholds(VENDOR_UNKNOWN, None, -55, DeviceClass::AccessPoint, &t);
        assert_eq!(level, ThreatLevel::Suspicious);
    }
}
