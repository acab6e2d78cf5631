//! Fuzz target: `DeviceAddress::parse`
//!
//! Arbitrary strings must either be rejected or come back in canonical
//! upper-case form that parses to itself.
//!
//! cargo fuzz run fuzz_device_address

#![no_main]

use gatt_binder::gatt::DeviceAddress;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|raw: &str| {
    if let Ok(addr) = DeviceAddress::parse(raw) {
        let canonical = addr.as_str();
        assert_eq!(canonical.len(), 17);
        assert_eq!(canonical, raw.to_ascii_uppercase());
        assert_eq!(DeviceAddress::parse(canonical), Ok(addr.clone()));
    }
});
