//! VLAN reconciliation algorithm.
//!
//! One-way, additive sync: the device is authoritative for what exists, the
//! database accumulates what it has already recorded. Ids present live but
//! not stored are inserted; stored rows are never deleted or renamed, even
//! when absent from the live set or renamed on the device.

use std::collections::{BTreeMap, BTreeSet};

use crate::device::VlanInfo;
use crate::error::DeviceError;
use crate::store::VlanRow;

/// Deterministic name for a VLAN the device reported without one.
#[must_use]
pub fn default_vlan_name(vlan_id: u16) -> String {
    format!("auto-vlan-{vlan_id}")
}

/// Normalizes raw device VLAN rows into an integer-keyed id→name map.
///
/// Device-reported ids arrive as text; an unparseable id fails the whole
/// query. A missing or empty name gets the deterministic default.
///
/// # Errors
///
/// Returns a query error naming the offending id text.
pub fn normalize_vlans(raw: &[VlanInfo]) -> Result<BTreeMap<u16, String>, DeviceError> {
    let mut live = BTreeMap::new();
    for vlan in raw {
        let id: u16 = vlan.vlan_id.trim().parse().map_err(|_| {
            DeviceError::query("vlans", format!("unparseable VLAN id '{}'", vlan.vlan_id))
        })?;

        let name = match vlan.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => default_vlan_name(id),
        };
        live.entry(id).or_insert(name);
    }
    Ok(live)
}

/// Computes the rows to insert: live ids the store has not recorded yet.
#[must_use]
pub fn missing_vlans(live: &BTreeMap<u16, String>, stored: &[VlanRow]) -> Vec<VlanRow> {
    let stored_ids: BTreeSet<u16> = stored.iter().map(|row| row.vlan_id).collect();

    live.iter()
        .filter(|(id, _)| !stored_ids.contains(id))
        .map(|(id, name)| VlanRow {
            vlan_id: *id,
            name: name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: Option<&str>) -> VlanInfo {
        VlanInfo {
            vlan_id: id.to_string(),
            name: name.map(String::from),
        }
    }

    fn stored(pairs: &[(u16, &str)]) -> Vec<VlanRow> {
        pairs
            .iter()
            .map(|(id, name)| VlanRow {
                vlan_id: *id,
                name: (*name).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_normalize_parses_text_ids() {
        let live = normalize_vlans(&[raw("100", Some("auto-vlan")), raw(" 1000 ", None)])
            .expect("normalize");

        assert_eq!(live.get(&100).map(String::as_str), Some("auto-vlan"));
        assert_eq!(live.get(&1000).map(String::as_str), Some("auto-vlan-1000"));
    }

    #[test]
    fn test_normalize_rejects_garbage_id() {
        let err = normalize_vlans(&[raw("default", None)]).expect_err("must fail");
        assert!(err.to_string().contains("default"));
    }

    #[test]
    fn test_empty_name_gets_default() {
        let live = normalize_vlans(&[raw("7", Some("  "))]).expect("normalize");
        assert_eq!(live.get(&7).map(String::as_str), Some("auto-vlan-7"));
    }

    #[test]
    fn test_fresh_device_inserts_all_live_vlans() {
        // live {100: "auto-vlan", 1000: "auto-vlan-1000"}, stored {} →
        // exactly two rows with those ids and names.
        let live = normalize_vlans(&[
            raw("100", Some("auto-vlan")),
            raw("1000", Some("auto-vlan-1000")),
        ])
        .expect("normalize");

        let missing = missing_vlans(&live, &[]);
        assert_eq!(
            missing,
            vec![
                VlanRow {
                    vlan_id: 100,
                    name: "auto-vlan".into(),
                },
                VlanRow {
                    vlan_id: 1000,
                    name: "auto-vlan-1000".into(),
                },
            ]
        );
    }

    #[test]
    fn test_stored_vlans_never_deleted() {
        // live {100}, stored {100, 1000} → nothing inserted, 1000 untouched.
        let live = normalize_vlans(&[raw("100", Some("auto-vlan"))]).expect("normalize");
        let rows = stored(&[(100, "auto-vlan"), (1000, "auto-vlan-1000")]);

        let missing = missing_vlans(&live, &rows);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let live = normalize_vlans(&[raw("100", Some("users")), raw("200", Some("voice"))])
            .expect("normalize");

        let mut rows = stored(&[]);
        let first = missing_vlans(&live, &rows);
        assert_eq!(first.len(), 2);
        rows.extend(first);

        // Second pass with unchanged live data produces no new rows.
        let second = missing_vlans(&live, &rows);
        assert!(second.is_empty());
    }

    #[test]
    fn test_renamed_live_vlan_does_not_update_store() {
        let live = normalize_vlans(&[raw("100", Some("renamed"))]).expect("normalize");
        let rows = stored(&[(100, "original")]);

        // Present in both sets: no insert, and the caller never diffs names.
        assert!(missing_vlans(&live, &rows).is_empty());
    }
}
