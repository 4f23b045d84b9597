//! Normalization of the two switching-interface response shapes.
//!
//! Modern device software reports a per-interface tagging attribute; legacy
//! software reports a port mode instead. Both are flattened into
//! [`PortTagness`] records keyed by the physical interface name, with any
//! logical-unit suffix stripped so the rows match the discovered interface
//! names.

use tracing::debug;

use crate::device::{LegacySwitchingPort, PortTagness, SwitchingPort, Tagness};

/// Strips a logical-unit suffix: `ge-0/0/1.0` → `ge-0/0/1`.
#[must_use]
pub fn strip_unit(interface: &str) -> &str {
    interface
        .split_once('.')
        .map_or(interface, |(physical, _)| physical)
}

/// Normalizes the modern response shape.
///
/// Interfaces with an unrecognized tagging attribute are skipped.
#[must_use]
pub fn normalize_modern(ports: &[SwitchingPort]) -> Vec<PortTagness> {
    ports
        .iter()
        .filter_map(|port| {
            let tagness = match port.tagging.trim() {
                "tagged" => Tagness::Tagged,
                "untagged" => Tagness::Untagged,
                other => {
                    debug!("Skipping {} with tagging '{other}'", port.interface);
                    return None;
                }
            };
            Some(PortTagness {
                interface: strip_unit(&port.interface).to_string(),
                tagness,
            })
        })
        .collect()
}

/// Normalizes the legacy response shape: trunk ports carry tagged traffic,
/// access ports untagged.
#[must_use]
pub fn normalize_legacy(ports: &[LegacySwitchingPort]) -> Vec<PortTagness> {
    ports
        .iter()
        .filter_map(|port| {
            let tagness = match port.port_mode.trim() {
                "trunk" => Tagness::Tagged,
                "access" => Tagness::Untagged,
                other => {
                    debug!("Skipping {} with port mode '{other}'", port.interface);
                    return None;
                }
            };
            Some(PortTagness {
                interface: strip_unit(&port.interface).to_string(),
                tagness,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_unit() {
        assert_eq!(strip_unit("ge-0/0/1.0"), "ge-0/0/1");
        assert_eq!(strip_unit("ge-0/0/1"), "ge-0/0/1");
        assert_eq!(strip_unit("xe-0/1/0.100"), "xe-0/1/0");
    }

    #[test]
    fn test_modern_shape() {
        let ports = vec![
            SwitchingPort {
                interface: "ge-0/0/1.0".into(),
                tagging: "tagged".into(),
            },
            SwitchingPort {
                interface: "ge-0/0/2.0".into(),
                tagging: "untagged".into(),
            },
            SwitchingPort {
                interface: "ge-0/0/3.0".into(),
                tagging: "mystery".into(),
            },
        ];

        let normalized = normalize_modern(&ports);
        assert_eq!(
            normalized,
            vec![
                PortTagness {
                    interface: "ge-0/0/1".into(),
                    tagness: Tagness::Tagged,
                },
                PortTagness {
                    interface: "ge-0/0/2".into(),
                    tagness: Tagness::Untagged,
                },
            ]
        );
    }

    #[test]
    fn test_legacy_shape_maps_port_modes() {
        let ports = vec![
            LegacySwitchingPort {
                interface: "ge-0/0/1.0".into(),
                port_mode: "trunk".into(),
            },
            LegacySwitchingPort {
                interface: "ge-0/0/2.0".into(),
                port_mode: "access".into(),
            },
        ];

        let normalized = normalize_legacy(&ports);
        assert_eq!(normalized[0].tagness, Tagness::Tagged);
        assert_eq!(normalized[1].tagness, Tagness::Untagged);
    }

    #[test]
    fn test_both_shapes_normalize_identically() {
        let modern = normalize_modern(&[SwitchingPort {
            interface: "ge-0/0/1.0".into(),
            tagging: "tagged".into(),
        }]);
        let legacy = normalize_legacy(&[LegacySwitchingPort {
            interface: "ge-0/0/1.0".into(),
            port_mode: "trunk".into(),
        }]);

        assert_eq!(modern, legacy);
    }
}
