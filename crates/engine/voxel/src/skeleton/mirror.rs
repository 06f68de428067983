//! Left to right marker mirroring

use super::RawMarker;
use std::collections::BTreeMap;

/// Left prefixes and their right-side replacements
pub const MIRROR_PREFIXES: [(&str, &str); 4] = [("BL_", "BR_"), ("EL_", "ER_"), ("NL_", "NR_"), ("HL_", "HR_")];

/// Right-side name for a left-side marker, `None` if `name` has no left prefix
pub fn mirror_name(name: &str) -> Option<String> {
    MIRROR_PREFIXES
        .iter()
        .find_map(|(left, right)| name.strip_prefix(left).map(|rest| format!("{right}{rest}")))
}

/// Add a right-side copy of every left-side marker that lacks one
///
/// X is reflected about the position of `root`; parents are renamed with the
/// same prefix rule. The root itself is never copied, and copies of its
/// children stay attached to it. Returns the names that were added, in order.
pub(super) fn mirror_markers(raw: &mut BTreeMap<String, RawMarker>, root: &str) -> Vec<String> {
    let Some(root_x) = raw.get(root).map(|m| m.position.x) else {
        return Vec::new();
    };

    let additions: Vec<(String, RawMarker)> = raw
        .iter()
        .filter(|(name, _)| name.as_str() != root)
        .filter_map(|(name, marker)| {
            let mirrored = mirror_name(name)?;
            if raw.contains_key(&mirrored) {
                return None;
            }
            let mut position = marker.position;
            position.x = 2.0 * root_x - position.x;
            let parent = match mirror_name(&marker.parent) {
                Some(parent) if marker.parent != root => parent,
                _ => marker.parent.clone(),
            };
            Some((
                mirrored,
                RawMarker {
                    position,
                    parent,
                    group: marker.group.clone(),
                    source: marker.source.clone(),
                },
            ))
        })
        .collect();

    let added = additions.iter().map(|(name, _)| name.clone()).collect();
    raw.extend(additions);
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn marker(x: f32, parent: &str) -> RawMarker {
        RawMarker {
            position: Vec3::new(x, 1.0, 2.0),
            parent: parent.to_string(),
            group: String::new(),
            source: "test".to_string(),
        }
    }

    #[test]
    fn test_mirror_name() {
        assert_eq!(mirror_name("BL_Arm").as_deref(), Some("BR_Arm"));
        assert_eq!(mirror_name("HL_Hand_In").as_deref(), Some("HR_Hand_In"));
        assert_eq!(mirror_name("N_Root"), None);
        assert_eq!(mirror_name("BR_Arm"), None);
    }

    #[test]
    fn test_mirror_reflects_about_root() {
        let mut raw = BTreeMap::new();
        raw.insert("BL_Forearm".to_string(), marker(3.0, "BL_Arm"));
        raw.insert("BL_Arm".to_string(), marker(1.5, "N_Root"));
        raw.insert("N_Root".to_string(), marker(1.0, ""));

        let added = mirror_markers(&mut raw, "N_Root");

        assert_eq!(added, vec!["BR_Arm".to_string(), "BR_Forearm".to_string()]);
        assert_eq!(raw["BR_Arm"].position, Vec3::new(0.5, 1.0, 2.0));
        assert_eq!(raw["BR_Arm"].parent, "N_Root");
        assert_eq!(raw["BR_Forearm"].position.x, -1.0);
        assert_eq!(raw["BR_Forearm"].parent, "BR_Arm");
    }

    #[test]
    fn test_existing_right_side_is_kept() {
        let mut raw = BTreeMap::new();
        raw.insert("BL_Arm".to_string(), marker(2.0, "N_Root"));
        raw.insert("BR_Arm".to_string(), marker(-7.0, "N_Root"));
        raw.insert("N_Root".to_string(), marker(0.0, ""));

        assert!(mirror_markers(&mut raw, "N_Root").is_empty());
        assert_eq!(raw["BR_Arm"].position.x, -7.0);
    }

    #[test]
    fn test_left_root_is_not_copied() {
        let mut raw = BTreeMap::new();
        raw.insert("NL_Root".to_string(), marker(3.0, ""));
        raw.insert("HL_Tip".to_string(), marker(5.0, "NL_Root"));
        raw.insert("BL_Arm".to_string(), marker(4.0, "NL_Root"));
        raw.insert("HL_Hand".to_string(), marker(6.0, "BL_Arm"));

        let added = mirror_markers(&mut raw, "NL_Root");

        assert_eq!(added, vec!["BR_Arm", "HR_Hand", "HR_Tip"]);
        assert!(!raw.contains_key("NR_Root"));
        assert_eq!(raw["HR_Tip"].parent, "NL_Root");
        assert_eq!(raw["HR_Tip"].position.x, 1.0);
        assert_eq!(raw["BR_Arm"].parent, "NL_Root");
        assert_eq!(raw["HR_Hand"].parent, "BR_Arm");
    }
}
