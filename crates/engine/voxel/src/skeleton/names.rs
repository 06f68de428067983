//! Marker naming grammar
//!
//! A skeleton node name holds one or more markers joined by `__`. Each marker
//! is `name[-parent[-group]]`, and the first character of `name` picks its kind.

/// Kind selected by a marker's leading character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Null,
    BoneStart,
    BoneEnd,
    Hardpoint,
}

impl RawKind {
    pub fn of(name: &str) -> Option<RawKind> {
        match name.as_bytes().first()? {
            b'N' => Some(RawKind::Null),
            b'B' => Some(RawKind::BoneStart),
            b'E' => Some(RawKind::BoneEnd),
            b'H' => Some(RawKind::Hardpoint),
            _ => None,
        }
    }
}

/// One `name-parent-group` segment, borrowed from the node name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerName<'a> {
    pub name: &'a str,
    /// Empty when unparented
    pub parent: &'a str,
    /// Empty when unspecified; may itself contain dashes
    pub group: &'a str,
}

impl<'a> MarkerName<'a> {
    pub fn parse(segment: &'a str) -> Self {
        let mut parts = segment.splitn(3, '-');
        Self {
            name: parts.next().unwrap_or_default(),
            parent: parts.next().unwrap_or_default(),
            group: parts.next().unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> Option<RawKind> {
        RawKind::of(self.name)
    }
}

/// Split a node name into marker segments
///
/// Returns `None` if any segment other than a trailing one is empty.
pub fn segments(node_name: &str) -> Option<Vec<MarkerName<'_>>> {
    let raw: Vec<&str> = node_name.split("__").collect();
    let last = raw.len() - 1;
    let mut out = Vec::with_capacity(raw.len());
    for (i, segment) in raw.into_iter().enumerate() {
        if segment.is_empty() {
            if i == last && i > 0 {
                continue;
            }
            return None;
        }
        out.push(MarkerName::parse(segment));
    }
    Some(out)
}

/// End marker paired with a bone: leading `B` replaced by `E`
pub fn end_marker_name(bone: &str) -> String {
    format!("E{}", bone.get(1..).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment() {
        assert_eq!(
            MarkerName::parse("BL_Arm-N_Root-arms"),
            MarkerName {
                name: "BL_Arm",
                parent: "N_Root",
                group: "arms"
            }
        );
        assert_eq!(MarkerName::parse("N_Root").parent, "");
        assert_eq!(MarkerName::parse("HL_Hand-BL_Arm-grip-left").group, "grip-left");
    }

    #[test]
    fn test_segments() {
        let parsed = segments("BL_Arm-N_Root__EL_Arm").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "BL_Arm");
        assert_eq!(parsed[1].name, "EL_Arm");
        assert_eq!(parsed[1].parent, "");

        assert_eq!(segments("N_Root__").unwrap().len(), 1);
        assert!(segments("N_Root____EL_Arm").is_none());
        assert!(segments("").is_none());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(RawKind::of("N_Root"), Some(RawKind::Null));
        assert_eq!(RawKind::of("BL_Arm"), Some(RawKind::BoneStart));
        assert_eq!(RawKind::of("EL_Arm"), Some(RawKind::BoneEnd));
        assert_eq!(RawKind::of("HNock"), Some(RawKind::Hardpoint));
        assert_eq!(RawKind::of("Reference"), None);
        assert_eq!(RawKind::of(""), None);
    }

    #[test]
    fn test_end_marker_name() {
        assert_eq!(end_marker_name("BL_Arm"), "EL_Arm");
        assert_eq!(end_marker_name("BSpine"), "ESpine");
    }
}
