//! Reference → target custom format id mapping.

use arrkit::{CustomFormat, QualityProfile};
use std::collections::{BTreeMap, HashMap};

/// Maps a reference instance's custom format ids to the ids of the
/// same-named formats on a target instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRemap {
    ids: BTreeMap<i64, i64>,
}

impl IdRemap {
    /// Pair formats by name. Formats without an id on either side are skipped.
    pub fn build(reference: &[CustomFormat], target: &[CustomFormat]) -> Self {
        let by_name: HashMap<&str, i64> = target
            .iter()
            .filter_map(|cf| cf.id.map(|id| (cf.name.as_str(), id)))
            .collect();

        let ids = reference
            .iter()
            .filter_map(|cf| {
                let reference_id = cf.id?;
                by_name.get(cf.name.as_str()).map(|&id| (reference_id, id))
            })
            .collect();

        Self { ids }
    }

    pub fn get(&self, reference_id: i64) -> Option<i64> {
        self.ids.get(&reference_id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Overwrite entries with those of `newer`
    pub fn refresh(&mut self, newer: IdRemap) {
        self.ids.extend(newer.ids);
    }

    /// Reference profile as a target payload: no id, format ids rewritten.
    ///
    /// Format ids with no mapping are left as they are.
    pub fn profile_payload(&self, profile: &QualityProfile) -> QualityProfile {
        let mut payload = profile.clone();
        payload.id = None;
        for item in &mut payload.format_items {
            if let Some(id) = self.get(item.format) {
                item.format = id;
            }
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrkit::FormatItem;

    fn cf(id: i64, name: &str) -> CustomFormat {
        CustomFormat {
            id: Some(id),
            name: name.to_string(),
            ..CustomFormat::default()
        }
    }

    #[test]
    fn test_build_pairs_by_name() {
        let reference = vec![cf(1, "x265"), cf(2, "HDR"), cf(3, "Remux")];
        let target = vec![cf(10, "HDR"), cf(11, "x265")];

        let remap = IdRemap::build(&reference, &target);

        assert_eq!(remap.len(), 2);
        assert_eq!(remap.get(1), Some(11));
        assert_eq!(remap.get(2), Some(10));
        assert_eq!(remap.get(3), None);
    }

    #[test]
    fn test_refresh_overrides_entries() {
        let mut remap = IdRemap::build(&[cf(1, "a")], &[cf(5, "a")]);
        remap.refresh(IdRemap::build(&[cf(1, "a"), cf(2, "b")], &[cf(6, "a"), cf(7, "b")]));

        assert_eq!(remap.get(1), Some(6));
        assert_eq!(remap.get(2), Some(7));
    }

    #[test]
    fn test_profile_payload_rewrites_formats() {
        let remap = IdRemap::build(&[cf(1, "a")], &[cf(9, "a")]);
        let profile = QualityProfile {
            id: Some(4),
            name: "HD".to_string(),
            format_items: vec![
                FormatItem {
                    format: 1,
                    score: 100,
                    ..FormatItem::default()
                },
                FormatItem {
                    format: 2,
                    score: -10,
                    ..FormatItem::default()
                },
            ],
            ..QualityProfile::default()
        };

        let payload = remap.profile_payload(&profile);

        assert_eq!(payload.id, None);
        assert_eq!(payload.format_items[0].format, 9);
        assert_eq!(payload.format_items[0].score, 100);
        assert_eq!(payload.format_items[1].format, 2);
    }
}
