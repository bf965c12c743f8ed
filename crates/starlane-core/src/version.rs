//! Snapshot versions and the upgrade chain between them.
//!
//! Upgrades operate on raw JSON so that old documents never need a typed
//! representation of their own.

use serde_json::{json, Map, Value};

use crate::error::VersionError;

/// Version written by this build.
pub const CURRENT_VERSION: &str = "alpha_2.0.0";

type Upgrade = fn(&mut Map<String, Value>);

/// Every version ever shipped, oldest first, with the transform to the next one.
const VERSIONS: &[(&str, Option<Upgrade>)] = &[
    ("infdev_1", None),
    ("infdev_2", None),
    ("infdev_3", None),
    ("infdev_4", None),
    ("infdev_5", None),
    ("infdev_6", None),
    ("infdev_7", None),
    ("infdev_8", None),
    ("infdev_9", None),
    ("infdev_10", None),
    ("infdev_11", None),
    ("infdev_12", None),
    ("alpha_1.0.0", None),
    ("alpha_1.1.0", None),
    ("alpha_1.2.0", None),
    ("alpha_1.2.1", None),
    ("alpha_1.3.0", None),
    ("alpha_1.3.1", None),
    ("alpha_1.4.0", None),
    ("alpha_1.4.1", None),
    ("alpha_1.4.2", None),
    ("alpha_1.4.3", Some(add_velocity)),
    ("alpha_1.4.4", Some(add_targetable_and_rename_cooldown)),
    (CURRENT_VERSION, None),
];

pub fn is_known(version: &str) -> bool {
    VERSIONS.iter().any(|(v, _)| *v == version)
}

/// Bring a snapshot document up to `CURRENT_VERSION` in place.
pub fn upgrade(document: &mut Value) -> Result<(), VersionError> {
    let root = document
        .as_object_mut()
        .ok_or(VersionError::Missing)?;
    let version = root
        .get("version")
        .and_then(Value::as_str)
        .ok_or(VersionError::Missing)?
        .to_string();

    let start = VERSIONS
        .iter()
        .position(|(v, _)| *v == version)
        .ok_or_else(|| VersionError::Unknown(version.clone()))?;

    for (index, (from, step)) in VERSIONS.iter().enumerate().skip(start) {
        if *from == CURRENT_VERSION {
            break;
        }
        let step = (*step).ok_or_else(|| VersionError::Unsupported(version.clone()))?;
        step(root);
        let (to, _) = VERSIONS[index + 1];
        root.insert("version".into(), Value::String(to.to_string()));
    }
    Ok(())
}

fn entities_mut(root: &mut Map<String, Value>) -> impl Iterator<Item = &mut Map<String, Value>> {
    root.get_mut("entities")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flat_map(|entities| entities.iter_mut())
        .filter_map(Value::as_object_mut)
}

fn add_velocity(root: &mut Map<String, Value>) {
    for entity in entities_mut(root) {
        entity
            .entry("velocity")
            .or_insert_with(|| json!([0.0, 0.0, 0.0]));
    }
}

fn add_targetable_and_rename_cooldown(root: &mut Map<String, Value>) {
    for entity in entities_mut(root) {
        let targetable = matches!(
            entity.get("entityType").and_then(Value::as_str),
            Some("ship")
        );
        entity
            .entry("isTargetable")
            .or_insert(Value::Bool(targetable));
        if let Some(cooldown) = entity.remove("jumpCoolDown") {
            entity.insert("jumpCooldown".into(), cooldown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_is_untouched() {
        let mut doc = json!({ "version": CURRENT_VERSION, "entities": [] });
        let before = doc.clone();
        upgrade(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_upgrade_chain_from_1_4_3() {
        let mut doc = json!({
            "version": "alpha_1.4.3",
            "entities": [
                { "id": "a", "entityType": "ship", "jumpCoolDown": 12 },
                { "id": "b", "entityType": "player" }
            ]
        });
        upgrade(&mut doc).unwrap();
        assert_eq!(doc["version"], CURRENT_VERSION);
        let ship = &doc["entities"][0];
        assert_eq!(ship["velocity"], json!([0.0, 0.0, 0.0]));
        assert_eq!(ship["isTargetable"], true);
        assert_eq!(ship["jumpCooldown"], 12);
        assert!(ship.get("jumpCoolDown").is_none());
        assert_eq!(doc["entities"][1]["isTargetable"], false);
    }

    #[test]
    fn test_old_versions_are_unsupported() {
        let mut doc = json!({ "version": "infdev_7" });
        assert_eq!(
            upgrade(&mut doc),
            Err(VersionError::Unsupported("infdev_7".into()))
        );
        let mut doc = json!({ "version": "beta_9" });
        assert_eq!(upgrade(&mut doc), Err(VersionError::Unknown("beta_9".into())));
        let mut doc = json!({ "name": "untagged" });
        assert_eq!(upgrade(&mut doc), Err(VersionError::Missing));
    }
}
