#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use glam::{DVec2, DVec3};
    use serde_json::json;

    use crate::actions::{Action, ActionOutcome, MoveOrder, WarpOrder};
    use crate::components::{Fleet, Projectile};
    use crate::enums::*;
    use crate::events::{LevelEvent, SequencedEvent, ShipHolding};
    use crate::snapshot::*;
    use crate::storage::Storage;
    use crate::types::{EntityId, SystemId};

    fn ship_snapshot() -> EntitySnapshot {
        let mut storage = Storage::new(250.0);
        storage.add(ItemId::Metal, 12.5);
        EntitySnapshot {
            id: EntityId::new("ship-1"),
            name: "Mosquito".into(),
            system: SystemId::new("sys-1"),
            owner: Some(EntityId::new("player-1")),
            parent: None,
            position: DVec3::new(1.0, 2.0, 3.0),
            rotation: DVec3::new(0.0, 0.5, 0.0),
            velocity: DVec3::new(0.1, 0.0, -0.1),
            is_selected: false,
            is_targetable: true,
            path: vec![DVec3::new(10.0, 0.0, 0.0)],
            data: EntityData::Ship(ShipData {
                ship_type: ShipType::Mosquito,
                hp: 25.0,
                jump_cooldown: 7,
                storage,
                hardpoints: vec![EntityId::new("hp-1"), EntityId::new("hp-2")],
            }),
        }
    }

    /// Verify catalog keys round-trip through serde_json as snake_case strings.
    #[test]
    fn test_enum_serde() {
        for v in ShipType::ALL {
            let json = serde_json::to_string(&v).unwrap();
            let back: ShipType = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
        for v in ResearchId::ALL {
            let json = serde_json::to_string(&v).unwrap();
            let back: ResearchId = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
        assert_eq!(serde_json::to_string(&ItemId::AncientTech).unwrap(), "\"ancient_tech\"");
        assert_eq!(
            serde_json::to_string(&HardpointType::LaserCannonDouble).unwrap(),
            "\"laser_cannon_double\""
        );
    }

    #[test]
    fn test_action_wire_shape() {
        let action = Action::CreateShip {
            ship: ShipType::Inca,
            shipyard: None,
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "create_ship");
        assert_eq!(value["payload"]["ship"], "inca");

        let parsed: Action = serde_json::from_value(json!({
            "type": "warp",
            "payload": [{ "id": "s1", "target": "sys-2" }]
        }))
        .unwrap();
        assert_eq!(
            parsed,
            Action::Warp(vec![WarpOrder {
                id: EntityId::new("s1"),
                target: SystemId::new("sys-2"),
            }])
        );

        let parsed: Action = serde_json::from_value(json!({
            "type": "move",
            "payload": [{ "id": "s1", "target": [1.0, 2.0, 3.0] }]
        }))
        .unwrap();
        assert_eq!(
            parsed,
            Action::Move(vec![MoveOrder {
                id: EntityId::new("s1"),
                target: DVec3::new(1.0, 2.0, 3.0),
            }])
        );
    }

    #[test]
    fn test_unknown_action_type_is_rejected() {
        let result: Result<Action, _> =
            serde_json::from_value(json!({ "type": "self_destruct", "payload": {} }));
        assert!(result.is_err(), "closed action set must reject unknown tags");
        let result: Result<Action, _> =
            serde_json::from_value(json!({ "type": "create_ship", "payload": { "ship": "tie_fighter" } }));
        assert!(result.is_err(), "unknown ship types must not parse");
    }

    #[test]
    fn test_entity_snapshot_field_names() {
        let value = serde_json::to_value(ship_snapshot()).unwrap();
        assert_eq!(value["entityType"], "ship");
        assert_eq!(value["type"], "mosquito");
        assert_eq!(value["jumpCooldown"], 7);
        assert_eq!(value["isTargetable"], true);
        assert_eq!(value["position"], json!([1.0, 2.0, 3.0]));
        assert!(value.get("parent").is_none(), "absent parent is omitted");
    }

    #[test]
    fn test_entity_snapshot_serde() {
        let ship = ship_snapshot();
        let json = serde_json::to_string(&ship).unwrap();
        let back: EntitySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(ship, back);
        assert_eq!(back.kind(), EntityKind::Ship);

        let hardpoint = EntitySnapshot {
            id: EntityId::new("hp-1"),
            name: "laser_cannon_double".into(),
            system: SystemId::new("sys-1"),
            owner: Some(EntityId::new("player-1")),
            parent: Some(EntityId::new("ship-1")),
            position: DVec3::new(-0.025, 0.0075, -0.075),
            rotation: DVec3::ZERO,
            velocity: DVec3::ZERO,
            is_selected: false,
            is_targetable: false,
            path: Vec::new(),
            data: EntityData::Hardpoint(HardpointData {
                hardpoint_type: HardpointType::LaserCannonDouble,
                scale: 0.375,
                reload: 12,
                projectiles: vec![Projectile {
                    id: EntityId::new("p-1"),
                    target: EntityId::new("ship-9"),
                    position: DVec3::new(4.0, 0.0, 0.0),
                    velocity: DVec3::new(50.0, 0.0, 0.0),
                    ticks_remaining: 3,
                    damage: 1.5,
                    critical: true,
                }],
            }),
        };
        let json = serde_json::to_string(&hardpoint).unwrap();
        let back: EntitySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(hardpoint, back);
    }

    #[test]
    fn test_system_connections_keep_unknown_kinds() {
        let system: SystemSnapshot = serde_json::from_value(json!({
            "id": "sys-1",
            "name": "Kerali",
            "difficulty": 0.25,
            "position": [3.0, 4.0],
            "connections": [
                { "type": "system", "value": "sys-2" },
                { "type": "position", "value": [1.0, 1.0] },
                { "type": "wormhole", "value": { "stable": false } }
            ]
        }))
        .unwrap();
        assert_eq!(system.position, DVec2::new(3.0, 4.0));
        assert_eq!(
            system.connections[0],
            SystemConnection::Known(KnownConnection::System(SystemId::new("sys-2")))
        );
        assert!(matches!(
            &system.connections[2],
            SystemConnection::Other { kind, .. } if kind == "wormhole"
        ));
        let value = serde_json::to_value(&system).unwrap();
        assert_eq!(value["connections"][2]["type"], "wormhole");
        assert_eq!(value["connections"][2]["value"]["stable"], false);
    }

    #[test]
    fn test_sequenced_event_serde() {
        let event = SequencedEvent {
            seq: 4,
            tick: 120,
            event: LevelEvent::FleetItemsChange {
                owner: EntityId::new("player-1"),
                fleet: Fleet {
                    position: DVec3::ZERO,
                    ships: vec![EntityId::new("ship-1")],
                },
                items: BTreeMap::from([(ItemId::Metal, 10.0)]),
                holdings: vec![ShipHolding {
                    ship: EntityId::new("ship-1"),
                    storage: Storage::new(250.0),
                }],
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "fleet_items_change");
        assert_eq!(value["seq"], 4);
        let back: SequencedEvent = serde_json::from_value(value).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_action_outcome_helpers() {
        assert!(ActionOutcome::Applied.succeeded());
        assert!(!ActionOutcome::Rejected.succeeded());
        assert!(!ActionOutcome::Failed("unknown entity".into()).succeeded());
    }
}
