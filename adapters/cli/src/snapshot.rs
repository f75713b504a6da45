use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use dungeon_editor_core::coords::MAX_BOARD_DIMENSION;
use dungeon_editor_system_scene_export::Scene;

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_PREFIX: &str = "dungeon";
/// Delimiter used to separate the prefix, board dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Board dimensions plus every live placement, for clipboard transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SceneSnapshot {
    /// Board extent along the `q` axis.
    pub(crate) q: u32,
    /// Board extent along the `s` axis.
    pub(crate) s: u32,
    /// Placements captured by the snapshot.
    pub(crate) scene: Scene,
}

impl SceneSnapshot {
    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, SnapshotError> {
        let json = serde_json::to_vec(&self.scene).map_err(SnapshotError::Serialize)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{SNAPSHOT_PREFIX}:{}x{}:{encoded}", self.q, self.s))
    }

    /// Decodes a snapshot from its single-line representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let prefix = parts.next().ok_or(SnapshotError::MissingPrefix)?;
        let dimensions = parts.next().ok_or(SnapshotError::MissingDimensions)?;
        let payload = parts.next().ok_or(SnapshotError::MissingPayload)?;

        if prefix != SNAPSHOT_PREFIX {
            return Err(SnapshotError::InvalidPrefix(prefix.to_owned()));
        }

        let (q, s) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotError::InvalidEncoding)?;
        let scene = serde_json::from_slice(&bytes).map_err(SnapshotError::InvalidPayload)?;

        Ok(Self { q, s, scene })
    }
}

/// Errors that can occur while encoding or decoding snapshot strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SnapshotError {
    /// The provided string was empty or contained only whitespace.
    #[error("snapshot was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("snapshot is missing the prefix")]
    MissingPrefix,
    /// The board dimensions were missing.
    #[error("snapshot is missing the board dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("snapshot is missing the payload")]
    MissingPayload,
    /// The prefix segment did not name a dungeon snapshot.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The board dimensions could not be parsed.
    #[error("could not parse board dimensions '{0}'")]
    InvalidDimensions(String),
    /// The board dimensions exceed the largest supported board.
    #[error("board {q}x{s} exceeds {max} cells per axis", max = MAX_BOARD_DIMENSION)]
    OversizedBoard {
        /// Requested extent along the `q` axis.
        q: u32,
        /// Requested extent along the `s` axis.
        s: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload was not a scene.
    #[error("could not parse snapshot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The scene could not be serialised.
    #[error("could not serialise scene: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotError> {
    let invalid = || SnapshotError::InvalidDimensions(dimensions.to_owned());
    let (q, s) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let q = q.trim().parse::<u32>().map_err(|_| invalid())?;
    let s = s.trim().parse::<u32>().map_err(|_| invalid())?;

    if q == 0 || s == 0 {
        return Err(invalid());
    }
    if q > MAX_BOARD_DIMENSION || s > MAX_BOARD_DIMENSION {
        return Err(SnapshotError::OversizedBoard { q, s });
    }

    Ok((q, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_editor_core::{ActorKind, GridCoord, Orientation, Rotation, TileKind};
    use dungeon_editor_system_scene_export::{ActorPlacement, TilePlacement};

    fn sample_scene() -> Scene {
        Scene {
            tiles: vec![TilePlacement {
                kind: TileKind::new("first"),
                anchor: GridCoord::new(3, -2),
                rotation: Rotation::new(2),
                orientation: Orientation::Rotated,
            }],
            actors: vec![ActorPlacement {
                kind: ActorKind::new("goblin"),
                anchor: GridCoord::new(0, 0),
                rotation: Rotation::new(1),
                default_action: Some("Idle".to_owned()),
            }],
        }
    }

    #[test]
    fn round_trip_scene() {
        let snapshot = SceneSnapshot {
            q: 12,
            s: 8,
            scene: sample_scene(),
        };

        let encoded = snapshot.encode().expect("scene serialises");
        assert!(encoded.starts_with("dungeon:12x8:"));
        assert!(!encoded.contains('\n'));

        let decoded = SceneSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn decode_trims_surrounding_whitespace() {
        let snapshot = SceneSnapshot {
            q: 4,
            s: 4,
            scene: Scene::default(),
        };
        let encoded = format!("  {}\n", snapshot.encode().expect("scene serialises"));

        assert_eq!(SceneSnapshot::decode(&encoded).expect("decodes"), snapshot);
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(matches!(
            SceneSnapshot::decode("   "),
            Err(SnapshotError::EmptyPayload)
        ));
    }

    #[test]
    fn decode_rejects_foreign_prefix() {
        assert!(matches!(
            SceneSnapshot::decode("atlas:4x4:e30"),
            Err(SnapshotError::InvalidPrefix(prefix)) if prefix == "atlas"
        ));
    }

    #[test]
    fn decode_rejects_zero_dimensions() {
        assert!(matches!(
            SceneSnapshot::decode("dungeon:0x4:e30"),
            Err(SnapshotError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn decode_rejects_oversized_dimensions() {
        assert!(matches!(
            SceneSnapshot::decode("dungeon:4294967295x1:e30"),
            Err(SnapshotError::OversizedBoard { q: u32::MAX, s: 1 })
        ));
    }

    #[test]
    fn decode_rejects_missing_payload() {
        assert!(matches!(
            SceneSnapshot::decode("dungeon:4x4"),
            Err(SnapshotError::MissingPayload)
        ));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        assert!(matches!(
            SceneSnapshot::decode("dungeon:4x4:@@@"),
            Err(SnapshotError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn decode_rejects_non_scene_json() {
        let payload = STANDARD_NO_PAD.encode(b"[1,2,3]");
        assert!(matches!(
            SceneSnapshot::decode(&format!("dungeon:4x4:{payload}")),
            Err(SnapshotError::InvalidPayload(_))
        ));
    }
}
