//! Redis key builders for room storage.
//!
//! Centralising key construction prevents typos and makes it easy to
//! find every key the backend uses.

use roomdrop_core::types::RoomId;

/// Key for the room record (JSON: password hash + expiry).
pub fn room(prefix: &str, id: RoomId) -> String {
    format!("{prefix}:room:{id}")
}

/// Key for the room's bearer-token set.
pub fn room_tokens(prefix: &str, id: RoomId) -> String {
    format!("{prefix}:room:{id}:tokens")
}

/// Key for the room's file hash (field = file id, value = JSON metadata).
pub fn room_files(prefix: &str, id: RoomId) -> String {
    format!("{prefix}:room:{id}:files")
}

/// Pattern matching every room-related key.
pub fn room_pattern(prefix: &str) -> String {
    format!("{prefix}:room:*")
}

/// Extract the room id from a room record key, rejecting the
/// `:tokens` / `:files` companion keys the pattern also matches.
pub fn parse_room_key(prefix: &str, key: &str) -> Option<RoomId> {
    let rest = key.strip_prefix(prefix)?.strip_prefix(":room:")?;
    rest.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key() {
        let id: RoomId = "00000000-0000-0000-0000-000000000000".parse().unwrap();
        assert_eq!(
            room("roomdrop", id),
            "roomdrop:room:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_parse_room_key_skips_companions() {
        let id = RoomId::new();
        assert_eq!(parse_room_key("rd", &room("rd", id)), Some(id));
        assert_eq!(parse_room_key("rd", &room_tokens("rd", id)), None);
        assert_eq!(parse_room_key("rd", &room_files("rd", id)), None);
        assert_eq!(parse_room_key("rd", "other:key"), None);
    }
}
