//! Result unit of a repository expiry sweep.

use roomdrop_core::types::RoomId;

/// One room removed by [`RoomRepository::delete_expired`], with the
/// storage paths of its files so the caller can cascade-delete blobs.
///
/// [`RoomRepository::delete_expired`]: crate::repository::RoomRepository::delete_expired
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiredCleanup {
    pub room_id: RoomId,
    pub paths: Vec<String>,
}
