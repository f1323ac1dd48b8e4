use super::RoomId;
use serde::{Deserialize, Serialize};

/// Room category; lab courses want lab rooms, everything else theory rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Theory,
    Lab,
}

impl RoomKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            RoomKind::Theory => "Theory",
            RoomKind::Lab => "Lab",
        }
    }
}

/// A physical teaching room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    pub capacity: u32,
    pub kind: RoomKind,
    /// Ordered specialisation tags, e.g. "networking_lab"
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub campus: String,
}

fn default_available() -> bool {
    true
}

impl Room {
    pub fn fits(&self, group_size: u32) -> bool {
        self.capacity >= group_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        let room = Room {
            id: RoomId("R101".to_string()),
            name: "Room 101".to_string(),
            capacity: 40,
            kind: RoomKind::Theory,
            specializations: vec![],
            available: true,
            building: String::new(),
            campus: String::new(),
        };
        assert!(room.fits(40));
        assert!(!room.fits(41));
    }
}
