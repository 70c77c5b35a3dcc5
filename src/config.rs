/// Fixed room list, loaded once at startup and immutable after. Emptying
/// a room never removes its name from here.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    rooms: Vec<String>,
}

const DEFAULT_ROOMS: &[&str] = &[
    "kpop",
    "percy jackson",
    "harry potter",
    "agatha christie",
    "programming",
    "news",
];

impl RoomConfig {
    /// `ROOMS` env var (comma-separated) or the built-in list.
    pub fn from_env() -> Self {
        match dotenv::var("ROOMS") {
            Ok(raw) => Self::from_list(raw.split(',').map(str::trim)),
            Err(_) => Self::from_list(DEFAULT_ROOMS.iter().copied()),
        }
    }

    pub fn from_list<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut rooms = Vec::new();
        for name in names {
            if name.is_empty() || rooms.iter().any(|r| r == name) {
                continue;
            }
            rooms.push(name.to_owned());
        }
        Self { rooms }
    }

    pub fn contains(&self, room: &str) -> bool {
        self.rooms.iter().any(|r| r == room)
    }

    pub fn names(&self) -> &[String] {
        &self.rooms
    }
}
