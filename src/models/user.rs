/// The viewer a chat line is evaluated for. Emote restriction predicates
/// (e.g. subscriber-only legacy emotes) are checked against this record.
///
/// A line may have no known author (pinned messages, system lines); every
/// consumer of this type must accept `Option<&ChatUser>` and treat `None`
/// as "no restriction context".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub color: Option<(u8, u8, u8)>,
    pub moderator: bool,
    pub subscriber: bool,
    pub badges: Vec<String>,
}

impl ChatUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            display_name: name.clone(),
            name,
            color: None,
            moderator: false,
            subscriber: false,
            badges: Vec::new(),
        }
    }

    pub fn subscriber(mut self, subscriber: bool) -> Self {
        self.subscriber = subscriber;
        self
    }
}
