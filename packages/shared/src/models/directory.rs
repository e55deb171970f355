use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Attribute holding the ids of every game a user currently belongs to.
pub const GAME_ATTRIBUTE: &str = "game";

/// A user as returned by the identity directory.
///
/// Only the fields the membership workflow touches are typed. Everything else
/// the directory sends is kept in `other` and written back untouched, since
/// updates replace the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Vec<String>>>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserRecord {
    pub fn new(id: &str) -> Self {
        UserRecord {
            id: id.to_string(),
            username: None,
            attributes: BTreeMap::new(),
            other: Map::new(),
        }
    }

    /// `None` when the user has never joined a game.
    pub fn games(&self) -> Option<&[String]> {
        self.attributes.get(GAME_ATTRIBUTE).map(Vec::as_slice)
    }

    pub fn is_member_of(&self, game_id: u64) -> bool {
        let target = game_id.to_string();
        self.games()
            .map_or(false, |games| games.iter().any(|game| *game == target))
    }

    pub fn add_game(&mut self, game_id: u64) {
        self.attributes
            .entry(GAME_ATTRIBUTE.to_string())
            .or_default()
            .push(game_id.to_string());
    }

    /// Removes every occurrence of the game. Drops the attribute once it is
    /// empty so a later leave reports the user as belonging to no game.
    pub fn remove_game(&mut self, game_id: u64) {
        let target = game_id.to_string();
        let now_empty = match self.attributes.get_mut(GAME_ATTRIBUTE) {
            Some(games) => {
                games.retain(|game| *game != target);
                games.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.attributes.remove(GAME_ATTRIBUTE);
        }
    }
}
