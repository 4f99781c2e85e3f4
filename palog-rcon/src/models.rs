use serde::Serialize;

/// One row of the server's player list.
///
/// None of the fields is a reliable key on its own: the server reports
/// `"00000000"` for unknown ids and ids are sometimes truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Player {
  /// Display name as reported by the server
  pub name: String,
  /// Palworld player uid (numeric text, may be truncated)
  pub player_uid: String,
  /// Steam id (numeric text, may be missing)
  pub steam_id: String,
}

impl Player {
  pub fn new(
    name: impl Into<String>,
    player_uid: impl Into<String>,
    steam_id: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      player_uid: player_uid.into(),
      steam_id: steam_id.into(),
    }
  }
}
