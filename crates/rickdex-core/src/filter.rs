//! Name filtering for the favorites view.

use crate::models::Character;

/// Case-insensitive substring match on the character name.
///
/// A blank term matches everything.
pub fn name_matches(character: &Character, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    character.name.to_lowercase().contains(&term.to_lowercase())
}
