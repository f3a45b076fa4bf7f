//! Store key namespacing
//!
//! Every store key is an ordered list of tokens joined with [`KEY_SEPARATOR`].
//! Three shapes are used:
//!
//! ```text
//! <entity>!id!<id>                         primary entry   -> record payload
//! <entity>!<field>!<value>                 unique entry    -> record id
//! <entity>!<field>!<value>!<disambiguator> non-unique entry -> record id
//! ```
//!
//! Joining performs no escaping. Tokens that contain the separator are
//! rejected before they reach this module: entity and field names when the
//! schema is built, field values when a record is saved or looked up.

/// Reserved token separator
pub const KEY_SEPARATOR: char = '!';

/// Name of the implicit identity field
pub const ID_FIELD: &str = "id";

/// Joins tokens with the reserved separator.
pub fn join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for (i, token) in tokens.into_iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(token.as_ref());
    }
    key
}

/// Returns true if `token` can be used as a single key token.
pub fn is_valid_token(token: &str) -> bool {
    !token.contains(KEY_SEPARATOR)
}

/// Key of the primary entry for `id`.
pub fn primary_key(entity: &str, id: &str) -> String {
    join([entity, ID_FIELD, id])
}

/// Key of a unique secondary entry.
pub fn unique_key(entity: &str, field: &str, token: &str) -> String {
    join([entity, field, token])
}

/// Key of a non-unique secondary entry.
pub fn non_unique_key(entity: &str, field: &str, token: &str, disambiguator: &str) -> String {
    join([entity, field, token, disambiguator])
}

/// Prefix covering every non-unique entry for one value.
///
/// Ends with the separator so that value `a` does not match entries for `ab`.
pub fn scan_prefix(entity: &str, field: &str, token: &str) -> String {
    let mut prefix = join([entity, field, token]);
    prefix.push(KEY_SEPARATOR);
    prefix
}
