pub mod mysql;
pub mod sqlite;

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::FkAction;

static TYPE_WITH_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\(?([\d,]*)\)?( |$)").expect("native type pattern"));
static TYPE_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\(").expect("bare type pattern"));

/// Split a catalog type declaration of the form `name[(size[,scale])]`
/// into its lowercased base name and optional size/scale.
///
/// Declarations whose parenthesized part is not numeric (`enum('a','b')`)
/// keep the base name and drop the rest.
pub(crate) fn parse_native_type(raw: &str) -> (String, Option<u32>, Option<u32>) {
    if let Some(caps) = TYPE_WITH_SIZE.captures(raw) {
        let name = caps[1].to_lowercase();
        let digits = &caps[2];
        if digits.is_empty() {
            return (name, None, None);
        }
        return match digits.split_once(',') {
            Some((size, scale)) => (name, size.parse().ok(), scale.parse().ok()),
            None => (name, digits.parse().ok(), None),
        };
    }
    if let Some(caps) = TYPE_BARE.captures(raw) {
        return (caps[1].to_lowercase(), None, None);
    }
    (raw.to_lowercase(), None, None)
}

/// Extract the action of an `ON DELETE`/`ON UPDATE` clause from the tail
/// of a constraint definition. Vendor-default actions come back as
/// `None`, and so does a missing clause.
pub(crate) fn referential_action(raw: &str, clause: &str) -> Option<FkAction> {
    let upper = raw.to_ascii_uppercase();
    let idx = upper.find(clause)?;
    let rest = upper[idx + clause.len()..].trim_start();
    if rest.starts_with("CASCADE") {
        Some(FkAction::Cascade)
    } else if rest.starts_with("SET NULL") {
        Some(FkAction::SetNull)
    } else {
        None
    }
}
