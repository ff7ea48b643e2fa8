/// Suffix stripped from owner names before normalization.
pub const OWNER_SUFFIX: &str = "Bundle";

/// Suffix appended to every normalized ledger name.
pub const LEDGER_SUFFIX: &str = "_migrations";

/// Derive a ledger table name from the name of the owning module.
///
/// `HelloWorld` becomes `hello_world_migrations` and `AppBundle` becomes
/// `app_migrations`. An underscore goes before every uppercase letter that
/// does not follow another uppercase letter, so acronyms stay together.
pub fn normalize_name(name: &str) -> String {
    let clean = name.strip_suffix(OWNER_SUFFIX).unwrap_or(name);

    let mut snake = String::with_capacity(clean.len() + 4);
    let mut prev_upper = false;
    for c in clean.chars() {
        let upper = c.is_ascii_uppercase();
        if upper && !prev_upper {
            snake.push('_');
        }
        snake.push(c.to_ascii_lowercase());
        prev_upper = upper;
    }

    format!("{}{}", snake.trim_matches('_'), LEDGER_SUFFIX)
}
