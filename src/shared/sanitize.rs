use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Runs of characters outside the storage-key whitelist.
    static ref DISALLOWED_RUN: Regex = Regex::new(r"[^0-9a-z._/-]+").unwrap();

    /// Runs of two or more underscores.
    static ref UNDERSCORE_RUN: Regex = Regex::new(r"__+").unwrap();
}

/// Convert an arbitrary user-supplied filename into a safe storage key
/// fragment.
///
/// Unicode is NFD-decomposed and combining marks are stripped, Cyrillic
/// letters transliterate to Latin, every other non-ASCII character drops.
/// Runs outside `[0-9a-z._/-]` collapse to a single underscore and the
/// result is lowercase. Total and idempotent; empty input yields empty
/// output.
pub fn sanitize(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for c in filename.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_ascii() {
            out.push(c.to_ascii_lowercase());
            continue;
        }
        for lower in c.to_lowercase() {
            if let Some(latin) = transliterate(lower) {
                out.push_str(latin);
            }
        }
    }

    let replaced = DISALLOWED_RUN.replace_all(&out, "_");
    UNDERSCORE_RUN.replace_all(&replaced, "_").into_owned()
}

/// Transliterate one lowercase Cyrillic letter to its Latin spelling.
///
/// Input arrives NFD-decomposed, so letters built from a base plus combining
/// mark (ё, й) normally reach this as their base form; the precomposed forms
/// are mapped anyway.
fn transliterate(c: char) -> Option<&'static str> {
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

/// Build the storage key for an upload:
/// `<prefix>/<parent_id>/<epoch_millis>_<sanitized_filename>`.
pub fn object_key(prefix: &str, parent_id: i64, filename: &str) -> String {
    object_key_at(prefix, parent_id, filename, Utc::now().timestamp_millis())
}

/// [`object_key`] with an explicit timestamp.
pub fn object_key_at(prefix: &str, parent_id: i64, filename: &str, epoch_millis: i64) -> String {
    format!(
        "{}/{}/{}_{}",
        prefix,
        parent_id,
        epoch_millis,
        sanitize(filename)
    )
}

/// Last segment of a storage path, used as the display name when no
/// original filename was recorded.
pub fn file_name_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
