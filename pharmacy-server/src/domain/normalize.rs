//! Locale-insensitive place-name folding.
//!
//! The upstream directory and our URL slugs disagree on Turkish diacritics
//! and casing ("İstanbul" vs "istanbul" vs "ISTANBUL"). Every comparison
//! between user input and a stored place name goes through [`fold`]; raw
//! string equality across that boundary is a bug.

/// Fold Turkish-specific characters to their base Latin form.
///
/// Maps the fixed table ç→c, Ç→C, ğ→g, Ğ→G, ı→i, İ→I, ö→o, Ö→O, ş→s, Ş→S,
/// ü→u, Ü→U and leaves every other character unchanged. ASCII case is
/// preserved; case folding is a separate step (see [`fold`]).
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
///
/// # Examples
///
/// ```
/// use pharmacy_server::domain::normalize;
///
/// assert_eq!(normalize("Çanakkale"), "Canakkale");
/// assert_eq!(normalize("İSTANBUL"), "ISTANBUL");
/// assert_eq!(normalize("London"), "London");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ç' => 'c',
            'Ç' => 'C',
            'ğ' => 'g',
            'Ğ' => 'G',
            'ı' => 'i',
            'İ' => 'I',
            'ö' => 'o',
            'Ö' => 'O',
            'ş' => 's',
            'Ş' => 'S',
            'ü' => 'u',
            'Ü' => 'U',
            other => other,
        })
        .collect()
}

/// The canonical comparison key for a place name: [`normalize`], then
/// lowercase, then trim.
///
/// Also collapses `i` followed by U+0307 (combining dot above) to plain `i`;
/// lowercasing a dotted capital İ outside a Turkish locale produces that
/// pair, and upstream data occasionally carries it pre-baked.
pub fn fold(text: &str) -> String {
    normalize(text)
        .to_lowercase()
        .replace("i\u{307}", "i")
        .trim()
        .to_string()
}

/// Whether two place-name spellings refer to the same location.
pub fn same_place(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_lowercase_diacritics() {
        assert_eq!(normalize("çğışöü"), "cgisou");
        assert_eq!(normalize("nöbetçi eczane"), "nobetci eczane");
    }

    #[test]
    fn folds_uppercase_diacritics() {
        assert_eq!(normalize("ÇĞİŞÖÜ"), "CGISOU");
        assert_eq!(normalize("ŞANLIURFA"), "SANLIURFA");
    }

    #[test]
    fn preserves_ascii_case() {
        assert_eq!(normalize("Çanakkale"), "Canakkale");
        assert_eq!(normalize("DİYARBAKIR"), "DIYARBAKIR");
    }

    #[test]
    fn noop_without_diacritics() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("ankara"), "ankara");
        assert_eq!(normalize("Kadikoy 12/B"), "Kadikoy 12/B");
    }

    #[test]
    fn fold_equates_case_and_diacritic_variants() {
        assert_eq!(fold("İSTANBUL"), fold("istanbul"));
        assert_eq!(fold("Çanakkale"), fold("canakkale"));
        assert_eq!(fold("ŞIRNAK"), fold("şırnak"));
        assert_eq!(fold("  Üsküdar "), "uskudar");
    }

    #[test]
    fn fold_collapses_combining_dot_above() {
        // "İzmir" lowercased in a non-Turkish locale: "i\u{307}zmir"
        assert_eq!(fold("i\u{307}zmir"), "izmir");
        assert!(same_place("i\u{307}zmir", "İzmir"));
    }

    #[test]
    fn same_place_rejects_different_names() {
        assert!(same_place("İstanbul", "ISTANBUL"));
        assert!(!same_place("İstanbul", "Ankara"));
        assert!(!same_place("", "Ankara"));
    }
}
