use unicode_normalization::UnicodeNormalization;

const ZWNJ: char = '\u{200C}';

/// Normalize Unicode text to NFC form and collapse runs of whitespace
/// into single spaces.
///
/// Page text arrives split across many text nodes with arbitrary
/// indentation; this gives a stable single-line value for CSV cells.
pub fn normalize_text(input: &str) -> String {
    let nfc: String = input.nfc().collect();
    nfc.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold the Arabic code points the catalog mixes into Persian text
/// (kaf, yeh, alef maksura) to their Persian forms and treat zero-width
/// non-joiners as spaces, so labels compare equal regardless of keyboard
/// layout.
pub fn fold_persian(input: &str) -> String {
    input
        .nfc()
        .map(|c| match c {
            'ك' => 'ک',
            'ي' | 'ى' => 'ی',
            ZWNJ => ' ',
            other => other,
        })
        .collect()
}

/// Whether `haystack` contains `label`, after Persian folding of both.
pub fn contains_label(haystack: &str, label: &str) -> bool {
    fold_persian(haystack).contains(&fold_persian(label))
}

/// Map Persian (U+06F0..) and Arabic-Indic (U+0660..) digits to ASCII.
pub fn ascii_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            other => other,
        })
        .collect()
}
