use unicode_normalization::UnicodeNormalization;

/// Fold a name for tolerant comparison: NFC, keep only letters and digits
/// (any script), lowercase.
pub fn normalize(s: &str) -> String {
    s.nfc()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when either normalized name contains the other.
///
/// Bank payer names often carry extra tokens ("ABC 홍길동") or abbreviate the
/// registered name, so this checks containment in both directions. Very short
/// names can match things they should not; that is accepted.
pub fn names_match(client_name: &str, depositor: &str) -> bool {
    let client = normalize(client_name);
    let payer = normalize(depositor);
    if client.is_empty() || payer.is_empty() {
        return false;
    }
    payer.contains(&client) || client.contains(&payer)
}
