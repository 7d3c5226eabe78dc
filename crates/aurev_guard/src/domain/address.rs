//! Cardano address format checks.

use once_cell::sync::Lazy;
use regex::Regex;

static BECH32_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^addr(1|_test1)[a-zA-Z0-9]{50,}$").expect("static regex")
});

/// Loose validation of a Cardano wallet address.
///
/// Accepts bech32 payment addresses (`addr1…`, `addr_test1…`) as well as raw
/// 56- or 64-character hashes.
pub fn is_valid_cardano_address(address: &str) -> bool {
    if address.is_empty() {
        return false;
    }
    BECH32_ADDRESS.is_match(address) || address.len() == 56 || address.len() == 64
}
