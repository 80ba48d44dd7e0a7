//! Email address syntax validation.

use validator::ValidateEmail;

const MAX_LOCAL_PART_LEN: usize = 64;

/// Check that `email` is a syntactically valid address.
///
/// On top of the RFC 5322-style check from `validator`, this rejects what
/// most mail systems refuse to deliver to: dotless domains (`user@localhost`),
/// empty domain labels, dot-leading or dot-trailing local parts, consecutive
/// dots, local parts longer than 64 characters, non-ASCII addresses and
/// top-level domains that do not start with a letter.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || !email.is_ascii() || email.chars().any(char::is_whitespace) {
        return false;
    }

    if !email.validate_email() {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.len() > MAX_LOCAL_PART_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }

    // IP literals are accepted as-is
    if domain.starts_with('[') && domain.ends_with(']') {
        return true;
    }

    let tld_starts_with_letter = domain
        .rsplit('.')
        .next()
        .and_then(|tld| tld.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic());

    domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
        && tld_starts_with_letter
}
