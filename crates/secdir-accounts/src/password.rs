//! Password character rules.

/// Punctuation permitted in passwords besides ASCII letters and digits.
pub const SPECIAL_CHARS: [char; 7] = ['@', '#', '%', '(', ')', '*', '_'];

/// Whether `ch` may appear in a password.
pub fn is_valid_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || SPECIAL_CHARS.contains(&ch)
}

/// The first character of `password` that may not appear in a password.
pub fn first_invalid_char(password: &str) -> Option<char> {
    password.chars().find(|&ch| !is_valid_char(ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumerics_and_specials() {
        assert_eq!(first_invalid_char("Passw0rd1"), None);
        assert_eq!(first_invalid_char("a@b#c%d(e)f*g_h"), None);
    }

    #[test]
    fn reports_first_offender_only() {
        assert_eq!(first_invalid_char("Abc$23456"), Some('$'));
        assert_eq!(first_invalid_char("a b!"), Some(' '));
        assert_eq!(first_invalid_char("pässwort"), Some('ä'));
    }
}
