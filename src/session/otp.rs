//! Sign-up form rules: email syntax, verification code entry, password policy.

use thiserror::Error;

/// Number of digits in an emailed verification code.
pub const OTP_LENGTH: usize = 6;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 20;

/// Loose email syntax check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("position {0} is outside the code")]
    OutOfRange(usize),
    #[error("'{0}' is not a digit")]
    NotADigit(char),
}

/// Verification code being typed digit by digit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpCode {
    digits: [Option<char>; OTP_LENGTH],
}

impl OtpCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one position. Returns the position focus should move to next.
    pub fn set_digit(&mut self, index: usize, value: char) -> Result<Option<usize>, OtpError> {
        if index >= OTP_LENGTH {
            return Err(OtpError::OutOfRange(index));
        }
        if !value.is_ascii_digit() {
            return Err(OtpError::NotADigit(value));
        }
        self.digits[index] = Some(value);
        Ok((index + 1 < OTP_LENGTH).then_some(index + 1))
    }

    /// Clear one position. Returns the position focus should move back to.
    pub fn backspace(&mut self, index: usize) -> Option<usize> {
        if index >= OTP_LENGTH {
            return None;
        }
        if self.digits[index].take().is_none() && index > 0 {
            self.digits[index - 1] = None;
            return Some(index - 1);
        }
        Some(index)
    }

    /// Fill from pasted text, ignoring non-digits. Returns digits taken.
    pub fn paste(&mut self, text: &str) -> usize {
        let digits: Vec<char> = text
            .chars()
            .filter(char::is_ascii_digit)
            .take(OTP_LENGTH)
            .collect();
        if digits.is_empty() {
            return 0;
        }
        self.clear();
        for (slot, digit) in self.digits.iter_mut().zip(&digits) {
            *slot = Some(*digit);
        }
        digits.len()
    }

    pub fn clear(&mut self) {
        self.digits = [None; OTP_LENGTH];
    }

    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    /// The full code once every position is filled.
    pub fn code(&self) -> Option<String> {
        self.digits.iter().copied().collect()
    }
}

/// A password policy violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordIssue {
    #[error("password must be between 8 and 20 characters")]
    Length,
    #[error("password must contain a letter")]
    NoLetter,
    #[error("password must contain a digit")]
    NoDigit,
    #[error("passwords do not match")]
    Mismatch,
}

/// Check a new password and its confirmation; empty when acceptable.
pub fn password_issues(password: &str, confirmation: &str) -> Vec<PasswordIssue> {
    let mut issues = Vec::new();
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        issues.push(PasswordIssue::Length);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        issues.push(PasswordIssue::NoLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push(PasswordIssue::NoDigit);
    }
    if password != confirmation {
        issues.push(PasswordIssue::Mismatch);
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("cliente@example.com"));
        assert!(is_valid_email("  a.b+c@mail.co  "));
        assert!(!is_valid_email("cliente@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn test_otp_entry() {
        let mut otp = OtpCode::new();
        assert_eq!(otp.set_digit(0, '4'), Ok(Some(1)));
        assert_eq!(otp.set_digit(1, 'x'), Err(OtpError::NotADigit('x')));
        assert_eq!(otp.set_digit(6, '1'), Err(OtpError::OutOfRange(6)));
        assert!(otp.code().is_none());

        assert_eq!(otp.paste("12-34 56 78"), 6);
        assert!(otp.is_complete());
        assert_eq!(otp.code().as_deref(), Some("123456"));
        assert_eq!(otp.set_digit(5, '9'), Ok(None));
    }

    #[test]
    fn test_otp_backspace_moves_back() {
        let mut otp = OtpCode::new();
        otp.paste("12");
        assert_eq!(otp.backspace(2), Some(1));
        assert_eq!(otp.code(), None);
        assert_eq!(otp.backspace(0), Some(0));
    }

    #[test]
    fn test_password_rules() {
        assert!(password_issues("clave1234", "clave1234").is_empty());
        assert_eq!(
            password_issues("short1", "short1"),
            vec![PasswordIssue::Length]
        );
        assert_eq!(
            password_issues("onlyletters", "different"),
            vec![PasswordIssue::NoDigit, PasswordIssue::Mismatch]
        );
        assert_eq!(
            password_issues("123456789", "123456789"),
            vec![PasswordIssue::NoLetter]
        );
    }
}
