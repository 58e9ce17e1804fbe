//! Login-page confidence scoring
//!
//! Five capped signals are summed into a score in `[0, 1]`:
//!
//! | factor            | weight            | cap  |
//! |-------------------|-------------------|------|
//! | `password_field`  | 0.35 if present   | 0.35 |
//! | `username_field`  | 0.25 if present   | 0.25 |
//! | `labeled_fields`  | 0.10 per type     | 0.30 |
//! | `login_keywords`  | 0.02 per hit      | 0.15 |
//! | `strong_keywords` | 0.05 per hit      | 0.30 |

use login_detect_common::{ConfidenceFactors, FieldType, FormField};
use std::collections::BTreeSet;
use tracing::debug;

/// General vocabulary found on authentication pages
pub const LOGIN_KEYWORDS: &[&str] = &[
    "login",
    "sign in",
    "signin",
    "log in",
    "username",
    "password",
    "email",
    "phone",
    "forgot password",
    "reset password",
    "remember me",
    "create account",
    "register",
    "authentication",
    "verify",
    "credentials",
    "account",
    "welcome back",
    "sign up",
    "signup",
    "continue with",
    "continue",
    "email address",
    "don't have an account",
    "new account",
    "create your account",
    "join now",
    "continue with google",
    "continue with microsoft",
    "continue with apple",
    "continue with facebook",
    "sign in with google",
    "sign in with apple",
    "facebook",
    "google",
    "apple",
    "microsoft",
    "steam",
    "epic games",
    "privacy policy",
    "terms of service",
    "terms of use",
    "terms and conditions",
    "next",
    "submit",
    "go",
    "enter",
    "send code",
    "verify email",
    "get started",
    "required",
    "required field",
    "remember this device",
    "keep me signed in",
    "stay signed in",
    "keep me logged in",
    "not your computer",
    "guest mode",
];

/// Phrases that point strongly at a sign-in form
pub const STRONG_KEYWORDS: &[&str] = &[
    "sign in with",
    "sign in to",
    "log in to",
    "email address",
    "password",
    "username and password",
    "forgot password",
    "create account",
    "sign up",
    "continue with google",
    "continue with microsoft",
    "continue with apple",
    "remember me",
    "email or phone",
    "username",
    "login",
    "signin",
    "sign in",
    "log in",
    "create your account",
    "verify your identity",
    "required field",
];

const PASSWORD_WEIGHT: f64 = 0.35;
const USERNAME_WEIGHT: f64 = 0.25;
const LABELED_WEIGHT: f64 = 0.1;
const LABELED_CAP: f64 = 0.3;
const LOGIN_KEYWORD_WEIGHT: f64 = 0.02;
const LOGIN_KEYWORD_CAP: f64 = 0.15;
const STRONG_KEYWORD_WEIGHT: f64 = 0.05;
const STRONG_KEYWORD_CAP: f64 = 0.3;

/// Confidence together with the factors that produced it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoginScore {
    pub confidence: f64,
    pub factors: ConfidenceFactors,
}

/// Scores how much a page looks like a login page
pub trait LoginScorer {
    fn score(&self, fields: &[FormField], page_text: &str) -> LoginScore;
}

/// Weighted keyword and field-type [`LoginScorer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceAggregator;

impl ConfidenceAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Occurrences of every keyword in `text`, case-insensitively. Each keyword
/// is counted on its own, so overlapping keywords both count.
#[must_use]
pub fn count_keywords(text: &str, keywords: &[&str]) -> usize {
    let lower = text.to_lowercase();
    keywords.iter().map(|k| lower.matches(k).count()).sum()
}

impl LoginScorer for ConfidenceAggregator {
    fn score(&self, fields: &[FormField], page_text: &str) -> LoginScore {
        let detected: BTreeSet<FieldType> = fields.iter().map(|f| f.field_type).collect();

        let has_password = detected.contains(&FieldType::Password);
        let has_identity = detected.iter().any(|t| t.is_identity());
        let labeled = FieldType::LOGIN_FIELDS
            .iter()
            .filter(|t| detected.contains(*t))
            .count();
        let login_hits = count_keywords(page_text, LOGIN_KEYWORDS);
        let strong_hits = count_keywords(page_text, STRONG_KEYWORDS);

        let factors = ConfidenceFactors {
            labeled_fields: (LABELED_WEIGHT * labeled as f64).min(LABELED_CAP),
            login_keywords: (LOGIN_KEYWORD_WEIGHT * login_hits as f64).min(LOGIN_KEYWORD_CAP),
            strong_keywords: (STRONG_KEYWORD_WEIGHT * strong_hits as f64)
                .min(STRONG_KEYWORD_CAP),
            password_field: if has_password { PASSWORD_WEIGHT } else { 0.0 },
            username_field: if has_identity { USERNAME_WEIGHT } else { 0.0 },
        };
        let confidence = factors.sum().min(1.0);

        debug!(
            "Score {:.3} from {} field types, {} login / {} strong keyword hits",
            confidence, labeled, login_hits, strong_hits
        );
        LoginScore {
            confidence,
            factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use login_detect_common::Region;

    fn field(field_type: FieldType) -> FormField {
        FormField {
            field_type,
            region: Region::new(0, 0, 300, 40),
            content: String::new(),
        }
    }

    const EPS: f64 = 1e-9;

    #[test]
    fn test_empty_page_scores_zero() {
        let score = ConfidenceAggregator.score(&[], "");
        assert_eq!(score.confidence, 0.0);
        assert_eq!(score.factors, ConfidenceFactors::default());
    }

    #[test]
    fn test_keyword_counting() {
        assert_eq!(count_keywords("Sign in to your account", &["sign in"]), 1);
        assert_eq!(count_keywords("LOGIN login", &["login"]), 2);
        // overlapping keywords are counted separately
        assert_eq!(count_keywords("sign in to", &["sign in", "sign in to"]), 2);
        assert_eq!(count_keywords("aaaa", &["aa"]), 2);
    }

    #[test]
    fn test_sign_in_page() {
        let fields = [field(FieldType::Username), field(FieldType::Password)];
        let score = ConfidenceAggregator.score(&fields, "sign in to your account");

        assert!((score.factors.password_field - 0.35).abs() < EPS);
        assert!((score.factors.username_field - 0.25).abs() < EPS);
        assert!((score.factors.labeled_fields - 0.2).abs() < EPS);
        // "sign in", "account"
        assert!((score.factors.login_keywords - 0.04).abs() < EPS);
        // "sign in to", "sign in"
        assert!((score.factors.strong_keywords - 0.1).abs() < EPS);
        assert!((score.confidence - 0.94).abs() < EPS);
    }

    #[test]
    fn test_factor_caps_and_total_clamp() {
        let fields: Vec<_> = FieldType::LOGIN_FIELDS.iter().map(|t| field(*t)).collect();
        let text = "sign in with password username login ".repeat(20);
        let score = ConfidenceAggregator.score(&fields, &text);

        assert!((score.factors.labeled_fields - 0.3).abs() < EPS);
        assert!((score.factors.login_keywords - 0.15).abs() < EPS);
        assert!((score.factors.strong_keywords - 0.3).abs() < EPS);
        assert_eq!(score.confidence, 1.0);
    }

    #[test]
    fn test_unknown_fields_do_not_count() {
        let fields = [field(FieldType::UnknownField), field(FieldType::UnknownField)];
        assert_eq!(ConfidenceAggregator.score(&fields, "").confidence, 0.0);
    }

    #[test]
    fn test_duplicate_types_count_once() {
        let fields = [field(FieldType::Email), field(FieldType::Email)];
        let score = ConfidenceAggregator.score(&fields, "");
        assert!((score.factors.labeled_fields - 0.1).abs() < EPS);
        assert!((score.confidence - 0.35).abs() < EPS);
    }

    #[test]
    fn test_score_is_monotonic() {
        let mut fields = Vec::new();
        let mut text = String::new();
        let mut last = ConfidenceAggregator.score(&fields, &text).confidence;

        for (ty, words) in [
            (FieldType::Email, "welcome back "),
            (FieldType::Password, "password "),
            (FieldType::Name, "sign in "),
            (FieldType::Phone, "remember me "),
        ] {
            fields.push(field(ty));
            let after_field = ConfidenceAggregator.score(&fields, &text).confidence;
            assert!(after_field >= last);

            text.push_str(words);
            let after_text = ConfidenceAggregator.score(&fields, &text).confidence;
            assert!(after_text >= after_field);
            assert!((0.0..=1.0).contains(&after_text));
            last = after_text;
        }
    }
}
