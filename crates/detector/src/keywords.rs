//! Label-text classification of field candidates
//!
//! [`KeywordClassifier`] decides from the OCR text around a candidate
//! (together with its shape) whether it is an input field, and which kind.

use crate::shape::{NeighborhoodProbe, ShapeAssessment};
use image::{Rgb, RgbImage};
use login_detect_common::{FieldType, Region};
use tracing::debug;

/// Text that marks links, buttons and social sign-in rather than inputs
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    "forgot",
    "forgot password",
    "remember me",
    "sign up",
    "register",
    "submit",
    "login with",
    "sign in with",
    "continue with",
    "terms",
    "privacy",
    "policy",
    "help",
    "support",
    "cancel",
    "reset",
    "captcha",
    "verification",
    "recover",
    "facebook",
    "google",
    "apple",
    "twitter",
    "oauth",
    "create account",
    "new user",
    "checkbox",
    "button",
    "click here",
    "here",
    "agree",
    "manage",
    "continue",
    "login",
];

/// Labels that typically sit next to an input field
pub const FIELD_KEYWORDS: &[&str] = &[
    "username",
    "user name",
    "user id",
    "id",
    "email",
    "e-mail",
    "mail",
    "gmail",
    "email address",
    "email or mobile phone number",
    "phone",
    "mobile",
    "cell",
    "telephone",
    "mobile phone number",
    "name",
    "first name",
    "last name",
    "full name",
    "password",
    "pass",
    "pwd",
    "passcode",
];

/// Characters a label must extend past the start of "password" before the
/// exclusion list is consulted a second time
const PASSWORD_TAIL: usize = "password".len() + 5;

/// Decides whether a candidate is an input field and what it holds
pub trait FieldClassifier {
    fn is_form_field(&self, text: &str, rect: Region, image: &RgbImage) -> bool;

    fn field_type(&self, text: &str) -> (FieldType, Rgb<u8>);
}

/// Keyword and geometry based [`FieldClassifier`]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

/// Exclusion check on lowercased label text.
///
/// Labels mentioning "password" are only excluded when they run well past
/// the word, so that short labels such as "forgot password" are left for
/// [`KeywordClassifier::field_type`] to reject.
fn is_excluded(lower: &str) -> bool {
    if !contains_any(lower, EXCLUDE_KEYWORDS) {
        return false;
    }
    match lower.find("password") {
        None => true,
        Some(pos) => {
            lower.len() > pos + PASSWORD_TAIL
                && EXCLUDE_KEYWORDS
                    .iter()
                    .any(|t| *t != "password" && lower.contains(t))
        }
    }
}

fn classify(lower: &str) -> FieldType {
    let has = |t: &str| lower.contains(t);

    if (has("forgot") && has("password"))
        || (has("reset") && has("password"))
        || (has("remember") && has("me"))
        || has("sign up")
        || has("register")
        || has("submit")
        || has("login with")
        || has("sign in with")
    {
        FieldType::NotAField
    } else if has("username")
        || has("user name")
        || has("user id")
        || (has("login") && !has("login with") && !has("button"))
    {
        FieldType::Username
    } else if has("email") || has("e-mail") || (has("mail") && has("@")) {
        FieldType::Email
    } else if has("phone") || has("mobile") || has("cell") || has("telephone") {
        FieldType::Phone
    } else if (has("name") && !has("user"))
        || has("first name")
        || has("last name")
        || has("full name")
    {
        FieldType::Name
    } else if (has("password")
        && !["forgot", "reset", "contain", "manage", "enter", "your"]
            .iter()
            .any(|t| lower.contains(t)))
        || (has("pass") && !has("word"))
        || has("pwd")
        || has("passcode")
    {
        FieldType::Password
    } else {
        FieldType::UnknownField
    }
}

impl FieldClassifier for KeywordClassifier {
    fn is_form_field(&self, text: &str, rect: Region, image: &RgbImage) -> bool {
        let lower = text.to_lowercase();
        if is_excluded(&lower) {
            debug!("Candidate {} excluded by label {:?}", rect, text);
            return false;
        }

        let shape = ShapeAssessment::of(rect);
        // Diagnostic only; the decision below does not consult it
        let _probe = NeighborhoodProbe::scan(image, rect);

        let has_keyword = contains_any(&lower, FIELD_KEYWORDS);
        let accepted = shape.is_input_like() && (has_keyword || shape.is_field_shape);
        debug!(
            "Candidate {} label {:?}: keyword={} shape={:?} -> {}",
            rect, text, has_keyword, shape, accepted
        );
        accepted
    }

    fn field_type(&self, text: &str) -> (FieldType, Rgb<u8>) {
        let field_type = classify(&text.to_lowercase());
        (field_type, field_type.display_color())
    }
}
