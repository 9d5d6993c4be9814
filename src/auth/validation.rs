use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub(crate) const USERNAME_MSG: &str = "Please enter a username.";
pub(crate) const EMAIL_MSG: &str = "Please enter your email address.";
pub(crate) const PASSWORD_MSG: &str = "Please enter your password.";

pub const MIN_PASSWORD_LEN: usize = 6;

/// One rejected signup field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub msg: &'static str,
    pub param: &'static str,
    pub location: &'static str,
}

impl FieldError {
    fn body(param: &'static str, msg: &'static str) -> Self {
        Self {
            msg,
            param,
            location: "body",
        }
    }
}

/// Signup input after trimming and email normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
                .unwrap();
    }
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com"];

const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.cl", "hotmail.co.il", "hotmail.co.nz",
    "hotmail.co.th", "hotmail.co.uk", "hotmail.com", "hotmail.com.ar", "hotmail.com.au",
    "hotmail.com.br", "hotmail.com.gr", "hotmail.com.mx", "hotmail.com.pe", "hotmail.com.tr",
    "hotmail.com.vn", "hotmail.cz", "hotmail.de", "hotmail.dk", "hotmail.es", "hotmail.fr",
    "hotmail.hu", "hotmail.id", "hotmail.ie", "hotmail.in", "hotmail.it", "hotmail.jp",
    "hotmail.kr", "hotmail.lv", "hotmail.my", "hotmail.ph", "hotmail.pt", "hotmail.sa",
    "hotmail.sg", "hotmail.sk", "live.be", "live.co.uk", "live.com", "live.com.ar",
    "live.com.mx", "live.de", "live.es", "live.eu", "live.fr", "live.it", "live.nl", "msn.com",
    "outlook.at", "outlook.be", "outlook.cl", "outlook.co.il", "outlook.co.nz", "outlook.co.th",
    "outlook.com", "outlook.com.ar", "outlook.com.au", "outlook.com.br", "outlook.com.gr",
    "outlook.com.pe", "outlook.com.tr", "outlook.com.vn", "outlook.cz", "outlook.de",
    "outlook.dk", "outlook.es", "outlook.fr", "outlook.hu", "outlook.id", "outlook.ie",
    "outlook.in", "outlook.it", "outlook.jp", "outlook.kr", "outlook.lv", "outlook.my",
    "outlook.ph", "outlook.pt", "outlook.sa", "outlook.sg", "outlook.sk", "passport.com",
];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de", "yahoo.fr",
    "yahoo.in", "yahoo.it", "ymail.com",
];

const YANDEX_DOMAINS: &[&str] = &[
    "yandex.ru", "yandex.ua", "yandex.kz", "yandex.com", "yandex.by", "ya.ru",
];

/// Lower-cases the address and strips provider subaddresses: `+tag` for Gmail, Outlook and
/// iCloud, the trailing `-tag` for Yahoo. Gmail also drops dots; Yandex aliases fold to yandex.ru.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.rsplit_once('@') else {
        return email;
    };

    let (local, domain) = match domain {
        "gmail.com" | "googlemail.com" => (before_plus(local).replace('.', ""), "gmail.com"),
        d if ICLOUD_DOMAINS.contains(&d) || OUTLOOK_DOMAINS.contains(&d) => {
            (before_plus(local).to_string(), d)
        }
        d if YAHOO_DOMAINS.contains(&d) => {
            let local = match local.rsplit_once('-') {
                Some((head, _)) => head,
                None => local,
            };
            (local.to_string(), d)
        }
        d if YANDEX_DOMAINS.contains(&d) => (local.to_string(), "yandex.ru"),
        _ => return email,
    };

    // Nothing left of the mailbox name: keep the address as typed rather than invent one.
    if local.is_empty() {
        return email;
    }
    format!("{local}@{domain}")
}

fn before_plus(local: &str) -> &str {
    local.split('+').next().unwrap_or(local)
}

/// Checks every field and returns either the cleaned input or all failures.
pub fn validate_signup(
    username: &str,
    email: &str,
    password: &str,
) -> Result<SignupInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    let username = username.trim();
    if username.is_empty() {
        errors.push(FieldError::body("username", USERNAME_MSG));
    }

    let email = email.trim();
    if email.is_empty() || !is_valid_email(email) {
        errors.push(FieldError::body("email", EMAIL_MSG));
    }

    let trimmed = password.trim();
    if trimmed.is_empty() || trimmed.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::body("password", PASSWORD_MSG));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(SignupInput {
        username: username.to_string(),
        email: normalize_email(email),
        password: password.to_string(),
    })
}
