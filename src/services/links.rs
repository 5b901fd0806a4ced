// SPDX-License-Identifier: MIT

//! Checkout-link assembly.
//!
//! Links are comma-joined field lists appended to a normalized base URL.
//! The consuming autofill extension expects the fields verbatim, so no URL
//! encoding is applied anywhere.

use crate::error::AppError;
use crate::models::{Credential, LinkStyle};

/// Marker query parameter the autofill consumer keys on.
const SOURCE_PARAM: &str = "source=quickActionCopy";

/// Assemble a checkout link from a card and (for wool) an identity email.
///
/// Any existing query string on the base URL is dropped before the marker
/// parameter is appended. "potato" carries card fields only; "wool"
/// additionally embeds the email as the trailing field and fails without
/// one.
pub fn assemble(
    base_url: &str,
    card: &Credential,
    email: Option<&str>,
    style: LinkStyle,
) -> Result<String, AppError> {
    let base = base_url.trim();
    if base.is_empty() {
        return Err(AppError::BadRequest("A base URL is required".to_string()));
    }
    let base = base.split('?').next().unwrap_or(base);
    let year = two_digit_year(&card.expiry_year);

    let link = match style {
        LinkStyle::Potato => format!(
            "{}?{},{},{},{},{},{}",
            base, SOURCE_PARAM, card.card_number, card.expiry_month, year, card.cvv, card.zip
        ),
        LinkStyle::Wool => {
            let email = email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .ok_or_else(|| {
                    AppError::BadRequest("Wool links require an identity email".to_string())
                })?;
            format!(
                "{}?{},{},{}/{},{},{},{}",
                base,
                SOURCE_PARAM,
                card.card_number,
                card.expiry_month,
                year,
                card.cvv,
                card.zip,
                email
            )
        }
    };

    Ok(link)
}

/// Four-character years collapse to their last two characters; anything
/// else passes through untouched. Card fields are format-preserved from
/// import, so the split has to respect char boundaries.
fn two_digit_year(year: &str) -> &str {
    if year.chars().count() == 4 {
        match year.char_indices().nth(2) {
            Some((split, _)) => &year[split..],
            None => year,
        }
    } else {
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Credential {
        Credential::new(
            "4111111111111111".into(),
            "09".into(),
            "2027".into(),
            "123".into(),
            "90210".into(),
            "2024-01-15T10:00:00Z",
        )
    }

    #[test]
    fn test_potato_link_drops_query_and_excludes_email() {
        let link = assemble(
            "https://x.test/join?old=1",
            &card(),
            Some("a@b.com"),
            LinkStyle::Potato,
        )
        .unwrap();

        assert_eq!(
            link,
            "https://x.test/join?source=quickActionCopy,4111111111111111,09,27,123,90210"
        );
    }

    #[test]
    fn test_wool_link_embeds_slash_expiry_and_email() {
        let link = assemble(
            "https://x.test/join?old=1",
            &card(),
            Some("a@b.com"),
            LinkStyle::Wool,
        )
        .unwrap();

        assert_eq!(
            link,
            "https://x.test/join?source=quickActionCopy,4111111111111111,09/27,123,90210,a@b.com"
        );
    }

    #[test]
    fn test_wool_without_email_is_rejected() {
        let err = assemble("https://x.test/join", &card(), None, LinkStyle::Wool).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = assemble("https://x.test/join", &card(), Some("  "), LinkStyle::Wool);
        assert!(err.is_err());
    }

    #[test]
    fn test_two_digit_year_passes_through() {
        let mut c = card();
        c.expiry_year = "27".into();
        let link = assemble("https://x.test/join", &c, None, LinkStyle::Potato).unwrap();
        assert!(link.contains(",09,27,"));
    }

    #[test]
    fn test_multibyte_year_does_not_panic() {
        // Imported fields are format-preserved; a 3-char year that is 4
        // bytes long must pass through, not split mid-char
        let mut c = card();
        c.expiry_year = "2é7".into();
        let link = assemble("https://x.test/join", &c, None, LinkStyle::Potato).unwrap();
        assert!(link.contains(",2é7,"));

        // A genuine 4-char year still collapses to its last two chars
        c.expiry_year = "éé27".into();
        let link = assemble("https://x.test/join", &c, None, LinkStyle::Potato).unwrap();
        assert!(link.contains(",09,27,"));
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let err = assemble("  ", &card(), None, LinkStyle::Potato).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_fields_are_not_url_encoded() {
        let mut c = card();
        c.cvv = "1 2&3".into();
        let link = assemble("https://x.test/join", &c, None, LinkStyle::Potato).unwrap();
        assert!(link.contains(",1 2&3,"));
    }
}
