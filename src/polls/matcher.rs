//! Reply sender → poll attendee matching.
//!
//! Primary: case-insensitive exact address match.
//! Fallback: the sender address contains the attendee's local part, which
//! catches aliases and alternate mail domains (jane.doe@mail.co.com replying
//! for jane.doe@co.com).
//!
//! The fallback is deliberately loose. A short local part ("jo") matches any
//! sender containing it, so an unrelated reply can be credited to the wrong
//! attendee. An attendee stored with an empty local part ("@co.com", or an
//! empty address) matches every sender. Exact matches are always preferred.

use super::types::Attendee;

/// How a sender was tied to an attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Exact,
    LocalPart,
}

/// Decide whether `candidate` (a reply sender) refers to `known` (an attendee address).
pub fn match_address(candidate: &str, known: &str) -> Option<MatchMethod> {
    let candidate = candidate.trim().to_lowercase();
    let known = known.trim().to_lowercase();

    if candidate == known {
        return Some(MatchMethod::Exact);
    }

    let local_part = known.split('@').next().unwrap_or_default();
    if candidate.contains(local_part) {
        return Some(MatchMethod::LocalPart);
    }

    None
}

/// Find the attendee a reply from `sender` belongs to.
///
/// An exact match anywhere in the list beats an earlier local-part match.
pub fn find_attendee(attendees: &[Attendee], sender: &str) -> Option<(usize, MatchMethod)> {
    let mut fallback = None;

    for (i, attendee) in attendees.iter().enumerate() {
        match match_address(sender, &attendee.email) {
            Some(MatchMethod::Exact) => return Some((i, MatchMethod::Exact)),
            Some(MatchMethod::LocalPart) if fallback.is_none() => {
                fallback = Some((i, MatchMethod::LocalPart));
            }
            _ => {}
        }
    }

    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendees(emails: &[&str]) -> Vec<Attendee> {
        emails.iter().map(|e| Attendee::new(e)).collect()
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        assert_eq!(
            match_address("Jane.Doe@Co.com", "jane.doe@co.com"),
            Some(MatchMethod::Exact)
        );
    }

    #[test]
    fn test_alias_domain_matches_by_local_part() {
        assert_eq!(
            match_address("jane.doe@mail.co.com", "jane.doe@co.com"),
            Some(MatchMethod::LocalPart)
        );
    }

    #[test]
    fn test_unrelated_sender() {
        assert_eq!(match_address("bob@co.com", "jane.doe@co.com"), None);
        assert_eq!(match_address("", "jane.doe@co.com"), None);
    }

    #[test]
    fn test_short_local_part_is_permissive() {
        // Known risk: "jo" is contained in "john.smith".
        assert_eq!(
            match_address("john.smith@other.org", "jo@co.com"),
            Some(MatchMethod::LocalPart)
        );
    }

    #[test]
    fn test_empty_local_part_matches_any_sender() {
        // Known risk: an empty local part is contained in every address.
        assert_eq!(
            match_address("anyone@other.org", "@co.com"),
            Some(MatchMethod::LocalPart)
        );
        assert_eq!(match_address("anyone@other.org", ""), Some(MatchMethod::LocalPart));
    }

    #[test]
    fn test_exact_attendee_beats_empty_local_part() {
        let list = attendees(&["@co.com", "jane.doe@co.com"]);
        assert_eq!(
            find_attendee(&list, "jane.doe@co.com"),
            Some((1, MatchMethod::Exact))
        );
        assert_eq!(
            find_attendee(&list, "bob@other.org"),
            Some((0, MatchMethod::LocalPart))
        );
    }

    #[test]
    fn test_find_prefers_exact_over_earlier_fallback() {
        let list = attendees(&["jo@co.com", "john@co.com"]);
        assert_eq!(find_attendee(&list, "john@co.com"), Some((1, MatchMethod::Exact)));
    }

    #[test]
    fn test_find_first_fallback() {
        let list = attendees(&["bob@co.com", "jane.doe@co.com"]);
        assert_eq!(
            find_attendee(&list, "jane.doe@mail.co.com"),
            Some((1, MatchMethod::LocalPart))
        );
        assert_eq!(find_attendee(&list, "carol@co.com"), None);
    }
}
