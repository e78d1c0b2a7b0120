//! VCARD decoding.

use crate::component::Component;
use crate::error::CodecResult;
use crate::Decode;
use serde::{Deserialize, Serialize};

/// A contact or contact group decoded from a vCard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Globally unique identifier.
    pub uid: Option<String>,
    /// Display name (FN).
    pub formatted_name: Option<String>,
    /// Email addresses.
    pub emails: Vec<String>,
    /// Phone numbers.
    pub phones: Vec<String>,
    /// True if this vCard describes a group rather than an individual.
    pub group: bool,
    /// Member UIDs, for groups.
    pub members: Vec<String>,
}

impl Contact {
    /// Builds a contact from a VCARD component.
    ///
    /// Groups are recognized by vCard 4 `KIND:group` and by the Apple
    /// `X-ADDRESSBOOKSERVER-KIND:group` extension.
    pub fn from_component(card: &Component) -> Self {
        let group = ["KIND", "X-ADDRESSBOOKSERVER-KIND"]
            .iter()
            .filter_map(|name| card.text(name))
            .any(|kind| kind.eq_ignore_ascii_case("group"));

        let members = ["MEMBER", "X-ADDRESSBOOKSERVER-MEMBER"]
            .iter()
            .flat_map(|name| card.properties_named(name))
            .map(|line| {
                let value = line.value.trim();
                value
                    .strip_prefix("urn:uuid:")
                    .unwrap_or(value)
                    .to_string()
            })
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            uid: card.text("UID").map(|uid| {
                uid.strip_prefix("urn:uuid:")
                    .map(str::to_string)
                    .unwrap_or(uid)
            }),
            formatted_name: card.text("FN"),
            emails: collect_values(card, "EMAIL"),
            phones: collect_values(card, "TEL"),
            group,
            members,
        }
    }
}

fn collect_values(card: &Component, name: &str) -> Vec<String> {
    card.properties_named(name)
        .map(|line| line.text().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl Decode for Contact {
    /// Decodes every VCARD in the payload, in document order.
    fn decode_all(payload: &[u8]) -> CodecResult<Vec<Self>> {
        let roots = Component::parse_all(payload)?;

        let mut cards = Vec::new();
        for root in &roots {
            root.find_all("VCARD", &mut cards);
        }

        Ok(cards.into_iter().map(Contact::from_component).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_individual() {
        let payload = "BEGIN:VCARD\r\nVERSION:4.0\r\nUID:urn:uuid:c-1\r\nFN:Ada Lovelace\r\nEMAIL;TYPE=work:ada@example.com\r\nitem1.TEL:+44 1\r\nEND:VCARD\r\n";
        let contacts = Contact::decode_all(payload.as_bytes()).unwrap();
        assert_eq!(contacts.len(), 1);

        let ada = &contacts[0];
        assert_eq!(ada.uid.as_deref(), Some("c-1"));
        assert_eq!(ada.formatted_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(ada.emails, vec!["ada@example.com"]);
        assert_eq!(ada.phones, vec!["+44 1"]);
        assert!(!ada.group);
    }

    #[test]
    fn decode_group_variants() {
        let v4 = "BEGIN:VCARD\nVERSION:4.0\nUID:g\nKIND:group\nMEMBER:urn:uuid:c-1\nMEMBER:urn:uuid:c-2\nEND:VCARD\n";
        let group = &Contact::decode_all(v4.as_bytes()).unwrap()[0];
        assert!(group.group);
        assert_eq!(group.members, vec!["c-1", "c-2"]);

        let apple = "BEGIN:VCARD\nVERSION:3.0\nUID:g\nX-ADDRESSBOOKSERVER-KIND:GROUP\nX-ADDRESSBOOKSERVER-MEMBER:urn:uuid:c-3\nEND:VCARD\n";
        let group = &Contact::decode_all(apple.as_bytes()).unwrap()[0];
        assert!(group.group);
        assert_eq!(group.members, vec!["c-3"]);
    }

    #[test]
    fn decode_multiple_cards() {
        let payload = "BEGIN:VCARD\nUID:a\nEND:VCARD\nBEGIN:VCARD\nUID:b\nEND:VCARD\n";
        assert_eq!(Contact::decode_all(payload.as_bytes()).unwrap().len(), 2);
    }
}
