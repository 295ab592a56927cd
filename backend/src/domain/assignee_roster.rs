//! Known assignees and the email-domain allowlist of the directory.

use std::fmt;

use serde::Serialize;

use super::{EmailAddress, PERSON_NAME_MAX, PersonName, UserValidationError};

/// A support agent the suggestion model may pick and whose display name is
/// used when a ticket assigns them by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnownAssignee {
    pub email: EmailAddress,
    pub name: PersonName,
}

/// Error raised while parsing a roster entry list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid roster entry '{entry}': {reason}")]
pub struct RosterParseError {
    pub entry: String,
    pub reason: String,
}

/// Roster of known assignees.
///
/// # Examples
/// ```
/// use helpdesk::domain::{AssigneeRoster, EmailAddress};
///
/// let roster =
///     AssigneeRoster::parse("ana@example.com=Ana Souza; bruno@example.com=Bruno").unwrap();
/// let email = EmailAddress::new("ana@example.com").unwrap();
/// assert_eq!(roster.display_name_for(&email).unwrap().as_ref(), "Ana Souza");
/// let stranger = EmailAddress::new("carla.dias@example.com").unwrap();
/// assert_eq!(roster.display_name_for(&stranger).unwrap().as_ref(), "carla.dias");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssigneeRoster {
    members: Vec<KnownAssignee>,
}

impl AssigneeRoster {
    pub fn new(members: Vec<KnownAssignee>) -> Self {
        Self { members }
    }

    /// Parse `email=Name` pairs separated by `;`. Blank entries are skipped.
    pub fn parse(raw: &str) -> Result<Self, RosterParseError> {
        let members = raw
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { members })
    }

    pub fn members(&self) -> &[KnownAssignee] {
        &self.members
    }

    /// Whether `email` may be suggested. An empty roster admits anyone.
    pub fn admits(&self, email: &EmailAddress) -> bool {
        self.members.is_empty() || self.members.iter().any(|member| &member.email == email)
    }

    /// Roster name for `email`, or its local part when the email is unknown.
    ///
    /// Local parts longer than [`PERSON_NAME_MAX`] are truncated.
    pub fn display_name_for(
        &self,
        email: &EmailAddress,
    ) -> Result<PersonName, UserValidationError> {
        if let Some(member) = self.members.iter().find(|member| &member.email == email) {
            return Ok(member.name.clone());
        }
        let local: String = email.local_part().chars().take(PERSON_NAME_MAX).collect();
        PersonName::new(local)
    }
}

fn parse_entry(entry: &str) -> Result<KnownAssignee, RosterParseError> {
    let fail = |reason: &dyn fmt::Display| RosterParseError {
        entry: entry.to_owned(),
        reason: reason.to_string(),
    };
    let (email, name) = entry
        .split_once('=')
        .ok_or_else(|| fail(&"expected email=Name"))?;
    Ok(KnownAssignee {
        email: EmailAddress::new(email).map_err(|err| fail(&err))?,
        name: PersonName::new(name).map_err(|err| fail(&err))?,
    })
}

/// Email domains accepted by directory writes.
///
/// Matching is exact on the lower-cased domain; subdomains must be listed
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDomainPolicy {
    allowed: Vec<String>,
}

impl EmailDomainPolicy {
    /// Build a policy from a list of domains; blanks are ignored.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = domains
            .into_iter()
            .map(|domain| domain.as_ref().trim().trim_start_matches('@').to_lowercase())
            .filter(|domain| !domain.is_empty())
            .collect();
        Self { allowed }
    }

    /// Parse a comma-separated domain list.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn permits(&self, email: &EmailAddress) -> bool {
        self.allowed.iter().any(|domain| domain == email.domain())
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw).expect("valid email")
    }

    #[rstest]
    fn roster_parses_pairs_and_skips_blanks() {
        let roster =
            AssigneeRoster::parse(" ana@example.com=Ana ;; bruno@example.com = Bruno Lima ;")
                .expect("valid roster");
        assert_eq!(roster.members().len(), 2);
        let name = roster
            .display_name_for(&email("bruno@example.com"))
            .expect("name");
        assert_eq!(name.as_ref(), "Bruno Lima");
    }

    #[rstest]
    #[case("ana@example.com")]
    #[case("not-an-email=Ana")]
    #[case("ana@example.com=  ")]
    fn roster_rejects_malformed_entries(#[case] raw: &str) {
        let err = AssigneeRoster::parse(raw).expect_err("malformed");
        assert_eq!(err.entry, raw.trim());
    }

    #[rstest]
    fn unknown_assignee_falls_back_to_local_part() {
        let roster = AssigneeRoster::default();
        let name = roster
            .display_name_for(&email("ops.team@example.com"))
            .expect("name");
        assert_eq!(name.as_ref(), "ops.team");
    }

    #[rstest]
    #[case("", "carla@example.com", true)]
    #[case("ana@example.com=Ana", "ana@example.com", true)]
    #[case("ana@example.com=Ana", "carla@example.com", false)]
    fn roster_admits_members_or_anyone_when_empty(
        #[case] raw: &str,
        #[case] address: &str,
        #[case] admitted: bool,
    ) {
        let roster = AssigneeRoster::parse(raw).expect("valid roster");
        assert_eq!(roster.admits(&email(address)), admitted);
    }

    #[rstest]
    #[case("example.com", "ana@example.com", true)]
    #[case("example.com, corp.example.org", "ana@corp.example.org", true)]
    #[case("@Example.com", "ana@example.com", true)]
    #[case("example.com", "ana@sub.example.com", false)]
    #[case("example.com", "ana@example.org", false)]
    #[case("", "ana@example.com", false)]
    fn domain_policy_matches_exact_domains(
        #[case] raw: &str,
        #[case] address: &str,
        #[case] permitted: bool,
    ) {
        assert_eq!(EmailDomainPolicy::parse(raw).permits(&email(address)), permitted);
    }
}
