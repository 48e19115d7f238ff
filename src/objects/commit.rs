//! A commit snapshots the repository: a tree, zero or more parents, the
//! person who authored the change and the person who committed it, and a
//! message. Serialized as RFC 822-ish headers followed by a blank line and
//! the message body, exactly as `objects/mod.rs` expects for any object
//! whose payload is text.

use crate::error::Error;
use crate::hash::Hash;

/// Either the author or the committer of a commit: a name, an email, and
/// the time the action happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub timestamp: u64,
    pub timezone: String,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>, timestamp: u64, timezone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            timezone: timezone.into(),
        }
    }

    /// `Name <email> timestamp timezone`
    pub fn serialize(&self) -> String {
        format!("{} <{}> {} {}", self.name, self.email, self.timestamp, self.timezone)
    }

    pub fn parse(s: &str) -> crate::error::Result<Self> {
        let email_start = s
            .find('<')
            .ok_or_else(|| Error::corrupt("person line missing '<'"))?;
        let email_end = s
            .find('>')
            .ok_or_else(|| Error::corrupt("person line missing '>'"))?;

        let name = s[..email_start].trim().to_string();
        let email = s[email_start + 1..email_end].to_string();

        let rest: Vec<&str> = s[email_end + 1..].trim().split(' ').collect();
        if rest.len() < 2 {
            return Err(Error::corrupt("person line missing timestamp/timezone"));
        }

        let timestamp: u64 = rest[0]
            .parse()
            .map_err(|_| Error::corrupt(format!("invalid timestamp '{}'", rest[0])))?;
        let timezone = rest[1].to_string();

        Ok(Self {
            name,
            email,
            timestamp,
            timezone,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: Hash,
    pub parents: Vec<Hash>,
    pub author: Person,
    pub committer: Person,
    pub message: String,
}

impl Commit {
    pub fn new(tree: Hash, parents: Vec<Hash>, author: Person, committer: Person, message: String) -> Self {
        Self {
            tree,
            parents,
            author,
            committer,
            message,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }

    pub fn serialize(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("tree {}", self.tree));
        for parent in &self.parents {
            lines.push(format!("parent {}", parent));
        }
        lines.push(format!("author {}", self.author.serialize()));
        lines.push(format!("committer {}", self.committer.serialize()));
        lines.push(String::new());
        lines.push(self.message.clone());

        lines.join("\n")
    }

    pub fn parse(content: &str) -> crate::error::Result<Self> {
        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        let mut lines = content.lines();

        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }

            if let Some(hex) = line.strip_prefix("tree ") {
                tree = Some(Hash::from_hex(hex)?);
            } else if let Some(hex) = line.strip_prefix("parent ") {
                parents.push(Hash::from_hex(hex)?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(Person::parse(rest)?);
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = Some(Person::parse(rest)?);
            }
        }

        let message: String = lines.collect::<Vec<_>>().join("\n");

        Ok(Self {
            tree: tree.ok_or_else(|| Error::corrupt("commit missing tree line"))?,
            parents,
            author: author.ok_or_else(|| Error::corrupt("commit missing author line"))?,
            committer: committer.ok_or_else(|| Error::corrupt("commit missing committer line"))?,
            message,
        })
    }
}
