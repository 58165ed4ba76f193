//! Caller identity and the claims it is decoded from.
//!
//! An authentication collaborator hands back a [`ClaimsIdentity`]: an ordered
//! bag of `(kind, value)` pairs. Encore only ever consumes two of them, the
//! name and the role, and turns them into a typed [`Identity`].

use serde::{Deserialize, Serialize};

/// Claim kinds consumed by Encore.
pub mod claim_types {
    /// The user name claim.
    pub const NAME: &str = "name";

    /// The role claim.
    pub const ROLE: &str = "role";
}

/// The authenticated caller of a request.
///
/// Serializes as `{"userName": ..., "role": ...}` so templates see the same
/// shape JSON clients do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// The user name.
    pub user_name: String,
    /// The role, e.g. `"admin"`.
    pub role: String,
}

impl Identity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(user_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            role: role.into(),
        }
    }

    /// Returns true when the role matches `role` exactly.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Builds the claim set persisted by a sign-in: exactly name and role.
    #[must_use]
    pub fn to_claims(&self) -> ClaimsIdentity {
        ClaimsIdentity::new()
            .with_claim(claim_types::NAME, &self.user_name)
            .with_claim(claim_types::ROLE, &self.role)
    }

    /// Decodes an identity from a claim set.
    ///
    /// Takes the first claim of each required kind and stops at the first one
    /// that is missing.
    #[must_use]
    pub fn from_claims(claims: &ClaimsIdentity) -> Option<Self> {
        let user_name = claims.first(claim_types::NAME)?;
        let role = claims.first(claim_types::ROLE)?;
        Some(Self::new(user_name, role))
    }
}

/// A single claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    /// Claim kind, see [`claim_types`].
    pub kind: String,
    /// Claim value.
    pub value: String,
}

/// An ordered set of claims produced by authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    claims: Vec<Claim>,
}

impl ClaimsIdentity {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a claim.
    #[must_use]
    pub fn with_claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim {
            kind: kind.into(),
            value: value.into(),
        });
        self
    }

    /// Returns the value of the first claim of `kind`.
    #[must_use]
    pub fn first(&self, kind: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.value.as_str())
    }

    /// Returns all claims in insertion order.
    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Returns the number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true if there are no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
