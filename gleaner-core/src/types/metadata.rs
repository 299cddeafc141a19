//! Metadata documents stored on IPFS.
//!
//! The resolution layer treats documents as opaque JSON; these types are a
//! typed view for callers that know which document a reference points at.
//! Unknown fields are ignored and optional fields default, so older documents
//! keep deserializing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a job pays out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Single payment on completion
    Full,
    /// Payment split across milestones
    Milestone,
}

/// Job posting metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    /// Short job title
    pub title: String,
    /// Full job description
    pub description: String,
    /// Marketplace category
    pub category: String,
    /// Free-form requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    /// How the job pays out
    pub payment_type: PaymentType,
    /// Milestones, when paid per milestone
    #[serde(default)]
    pub milestones: Vec<MilestoneMetadata>,
}

/// One milestone of a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneMetadata {
    /// Milestone title
    pub title: String,
    /// What the milestone delivers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Amount in whole tokens, kept as a string for precision
    pub amount: String,
    /// Unix seconds
    pub deadline: u64,
}

/// Work submitted against a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableMetadata {
    /// Deliverable title
    pub title: String,
    /// What was delivered
    pub description: String,
    /// Links to the submitted work
    #[serde(default)]
    pub links: Vec<String>,
    /// Unix seconds
    pub submitted_at: u64,
    /// Job the work was submitted for
    pub job_id: String,
    /// Submitting wallet address
    pub freelancer: String,
}

/// Availability advertised on a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// Taking new work
    Available,
    /// Working, may accept later
    Busy,
    /// Not taking work
    Unavailable,
}

/// Public profile of a marketplace user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    /// Name shown on the profile
    pub display_name: String,
    /// Short biography
    #[serde(default)]
    pub bio: String,
    /// CID of the avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_hash: Option<String>,
    /// CID of the cover image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_hash: Option<String>,
    /// Professional title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Personal website
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Listed skills
    #[serde(default)]
    pub skills: Vec<String>,
    /// Spoken languages
    #[serde(default)]
    pub languages: Vec<String>,
    /// Social handles keyed by network (twitter, github, ...)
    #[serde(default)]
    pub socials: BTreeMap<String, String>,
    /// Portfolio entries
    #[serde(default)]
    pub portfolio_items: Vec<PortfolioItem>,
    /// Asking rate per hour, in whole tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    /// Current availability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    /// Unix seconds
    #[serde(default)]
    pub created_at: u64,
    /// Unix seconds
    #[serde(default)]
    pub updated_at: u64,
}

/// Portfolio entry on a profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    /// Entry title
    pub title: String,
    /// Entry description
    #[serde(default)]
    pub description: String,
    /// CID of the preview image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
    /// External link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_metadata_from_json() {
        let json = serde_json::json!({
            "title": "Build a landing page",
            "description": "Responsive landing page with a signup form",
            "category": "development",
            "paymentType": "milestone",
            "milestones": [
                { "title": "Design", "amount": "10.5", "deadline": 1735689600 }
            ]
        });

        let job: JobMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(job.payment_type, PaymentType::Milestone);
        assert_eq!(job.milestones.len(), 1);
        assert_eq!(job.milestones[0].amount, "10.5");
        assert!(job.requirements.is_none());
    }

    #[test]
    fn test_profile_metadata_tolerates_missing_fields() {
        let json = serde_json::json!({
            "displayName": "alice",
            "socials": { "github": "alice" },
            "availability": "busy",
            "somethingNew": true
        });

        let profile: ProfileMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(profile.display_name, "alice");
        assert_eq!(profile.socials.get("github").map(String::as_str), Some("alice"));
        assert_eq!(profile.availability, Some(Availability::Busy));
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_deliverable_requires_job_id() {
        let json = serde_json::json!({
            "title": "v1",
            "description": "first cut",
            "submittedAt": 1
        });
        assert!(serde_json::from_value::<DeliverableMetadata>(json).is_err());
    }
}
