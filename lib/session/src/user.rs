//! The authenticated user's profile.
//!
//! A `UserProfile` is what the backend returns from the login and
//! registration exchanges. Only the identity fields and the role matter to
//! the session pipeline; the lending attributes (credit score, income, KYC
//! state) are carried through untouched for the views that display them.

use chrono::{DateTime, Utc};
use emi_portal_core::UserId;
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Profile of the authenticated portal user.
///
/// Field names follow the backend's camelCase JSON so the profile can be
/// persisted and restored in exactly the shape it was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user key.
    id: UserId,
    /// Display name.
    full_name: String,
    /// Login email address.
    email: String,
    /// Contact number.
    #[serde(default)]
    mobile: String,
    /// Access role.
    #[serde(default)]
    role: Role,
    /// KYC verification state as reported by the backend.
    #[serde(default)]
    kyc_status: String,
    /// Bureau credit score.
    #[serde(default)]
    credit_score: i32,
    /// Declared monthly income.
    #[serde(default)]
    monthly_income: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Creates a profile with the identity fields set and every lending
    /// attribute at its default.
    #[must_use]
    pub fn new(id: UserId, full_name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            email: email.into(),
            mobile: String::new(),
            role,
            kyc_status: String::new(),
            credit_score: 0,
            monthly_income: 0.0,
            profile_image: None,
            employment_type: None,
            is_active: None,
            created_at: None,
        }
    }

    /// Sets the contact number.
    #[must_use]
    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = mobile.into();
        self
    }

    /// Sets the lending attributes reported by the backend.
    #[must_use]
    pub fn with_lending_profile(
        mut self,
        kyc_status: impl Into<String>,
        credit_score: i32,
        monthly_income: f64,
    ) -> Self {
        self.kyc_status = kyc_status.into();
        self.credit_score = credit_score;
        self.monthly_income = monthly_income;
        self
    }

    /// Sets the employment type.
    #[must_use]
    pub fn with_employment_type(mut self, employment_type: Option<String>) -> Self {
        self.employment_type = employment_type;
        self
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns true if the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    #[must_use]
    pub fn kyc_status(&self) -> &str {
        &self.kyc_status
    }

    #[must_use]
    pub fn credit_score(&self) -> i32 {
        self.credit_score
    }

    #[must_use]
    pub fn monthly_income(&self) -> f64 {
        self.monthly_income
    }

    #[must_use]
    pub fn profile_image(&self) -> Option<&str> {
        self.profile_image.as_deref()
    }

    #[must_use]
    pub fn employment_type(&self) -> Option<&str> {
        self.employment_type.as_deref()
    }

    #[must_use]
    pub fn is_active(&self) -> Option<bool> {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_has_identity_and_defaults() {
        let user = UserProfile::new(UserId::new(5), "Asha Rao", "asha@example.com", Role::Standard);

        assert_eq!(user.id(), UserId::new(5));
        assert_eq!(user.full_name(), "Asha Rao");
        assert_eq!(user.email(), "asha@example.com");
        assert!(!user.is_admin());
        assert_eq!(user.credit_score(), 0);
        assert!(user.profile_image().is_none());
    }

    #[test]
    fn deserializes_backend_payload() {
        let json = r#"{
            "id": 12,
            "fullName": "Vikram Shah",
            "email": "vikram@example.com",
            "mobile": "9876543210",
            "kycStatus": "Verified",
            "creditScore": 742,
            "monthlyIncome": 85000.5,
            "employmentType": "Salaried",
            "role": "Admin",
            "isActive": true,
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;

        let user: UserProfile = serde_json::from_str(json).expect("deserialize");

        assert_eq!(user.id(), UserId::new(12));
        assert!(user.is_admin());
        assert_eq!(user.kyc_status(), "Verified");
        assert_eq!(user.credit_score(), 742);
        assert_eq!(user.employment_type(), Some("Salaried"));
        assert_eq!(user.is_active(), Some(true));
        assert!(user.created_at().is_some());
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_options() {
        let user = UserProfile::new(UserId::new(1), "A", "a@example.com", Role::Admin)
            .with_lending_profile("Pending", 650, 40000.0);

        let json = serde_json::to_value(&user).expect("serialize");

        assert_eq!(json["fullName"], "A");
        assert_eq!(json["kycStatus"], "Pending");
        assert_eq!(json["role"], "Admin");
        assert!(json.get("profileImage").is_none());
    }

    #[test]
    fn profile_serialization_roundtrip() {
        let user = UserProfile::new(UserId::new(3), "R", "r@example.com", Role::Standard)
            .with_mobile("555")
            .with_employment_type(Some("SelfEmployed".to_string()));

        let json = serde_json::to_string(&user).expect("serialize");
        let parsed: UserProfile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(user, parsed);
    }
}
