//! # Anduril Core
//!
//! Owner and profile models for the Anduril school portal.
//!
//! Users and groups are *owners*. Each owner carries exactly one profile chosen
//! from a closed set of variants:
//!
//! - **User profiles**: `student`, `teacher`, `counselor`, `staff`, `alumnus`
//! - **Group profiles**: `club`, `academic`, `administrative`, `external`
//!
//! Discriminators are resolved through the static tables in [`registry`], and
//! untyped profile input is validated against the resolved variant before
//! anything is written.
//!
//! ## Example
//!
//! ```
//! use anduril_core::{NewUserProfile, ProfileFields, UserKind};
//! use serde_json::json;
//!
//! let mut fields = ProfileFields::new();
//! fields.insert("title".to_string(), json!("Registrar"));
//!
//! let profile = NewUserProfile::from_fields("staff", &fields).unwrap();
//! assert_eq!(profile.details.kind(), UserKind::Staff);
//! ```

pub mod error;
pub mod fields;
pub mod friendship;
pub mod group;
pub mod mail;
pub mod profile;
pub mod registry;
pub mod serializers;
pub mod user;

pub use error::{Error, Result};
pub use fields::ProfileFields;
pub use friendship::Friendship;
pub use group::{
	Group, GroupKind, GroupMembership, GroupProfile, GroupProfileDetails, NewGroup,
	NewGroupProfile,
};
pub use mail::{Account, Domain};
pub use profile::{NewUserProfile, UserKind, UserProfile, UserProfileDetails};
pub use registry::{Discriminator, VariantRegistry, VariantSpec, group_profiles, user_profiles};
pub use serializers::{GroupRecord, UserRecord};
pub use user::{NewUser, User, UserStatistics};
