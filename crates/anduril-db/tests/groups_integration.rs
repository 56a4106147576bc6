//! Group manager integration tests
//!
//! Covers atomic group and profile creation, club sponsors, group requests
//! gated by the requester's profile, memberships and delete cascades.

use anduril_core::{
	Error, GroupKind, GroupProfileDetails, NewGroup, NewUser, ProfileFields, User,
};
use anduril_db::{Database, DbError, GroupManager, UserManager};
use rstest::rstest;
use serde_json::json;

struct Managers {
	db: Database,
	users: UserManager,
	groups: GroupManager,
}

async fn setup() -> Managers {
	let db = Database::connect("sqlite::memory:")
		.await
		.expect("Failed to connect");
	db.migrate().await.expect("Failed to migrate");
	Managers {
		users: UserManager::new(db.clone()),
		groups: GroupManager::new(db.clone()),
		db,
	}
}

async fn count(db: &Database, table: &str) -> i64 {
	sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
		.fetch_one(db.pool())
		.await
		.expect("Failed to count rows")
}

async fn teacher(m: &Managers, username: &str) -> User {
	m.users
		.create_user(NewUser::new(username), "teacher", &ProfileFields::new())
		.await
		.expect("Failed to create teacher")
}

async fn student(m: &Managers, username: &str, student_id: &str) -> User {
	let mut fields = ProfileFields::new();
	fields.insert("student_id".to_string(), json!(student_id));
	m.users
		.create_user(NewUser::new(username), "student", &fields)
		.await
		.expect("Failed to create student")
}

// ============================================================================
// Creation
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_create_club_with_sponsors() {
	// Arrange
	let m = setup().await;
	let first = teacher(&m, "sponsor1").await;
	let second = teacher(&m, "sponsor2").await;
	let mut fields = ProfileFields::new();
	fields.insert("sponsors".to_string(), json!([second.id, first.id]));
	fields.insert("display_title".to_string(), json!("Robotics"));

	// Act
	let group = m
		.groups
		.create_group(
			NewGroup::new("robotics").with_title("Robotics Team"),
			"club",
			&fields,
		)
		.await
		.expect("Should create club");

	// Assert
	assert_eq!(group.profile_kind(), Some(GroupKind::Club));
	assert_eq!(group.effective_title(), "Robotics");
	assert_eq!(group.to_string(), "<Group.Club robotics>");

	let loaded = m.groups.get(group.id).await.unwrap();
	assert_eq!(loaded.profile().unwrap().sponsors(), &[first.id, second.id]);
	let sponsors: Vec<String> = m
		.groups
		.sponsors(&loaded)
		.await
		.unwrap()
		.into_iter()
		.map(|u| u.username)
		.collect();
	assert_eq!(sponsors, vec!["sponsor1", "sponsor2"]);
}

#[rstest]
#[case("academic", GroupKind::Academic)]
#[case("administrative", GroupKind::Administrative)]
#[case("external", GroupKind::External)]
#[tokio::test]
async fn test_create_each_group_variant(#[case] discriminator: &str, #[case] kind: GroupKind) {
	let m = setup().await;

	let group = m
		.groups
		.create_group(NewGroup::new("group"), discriminator, &ProfileFields::new())
		.await
		.unwrap();

	assert_eq!(group.profile_kind(), Some(kind));
	assert!(group.profile().unwrap().sponsors().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_unknown_group_discriminator_writes_nothing() {
	let m = setup().await;

	let result = m
		.groups
		.create_group(NewGroup::new("robotics"), "student", &ProfileFields::new())
		.await;

	assert!(matches!(
		result,
		Err(DbError::Model(Error::UnknownVariant { registry: "group profile", .. }))
	));
	assert_eq!(count(&m.db, "groups_group").await, 0);
}

#[rstest]
#[tokio::test]
async fn test_unknown_sponsor_rolls_back_group() {
	let m = setup().await;
	let mut fields = ProfileFields::new();
	fields.insert("sponsors".to_string(), json!([404]));

	let result = m
		.groups
		.create_group(NewGroup::new("ghosts"), "club", &fields)
		.await;

	assert!(matches!(result, Err(DbError::Sqlx(_))));
	assert_eq!(count(&m.db, "groups_group").await, 0);
	assert_eq!(count(&m.db, "groups_groupprofile").await, 0);
}

#[rstest]
#[tokio::test]
async fn test_duplicate_group_name_is_rejected() {
	let m = setup().await;
	m.groups
		.create_group(NewGroup::new("chess"), "club", &ProfileFields::new())
		.await
		.unwrap();

	let error = m
		.groups
		.create_group(NewGroup::new("chess"), "academic", &ProfileFields::new())
		.await
		.unwrap_err();

	assert!(error.is_unique_violation());
	assert_eq!(count(&m.db, "groups_groupprofile").await, 1);
}

// ============================================================================
// Requests
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_student_may_request_club_only() {
	let m = setup().await;
	let requester = student(&m, "nokim", "1").await;

	let club = m
		.groups
		.request_group(&requester, NewGroup::new("chess"), "club", &ProfileFields::new())
		.await;
	let academic = m
		.groups
		.request_group(&requester, NewGroup::new("algebra"), "academic", &ProfileFields::new())
		.await;

	assert!(club.is_ok());
	assert!(matches!(
		academic,
		Err(DbError::Model(Error::PermissionDenied(_)))
	));
	assert_eq!(count(&m.db, "groups_group").await, 1);
}

#[rstest]
#[tokio::test]
async fn test_teacher_may_not_request_administrative() {
	let m = setup().await;
	let requester = teacher(&m, "mrsmith").await;

	let result = m
		.groups
		.request_group(&requester, NewGroup::new("office"), "administrative", &ProfileFields::new())
		.await;

	assert!(matches!(result, Err(DbError::Model(Error::PermissionDenied(_)))));
}

#[rstest]
#[tokio::test]
async fn test_superuser_may_request_anything() {
	let m = setup().await;
	let admin = m
		.users
		.create_user(NewUser::new("admin").superuser(), "counselor", &ProfileFields::new())
		.await
		.unwrap();

	for (name, kind) in [
		("a", "club"),
		("b", "academic"),
		("c", "administrative"),
		("d", "external"),
	] {
		m.groups
			.request_group(&admin, NewGroup::new(name), kind, &ProfileFields::new())
			.await
			.expect("Superuser should be allowed");
	}
	assert_eq!(count(&m.db, "groups_group").await, 4);
}

// ============================================================================
// Save, delete and membership
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_save_cascades_to_profile() {
	let m = setup().await;
	let sponsor = teacher(&m, "sponsor").await;
	let mut group = m
		.groups
		.create_group(NewGroup::new("chess"), "club", &ProfileFields::new())
		.await
		.unwrap();

	group.description = "Weekly games".to_string();
	let profile = group.profile.as_mut().unwrap();
	profile.display_title = Some("Chess Club".to_string());
	profile.details = GroupProfileDetails::Club {
		sponsors: vec![sponsor.id],
	};
	m.groups.save(&group).await.unwrap();

	let loaded = m.groups.get_by_name("chess").await.unwrap();
	assert_eq!(loaded.description, "Weekly games");
	assert_eq!(loaded.effective_title(), "Chess Club");
	assert_eq!(loaded.profile().unwrap().sponsors(), &[sponsor.id]);
}

#[rstest]
#[tokio::test]
async fn test_save_writes_only_own_profile() {
	// Arrange
	let m = setup().await;
	let sponsor = teacher(&m, "sponsor").await;
	let chess = m
		.groups
		.create_group(NewGroup::new("chess"), "club", &ProfileFields::new())
		.await
		.unwrap();
	let mut robotics = m
		.groups
		.create_group(NewGroup::new("robotics"), "club", &ProfileFields::new())
		.await
		.unwrap();

	// Act
	let mut borrowed = chess.profile.clone().unwrap();
	borrowed.display_title = Some("Robotics Team".to_string());
	borrowed.details = GroupProfileDetails::Club {
		sponsors: vec![sponsor.id],
	};
	robotics.profile = Some(borrowed);
	m.groups.save(&robotics).await.unwrap();

	// Assert
	let chess = m.groups.get_by_name("chess").await.unwrap();
	assert_eq!(chess.profile().unwrap().display_title, None);
	assert!(chess.profile().unwrap().sponsors().is_empty());
	let robotics = m.groups.get_by_name("robotics").await.unwrap();
	assert_eq!(robotics.effective_title(), "Robotics Team");
	assert_eq!(robotics.profile().unwrap().sponsors(), &[sponsor.id]);
}

#[rstest]
#[tokio::test]
async fn test_save_trims_group_name() {
	let m = setup().await;
	let mut group = m
		.groups
		.create_group(NewGroup::new("chess"), "club", &ProfileFields::new())
		.await
		.unwrap();

	group.name = "  chess-club ".to_string();
	m.groups.save(&group).await.unwrap();

	assert_eq!(m.groups.get(group.id).await.unwrap().name, "chess-club");
}

#[rstest]
#[tokio::test]
async fn test_delete_leaves_no_orphans() {
	let m = setup().await;
	let sponsor = teacher(&m, "sponsor").await;
	let mut fields = ProfileFields::new();
	fields.insert("sponsors".to_string(), json!(sponsor.id));
	let group = m
		.groups
		.create_group(NewGroup::new("chess"), "club", &fields)
		.await
		.unwrap();
	m.groups.add_member(&group, &sponsor, "sponsor").await.unwrap();

	m.groups.delete(&group).await.unwrap();

	assert_eq!(count(&m.db, "groups_group").await, 0);
	assert_eq!(count(&m.db, "groups_groupprofile").await, 0);
	assert_eq!(count(&m.db, "groups_clubsponsor").await, 0);
	assert_eq!(count(&m.db, "groups_membership").await, 0);
	assert!(matches!(
		m.groups.get(group.id).await,
		Err(DbError::NotFound { model: "Group", .. })
	));
}

#[rstest]
#[tokio::test]
async fn test_memberships() {
	// Arrange
	let m = setup().await;
	let alice = student(&m, "alice", "1").await;
	let bob = student(&m, "bob", "2").await;
	let chess = m
		.groups
		.create_group(NewGroup::new("chess"), "club", &ProfileFields::new())
		.await
		.unwrap();
	let band = m
		.groups
		.create_group(NewGroup::new("band"), "club", &ProfileFields::new())
		.await
		.unwrap();

	// Act
	m.groups.add_member(&chess, &alice, "").await.unwrap();
	let updated = m.groups.add_member(&chess, &alice, "president").await.unwrap();
	m.groups.add_member(&chess, &bob, "").await.unwrap();
	m.groups.add_member(&band, &alice, "").await.unwrap();

	// Assert
	assert_eq!(updated.roles, "president");
	assert_eq!(m.groups.memberships(&chess).await.unwrap().len(), 2);
	let members: Vec<String> = m
		.groups
		.members(&chess)
		.await
		.unwrap()
		.into_iter()
		.map(|u| u.username)
		.collect();
	assert_eq!(members, vec!["alice", "bob"]);

	let names: Vec<String> = m
		.groups
		.groups_for_user(&alice)
		.await
		.unwrap()
		.into_iter()
		.map(|g| g.name)
		.collect();
	assert_eq!(names, vec!["band", "chess"]);

	assert!(m.groups.remove_member(&chess, &bob).await.unwrap());
	assert!(!m.groups.remove_member(&chess, &bob).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_membership_roles_length_is_checked() {
	let m = setup().await;
	let alice = student(&m, "alice", "1").await;
	let chess = m
		.groups
		.create_group(NewGroup::new("chess"), "club", &ProfileFields::new())
		.await
		.unwrap();

	let result = m.groups.add_member(&chess, &alice, &"r".repeat(31)).await;

	assert!(matches!(result, Err(DbError::Model(Error::Validation(_)))));
}

#[rstest]
#[tokio::test]
async fn test_list_hides_hidden_groups() {
	let m = setup().await;
	m.groups
		.create_group(NewGroup::new("visible"), "club", &ProfileFields::new())
		.await
		.unwrap();
	m.groups
		.create_group(NewGroup::new("secret").hidden(), "administrative", &ProfileFields::new())
		.await
		.unwrap();

	assert_eq!(m.groups.list(false).await.unwrap().len(), 1);
	assert_eq!(m.groups.list(true).await.unwrap().len(), 2);
}
