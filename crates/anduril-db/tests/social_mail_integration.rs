//! Friendship and mail integration tests

use anduril_core::{Error, NewUser, ProfileFields, User};
use anduril_db::{AccountManager, Database, DbError, DomainManager, FriendshipManager, UserManager};
use rstest::rstest;

async fn database() -> Database {
	let db = Database::connect("sqlite::memory:")
		.await
		.expect("Failed to connect");
	db.migrate().await.expect("Failed to migrate");
	db
}

async fn user(users: &UserManager, username: &str) -> User {
	users
		.create_user(NewUser::new(username), "teacher", &ProfileFields::new())
		.await
		.expect("Failed to create user")
}

fn usernames(users: Vec<User>) -> Vec<String> {
	users.into_iter().map(|u| u.username).collect()
}

// ============================================================================
// Friendships
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_between_only_sees_confirmed_friendships() {
	// Arrange
	let db = database().await;
	let users = UserManager::new(db.clone());
	let friendships = FriendshipManager::new(db);
	let a = user(&users, "a").await;
	let b = user(&users, "b").await;

	// Act
	let mut request = friendships.request(&a, &b).await.unwrap();

	// Assert
	assert!(friendships.between(&a, &b).await.unwrap().is_none());
	friendships.confirm(&mut request).await.unwrap();
	assert!(request.confirmed);
	let found = friendships.between(&b, &a).await.unwrap().unwrap();
	assert_eq!(found.id, request.id);
	assert!(found.links(a.id, b.id));
}

#[rstest]
#[tokio::test]
async fn test_friends_in_both_directions() {
	let db = database().await;
	let users = UserManager::new(db.clone());
	let friendships = FriendshipManager::new(db);
	let me = user(&users, "me").await;
	let asked = user(&users, "asked").await;
	let asker = user(&users, "asker").await;
	let pending = user(&users, "pending").await;

	let mut outgoing = friendships.request(&me, &asked).await.unwrap();
	friendships.confirm(&mut outgoing).await.unwrap();
	let mut incoming = friendships.request(&asker, &me).await.unwrap();
	friendships.confirm(&mut incoming).await.unwrap();
	friendships.request(&pending, &me).await.unwrap();

	let mut confirmed = usernames(friendships.friends(&me, true).await.unwrap());
	confirmed.sort();
	assert_eq!(confirmed, vec!["asked", "asker"]);
	assert_eq!(
		usernames(friendships.friends(&me, false).await.unwrap()),
		vec!["pending"]
	);
}

#[rstest]
#[tokio::test]
async fn test_self_friendship_is_rejected() {
	let db = database().await;
	let users = UserManager::new(db.clone());
	let friendships = FriendshipManager::new(db);
	let me = user(&users, "me").await;

	assert!(matches!(
		friendships.request(&me, &me).await,
		Err(DbError::Model(Error::Validation(_)))
	));
}

#[rstest]
#[tokio::test]
async fn test_deleting_user_removes_friendships() {
	let db = database().await;
	let users = UserManager::new(db.clone());
	let friendships = FriendshipManager::new(db.clone());
	let a = user(&users, "a").await;
	let b = user(&users, "b").await;
	friendships.request(&a, &b).await.unwrap();

	users.delete(&b).await.unwrap();

	let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM home_friendship")
		.fetch_one(db.pool())
		.await
		.unwrap();
	assert_eq!(remaining, 0);
}

// ============================================================================
// Mail
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_only_one_main_domain() {
	let db = database().await;
	let domains = DomainManager::new(db);

	let first = domains.create("school.org", true).await.unwrap();
	let second = domains.create("alumni.school.org", true).await.unwrap();

	let main: Vec<_> = domains
		.list()
		.await
		.unwrap()
		.into_iter()
		.filter(|d| d.main)
		.collect();
	assert_eq!(main.len(), 1);
	assert_eq!(domains.default_domain().await.unwrap().unwrap().id, second.id);

	let mut first = domains.get(first.id).await.unwrap();
	assert!(!first.main);
	first.main = true;
	domains.save(&first).await.unwrap();
	assert_eq!(domains.default_domain().await.unwrap().unwrap().id, first.id);
	assert!(!domains.get(second.id).await.unwrap().main);
}

#[rstest]
#[tokio::test]
async fn test_no_default_domain() {
	let db = database().await;
	let domains = DomainManager::new(db);
	domains.create("school.org", false).await.unwrap();

	assert!(domains.default_domain().await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
async fn test_account_address_must_match_domain() {
	// Arrange
	let db = database().await;
	let domains = DomainManager::new(db.clone());
	let accounts = AccountManager::new(db);
	let domain = domains.create("school.org", true).await.unwrap();

	// Act
	let local = accounts.create(&domain, "nokim@school.org", "").await.unwrap();
	let mismatched = accounts.create(&domain, "nokim@gmail.com", "").await;

	// Assert
	assert!(!local.is_alias());
	assert!(matches!(
		mismatched,
		Err(DbError::Model(Error::Validation(_)))
	));

	let mut alias = accounts.get_by_address("nokim@school.org").await.unwrap();
	alias.forward = "nokim@gmail.com".to_string();
	accounts.save(&alias).await.unwrap();
	assert!(accounts.get_by_address("nokim@school.org").await.unwrap().is_alias());

	alias.address = "nokim@elsewhere.org".to_string();
	assert!(accounts.save(&alias).await.is_err());
	assert_eq!(accounts.for_domain(&domain).await.unwrap().len(), 1);
}
